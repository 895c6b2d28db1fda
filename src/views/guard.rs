//! Bot filtering and per-visitor throttling of view increments

use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;
use std::time::Duration;

use super::KvStore;

lazy_static! {
    static ref BOT_PATTERN: Regex =
        Regex::new(r"(?i)(bot|spider|crawler|preview|pingdom|lighthouse)").unwrap();
}

/// Characters of the user agent kept in throttle keys
const UA_KEY_LEN: usize = 40;

pub fn is_bot(user_agent: &str) -> bool {
    BOT_PATTERN.is_match(user_agent)
}

pub fn throttle_key(slug: Option<&str>, ip: &str, user_agent: &str) -> String {
    let target = slug.filter(|s| !s.is_empty()).unwrap_or("site");
    let ua: String = user_agent.chars().take(UA_KEY_LEN).collect();
    format!("rate:views:{}:{}:{}", target, ip, ua)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Bot,
    Throttled,
}

#[derive(Clone)]
pub struct ViewGuard {
    store: Arc<dyn KvStore>,
    ttl: Duration,
}

impl ViewGuard {
    pub fn new(store: Arc<dyn KvStore>, throttle_seconds: u64) -> Self {
        Self {
            store,
            ttl: Duration::from_secs(throttle_seconds),
        }
    }

    /// Decide whether a view should be counted; store failures never block counting
    pub async fn check(&self, slug: Option<&str>, ip: &str, user_agent: &str) -> GuardDecision {
        if is_bot(user_agent) {
            return GuardDecision::Bot;
        }
        if self.ttl.is_zero() {
            return GuardDecision::Allow;
        }

        let key = throttle_key(slug, ip, user_agent);
        match self.store.set_if_absent(&key, "1", self.ttl).await {
            Ok(true) => GuardDecision::Allow,
            Ok(false) => GuardDecision::Throttled,
            Err(e) => {
                tracing::debug!(key = %key, "throttle check failed: {}", e);
                GuardDecision::Allow
            }
        }
    }
}
