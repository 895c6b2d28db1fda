//! Article, site and daily view counters

use chrono::{Duration, NaiveDate, Utc};
use chrono_tz::Tz;
use indexmap::IndexMap;
use serde::Serialize;
use std::sync::Arc;

use super::{KvStore, StoreError};
use crate::config::ViewsConfig;

pub const SITE_TOTAL_KEY: &str = "views:site:total";

pub fn article_key(slug: &str) -> String {
    format!("views:article:{}", slug)
}

pub fn daily_key(date: NaiveDate) -> String {
    format!("views:site:daily:{}", date.format("%Y-%m-%d"))
}

/// Stored values that are missing, non-numeric or negative read as 0
fn parse_count(value: Option<String>) -> u64 {
    value
        .and_then(|v| v.trim().parse::<i64>().ok())
        .map(|n| n.max(0) as u64)
        .unwrap_or(0)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyViews {
    pub date: String,
    pub views: u64,
}

#[derive(Clone)]
pub struct ViewCounter {
    store: Arc<dyn KvStore>,
    tz: Tz,
    allow_reset: bool,
}

impl ViewCounter {
    pub fn new(store: Arc<dyn KvStore>, config: &ViewsConfig, production: bool) -> Self {
        let tz = config.timezone.parse::<Tz>().unwrap_or_else(|_| {
            tracing::warn!(timezone = %config.timezone, "unknown timezone, using UTC");
            Tz::UTC
        });
        Self {
            store,
            tz,
            allow_reset: config.allow_reset || !production,
        }
    }

    pub fn store(&self) -> &Arc<dyn KvStore> {
        &self.store
    }

    /// Current day in the configured timezone
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.tz).date_naive()
    }

    pub async fn increment_article(&self, slug: &str) -> Result<u64, StoreError> {
        let views = self.store.incr(&article_key(slug)).await?;
        Ok(views.max(0) as u64)
    }

    pub async fn article_views(&self, slug: &str) -> Result<u64, StoreError> {
        Ok(parse_count(self.store.get(&article_key(slug)).await?))
    }

    /// Views of several articles, in the order requested
    pub async fn batch_article_views(
        &self,
        slugs: &[String],
    ) -> Result<IndexMap<String, u64>, StoreError> {
        if slugs.is_empty() {
            return Ok(IndexMap::new());
        }
        let keys: Vec<String> = slugs.iter().map(|s| article_key(s)).collect();
        let values = self.store.mget(&keys).await?;
        Ok(slugs
            .iter()
            .cloned()
            .zip(values.into_iter().map(parse_count))
            .collect())
    }

    pub async fn increment_site(&self) -> Result<u64, StoreError> {
        let views = self.store.incr(SITE_TOTAL_KEY).await?;
        Ok(views.max(0) as u64)
    }

    pub async fn site_views(&self) -> Result<u64, StoreError> {
        Ok(parse_count(self.store.get(SITE_TOTAL_KEY).await?))
    }

    pub async fn increment_today(&self) -> Result<u64, StoreError> {
        let views = self.store.incr(&daily_key(self.today())).await?;
        Ok(views.max(0) as u64)
    }

    pub async fn today_views(&self) -> Result<u64, StoreError> {
        Ok(parse_count(self.store.get(&daily_key(self.today())).await?))
    }

    /// Daily views of the last `days` days, oldest first
    pub async fn recent_views(&self, days: u32) -> Result<Vec<DailyViews>, StoreError> {
        let today = self.today();
        let dates: Vec<NaiveDate> = (0..days as i64)
            .rev()
            .map(|offset| today - Duration::days(offset))
            .collect();
        let keys: Vec<String> = dates.iter().map(|d| daily_key(*d)).collect();
        let values = self.store.mget(&keys).await?;

        Ok(dates
            .into_iter()
            .zip(values)
            .map(|(date, value)| DailyViews {
                date: date.format("%Y-%m-%d").to_string(),
                views: parse_count(value),
            })
            .collect())
    }

    pub async fn set_article_views(&self, slug: &str, count: u64) -> Result<(), StoreError> {
        self.store
            .set(&article_key(slug), &count.to_string())
            .await?;
        tracing::info!(slug, count, "article views set manually");
        Ok(())
    }

    pub async fn set_site_views(&self, count: u64) -> Result<(), StoreError> {
        self.store.set(SITE_TOTAL_KEY, &count.to_string()).await?;
        tracing::info!(count, "site views set manually");
        Ok(())
    }

    /// Reset counters; backends that cannot be cleared get site and today zeroed
    pub async fn reset_all(&self) -> Result<(), StoreError> {
        if !self.allow_reset {
            return Err(StoreError::ResetForbidden);
        }

        if self.store.clear().await? {
            tracing::warn!("all view counts cleared");
        } else {
            self.store.set(SITE_TOTAL_KEY, "0").await?;
            self.store.set(&daily_key(self.today()), "0").await?;
            tracing::warn!("site and today views reset, article views left untouched");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::views::MemoryStore;

    fn counter(production: bool, allow_reset: bool) -> ViewCounter {
        let config = ViewsConfig {
            allow_reset,
            ..ViewsConfig::default()
        };
        ViewCounter::new(Arc::new(MemoryStore::new()), &config, production)
    }

    #[test]
    fn test_keys() {
        assert_eq!(article_key("rust/ownership"), "views:article:rust/ownership");
        assert_eq!(
            daily_key(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()),
            "views:site:daily:2024-03-09"
        );
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(None), 0);
        assert_eq!(parse_count(Some("42".to_string())), 42);
        assert_eq!(parse_count(Some("abc".to_string())), 0);
        assert_eq!(parse_count(Some("-5".to_string())), 0);
    }

    #[tokio::test]
    async fn test_article_and_site_counts() {
        let counter = counter(false, false);
        assert_eq!(counter.article_views("a").await.unwrap(), 0);
        assert_eq!(counter.increment_article("a").await.unwrap(), 1);
        assert_eq!(counter.increment_article("a").await.unwrap(), 2);
        assert_eq!(counter.increment_site().await.unwrap(), 1);
        assert_eq!(counter.increment_today().await.unwrap(), 1);

        assert_eq!(counter.article_views("a").await.unwrap(), 2);
        assert_eq!(counter.site_views().await.unwrap(), 1);
        assert_eq!(counter.today_views().await.unwrap(), 1);

        let batch = counter
            .batch_article_views(&["b".to_string(), "a".to_string()])
            .await
            .unwrap();
        assert_eq!(batch.get_index(0), Some((&"b".to_string(), &0)));
        assert_eq!(batch.get("a"), Some(&2));
    }

    #[tokio::test]
    async fn test_recent_views_oldest_first() {
        let counter = counter(false, false);
        counter.increment_today().await.unwrap();
        counter.increment_today().await.unwrap();

        let recent = counter.recent_views(3).await.unwrap();
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].date, counter.today().format("%Y-%m-%d").to_string());
        assert_eq!(recent[2].views, 2);
        assert_eq!(recent[0].views, 0);
        assert!(recent[0].date < recent[1].date);
    }

    #[tokio::test]
    async fn test_manual_set_and_reset() {
        let counter = counter(false, false);
        counter.set_article_views("a", 10).await.unwrap();
        counter.set_site_views(99).await.unwrap();
        assert_eq!(counter.article_views("a").await.unwrap(), 10);
        assert_eq!(counter.site_views().await.unwrap(), 99);

        counter.reset_all().await.unwrap();
        assert_eq!(counter.article_views("a").await.unwrap(), 0);
        assert_eq!(counter.site_views().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_reset_forbidden_in_production() {
        let counter = counter(true, false);
        assert!(matches!(
            counter.reset_all().await,
            Err(StoreError::ResetForbidden)
        ));
        assert!(self::counter(true, true).reset_all().await.is_ok());
    }

    #[test]
    fn test_unknown_timezone_falls_back() {
        let config = ViewsConfig {
            timezone: "Mars/Olympus".to_string(),
            ..ViewsConfig::default()
        };
        let counter = ViewCounter::new(Arc::new(MemoryStore::new()), &config, false);
        assert_eq!(counter.tz, Tz::UTC);
    }
}
