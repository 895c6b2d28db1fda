//! Key-value store backends

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{BackendKind, KvStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map(|t| t > now).unwrap_or(true)
    }
}

/// Process-local store for development and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvStore for MemoryStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Memory
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.lock().await;
        let value = entries
            .get(key)
            .filter(|e| e.is_live(Instant::now()))
            .map(|e| e.value.clone());
        tracing::debug!(key, found = value.is_some(), "memory GET");
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.entries.lock().await.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
        tracing::debug!(key, value, "memory SET");
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let current = entries
            .get(key)
            .filter(|e| e.is_live(now))
            .and_then(|e| e.value.trim().parse::<i64>().ok())
            .unwrap_or(0);
        let next = current + 1;
        entries.insert(
            key.to_string(),
            Entry {
                value: next.to_string(),
                expires_at: None,
            },
        );
        tracing::debug!(key, value = next, "memory INCR");
        Ok(next)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        let entries = self.entries.lock().await;
        let now = Instant::now();
        Ok(keys
            .iter()
            .map(|k| {
                entries
                    .get(k)
                    .filter(|e| e.is_live(now))
                    .map(|e| e.value.clone())
            })
            .collect())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        if entries.get(key).map(|e| e.is_live(now)).unwrap_or(false) {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(now + ttl),
            },
        );
        Ok(true)
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        self.entries.lock().await.clear();
        Ok(true)
    }
}

/// Redis backend over a multiplexed, auto-reconnecting connection
#[derive(Clone)]
pub struct RedisStore {
    conn: ConnectionManager,
}

impl RedisStore {
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl KvStore for RedisStore {
    fn kind(&self) -> BackendKind {
        BackendKind::Redis
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn.clone();
        let _: () = conn.set(key, value).await?;
        Ok(())
    }

    async fn incr(&self, key: &str) -> Result<i64, StoreError> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.incr(key, 1).await?;
        Ok(value)
    }

    async fn mget(&self, keys: &[String]) -> Result<Vec<Option<String>>, StoreError> {
        if keys.is_empty() {
            return Ok(Vec::new());
        }
        let mut conn = self.conn.clone();
        let values: Vec<Option<String>> = redis::cmd("MGET").arg(keys).query_async(&mut conn).await?;
        Ok(values)
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn.clone();
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }

    async fn clear(&self) -> Result<bool, StoreError> {
        // The database may be shared, never flush it
        Ok(false)
    }
}
