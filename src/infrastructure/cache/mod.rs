//! Read-through cache collaborator.
//!
//! The cache is an accelerator, never a correctness dependency: with
//! [`NoopCache`] plugged in, every operation behaves identically. Read
//! paths may consult it first; every mutating operation invalidates
//! through one entity-keyed map instead of hand-written key lists.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;

/// Per-kind TTLs.
pub const TTL_LOTS: Duration = Duration::from_secs(300);
pub const TTL_HISTORY: Duration = Duration::from_secs(120);
pub const TTL_SUMMARY: Duration = Duration::from_secs(180);

/// Key-value cache with per-entry TTL.
#[async_trait]
pub trait Cache: Send + Sync {
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: String, ttl: Duration);
    async fn delete(&self, key: &str);
    async fn clear(&self);
}

/// Process-local cache backed by a concurrent map with lazy expiry.
pub struct InMemoryCache {
    entries: DashMap<String, (String, Instant)>,
}

impl InMemoryCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }
}

impl Default for InMemoryCache {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Cache for InMemoryCache {
    async fn get(&self, key: &str) -> Option<String> {
        if let Some(entry) = self.entries.get(key) {
            let (value, expires_at) = entry.value();
            if Instant::now() < *expires_at {
                return Some(value.clone());
            }
        }
        // expired entries are evicted on access
        self.entries.remove(key);
        None
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        self.entries
            .insert(key.to_string(), (value, Instant::now() + ttl));
    }

    async fn delete(&self, key: &str) {
        self.entries.remove(key);
    }

    async fn clear(&self) {
        self.entries.clear();
    }
}

/// Cache collaborator absent: all reads miss, all writes are dropped.
pub struct NoopCache;

#[async_trait]
impl Cache for NoopCache {
    async fn get(&self, _key: &str) -> Option<String> {
        None
    }

    async fn set(&self, _key: &str, _value: String, _ttl: Duration) {}

    async fn delete(&self, _key: &str) {}

    async fn clear(&self) {}
}

/// Entities whose cached projections a mutation can stale.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheEntity {
    Lot(i64),
    User(String),
    AdminSummary,
}

/// Cache key builders. Every key in the system is minted here.
pub mod keys {
    pub fn lots_all() -> String {
        "lots:all".to_string()
    }

    pub fn lot(id: i64) -> String {
        format!("lot:{}", id)
    }

    pub fn user_history(user_id: &str) -> String {
        format!("user:{}:history", user_id)
    }

    pub fn user_summary(user_id: &str) -> String {
        format!("user:{}:summary", user_id)
    }

    pub fn admin_summary() -> String {
        "summary:admin".to_string()
    }
}

/// The keys an entity mutation invalidates.
pub fn invalidation_keys(entity: &CacheEntity) -> Vec<String> {
    match entity {
        CacheEntity::Lot(id) => vec![keys::lot(*id), keys::lots_all(), keys::admin_summary()],
        CacheEntity::User(id) => vec![keys::user_history(id), keys::user_summary(id)],
        CacheEntity::AdminSummary => vec![keys::admin_summary()],
    }
}

/// Typed facade the services talk to.
#[derive(Clone)]
pub struct CacheLayer {
    cache: Arc<dyn Cache>,
}

impl CacheLayer {
    pub fn new(cache: Arc<dyn Cache>) -> Self {
        Self { cache }
    }

    /// Cache disabled; identical behavior, no acceleration.
    pub fn disabled() -> Self {
        Self::new(Arc::new(NoopCache))
    }

    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let raw = self.cache.get(key).await?;
        serde_json::from_str(&raw).ok()
    }

    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl: Duration) {
        if let Ok(raw) = serde_json::to_string(value) {
            self.cache.set(key, raw, ttl).await;
        }
    }

    /// Invalidate every key the given entities map to.
    pub async fn invalidate(&self, entities: &[CacheEntity]) {
        for entity in entities {
            for key in invalidation_keys(entity) {
                debug!(key = %key, "cache invalidate");
                self.cache.delete(&key).await;
            }
        }
    }
}

// ── Tests ──────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_then_get_roundtrips() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await;
        assert_eq!(cache.get("k").await.as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn expired_entry_misses() {
        let cache = InMemoryCache::new();
        cache
            .set("k", "v".to_string(), Duration::from_millis(10))
            .await;
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(cache.get("k").await.is_none());
    }

    #[tokio::test]
    async fn delete_and_clear_remove_entries() {
        let cache = InMemoryCache::new();
        cache
            .set("a", "1".to_string(), Duration::from_secs(60))
            .await;
        cache
            .set("b", "2".to_string(), Duration::from_secs(60))
            .await;
        cache.delete("a").await;
        assert!(cache.get("a").await.is_none());
        cache.clear().await;
        assert!(cache.get("b").await.is_none());
    }

    #[tokio::test]
    async fn noop_cache_never_stores() {
        let cache = NoopCache;
        cache
            .set("k", "v".to_string(), Duration::from_secs(60))
            .await;
        assert!(cache.get("k").await.is_none());
    }

    #[test]
    fn lot_mutation_invalidates_lot_list_and_summary() {
        let keys = invalidation_keys(&CacheEntity::Lot(7));
        assert!(keys.contains(&"lot:7".to_string()));
        assert!(keys.contains(&"lots:all".to_string()));
        assert!(keys.contains(&"summary:admin".to_string()));
    }

    #[test]
    fn user_mutation_invalidates_history_and_summary() {
        let keys = invalidation_keys(&CacheEntity::User("u1".into()));
        assert!(keys.contains(&"user:u1:history".to_string()));
        assert!(keys.contains(&"user:u1:summary".to_string()));
    }

    #[tokio::test]
    async fn cache_layer_roundtrips_json() {
        let layer = CacheLayer::new(Arc::new(InMemoryCache::new()));
        layer
            .set_json("nums", &vec![1, 2, 3], Duration::from_secs(60))
            .await;
        let got: Option<Vec<i32>> = layer.get_json("nums").await;
        assert_eq!(got, Some(vec![1, 2, 3]));
    }
}
