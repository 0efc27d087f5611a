//! Short-lived memoization of idempotent reads
//!
//! A small expiring map keyed by logical endpoint name. Entries older than
//! the TTL are never returned; inserting past capacity evicts the entry that
//! was inserted first.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Time-to-live of a cached response.
pub const CACHE_TTL: Duration = Duration::from_secs(300);

/// Maximum number of cached responses.
pub const CACHE_CAPACITY: usize = 100;

#[derive(Debug, Clone)]
struct CacheEntry {
    value: serde_json::Value,
    inserted_at: Instant,
}

/// Expiring response cache shared by every call within a server session.
///
/// # Examples
///
/// ```
/// use inoreader_mcp::api::cache::ResponseCache;
///
/// let cache = ResponseCache::new();
/// cache.put("tag_list", serde_json::json!({"tags": []}));
/// assert!(cache.get("tag_list").is_some());
/// ```
#[derive(Debug)]
pub struct ResponseCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    ttl: Duration,
    capacity: usize,
}

impl ResponseCache {
    /// Cache with the standard 300-second TTL and 100-entry capacity.
    pub fn new() -> Self {
        Self::with_limits(CACHE_TTL, CACHE_CAPACITY)
    }

    /// Cache with explicit limits.
    pub fn with_limits(ttl: Duration, capacity: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            ttl,
            capacity: capacity.max(1),
        }
    }

    /// Returns the live value for `key`, if any.
    pub fn get(&self, key: &str) -> Option<serde_json::Value> {
        self.get_at(key, Instant::now())
    }

    /// Stores `value` under `key`, replacing any previous value.
    pub fn put(&self, key: &str, value: serde_json::Value) {
        self.put_at(key, value, Instant::now());
    }

    /// Number of stored entries, including ones that have expired but not
    /// yet been purged.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Returns `true` when nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    pub fn clear(&self) {
        self.lock().clear();
    }

    fn get_at(&self, key: &str, now: Instant) -> Option<serde_json::Value> {
        let mut entries = self.lock();
        match entries.get(key) {
            Some(entry) if now.saturating_duration_since(entry.inserted_at) < self.ttl => {
                tracing::debug!(key, "Response cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                entries.remove(key);
                None
            }
            None => None,
        }
    }

    fn put_at(&self, key: &str, value: serde_json::Value, now: Instant) {
        let mut entries = self.lock();
        entries.retain(|_, entry| now.saturating_duration_since(entry.inserted_at) < self.ttl);

        if !entries.contains_key(key) && entries.len() >= self.capacity {
            let oldest = entries
                .iter()
                .min_by_key(|(_, entry)| entry.inserted_at)
                .map(|(k, _)| k.clone());
            if let Some(oldest) = oldest {
                entries.remove(&oldest);
            }
        }

        entries.insert(
            key.to_string(),
            CacheEntry {
                value,
                inserted_at: now,
            },
        );
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, CacheEntry>> {
        // A panic while holding the lock cannot leave a half-written entry.
        self.entries.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_before_ttl_returns_value() {
        let cache = ResponseCache::new();
        let t0 = Instant::now();
        cache.put_at("subscription_list", json!({"subscriptions": [1]}), t0);

        let hit = cache.get_at("subscription_list", t0 + Duration::from_secs(299));
        assert_eq!(hit, Some(json!({"subscriptions": [1]})));
    }

    #[test]
    fn test_get_after_ttl_returns_none() {
        let cache = ResponseCache::new();
        let t0 = Instant::now();
        cache.put_at("subscription_list", json!({}), t0);

        assert!(cache
            .get_at("subscription_list", t0 + Duration::from_secs(300))
            .is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_last_write_wins() {
        let cache = ResponseCache::new();
        cache.put("tag_list", json!(1));
        cache.put("tag_list", json!(2));
        assert_eq!(cache.get("tag_list"), Some(json!(2)));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_rewrite_resets_age() {
        let cache = ResponseCache::new();
        let t0 = Instant::now();
        cache.put_at("k", json!("old"), t0);
        cache.put_at("k", json!("new"), t0 + Duration::from_secs(200));

        let hit = cache.get_at("k", t0 + Duration::from_secs(400));
        assert_eq!(hit, Some(json!("new")));
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let cache = ResponseCache::with_limits(CACHE_TTL, 2);
        let t0 = Instant::now();
        cache.put_at("a", json!("a"), t0);
        cache.put_at("b", json!("b"), t0 + Duration::from_secs(1));
        cache.put_at("c", json!("c"), t0 + Duration::from_secs(2));

        let now = t0 + Duration::from_secs(3);
        assert!(cache.get_at("a", now).is_none());
        assert_eq!(cache.get_at("b", now), Some(json!("b")));
        assert_eq!(cache.get_at("c", now), Some(json!("c")));
    }

    #[test]
    fn test_default_capacity_holds_one_hundred() {
        let cache = ResponseCache::new();
        for i in 0..150 {
            cache.put(&format!("key{i}"), json!(i));
        }
        assert_eq!(cache.len(), CACHE_CAPACITY);
    }

    #[test]
    fn test_clear() {
        let cache = ResponseCache::new();
        cache.put("x", json!(null));
        cache.clear();
        assert!(cache.get("x").is_none());
    }
}
