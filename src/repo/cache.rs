//! In-memory cache of fetched repository indexes

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::debug;

use crate::index::catalog::VersionCatalog;

struct CacheEntry {
    catalog: Arc<VersionCatalog>,
    expires_at: Instant,
}

/// Thread-safe map from repository URL to its most recently fetched index.
///
/// Entries are treated as absent once their TTL has elapsed; a background
/// sweeper started with [`spawn_sweeper`](Self::spawn_sweeper) removes them.
pub struct ResolutionCache {
    entries: Mutex<HashMap<String, CacheEntry>>,
    default_ttl: Duration,
}

impl ResolutionCache {
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<String, CacheEntry>> {
        // Entries hold no cross-field invariants, so a poisoned map is still usable
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, locator: &str) -> Option<Arc<VersionCatalog>> {
        let entries = self.lock_entries();
        entries
            .get(locator)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| Arc::clone(&entry.catalog))
    }

    pub fn set(&self, locator: &str, catalog: Arc<VersionCatalog>, ttl: Duration) {
        let entry = CacheEntry {
            catalog,
            expires_at: Instant::now() + ttl,
        };
        self.lock_entries().insert(locator.to_string(), entry);
    }

    pub fn delete(&self, locator: &str) {
        self.lock_entries().remove(locator);
    }

    /// Remove expired entries, returning how many were dropped.
    pub fn sweep_expired(&self) -> usize {
        let now = Instant::now();
        let mut entries = self.lock_entries();
        let before = entries.len();
        entries.retain(|_, entry| now < entry.expires_at);
        before - entries.len()
    }

    /// Number of stored entries, including expired ones not yet swept
    pub fn len(&self) -> usize {
        self.lock_entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Start a task that sweeps expired entries once per default TTL.
    ///
    /// The task ends once the cache has been dropped.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let cache = Arc::downgrade(self);
        let period = self.default_ttl.max(Duration::from_millis(1));

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                let Some(cache) = cache.upgrade() else {
                    break;
                };
                let removed = cache.sweep_expired();
                if removed > 0 {
                    debug!("Swept {} expired index cache entries", removed);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_secs(180);

    fn catalog() -> Arc<VersionCatalog> {
        Arc::new(VersionCatalog::new())
    }

    #[tokio::test(start_paused = true)]
    async fn entry_is_available_until_ttl_elapses() {
        let cache = ResolutionCache::new(TTL);
        cache.set("https://charts.example", catalog(), TTL);

        tokio::time::advance(TTL - Duration::from_millis(1)).await;
        assert!(cache.get("https://charts.example").is_some());

        tokio::time::advance(Duration::from_millis(1)).await;
        assert!(cache.get("https://charts.example").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn set_with_custom_ttl_overrides_default() {
        let cache = ResolutionCache::new(TTL);
        cache.set("a", catalog(), Duration::from_secs(10));

        tokio::time::advance(Duration::from_secs(10)).await;

        assert!(cache.get("a").is_none());
    }

    #[test]
    fn set_replaces_existing_entry() {
        let cache = ResolutionCache::new(TTL);
        let first = catalog();
        let second = catalog();
        cache.set("a", Arc::clone(&first), TTL);
        cache.set("a", Arc::clone(&second), TTL);

        let cached = cache.get("a").unwrap();

        assert!(Arc::ptr_eq(&cached, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn delete_removes_entry() {
        let cache = ResolutionCache::new(TTL);
        cache.set("a", catalog(), TTL);

        cache.delete("a");

        assert!(cache.get("a").is_none());
        assert!(cache.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn sweep_expired_removes_only_expired_entries() {
        let cache = ResolutionCache::new(TTL);
        cache.set("short", catalog(), Duration::from_secs(1));
        cache.set("long", catalog(), TTL);

        tokio::time::advance(Duration::from_secs(2)).await;

        assert_eq!(cache.sweep_expired(), 1);
        assert_eq!(cache.len(), 1);
        assert!(cache.get("long").is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_removes_expired_entries_without_lookups() {
        let cache = Arc::new(ResolutionCache::new(TTL));
        let _sweeper = cache.spawn_sweeper();
        cache.set("a", catalog(), TTL);

        tokio::time::sleep(TTL + Duration::from_secs(1)).await;

        assert_eq!(cache.len(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn sweeper_stops_when_cache_is_dropped() {
        let cache = Arc::new(ResolutionCache::new(TTL));
        let sweeper = cache.spawn_sweeper();

        drop(cache);
        tokio::time::sleep(TTL * 2).await;

        assert!(sweeper.is_finished());
    }
}
