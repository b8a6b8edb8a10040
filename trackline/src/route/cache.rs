//! Route cache trait and in-memory implementation.
//!
//! The cache is an explicit object handed to the gateway, shared across
//! sessions behind an `Arc<dyn RouteCache>`. Writes for a key overwrite the
//! previous entry; nothing is merged.

use std::sync::Arc;
use std::time::Duration;

use moka::policy::EvictionPolicy;
use moka::sync::Cache as MokaCache;
use tokio::time::Instant;
use tracing::debug;

use super::config::RouteCacheConfig;
use super::key::RouteKey;
use crate::geometry::Path;

/// A cached route.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCacheEntry {
    pub key: RouteKey,
    pub path: Path,
    pub resolved_at: Instant,
}

impl RouteCacheEntry {
    /// Age of the entry at `now`.
    pub fn age(&self, now: Instant) -> Duration {
        now.saturating_duration_since(self.resolved_at)
    }
}

/// Storage for resolved routes.
///
/// Ages are measured on the Tokio clock.
///
/// # Thread Safety
///
/// All implementations must be `Send + Sync`; the cache is read from every
/// session's resolution tasks.
pub trait RouteCache: Send + Sync {
    /// Returns the path for `key` if its entry is younger than the TTL.
    fn get(&self, key: &RouteKey) -> Option<Path>;

    /// Returns the entry for `key` regardless of age.
    fn entry(&self, key: &RouteKey) -> Option<RouteCacheEntry>;

    /// Stores `path` under `key`, replacing any previous entry.
    fn insert(&self, key: RouteKey, path: Path);

    /// Removes the entry for `key`. Returns whether one existed.
    fn remove(&self, key: &RouteKey) -> bool;

    /// Number of stored entries, live or not.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every entry.
    fn clear(&self);
}

/// In-memory route cache backed by moka.
///
/// moka bounds the entry count to `max_entries` (least recently used goes
/// first) and drops entries once they are older than `purge_horizon`.
/// Reads apply the shorter `ttl` on top, so an entry past its TTL is no
/// longer served by [`get`](RouteCache::get) but is still available through
/// [`entry`](RouteCache::entry) until the purge horizon.
pub struct MemoryRouteCache {
    entries: MokaCache<RouteKey, RouteCacheEntry>,
    ttl: Duration,
    purge_horizon: Duration,
    max_entries: usize,
}

impl MemoryRouteCache {
    /// Creates a cache using the TTL, purge horizon and size bound of `config`.
    pub fn new(config: &RouteCacheConfig) -> Self {
        let max_entries = config.max_entries.max(1);
        let entries = MokaCache::builder()
            .max_capacity(max_entries as u64)
            .time_to_live(config.purge_horizon)
            .eviction_policy(EvictionPolicy::lru())
            .eviction_listener(|key: Arc<RouteKey>, _, cause| {
                if cause.was_evicted() {
                    debug!(key = %key, ?cause, "Route evicted from cache");
                }
            })
            .build();

        Self {
            entries,
            ttl: config.ttl,
            purge_horizon: config.purge_horizon,
            max_entries,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    /// Runs moka's pending maintenance (expiry and eviction).
    pub fn run_pending_tasks(&self) {
        self.entries.run_pending_tasks();
    }

    fn live_entry(&self, key: &RouteKey, max_age: Duration) -> Option<RouteCacheEntry> {
        let now = Instant::now();
        self.entries
            .get(key)
            .filter(|entry| entry.age(now) < max_age)
    }
}

impl Default for MemoryRouteCache {
    fn default() -> Self {
        Self::new(&RouteCacheConfig::default())
    }
}

impl RouteCache for MemoryRouteCache {
    fn get(&self, key: &RouteKey) -> Option<Path> {
        self.live_entry(key, self.ttl).map(|entry| entry.path)
    }

    fn entry(&self, key: &RouteKey) -> Option<RouteCacheEntry> {
        self.live_entry(key, self.purge_horizon)
    }

    fn insert(&self, key: RouteKey, path: Path) {
        self.entries.insert(
            key,
            RouteCacheEntry {
                key,
                path,
                resolved_at: Instant::now(),
            },
        );
    }

    fn remove(&self, key: &RouteKey) -> bool {
        self.entries.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.entries.run_pending_tasks();
        self.entries.entry_count() as usize
    }

    fn clear(&self) {
        self.entries.invalidate_all();
    }
}
