//! Route cache and throttle tunables.

use std::time::Duration;

/// How long a resolved route is served from the cache.
pub const DEFAULT_ROUTE_TTL: Duration = Duration::from_secs(5 * 60);

/// Entries older than this are removed from the cache.
pub const DEFAULT_PURGE_HORIZON: Duration = Duration::from_secs(10 * 60);

/// Window in which a repeated request for the same key reuses the first.
pub const DEFAULT_THROTTLE_WINDOW: Duration = Duration::from_secs(2);

/// Decimal places used to round endpoints into a route key (about 11 m).
pub const DEFAULT_KEY_PRECISION: u32 = 4;

/// Endpoints closer than this need no route.
pub const DEFAULT_MIN_ROUTE_DISTANCE_M: f64 = 5.0;

/// Upper bound on cached routes.
pub const DEFAULT_MAX_ENTRIES: usize = 256;

/// Configuration for the route cache and gateway.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteCacheConfig {
    /// Time-to-live of a cached route (default: 5 min).
    pub ttl: Duration,
    /// Age after which entries are purged (default: 10 min).
    pub purge_horizon: Duration,
    /// Throttle window per route key (default: 2s).
    pub throttle_window: Duration,
    /// Rounding precision of route keys, in decimal places (default: 4).
    pub key_precision: u32,
    /// Minimum origin-destination distance worth routing (default: 5 m).
    pub min_route_distance_m: f64,
    /// Maximum number of cached routes (default: 256).
    pub max_entries: usize,
}

impl Default for RouteCacheConfig {
    fn default() -> Self {
        Self {
            ttl: DEFAULT_ROUTE_TTL,
            purge_horizon: DEFAULT_PURGE_HORIZON,
            throttle_window: DEFAULT_THROTTLE_WINDOW,
            key_precision: DEFAULT_KEY_PRECISION,
            min_route_distance_m: DEFAULT_MIN_ROUTE_DISTANCE_M,
            max_entries: DEFAULT_MAX_ENTRIES,
        }
    }
}
