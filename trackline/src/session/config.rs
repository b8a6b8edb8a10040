//! Session tunables.

use std::time::Duration;

use super::channel::DEFAULT_CHANNEL_CAPACITY;

/// Silence after which the session asks for the current position.
pub const DEFAULT_STALE_FIX_TIMEOUT: Duration = Duration::from_secs(30);

/// Snap offset beyond which a fix counts as off-route.
pub const DEFAULT_OFF_ROUTE_THRESHOLD_M: f64 = 75.0;

/// Consecutive off-route fixes that trigger a reroute.
pub const DEFAULT_OFF_ROUTE_FIXES: u32 = 3;

/// Configuration for a tracking session.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionConfig {
    /// Resync after this long without a fix (default: 30s).
    pub stale_fix_timeout: Duration,
    /// Off-route distance in metres (default: 75).
    pub off_route_threshold_m: f64,
    /// Consecutive off-route fixes before rerouting; 0 disables (default: 3).
    pub off_route_fixes: u32,
    /// Buffered fixes per subscription (default: 64).
    pub channel_capacity: usize,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            stale_fix_timeout: DEFAULT_STALE_FIX_TIMEOUT,
            off_route_threshold_m: DEFAULT_OFF_ROUTE_THRESHOLD_M,
            off_route_fixes: DEFAULT_OFF_ROUTE_FIXES,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}
