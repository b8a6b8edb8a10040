//! Route cache and provider gateway.
//!
//! The [`RouteGateway`] is the only way the tracking core asks for a route.
//! It validates the endpoints, short-circuits trivially short trips, serves
//! live entries from an injectable [`RouteCache`], and collapses repeated
//! requests for the same rounded endpoint pair inside the throttle window
//! into a single provider call.
//!
//! ```text
//! resolve_route(o, d)
//!   ├─ invalid endpoint ───────────────► Err(InvalidEndpoint)
//!   ├─ distance < min_route_distance ──► Ok(NoRouteNeeded)
//!   ├─ live cache entry ───────────────► Ok(Resolved(path))
//!   ├─ same key issued < throttle ago ─► await shared result
//!   └─ provider call ──► insert into cache ──► Ok(Resolved(path))
//! ```

mod cache;
mod config;
mod gateway;
mod key;

pub use cache::{MemoryRouteCache, RouteCache, RouteCacheEntry};
pub use config::{
    RouteCacheConfig, DEFAULT_KEY_PRECISION, DEFAULT_MAX_ENTRIES, DEFAULT_MIN_ROUTE_DISTANCE_M,
    DEFAULT_PURGE_HORIZON, DEFAULT_ROUTE_TTL, DEFAULT_THROTTLE_WINDOW,
};
pub use gateway::{RouteError, RouteGateway, RouteGatewayStats, RouteResolution};
pub use key::RouteKey;
