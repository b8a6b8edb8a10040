//! Trackline - route-constrained live courier tracking
//!
//! This library turns a stream of raw, noisy position fixes for a moving
//! agent into smooth, route-aligned motion on a map:
//!
//! - [`route`]: resolves travel paths through a pluggable [`provider`],
//!   with a time-bounded cache and per-route throttle
//! - [`snap`]: projects fixes onto the active path and keeps progress
//!   monotonic under GPS noise
//! - [`animation`]: eases a marker between successive snapped positions
//! - [`phase`]: picks route endpoints for the active journey leg
//! - [`session`]: ties the above together for one journey
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use trackline::config::TrackingConfig;
//! use trackline::provider::StraightLineProvider;
//! use trackline::route::{MemoryRouteCache, RouteGateway};
//!
//! let config = TrackingConfig::default();
//! let cache = Arc::new(MemoryRouteCache::new(&config.route));
//! let gateway = Arc::new(RouteGateway::new(StraightLineProvider, cache, config.route.clone()));
//! let session = TrackingSession::new("order-42", gateway, surface, channel, config);
//! let handle = session.start(lifecycle_rx).await?;
//! ```

pub mod animation;
pub mod config;
pub mod coord;
pub mod geometry;
pub mod logging;
pub mod phase;
pub mod provider;
pub mod route;
pub mod session;
pub mod snap;
