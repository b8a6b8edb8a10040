//! Tracking sessions.
//!
//! A session binds one journey to a fix channel, a route gateway and a
//! render surface. It listens for fixes and lifecycle updates, keeps the
//! active path in step with the journey phase, snaps each fix to that path
//! and drives the marker animation.
//!
//! # Staleness
//!
//! If no fix arrives for [`SessionConfig::stale_fix_timeout`], the session
//! asks the channel for the agent's current position. The same request is
//! made once at start so the marker appears without waiting for the next
//! scheduled fix.
//!
//! # Example
//!
//! ```ignore
//! let channel = Arc::new(MemoryFixChannel::new());
//! let session = TrackingSession::new("order-42", gateway, surface, channel, config);
//! let (tx, rx) = watch::channel(LifecycleSignal::new(Phase::ToOrigin, pickup, dropoff));
//! let mut handle = session.start(rx).await?;
//! // ...
//! handle.shutdown().await;
//! ```

mod channel;
mod config;
mod controller;
mod observer;
mod websocket;

pub use channel::{
    ChannelError, FixChannel, FixSubscription, MemoryFixChannel, PositionProvider,
    DEFAULT_CHANNEL_CAPACITY,
};
pub use config::{
    SessionConfig, DEFAULT_OFF_ROUTE_FIXES, DEFAULT_OFF_ROUTE_THRESHOLD_M,
    DEFAULT_STALE_FIX_TIMEOUT,
};
pub use controller::{LifecycleSignal, TrackingSession, TrackingSessionHandle};
pub use observer::{NoopObserver, SessionObserver};
pub use websocket::WebSocketFixChannel;
