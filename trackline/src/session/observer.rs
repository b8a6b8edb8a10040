//! Session observer interface.

use crate::geometry::Path;
use crate::route::RouteError;
use crate::snap::{SnapRejection, SnapResult};

/// Receives session events. Every method defaults to doing nothing.
///
/// Methods are called from the session loop and must return quickly.
pub trait SessionObserver: Send + Sync {
    /// A new path is active and drawn.
    fn on_route_changed(&self, _path: &Path) {}

    /// The path was dropped; nothing is rendered.
    fn on_route_cleared(&self) {}

    /// A fix was snapped and forwarded to the animation.
    fn on_progress(&self, _result: &SnapResult) {}

    /// Route resolution failed for the current endpoints.
    fn on_route_unavailable(&self, _error: &RouteError) {}

    /// A fix could not be snapped (no path yet, or invalid).
    fn on_fix_rejected(&self, _rejection: &SnapRejection) {}

    /// The session asked the fix channel for the current position.
    fn on_resync_requested(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl SessionObserver for NoopObserver {}
