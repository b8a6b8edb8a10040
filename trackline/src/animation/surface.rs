//! Render surface boundary.
//!
//! The tracking core draws through this trait and nothing else. A map SDK
//! binding implements it in the host application; [`RecordingSurface`]
//! implements it for tests and dry runs.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;

use crate::coord::Coordinate;

/// Handle to a marker created on a [`RenderSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MarkerId(pub u64);

impl fmt::Display for MarkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Map primitives used by the tracking core.
///
/// Calls arrive from the animation tick task and the session loop, so
/// implementations must be `Send + Sync`. They must not call back into the
/// controller that invoked them.
pub trait RenderSurface: Send + Sync {
    /// Places a new marker and returns its handle.
    fn create_marker(&self, position: Coordinate, heading: f64) -> MarkerId;

    fn set_marker_position(&self, marker: MarkerId, position: Coordinate);

    /// Rotates the marker to `heading` degrees clockwise from north.
    fn set_marker_heading(&self, marker: MarkerId, heading: f64);

    fn remove_marker(&self, marker: MarkerId);

    /// Draws the route polyline, replacing any previous one.
    fn draw_path(&self, points: &[Coordinate]);

    /// Removes the route polyline.
    fn clear_path(&self);
}

/// One recorded [`RenderSurface`] call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceCall {
    CreateMarker {
        marker: MarkerId,
        position: Coordinate,
        heading: f64,
    },
    SetPosition {
        marker: MarkerId,
        position: Coordinate,
    },
    SetHeading {
        marker: MarkerId,
        heading: f64,
    },
    RemoveMarker(MarkerId),
    DrawPath(Vec<Coordinate>),
    ClearPath,
}

/// Surface that records every call in order.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    calls: Mutex<Vec<SurfaceCall>>,
    next_id: AtomicU64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every call so far.
    pub fn calls(&self) -> Vec<SurfaceCall> {
        self.calls.lock().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }

    /// Positions set for `marker`, including its creation position.
    pub fn positions(&self, marker: MarkerId) -> Vec<Coordinate> {
        self.calls
            .lock()
            .iter()
            .filter_map(|call| match call {
                SurfaceCall::CreateMarker {
                    marker: m,
                    position,
                    ..
                }
                | SurfaceCall::SetPosition {
                    marker: m,
                    position,
                } if *m == marker => Some(*position),
                _ => None,
            })
            .collect()
    }

    /// Most recent position of `marker`.
    pub fn last_position(&self, marker: MarkerId) -> Option<Coordinate> {
        self.positions(marker).last().copied()
    }

    /// Markers created and not yet removed.
    pub fn live_markers(&self) -> Vec<MarkerId> {
        let mut live = Vec::new();
        for call in self.calls.lock().iter() {
            match call {
                SurfaceCall::CreateMarker { marker, .. } => live.push(*marker),
                SurfaceCall::RemoveMarker(marker) => live.retain(|m| m != marker),
                _ => {}
            }
        }
        live
    }

    /// The currently drawn path, if any.
    pub fn drawn_path(&self) -> Option<Vec<Coordinate>> {
        let mut drawn = None;
        for call in self.calls.lock().iter() {
            match call {
                SurfaceCall::DrawPath(points) => drawn = Some(points.clone()),
                SurfaceCall::ClearPath => drawn = None,
                _ => {}
            }
        }
        drawn
    }

    /// Number of recorded calls matching `predicate`.
    pub fn count(&self, predicate: impl Fn(&SurfaceCall) -> bool) -> usize {
        self.calls.lock().iter().filter(|c| predicate(c)).count()
    }
}

impl RenderSurface for RecordingSurface {
    fn create_marker(&self, position: Coordinate, heading: f64) -> MarkerId {
        let marker = MarkerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        self.calls.lock().push(SurfaceCall::CreateMarker {
            marker,
            position,
            heading,
        });
        marker
    }

    fn set_marker_position(&self, marker: MarkerId, position: Coordinate) {
        self.calls
            .lock()
            .push(SurfaceCall::SetPosition { marker, position });
    }

    fn set_marker_heading(&self, marker: MarkerId, heading: f64) {
        self.calls
            .lock()
            .push(SurfaceCall::SetHeading { marker, heading });
    }

    fn remove_marker(&self, marker: MarkerId) {
        self.calls.lock().push(SurfaceCall::RemoveMarker(marker));
    }

    fn draw_path(&self, points: &[Coordinate]) {
        self.calls.lock().push(SurfaceCall::DrawPath(points.to_vec()));
    }

    fn clear_path(&self) {
        self.calls.lock().push(SurfaceCall::ClearPath);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_recording_tracks_markers_and_path() {
        let surface = RecordingSurface::new();
        let a = surface.create_marker(c(0.0, 0.0), 0.0);
        let b = surface.create_marker(c(1.0, 1.0), 0.0);
        assert_ne!(a, b);

        surface.set_marker_position(a, c(0.5, 0.5));
        surface.draw_path(&[c(0.0, 0.0), c(1.0, 1.0)]);
        surface.remove_marker(b);

        assert_eq!(surface.live_markers(), vec![a]);
        assert_eq!(surface.last_position(a), Some(c(0.5, 0.5)));
        assert_eq!(surface.positions(a).len(), 2);
        assert_eq!(surface.drawn_path().map(|p| p.len()), Some(2));

        surface.clear_path();
        assert!(surface.drawn_path().is_none());
    }
}
