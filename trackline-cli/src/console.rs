//! Render surface that writes marker and path updates to the log.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::{debug, info};
use trackline::animation::{MarkerId, RenderSurface};
use trackline::coord::Coordinate;

/// Logs every surface call. Marker moves go to `debug`, everything else to
/// `info`.
#[derive(Debug, Default)]
pub struct ConsoleSurface {
    next_id: AtomicU64,
    moves: AtomicU64,
}

impl ConsoleSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marker position updates so far.
    pub fn moves(&self) -> u64 {
        self.moves.load(Ordering::Relaxed)
    }
}

impl RenderSurface for ConsoleSurface {
    fn create_marker(&self, position: Coordinate, heading: f64) -> MarkerId {
        let marker = MarkerId(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        info!(%marker, %position, heading = format!("{:.1}", heading), "Marker created");
        marker
    }

    fn set_marker_position(&self, marker: MarkerId, position: Coordinate) {
        self.moves.fetch_add(1, Ordering::Relaxed);
        debug!(%marker, %position, "Marker moved");
    }

    fn set_marker_heading(&self, marker: MarkerId, heading: f64) {
        debug!(%marker, heading = format!("{:.1}", heading), "Marker turned");
    }

    fn remove_marker(&self, marker: MarkerId) {
        info!(%marker, moves = self.moves(), "Marker removed");
    }

    fn draw_path(&self, points: &[Coordinate]) {
        match (points.first(), points.last()) {
            (Some(first), Some(last)) => {
                info!(points = points.len(), from = %first, to = %last, "Path drawn")
            }
            _ => info!("Empty path drawn"),
        }
    }

    fn clear_path(&self) {
        info!("Path cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_ids_and_move_count() {
        let surface = ConsoleSurface::new();
        let position = Coordinate::new(1.0, 2.0).unwrap();

        let a = surface.create_marker(position, 0.0);
        let b = surface.create_marker(position, 0.0);
        assert_ne!(a, b);

        surface.set_marker_position(a, position);
        surface.set_marker_position(b, position);
        assert_eq!(surface.moves(), 2);
    }
}
