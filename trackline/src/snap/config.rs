//! Snap tunables.

/// Backward movement (as a fraction of the path) still treated as noise.
pub const DEFAULT_BACKTRACK_TOLERANCE: f64 = 0.05;

/// Segments whose projections are this close to the best one count as
/// overlapping candidates.
pub const DEFAULT_OVERLAP_TOLERANCE_M: f64 = 3.0;

/// Configuration for the snap engine.
#[derive(Debug, Clone, PartialEq)]
pub struct SnapConfig {
    /// Backward movement tolerated as noise, as a fraction of path length (default: 0.05).
    pub backtrack_tolerance: f64,
    /// Distance band for overlapping segment candidates, in metres (default: 3).
    pub overlap_tolerance_m: f64,
}

impl Default for SnapConfig {
    fn default() -> Self {
        Self {
            backtrack_tolerance: DEFAULT_BACKTRACK_TOLERANCE,
            overlap_tolerance_m: DEFAULT_OVERLAP_TOLERANCE_M,
        }
    }
}
