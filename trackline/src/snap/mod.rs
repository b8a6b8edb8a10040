//! Snap and progress engine.
//!
//! Turns a raw [`Fix`](crate::coord::Fix) into a position on the active
//! [`Path`](crate::geometry::Path): the nearest point on the path, the
//! normalised distance travelled along it, and a heading.
//!
//! # Anti-backtrack
//!
//! GPS noise routinely places a stationary courier a few metres behind
//! where they were a moment ago. Progress is therefore held at the
//! high-water mark in [`ProgressState`]:
//!
//! ```text
//! delta = progress - last_committed
//!
//!   delta >= 0                      -> Advanced
//!   -tolerance <= delta < 0         -> HeldNoise      (progress = last_committed)
//!   delta < -tolerance              -> HeldBacktrack  (progress = last_committed)
//! ```
//!
//! The emitted progress sequence for one path is non-decreasing.

mod config;
mod engine;
mod progress;

pub use config::{SnapConfig, DEFAULT_BACKTRACK_TOLERANCE, DEFAULT_OVERLAP_TOLERANCE_M};
pub use engine::{SnapDecision, SnapEngine, SnapRejection, SnapResult};
pub use progress::ProgressState;
