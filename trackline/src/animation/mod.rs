//! Marker animation.
//!
//! Turns sparse progress targets into continuous marker motion along the
//! active path, and defines the [`RenderSurface`] boundary the core draws
//! through.

mod controller;
mod surface;
mod tween;

pub use controller::{
    AnimationConfig, AnimationController, AnimationState, DEFAULT_FRAME_INTERVAL,
    DEFAULT_TWEEN_DURATION,
};
pub use surface::{MarkerId, RecordingSurface, RenderSurface, SurfaceCall};
pub use tween::{ease_out_cubic, interpolate_heading, shortest_heading_delta, TweenSample, TweenState};
