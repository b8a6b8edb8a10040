//! Marker animation controller.
//!
//! One controller drives one marker on one [`RenderSurface`]. Targets come
//! in at whatever cadence fixes arrive; a single tick task eases the
//! rendered position toward the latest target and parks while idle.
//!
//! # Scheduling
//!
//! ```text
//!            update_target ──► notify
//!                                │
//!   ┌──────── idle ◄─────────────┼──────────────┐
//!   │  (park on Notify)          ▼              │
//!   └──────────────────────► active ── tween finished
//!                         (tick every frame_interval)
//! ```

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::surface::{MarkerId, RenderSurface};
use super::tween::TweenState;
use crate::geometry::{normalize_degrees, Path};

/// Default length of one tween.
pub const DEFAULT_TWEEN_DURATION: Duration = Duration::from_millis(600);

/// Default time between animation frames (about 60 fps).
pub const DEFAULT_FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Configuration for the animation controller.
#[derive(Debug, Clone, PartialEq)]
pub struct AnimationConfig {
    /// Time to ease from the rendered value to a new target (default: 600ms).
    pub tween_duration: Duration,
    /// Frame interval while a tween is active (default: 16ms).
    pub frame_interval: Duration,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            tween_duration: DEFAULT_TWEEN_DURATION,
            frame_interval: DEFAULT_FRAME_INTERVAL,
        }
    }
}

/// Snapshot of a controller's rendered state.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnimationState {
    /// Progress currently drawn.
    pub current_progress: f64,
    /// Heading currently drawn.
    pub current_heading: f64,
    /// Highest target progress received for the current path.
    pub last_committed_progress: f64,
}

struct Inner {
    path: Path,
    tween: Option<TweenState>,
    current_progress: f64,
    current_heading: f64,
    last_committed: f64,
    destroyed: bool,
}

impl Inner {
    fn state(&self) -> AnimationState {
        AnimationState {
            current_progress: self.current_progress,
            current_heading: self.current_heading,
            last_committed_progress: self.last_committed,
        }
    }
}

struct Shared {
    surface: Arc<dyn RenderSurface>,
    marker: MarkerId,
    config: AnimationConfig,
    inner: Mutex<Inner>,
    wake: Notify,
}

impl Shared {
    /// Advances the tween to `now` and draws the result.
    ///
    /// Returns whether a tween is still running.
    fn frame(&self, now: Instant) -> bool {
        let mut inner = self.inner.lock();
        if inner.destroyed {
            return false;
        }
        let Some(tween) = inner.tween else {
            return false;
        };

        let sample = tween.sample(now);
        inner.current_progress = sample.progress;
        inner.current_heading = sample.heading;
        if sample.finished {
            inner.tween = None;
        }

        let (position, _) = inner.path.locate(sample.progress);
        self.surface.set_marker_position(self.marker, position);
        self.surface.set_marker_heading(self.marker, sample.heading);
        trace!(marker = %self.marker, progress = sample.progress, "Animation frame");

        !sample.finished
    }
}

/// Animates one marker along a [`Path`].
///
/// Dropping the controller destroys it.
pub struct AnimationController {
    shared: Arc<Shared>,
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl AnimationController {
    /// Creates the marker at the start of `path` and starts the tick task.
    ///
    /// Must be called within a Tokio runtime.
    pub fn create(surface: Arc<dyn RenderSurface>, path: Path, config: AnimationConfig) -> Self {
        let heading = path.heading_at(0);
        Self::create_at(surface, path, 0.0, heading, config)
    }

    /// Creates the marker at `progress` along `path` facing `heading`.
    ///
    /// Used when the first fix is already somewhere along the route, so the
    /// marker does not glide in from the route start.
    pub fn create_at(
        surface: Arc<dyn RenderSurface>,
        path: Path,
        progress: f64,
        heading: f64,
        config: AnimationConfig,
    ) -> Self {
        let progress = clamp_progress(progress);
        let (position, _) = path.locate(progress);
        let marker = surface.create_marker(position, heading);
        debug!(marker = %marker, progress, "Animation controller created");

        let shared = Arc::new(Shared {
            surface,
            marker,
            config,
            inner: Mutex::new(Inner {
                path,
                tween: None,
                current_progress: progress,
                current_heading: heading,
                last_committed: progress,
                destroyed: false,
            }),
            wake: Notify::new(),
        });

        let cancellation = CancellationToken::new();
        let task = tokio::spawn(run_ticks(Arc::clone(&shared), cancellation.clone()));

        Self {
            shared,
            cancellation,
            task: Some(task),
        }
    }

    pub fn marker(&self) -> MarkerId {
        self.shared.marker
    }

    /// Sets a new target. The marker eases toward it from where it is now.
    ///
    /// A call during a running tween retargets that tween; nothing queues.
    pub fn update_target(&self, progress: f64, heading: f64) {
        let now = Instant::now();
        let progress = clamp_progress(progress);

        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }

            let heading = if heading.is_finite() {
                normalize_degrees(heading)
            } else {
                inner.tween.map_or(inner.current_heading, |t| t.to_heading)
            };

            let tween = match inner.tween {
                Some(running) => running.retarget((progress, heading), now),
                None => TweenState::start(
                    (inner.current_progress, inner.current_heading),
                    (progress, heading),
                    now,
                    self.shared.config.tween_duration,
                ),
            };
            inner.tween = Some(tween);
            if progress > inner.last_committed {
                inner.last_committed = progress;
            }
        }

        self.shared.wake.notify_one();
    }

    /// Replaces the path, keeping the marker where it is drawn.
    ///
    /// The rendered coordinate is projected onto `path` and becomes the new
    /// current progress, target and high-water mark. A running tween stops
    /// where it is.
    pub fn update_polyline(&self, path: Path) {
        let now = Instant::now();
        let mut inner = self.shared.inner.lock();
        if inner.destroyed {
            return;
        }

        if let Some(tween) = inner.tween.take() {
            let sample = tween.sample(now);
            inner.current_progress = sample.progress;
            inner.current_heading = sample.heading;
        }

        let (rendered, _) = inner.path.locate(inner.current_progress);
        let projection = path.project(&rendered);
        let progress = path.progress_of(projection.segment_index, projection.fraction);

        inner.path = path;
        inner.current_progress = progress;
        inner.last_committed = progress;
        self.shared
            .surface
            .set_marker_position(self.shared.marker, projection.point);

        debug!(
            marker = %self.shared.marker,
            progress,
            moved_m = projection.distance,
            "Animation path replaced"
        );
    }

    /// Current rendered state.
    pub fn state(&self) -> AnimationState {
        self.shared.inner.lock().state()
    }

    /// Whether a tween is running.
    pub fn is_animating(&self) -> bool {
        self.shared.inner.lock().tween.is_some()
    }

    /// Stops the tick task and removes the marker. Safe to call repeatedly.
    pub fn destroy(&mut self) {
        {
            let mut inner = self.shared.inner.lock();
            if inner.destroyed {
                return;
            }
            inner.destroyed = true;
            inner.tween = None;
            self.shared.surface.remove_marker(self.shared.marker);
        }

        self.cancellation.cancel();
        self.task.take();
        debug!(marker = %self.shared.marker, "Animation controller destroyed");
    }

    pub fn is_destroyed(&self) -> bool {
        self.shared.inner.lock().destroyed
    }
}

impl Drop for AnimationController {
    fn drop(&mut self) {
        self.destroy();
    }
}

async fn run_ticks(shared: Arc<Shared>, cancellation: CancellationToken) {
    let frame_interval = shared.config.frame_interval;

    loop {
        let active = shared.frame(Instant::now());

        if active {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = tokio::time::sleep(frame_interval) => {}
            }
        } else {
            tokio::select! {
                biased;
                _ = cancellation.cancelled() => break,
                _ = shared.wake.notified() => {}
            }
        }
    }

    trace!(marker = %shared.marker, "Animation tick loop stopped");
}

fn clamp_progress(progress: f64) -> f64 {
    if progress.is_finite() {
        progress.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::{RecordingSurface, SurfaceCall};
    use crate::coord::Coordinate;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn east_path() -> Path {
        Path::new(vec![c(0.0, 0.0), c(0.0, 0.01)]).unwrap()
    }

    async fn settle() {
        for _ in 0..5 {
            tokio::task::yield_now().await;
        }
    }

    fn controller(surface: &Arc<RecordingSurface>) -> AnimationController {
        AnimationController::create(
            Arc::clone(surface) as Arc<dyn RenderSurface>,
            east_path(),
            AnimationConfig::default(),
        )
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Tweening
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_create_places_marker_at_path_start() {
        let surface = Arc::new(RecordingSurface::new());
        let ctrl = controller(&surface);

        assert_eq!(surface.live_markers(), vec![ctrl.marker()]);
        assert_eq!(surface.last_position(ctrl.marker()), Some(c(0.0, 0.0)));
        assert_eq!(ctrl.state().current_progress, 0.0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_update_target_eases_without_jumping() {
        let surface = Arc::new(RecordingSurface::new());
        let ctrl = controller(&surface);

        ctrl.update_target(0.5, 90.0);
        assert_eq!(ctrl.state().current_progress, 0.0);
        assert_eq!(ctrl.state().last_committed_progress, 0.5);

        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        let mid = ctrl.state().current_progress;
        assert!((mid - 0.4375).abs() < 0.02, "got {}", mid);

        tokio::time::advance(Duration::from_millis(400)).await;
        settle().await;
        assert_eq!(ctrl.state().current_progress, 0.5);
        assert!(!ctrl.is_animating());

        let last = surface.last_position(ctrl.marker()).unwrap();
        assert!((last.longitude - 0.005).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_retarget_mid_tween_does_not_jump() {
        let surface = Arc::new(RecordingSurface::new());
        let ctrl = controller(&surface);

        ctrl.update_target(0.5, 90.0);
        tokio::time::advance(Duration::from_millis(300)).await;
        settle().await;
        let before = ctrl.state().current_progress;

        ctrl.update_target(1.0, 90.0);
        assert_eq!(ctrl.state().current_progress, before);

        tokio::time::advance(Duration::from_millis(16)).await;
        settle().await;
        let after = ctrl.state().current_progress;
        assert!(after >= before && after < 0.6, "{} -> {}", before, after);

        tokio::time::advance(Duration::from_millis(700)).await;
        settle().await;
        assert_eq!(ctrl.state().current_progress, 1.0);

        // Drawn longitudes never go backwards on an eastbound path
        let positions = surface.positions(ctrl.marker());
        assert!(positions
            .windows(2)
            .all(|w| w[1].longitude >= w[0].longitude - 1e-12));
    }

    #[tokio::test(start_paused = true)]
    async fn test_heading_tween_takes_short_way() {
        let surface = Arc::new(RecordingSurface::new());
        let ctrl = AnimationController::create_at(
            Arc::clone(&surface) as Arc<dyn RenderSurface>,
            east_path(),
            0.1,
            350.0,
            AnimationConfig::default(),
        );

        ctrl.update_target(0.2, 10.0);
        for _ in 0..40 {
            tokio::time::advance(Duration::from_millis(16)).await;
            settle().await;
        }

        let headings: Vec<f64> = surface
            .calls()
            .into_iter()
            .filter_map(|call| match call {
                SurfaceCall::SetHeading { heading, .. } => Some(heading),
                _ => None,
            })
            .collect();
        assert!(!headings.is_empty());
        assert!(headings.iter().all(|h| *h >= 350.0 || *h <= 10.0), "{:?}", headings);
        assert_eq!(ctrl.state().current_heading, 10.0);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Path replacement and teardown
    // ─────────────────────────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn test_update_polyline_preserves_rendered_coordinate() {
        let surface = Arc::new(RecordingSurface::new());
        let ctrl = controller(&surface);

        ctrl.update_target(0.5, 90.0);
        tokio::time::advance(Duration::from_millis(700)).await;
        settle().await;

        // North-south road crossing the marker's position
        let crossing = Path::new(vec![c(-0.005, 0.005), c(0.005, 0.005)]).unwrap();
        ctrl.update_polyline(crossing);

        let state = ctrl.state();
        assert!((state.current_progress - 0.5).abs() < 1e-6);
        assert_eq!(state.current_progress, state.last_committed_progress);
        assert!(!ctrl.is_animating());

        let drawn = surface.last_position(ctrl.marker()).unwrap();
        assert!(drawn.latitude.abs() < 1e-9);
        assert!((drawn.longitude - 0.005).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_destroy_is_idempotent() {
        let surface = Arc::new(RecordingSurface::new());
        let mut ctrl = controller(&surface);

        ctrl.destroy();
        ctrl.destroy();
        assert!(ctrl.is_destroyed());
        assert!(surface.live_markers().is_empty());
        assert_eq!(
            surface.count(|call| matches!(call, SurfaceCall::RemoveMarker(_))),
            1
        );

        let calls = surface.call_count();
        ctrl.update_target(0.9, 0.0);
        ctrl.update_polyline(east_path());
        tokio::time::advance(Duration::from_millis(700)).await;
        settle().await;
        assert_eq!(surface.call_count(), calls);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_removes_marker() {
        let surface = Arc::new(RecordingSurface::new());
        {
            let _ctrl = controller(&surface);
            assert_eq!(surface.live_markers().len(), 1);
        }
        assert!(surface.live_markers().is_empty());
    }
}
