//! Tracking session controller.
//!
//! One session per journey. The session owns the active path and the
//! animation controller, and runs a single event loop:
//!
//! ```text
//!   fix channel ─────────┐
//!   lifecycle (watch) ───┤
//!   route completions ───┼──► session loop ──► snap ──► animation ──► surface
//!   staleness timer ─────┤          │
//!   cancellation ────────┘          └──► spawn resolve_route (tagged with generation)
//! ```
//!
//! Events are handled one at a time in arrival order. Route resolutions run
//! as separate tasks; their results come back through the loop and are
//! discarded when the desired endpoints have moved on.
//!
//! A lifecycle change drops the current path and marker straight away. A
//! reroute within the same phase keeps both until the replacement resolves,
//! and keeps them for good if it fails.

use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::channel::{ChannelError, FixChannel, FixSubscription};
use super::config::SessionConfig;
use super::observer::{NoopObserver, SessionObserver};
use crate::animation::{AnimationConfig, AnimationController, RenderSurface};
use crate::config::TrackingConfig;
use crate::coord::{Coordinate, Fix, FixMessage};
use crate::geometry::Path;
use crate::phase::{EndpointChange, Endpoints, KnownPoints, Phase, PhaseRouter};
use crate::provider::RouteProvider;
use crate::route::{RouteError, RouteGateway, RouteKey, RouteResolution};
use crate::snap::{ProgressState, SnapEngine, SnapRejection};

/// Lifecycle input published by the order system.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LifecycleSignal {
    pub phase: Phase,
    pub journey_origin: Coordinate,
    pub journey_destination: Coordinate,
    pub journey_start: Option<Coordinate>,
}

impl LifecycleSignal {
    pub fn new(phase: Phase, journey_origin: Coordinate, journey_destination: Coordinate) -> Self {
        Self {
            phase,
            journey_origin,
            journey_destination,
            journey_start: None,
        }
    }

    pub fn with_journey_start(mut self, start: Coordinate) -> Self {
        self.journey_start = Some(start);
        self
    }

    /// Same journey in another phase.
    pub fn with_phase(mut self, phase: Phase) -> Self {
        self.phase = phase;
        self
    }
}

/// A tracking session ready to start.
pub struct TrackingSession<P: RouteProvider + 'static, C: FixChannel + 'static> {
    session_id: String,
    gateway: Arc<RouteGateway<P>>,
    surface: Arc<dyn RenderSurface>,
    channel: Arc<C>,
    observer: Arc<dyn SessionObserver>,
    config: TrackingConfig,
}

impl<P: RouteProvider + 'static, C: FixChannel + 'static> TrackingSession<P, C> {
    pub fn new(
        session_id: impl Into<String>,
        gateway: Arc<RouteGateway<P>>,
        surface: Arc<dyn RenderSurface>,
        channel: Arc<C>,
        config: TrackingConfig,
    ) -> Self {
        Self {
            session_id: session_id.into(),
            gateway,
            surface,
            channel,
            observer: Arc::new(NoopObserver),
            config,
        }
    }

    /// Sets the observer notified of session events.
    pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Subscribes to the fix channel and starts the session loop.
    ///
    /// # Errors
    ///
    /// Returns the channel's error if the subscription fails.
    pub async fn start(
        self,
        lifecycle: watch::Receiver<LifecycleSignal>,
    ) -> Result<TrackingSessionHandle, ChannelError> {
        let subscription = self.channel.subscribe(&self.session_id).await?;
        let cancellation = CancellationToken::new();
        let session_id = self.session_id.clone();

        info!(session = %session_id, provider = self.gateway.provider_name(), "Tracking session started");

        let state = SessionState::new(self);
        let task = tokio::spawn(run_session(
            state,
            subscription,
            lifecycle,
            cancellation.clone(),
        ));

        Ok(TrackingSessionHandle {
            session_id,
            cancellation,
            task: Some(task),
        })
    }
}

/// Handle to a running session.
///
/// Dropping the handle cancels the session; [`shutdown`](Self::shutdown)
/// also waits for teardown to finish.
pub struct TrackingSessionHandle {
    session_id: String,
    cancellation: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl TrackingSessionHandle {
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Whether the session loop has exited.
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, |task| task.is_finished())
    }

    /// Stops the session and waits for its teardown. Safe to call repeatedly.
    pub async fn shutdown(&mut self) {
        self.cancellation.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(session = %self.session_id, error = %e, "Session task ended abnormally");
            }
        }
    }
}

impl Drop for TrackingSessionHandle {
    fn drop(&mut self) {
        self.cancellation.cancel();
    }
}

/// What happens to the active path while a new one resolves.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Reselect {
    /// The endpoints changed meaning (lifecycle); stop rendering now.
    ReplacePath,
    /// Same leg, new start (reroute); render the old path until replaced.
    KeepPath,
}

struct RouteCompletion {
    generation: u64,
    key: RouteKey,
    result: Result<RouteResolution, RouteError>,
}

struct SessionState<P: RouteProvider + 'static, C: FixChannel + 'static> {
    session_id: String,
    gateway: Arc<RouteGateway<P>>,
    surface: Arc<dyn RenderSurface>,
    channel: Arc<C>,
    observer: Arc<dyn SessionObserver>,
    snap: SnapEngine,
    animation_config: AnimationConfig,
    config: SessionConfig,

    router: PhaseRouter,
    signal: Option<LifecycleSignal>,
    agent_position: Option<Coordinate>,

    /// Active path and its key.
    path: Option<(RouteKey, Path)>,
    /// Most recent path successfully resolved, kept through failures.
    last_good: Option<(RouteKey, Path)>,
    progress: ProgressState,
    controller: Option<AnimationController>,
    held_fix: Option<Fix>,

    generation: u64,
    desired: Option<(u64, RouteKey)>,
    completions_tx: mpsc::UnboundedSender<RouteCompletion>,
    off_route_streak: u32,
}

impl<P: RouteProvider + 'static, C: FixChannel + 'static> SessionState<P, C> {
    fn new(session: TrackingSession<P, C>) -> (Self, mpsc::UnboundedReceiver<RouteCompletion>) {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        let key_precision = session.gateway.config().key_precision;
        let state = Self {
            session_id: session.session_id,
            gateway: session.gateway,
            surface: session.surface,
            channel: session.channel,
            observer: session.observer,
            snap: SnapEngine::new(session.config.snap),
            animation_config: session.config.animation,
            config: session.config.session,
            router: PhaseRouter::new(key_precision),
            signal: None,
            agent_position: None,
            path: None,
            last_good: None,
            progress: ProgressState::new(),
            controller: None,
            held_fix: None,
            generation: 0,
            desired: None,
            completions_tx,
            off_route_streak: 0,
        };
        (state, completions_rx)
    }

    fn known_points(&self, signal: &LifecycleSignal) -> KnownPoints {
        KnownPoints {
            journey_origin: signal.journey_origin,
            journey_destination: signal.journey_destination,
            journey_start: signal.journey_start,
            agent_position: self.agent_position,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Lifecycle and routing
    // ─────────────────────────────────────────────────────────────────────────

    fn on_lifecycle(&mut self, signal: LifecycleSignal) {
        debug!(session = %self.session_id, phase = %signal.phase, "Lifecycle update");
        self.signal = Some(signal);
        self.reselect(Reselect::ReplacePath);
    }

    /// Re-runs endpoint selection for the current signal.
    fn reselect(&mut self, mode: Reselect) {
        let Some(signal) = self.signal else { return };
        let known = self.known_points(&signal);

        match self.router.update(signal.phase, &known) {
            EndpointChange::Unchanged => {}
            EndpointChange::Changed(endpoints) => self.request_route(endpoints, mode),
            EndpointChange::Cleared => self.clear_route(),
        }
    }

    fn request_route(&mut self, endpoints: Endpoints, mode: Reselect) {
        self.generation += 1;
        let generation = self.generation;
        let key = self.gateway.key_for(&endpoints.origin, &endpoints.destination);
        self.desired = Some((generation, key));
        self.off_route_streak = 0;

        if mode == Reselect::ReplacePath {
            self.drop_path();
        }

        info!(
            session = %self.session_id,
            generation,
            key = %key,
            ?mode,
            "Requesting route"
        );

        let gateway = Arc::clone(&self.gateway);
        let completions = self.completions_tx.clone();
        tokio::spawn(async move {
            let result = gateway
                .resolve_route(endpoints.origin, endpoints.destination)
                .await;
            let _ = completions.send(RouteCompletion {
                generation,
                key,
                result,
            });
        });
    }

    fn clear_route(&mut self) {
        info!(session = %self.session_id, "Route cleared, rendering nothing");
        self.desired = None;
        self.held_fix = None;
        self.drop_path();
        self.surface.clear_path();
        self.observer.on_route_cleared();
    }

    fn on_route_completion(&mut self, done: RouteCompletion) {
        if self.desired != Some((done.generation, done.key)) {
            debug!(
                session = %self.session_id,
                generation = done.generation,
                key = %done.key,
                "Discarding stale route response"
            );
            return;
        }

        match done.result {
            Ok(RouteResolution::Resolved(path)) => self.install_path(done.key, path),
            Ok(RouteResolution::NoRouteNeeded) => {
                debug!(session = %self.session_id, "No route needed, rendering nothing");
                self.drop_path();
                self.surface.clear_path();
            }
            Err(error) => {
                warn!(session = %self.session_id, key = %done.key, error = %error, "Route unavailable");
                // Endpoints are selected afresh on the next attempt
                self.router.reset();

                let fallback = self
                    .last_good
                    .clone()
                    .filter(|(key, _)| *key == done.key);
                match (self.path.is_some(), fallback) {
                    (true, _) => {
                        debug!(session = %self.session_id, "Keeping current path");
                    }
                    (false, Some((key, path))) => self.install_path(key, path),
                    (false, None) => {
                        self.drop_path();
                        self.surface.clear_path();
                    }
                }
                self.observer.on_route_unavailable(&error);
            }
        }
    }

    fn install_path(&mut self, key: RouteKey, path: Path) {
        info!(
            session = %self.session_id,
            key = %key,
            points = path.len(),
            length_m = path.total_length() as u64,
            "Route active"
        );

        self.surface.draw_path(path.points());
        self.progress = match &self.controller {
            Some(controller) => {
                controller.update_polyline(path.clone());
                ProgressState::at(controller.state().last_committed_progress)
            }
            None => ProgressState::new(),
        };
        self.path = Some((key, path.clone()));
        self.last_good = Some((key, path.clone()));
        self.off_route_streak = 0;
        self.observer.on_route_changed(&path);

        // Without a marker, place one at the agent's last known position
        let fix = self.held_fix.take().or_else(|| {
            self.agent_position
                .filter(|_| self.controller.is_none())
                .map(Fix::new)
        });
        if let Some(fix) = fix {
            debug!(session = %self.session_id, "Applying held fix");
            self.apply_fix(fix);
        }
    }

    /// Forgets the active path and removes the marker. Nothing is rendered
    /// while there is no path.
    fn drop_path(&mut self) {
        if self.path.take().is_some() {
            self.surface.clear_path();
        }
        self.progress = ProgressState::new();
        self.off_route_streak = 0;
        self.destroy_controller();
    }

    fn destroy_controller(&mut self) {
        if let Some(mut controller) = self.controller.take() {
            controller.destroy();
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Fixes
    // ─────────────────────────────────────────────────────────────────────────

    fn on_message(&mut self, message: FixMessage) {
        let fix = match Fix::try_from(message) {
            Ok(fix) => fix,
            Err(e) => {
                debug!(session = %self.session_id, error = %e, "Dropping invalid fix");
                self.observer
                    .on_fix_rejected(&SnapRejection::InvalidFix(e));
                return;
            }
        };

        self.agent_position = Some(fix.coordinate);

        // A travelling phase may have been waiting for the agent's position
        let travelling = self.signal.map_or(false, |s| s.phase.is_travelling());
        if travelling && self.router.current().is_none() {
            self.reselect(Reselect::KeepPath);
        }

        self.apply_fix(fix);
    }

    fn apply_fix(&mut self, fix: Fix) {
        let path = self.path.as_ref().map(|(_, path)| path);
        let result = match self.snap.snap(&fix, path, Some(&self.progress)) {
            Ok(result) => result,
            Err(SnapRejection::NoPath) => {
                debug!(session = %self.session_id, "No path yet, holding fix");
                self.held_fix = Some(fix);
                self.observer.on_fix_rejected(&SnapRejection::NoPath);
                return;
            }
            Err(rejection) => {
                self.observer.on_fix_rejected(&rejection);
                return;
            }
        };

        self.progress.commit(result.progress);
        if let Some(controller) = &self.controller {
            controller.update_target(result.progress, result.heading);
        } else if let Some((_, path)) = &self.path {
            let controller = AnimationController::create_at(
                Arc::clone(&self.surface),
                path.clone(),
                result.progress,
                result.heading,
                self.animation_config.clone(),
            );
            self.controller = Some(controller);
        }
        self.observer.on_progress(&result);
        self.check_off_route(result.offset_meters);
    }

    fn check_off_route(&mut self, offset_m: f64) {
        let travelling = self.signal.map_or(false, |s| s.phase.is_travelling());
        if !travelling || self.config.off_route_fixes == 0 {
            return;
        }

        if offset_m <= self.config.off_route_threshold_m {
            self.off_route_streak = 0;
            return;
        }

        self.off_route_streak += 1;
        debug!(
            session = %self.session_id,
            offset_m,
            streak = self.off_route_streak,
            "Fix off route"
        );
        if self.off_route_streak >= self.config.off_route_fixes {
            info!(session = %self.session_id, offset_m, "Agent left the route, rerouting");
            self.off_route_streak = 0;
            self.reselect(Reselect::KeepPath);
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Resync and teardown
    // ─────────────────────────────────────────────────────────────────────────

    async fn resync(&self) {
        debug!(session = %self.session_id, "Requesting current position");
        if let Err(e) = self.channel.request_current_position(&self.session_id).await {
            warn!(session = %self.session_id, error = %e, "Resync request failed");
        }
        self.observer.on_resync_requested();
    }

    fn teardown(&mut self, subscription: FixSubscription) {
        subscription.unsubscribe();
        self.drop_path();
        self.surface.clear_path();
        info!(session = %self.session_id, "Tracking session stopped");
    }
}

async fn run_session<P: RouteProvider + 'static, C: FixChannel + 'static>(
    (mut state, mut completions): (SessionState<P, C>, mpsc::UnboundedReceiver<RouteCompletion>),
    mut subscription: FixSubscription,
    mut lifecycle: watch::Receiver<LifecycleSignal>,
    cancellation: CancellationToken,
) {
    let stale_timeout = state.config.stale_fix_timeout;
    let stale = sleep_until(Instant::now() + stale_timeout);
    tokio::pin!(stale);

    let initial = *lifecycle.borrow_and_update();
    state.on_lifecycle(initial);
    state.resync().await;

    let mut fixes_open = true;
    let mut lifecycle_open = true;

    loop {
        tokio::select! {
            biased;

            _ = cancellation.cancelled() => break,

            changed = lifecycle.changed(), if lifecycle_open => {
                if changed.is_err() {
                    debug!(session = %state.session_id, "Lifecycle sender dropped");
                    lifecycle_open = false;
                    continue;
                }
                let signal = *lifecycle.borrow_and_update();
                state.on_lifecycle(signal);
            }

            Some(done) = completions.recv() => state.on_route_completion(done),

            message = subscription.recv(), if fixes_open => match message {
                Some(message) => {
                    stale.as_mut().reset(Instant::now() + stale_timeout);
                    state.on_message(message);
                }
                None => {
                    info!(session = %state.session_id, "Fix channel ended");
                    fixes_open = false;
                }
            },

            _ = &mut stale => {
                state.resync().await;
                stale.as_mut().reset(Instant::now() + stale_timeout);
            }
        }
    }

    state.teardown(subscription);
}
