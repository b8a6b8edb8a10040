//! `trackline replay`: run a recorded fix log through a tracking session.
//!
//! The fix log is JSON lines, one position message per line:
//!
//! ```text
//! {"latitude": 12.9716, "longitude": 77.5946, "heading": 80.0}
//! {"lat": 12.9718, "lng": 77.5951}
//! ```
//!
//! Blank lines and lines starting with `#` are skipped.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{info, warn};
use trackline::coord::{Coordinate, FixMessage};
use trackline::geometry::Path as TravelPath;
use trackline::phase::Phase;
use trackline::route::RouteError;
use trackline::session::{LifecycleSignal, MemoryFixChannel, SessionObserver, TrackingSession};
use trackline::snap::{SnapRejection, SnapResult};

use super::common::{build_gateway, PhaseAt};
use crate::console::ConsoleSurface;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Inputs of a replay run.
#[derive(Debug, Clone)]
pub struct ReplayOptions {
    pub fixes: PathBuf,
    pub session_id: String,
    pub origin: Coordinate,
    pub destination: Coordinate,
    pub journey_start: Option<Coordinate>,
    pub phase: Phase,
    pub phase_at: Vec<PhaseAt>,
    pub interval: Duration,
}

/// Prints session events as they happen.
#[derive(Default)]
struct ReplayObserver {
    progress_updates: AtomicU64,
    rejected: AtomicU64,
    routes: AtomicU64,
    last_progress: AtomicU64,
}

impl ReplayObserver {
    fn last_progress(&self) -> f64 {
        f64::from_bits(self.last_progress.load(Ordering::Relaxed))
    }
}

impl SessionObserver for ReplayObserver {
    fn on_route_changed(&self, path: &TravelPath) {
        self.routes.fetch_add(1, Ordering::Relaxed);
        println!(
            "route   {} points, {:.0} m, {} -> {}",
            path.len(),
            path.total_length(),
            path.first(),
            path.last()
        );
    }

    fn on_route_cleared(&self) {
        println!("route   cleared");
    }

    fn on_progress(&self, result: &SnapResult) {
        self.progress_updates.fetch_add(1, Ordering::Relaxed);
        self.last_progress
            .store(result.progress.to_bits(), Ordering::Relaxed);
        println!(
            "snap    {:>5.1}%  heading {:>5.1}  offset {:>6.1} m  {:?}",
            result.progress * 100.0,
            result.heading,
            result.offset_meters,
            result.decision
        );
    }

    fn on_route_unavailable(&self, error: &RouteError) {
        println!("route   unavailable: {}", error);
    }

    fn on_fix_rejected(&self, rejection: &SnapRejection) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        println!("fix     held or dropped: {}", rejection);
    }
}

/// Parses a JSON-lines fix log.
pub fn load_fixes(path: &Path) -> Result<Vec<FixMessage>, CliError> {
    let content = std::fs::read_to_string(path).map_err(|error| CliError::FileRead {
        path: path.display().to_string(),
        error,
    })?;
    parse_fixes(&content)
}

fn parse_fixes(content: &str) -> Result<Vec<FixMessage>, CliError> {
    content
        .lines()
        .enumerate()
        .filter(|(_, line)| {
            let line = line.trim();
            !line.is_empty() && !line.starts_with('#')
        })
        .map(|(i, line)| {
            serde_json::from_str(line).map_err(|e| CliError::InvalidFix {
                line: i + 1,
                reason: e.to_string(),
            })
        })
        .collect()
}

/// Replays the fix log, then shuts the session down.
pub async fn run(runner: &CliRunner, options: ReplayOptions) -> Result<(), CliError> {
    let fixes = load_fixes(&options.fixes)?;
    if let Some(change) = options.phase_at.iter().find(|c| c.index >= fixes.len()) {
        return Err(CliError::InvalidArgument(format!(
            "--phase-at {} is past the last fix (log has {} fixes)",
            change.index,
            fixes.len()
        )));
    }

    let config = runner.config();
    let gateway = build_gateway(config)?;
    let surface = Arc::new(ConsoleSurface::new());
    let channel = Arc::new(MemoryFixChannel::with_capacity(
        config.tracking.session.channel_capacity,
    ));
    let observer = Arc::new(ReplayObserver::default());

    let mut signal = LifecycleSignal::new(options.phase, options.origin, options.destination);
    if let Some(start) = options.journey_start {
        signal = signal.with_journey_start(start);
    }
    let (lifecycle, lifecycle_rx) = watch::channel(signal);

    let mut handle = TrackingSession::new(
        options.session_id.clone(),
        gateway,
        surface.clone(),
        Arc::clone(&channel),
        config.tracking.clone(),
    )
    .with_observer(observer.clone())
    .start(lifecycle_rx)
    .await?;

    info!(
        session = %options.session_id,
        fixes = fixes.len(),
        interval_ms = options.interval.as_millis() as u64,
        "Replaying fix log"
    );

    let settle = config.tracking.animation.tween_duration;
    let replay = async {
        for (index, fix) in fixes.iter().enumerate() {
            for change in options.phase_at.iter().filter(|c| c.index == index) {
                println!("phase   {}", change.phase);
                signal = signal.with_phase(change.phase);
                lifecycle.send_replace(signal);
            }
            channel.publish(&options.session_id, *fix);
            tokio::time::sleep(options.interval).await;
        }
        // Let the last tween finish
        tokio::time::sleep(settle).await;
    };

    tokio::select! {
        _ = replay => {}
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                warn!(error = %e, "Failed to listen for Ctrl+C");
            }
            println!("Interrupted");
        }
    }

    handle.shutdown().await;

    println!();
    println!("Replay finished");
    println!("  Fixes published:  {}", fixes.len());
    println!("  Routes drawn:     {}", observer.routes.load(Ordering::Relaxed));
    println!(
        "  Progress updates: {}",
        observer.progress_updates.load(Ordering::Relaxed)
    );
    println!("  Held or dropped:  {}", observer.rejected.load(Ordering::Relaxed));
    println!("  Final progress:   {:.1}%", observer.last_progress() * 100.0);
    println!("  Marker moves:     {}", surface.moves());

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_fixes_skips_comments_and_blanks() {
        let content = r#"
# recorded 2024-05-01
{"latitude": 12.9716, "longitude": 77.5946, "heading": 80.0}

{"lat": 12.9718, "lng": 77.5951}
"#;
        let fixes = parse_fixes(content).unwrap();
        assert_eq!(fixes.len(), 2);
        assert_eq!(fixes[0].heading, Some(80.0));
        assert_eq!(fixes[1].latitude, 12.9718);
    }

    #[test]
    fn test_parse_fixes_reports_line() {
        let content = "{\"lat\": 1.0, \"lng\": 2.0}\nnot json\n";
        match parse_fixes(content) {
            Err(CliError::InvalidFix { line, .. }) => assert_eq!(line, 2),
            other => panic!("unexpected {:?}", other.map(|f| f.len())),
        }
    }

    #[test]
    fn test_load_missing_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        assert!(matches!(
            load_fixes(&temp_dir.path().join("missing.jsonl")),
            Err(CliError::FileRead { .. })
        ));
    }
}
