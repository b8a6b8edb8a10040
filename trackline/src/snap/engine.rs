//! Fix-to-path projection and progress computation.

use thiserror::Error;
use tracing::debug;

use super::config::SnapConfig;
use super::progress::ProgressState;
use crate::coord::{CoordError, Coordinate, Fix};
use crate::geometry::{normalize_degrees, Path, PathProjection};

/// How the progress of a [`SnapResult`] was decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapDecision {
    /// Progress moved forward (or stayed level).
    Advanced,
    /// Small backward movement, treated as noise and held.
    HeldNoise,
    /// Backward movement beyond the tolerance, rejected and held.
    HeldBacktrack,
}

/// Why a fix could not be snapped.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SnapRejection {
    /// There is no active path to snap against.
    #[error("No active path")]
    NoPath,

    /// The fix coordinate is not usable.
    #[error("Invalid fix: {0}")]
    InvalidFix(#[source] CoordError),
}

/// A fix placed on the active path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SnapResult {
    /// Where the marker should be drawn.
    pub snapped_coordinate: Coordinate,
    /// Segment containing `snapped_coordinate`.
    pub segment_index: usize,
    /// Position along that segment, in [0, 1].
    pub fraction_along_segment: f64,
    /// Normalised distance along the path, in [0, 1].
    pub progress: f64,
    /// Direction of travel in degrees [0, 360).
    pub heading: f64,
    /// Distance from the fix to the path at its projection, in metres.
    pub offset_meters: f64,
    pub decision: SnapDecision,
}

/// Projects fixes onto paths.
#[derive(Debug, Clone, Default)]
pub struct SnapEngine {
    config: SnapConfig,
}

impl SnapEngine {
    pub fn new(config: SnapConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SnapConfig {
        &self.config
    }

    /// Snaps `fix` onto `path`.
    ///
    /// `previous` carries the committed high-water mark for this path; the
    /// caller commits the returned progress. Without `previous` every fix
    /// is [`SnapDecision::Advanced`].
    ///
    /// # Errors
    ///
    /// - [`SnapRejection::NoPath`] when `path` is `None`; the caller must not
    ///   fall back to drawing the raw fix
    /// - [`SnapRejection::InvalidFix`] for a non-finite or out-of-range fix
    pub fn snap(
        &self,
        fix: &Fix,
        path: Option<&Path>,
        previous: Option<&ProgressState>,
    ) -> Result<SnapResult, SnapRejection> {
        let path = path.ok_or(SnapRejection::NoPath)?;
        if let Err(e) = fix.validate() {
            debug!(error = %e, "Dropping invalid fix");
            return Err(SnapRejection::InvalidFix(e));
        }

        let reference = fix
            .progress_hint
            .or_else(|| previous.map(|p| p.last_committed()));
        let projection = self.choose_projection(path, &fix.coordinate, reference);
        let raw_progress = path.progress_of(projection.segment_index, projection.fraction);

        let (decision, progress) = match previous {
            None => (SnapDecision::Advanced, raw_progress),
            Some(state) => {
                let committed = state.last_committed();
                let delta = raw_progress - committed;
                if delta >= 0.0 {
                    (SnapDecision::Advanced, raw_progress)
                } else if delta >= -self.config.backtrack_tolerance {
                    (SnapDecision::HeldNoise, committed)
                } else {
                    (SnapDecision::HeldBacktrack, committed)
                }
            }
        };

        let (snapped_coordinate, segment_index, fraction_along_segment) =
            if decision == SnapDecision::Advanced {
                (projection.point, projection.segment_index, projection.fraction)
            } else {
                position_at(path, progress)
            };

        let heading = match fix.heading.filter(|h| h.is_finite()) {
            Some(h) => normalize_degrees(h),
            None => path.heading_at(segment_index),
        };

        debug!(
            progress,
            raw_progress,
            offset_m = projection.distance,
            decision = ?decision,
            "Fix snapped"
        );

        Ok(SnapResult {
            snapped_coordinate,
            segment_index,
            fraction_along_segment,
            progress,
            heading,
            offset_meters: projection.distance,
            decision,
        })
    }

    /// Nearest projection, disambiguated between overlapping stretches of
    /// the path by closeness to `reference` progress.
    fn choose_projection(
        &self,
        path: &Path,
        point: &Coordinate,
        reference: Option<f64>,
    ) -> PathProjection {
        let tolerance = self.config.overlap_tolerance_m;
        let best = path.project(point);

        let reference = match reference {
            Some(r) if tolerance > 0.0 && r.is_finite() => r,
            _ => return best,
        };

        let along = |p: &PathProjection| {
            path.cumulative_lengths()[p.segment_index] + p.fraction * path.segment_length(p.segment_index)
        };
        let best_along = along(&best);

        let candidates = path.project_all(point);
        let alternatives = candidates.iter().copied().filter(|c| {
            c.distance <= best.distance + tolerance && (along(c) - best_along).abs() > tolerance
        });

        std::iter::once(best)
            .chain(alternatives)
            .min_by(|a, b| {
                let da = (path.progress_of(a.segment_index, a.fraction) - reference).abs();
                let db = (path.progress_of(b.segment_index, b.fraction) - reference).abs();
                da.total_cmp(&db)
            })
            .unwrap_or(best)
    }
}

/// Point, segment and segment fraction at `progress` along `path`.
fn position_at(path: &Path, progress: f64) -> (Coordinate, usize, f64) {
    let (point, segment) = path.locate(progress);
    let seg_len = path.segment_length(segment);
    let fraction = if seg_len > 0.0 {
        let along = progress * path.total_length() - path.cumulative_lengths()[segment];
        (along / seg_len).clamp(0.0, 1.0)
    } else {
        0.0
    };
    (point, segment, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn three_point() -> Path {
        Path::new(vec![c(0.0, 0.0), c(0.0, 0.004), c(0.0, 0.01)]).unwrap()
    }

    #[test]
    fn test_no_path_is_rejected() {
        let engine = SnapEngine::default();
        let result = engine.snap(&Fix::new(c(0.0, 0.0)), None, None);
        assert_eq!(result, Err(SnapRejection::NoPath));
    }

    #[test]
    fn test_invalid_fix_is_rejected() {
        let engine = SnapEngine::default();
        let fix = Fix::new(Coordinate {
            latitude: f64::INFINITY,
            longitude: 0.0,
        });
        let result = engine.snap(&fix, Some(&three_point()), None);
        assert!(matches!(result, Err(SnapRejection::InvalidFix(_))));
    }

    #[test]
    fn test_progress_example_then_noise_holds() {
        let engine = SnapEngine::default();
        let path = three_point();
        let mut state = ProgressState::new();

        let first = engine
            .snap(&Fix::new(c(0.00005, 0.0041)), Some(&path), Some(&state))
            .unwrap();
        assert_eq!(first.segment_index, 1);
        assert!((first.progress - 0.41).abs() < 1e-3, "got {}", first.progress);
        assert_eq!(first.decision, SnapDecision::Advanced);
        assert!(first.snapped_coordinate.latitude.abs() < 1e-12);
        assert!((first.offset_meters - 5.56).abs() < 0.05);
        state.commit(first.progress);

        let second = engine
            .snap(&Fix::new(c(0.00005, 0.0039)), Some(&path), Some(&state))
            .unwrap();
        assert_eq!(second.decision, SnapDecision::HeldNoise);
        assert!((second.progress - 0.41).abs() < 1e-3);
        assert!((second.snapped_coordinate.longitude - 0.0041).abs() < 1e-9);
        assert_eq!(second.segment_index, 1);
    }

    #[test]
    fn test_large_backtrack_is_held() {
        let engine = SnapEngine::default();
        let path = three_point();
        let state = ProgressState::at(0.5);

        let result = engine
            .snap(&Fix::new(c(0.0, 0.002)), Some(&path), Some(&state))
            .unwrap();
        assert_eq!(result.decision, SnapDecision::HeldBacktrack);
        assert_eq!(result.progress, 0.5);
        assert!((result.snapped_coordinate.longitude - 0.005).abs() < 1e-9);
        assert!((result.fraction_along_segment - 1.0 / 6.0).abs() < 1e-6);
    }

    #[test]
    fn test_heading_from_fix_or_tangent() {
        let engine = SnapEngine::default();
        let path = three_point();

        let tangent = engine
            .snap(&Fix::new(c(0.0, 0.005)), Some(&path), None)
            .unwrap();
        assert!((tangent.heading - 90.0).abs() < 0.01);

        let reported = engine
            .snap(
                &Fix::new(c(0.0, 0.005)).with_heading(-45.0),
                Some(&path),
                None,
            )
            .unwrap();
        assert!((reported.heading - 315.0).abs() < 1e-9);
    }

    #[test]
    fn test_overlapping_path_prefers_reference_progress() {
        let engine = SnapEngine::default();
        // Out and back along the same road, the return lane a few metres north
        let path = Path::new(vec![c(0.0, 0.0), c(0.0, 0.01), c(0.00003, 0.0)]).unwrap();
        let fix = Fix::new(c(0.00001, 0.003));

        let outbound = engine.snap(&fix, Some(&path), None).unwrap();
        assert_eq!(outbound.segment_index, 0);
        assert!((outbound.progress - 0.15).abs() < 1e-3);

        let hinted = engine
            .snap(&fix.with_progress_hint(0.8), Some(&path), None)
            .unwrap();
        assert_eq!(hinted.segment_index, 1);
        assert!((hinted.progress - 0.85).abs() < 1e-3);

        let state = ProgressState::at(0.7);
        let returning = engine.snap(&fix, Some(&path), Some(&state)).unwrap();
        assert_eq!(returning.segment_index, 1);
        assert_eq!(returning.decision, SnapDecision::Advanced);
    }

    #[test]
    fn test_adjacent_segments_near_vertex_are_not_alternatives() {
        let engine = SnapEngine::default();
        let path = three_point();
        let state = ProgressState::at(0.1);
        // Just past the vertex at 0.4
        let result = engine
            .snap(&Fix::new(c(0.0, 0.00401)), Some(&path), Some(&state))
            .unwrap();
        assert_eq!(result.segment_index, 1);
        assert!(result.progress > 0.4);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn path_strategy() -> impl Strategy<Value = Path> {
            (
                -60.0..60.0_f64,
                -170.0..170.0_f64,
                prop::collection::vec((-0.01..0.01_f64, -0.01..0.01_f64), 2..8),
            )
                .prop_map(|(lat, lon, offsets)| {
                    let points = offsets
                        .into_iter()
                        .map(|(dlat, dlon)| c(lat + dlat, lon + dlon))
                        .collect();
                    Path::new(points).unwrap()
                })
        }

        proptest! {
            #[test]
            fn test_snap_never_leaves_path(
                path in path_strategy(),
                dlat in -0.02..0.02_f64,
                dlon in -0.02..0.02_f64,
                committed in 0.0..1.0_f64,
            ) {
                let engine = SnapEngine::default();
                let first = path.first();
                let fix = Fix::new(c(first.latitude + dlat, first.longitude + dlon));
                let state = ProgressState::at(committed);

                let result = engine.snap(&fix, Some(&path), Some(&state)).unwrap();
                let back = path.project(&result.snapped_coordinate);
                prop_assert!(
                    back.distance < 0.01,
                    "snapped point {} is {} m off the path",
                    result.snapped_coordinate, back.distance
                );
                prop_assert!((0.0..=1.0).contains(&result.progress));
            }

            #[test]
            fn test_progress_is_monotonic(
                path in path_strategy(),
                jitter in prop::collection::vec((-0.015..0.015_f64, -0.015..0.015_f64), 1..30),
            ) {
                let engine = SnapEngine::default();
                let first = path.first();
                let mut state = ProgressState::new();
                let mut last = 0.0;

                for (dlat, dlon) in jitter {
                    let fix = Fix::new(c(first.latitude + dlat, first.longitude + dlon));
                    let result = engine.snap(&fix, Some(&path), Some(&state)).unwrap();
                    prop_assert!(result.progress >= last, "{} < {}", result.progress, last);
                    last = state.commit(result.progress);
                }
            }

            #[test]
            fn test_noise_within_tolerance_holds(
                progress in 0.1..0.9_f64,
                back in 0.0001..0.049_f64,
            ) {
                let engine = SnapEngine::default();
                let path = Path::new(vec![c(0.0, 0.0), c(0.0, 0.01)]).unwrap();
                let state = ProgressState::at(progress);
                let fix = Fix::new(c(0.0, (progress - back) * 0.01));

                let result = engine.snap(&fix, Some(&path), Some(&state)).unwrap();
                prop_assert_eq!(result.decision, SnapDecision::HeldNoise);
                prop_assert_eq!(result.progress, progress);
            }
        }
    }
}
