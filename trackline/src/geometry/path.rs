//! Immutable travel path with precomputed length prefix sums.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::{
    bearing, cumulative_lengths, interpolate, nearest_point_on_path, project_segments,
    PathProjection,
};
use crate::coord::{CoordError, Coordinate};

/// Errors building a [`Path`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PathError {
    /// A path needs at least a start and an end.
    #[error("Path needs at least 2 points, got {0}")]
    TooFewPoints(usize),

    /// One of the points failed validation.
    #[error("Invalid point at index {index}: {source}")]
    InvalidPoint {
        index: usize,
        #[source]
        source: CoordError,
    },
}

struct PathInner {
    points: Vec<Coordinate>,
    cumulative: Vec<f64>,
}

/// An ordered route of at least two coordinates.
///
/// Paths are immutable and cheap to clone (the points are shared). A route
/// change replaces the whole `Path`; nothing mutates one in place.
#[derive(Clone)]
pub struct Path {
    inner: Arc<PathInner>,
}

impl Path {
    /// Builds a path, validating every point.
    pub fn new(points: Vec<Coordinate>) -> Result<Self, PathError> {
        if points.len() < 2 {
            return Err(PathError::TooFewPoints(points.len()));
        }
        for (index, point) in points.iter().enumerate() {
            point
                .validate()
                .map_err(|source| PathError::InvalidPoint { index, source })?;
        }

        let cumulative = cumulative_lengths(&points);
        Ok(Self {
            inner: Arc::new(PathInner { points, cumulative }),
        })
    }

    /// The path's points in traversal order.
    pub fn points(&self) -> &[Coordinate] {
        &self.inner.points
    }

    /// Number of points (always >= 2).
    pub fn len(&self) -> usize {
        self.inner.points.len()
    }

    /// Always false; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.inner.points.len() - 1
    }

    pub fn first(&self) -> Coordinate {
        self.inner.points[0]
    }

    pub fn last(&self) -> Coordinate {
        self.inner.points[self.inner.points.len() - 1]
    }

    /// Total length in metres.
    pub fn total_length(&self) -> f64 {
        self.inner.cumulative[self.inner.cumulative.len() - 1]
    }

    /// Distance from the first point to each point, in metres.
    pub fn cumulative_lengths(&self) -> &[f64] {
        &self.inner.cumulative
    }

    /// Length of segment `index` in metres.
    pub fn segment_length(&self, index: usize) -> f64 {
        let i = index.min(self.segment_count() - 1);
        self.inner.cumulative[i + 1] - self.inner.cumulative[i]
    }

    /// Converts a segment-local position into a path-global progress in [0, 1].
    ///
    /// A zero-length path reports progress 0.
    pub fn progress_of(&self, segment_index: usize, fraction: f64) -> f64 {
        let total = self.total_length();
        if total <= 0.0 {
            return 0.0;
        }
        let i = segment_index.min(self.segment_count() - 1);
        let along = self.inner.cumulative[i] + fraction.clamp(0.0, 1.0) * self.segment_length(i);
        (along / total).clamp(0.0, 1.0)
    }

    /// Converts a progress value back into a coordinate on the path.
    ///
    /// Returns the point and the index of the segment it lies on.
    pub fn locate(&self, progress: f64) -> (Coordinate, usize) {
        let total = self.total_length();
        if total <= 0.0 || !progress.is_finite() {
            return (self.first(), 0);
        }

        let target = progress.clamp(0.0, 1.0) * total;
        let cum = &self.inner.cumulative;
        // First index whose cumulative length exceeds the target, minus one
        let upper = cum.partition_point(|&c| c <= target);
        let i = upper.saturating_sub(1).min(self.segment_count() - 1);

        let seg_len = cum[i + 1] - cum[i];
        let fraction = if seg_len > 0.0 {
            ((target - cum[i]) / seg_len).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let points = &self.inner.points;
        (interpolate(&points[i], &points[i + 1], fraction), i)
    }

    /// Direction of travel along segment `index`, in degrees.
    ///
    /// Zero-length segments borrow the bearing of the nearest segment that
    /// has length; a path with no length at all faces north.
    pub fn heading_at(&self, index: usize) -> f64 {
        let points = &self.inner.points;
        let n = self.segment_count();
        let i = index.min(n - 1);

        let usable = |j: usize| points[j] != points[j + 1];
        let j = (i..n)
            .find(|&j| usable(j))
            .or_else(|| (0..i).rev().find(|&j| usable(j)));

        match j {
            Some(j) => bearing(&points[j], &points[j + 1]),
            None => 0.0,
        }
    }

    /// Closest point on the path to `p`.
    pub fn project(&self, p: &Coordinate) -> PathProjection {
        // A Path always has at least one segment
        nearest_point_on_path(p, self.points()).unwrap_or(PathProjection {
            point: self.first(),
            segment_index: 0,
            fraction: 0.0,
            distance: super::distance(p, &self.first()),
        })
    }

    /// Projections of `p` onto every segment, in path order.
    pub fn project_all(&self, p: &Coordinate) -> Vec<PathProjection> {
        project_segments(p, self.points()).collect()
    }
}

impl PartialEq for Path {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.inner.points == other.inner.points
    }
}

impl fmt::Debug for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Path")
            .field("points", &self.inner.points.len())
            .field("length_m", &self.total_length())
            .field("first", &self.first())
            .field("last", &self.last())
            .finish()
    }
}
