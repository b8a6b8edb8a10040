//! Geometry utilities for route-constrained tracking.
//!
//! Pure functions over [`Coordinate`]s: great-circle distance and bearing,
//! projection of a point onto a segment or a whole path, and path length
//! prefix sums. Nothing here performs I/O or holds state.
//!
//! Projection is done in a local equirectangular frame (longitude scaled by
//! the cosine of the segment's mean latitude). At city scale the error is
//! far below GPS noise, and the projected point is always an interpolation
//! of the segment's endpoints, so it never leaves the segment.

mod path;
mod polyline;

pub use path::{Path, PathError};
pub use polyline::{decode_polyline, PolylineError};

use crate::coord::Coordinate;

/// Mean Earth radius in metres (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Great-circle distance in metres using the haversine formula.
pub fn distance(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    // Clamp guards asin against rounding just above 1.0 for antipodal points
    2.0 * EARTH_RADIUS_M * h.sqrt().min(1.0).asin()
}

/// Initial great-circle bearing from `a` to `b`.
///
/// Returns degrees in [0, 360), where 0 = North, 90 = East.
pub fn bearing(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let x = dlon.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_degrees(x.atan2(y).to_degrees())
}

/// Wraps an angle into [0, 360).
pub fn normalize_degrees(degrees: f64) -> f64 {
    let d = degrees.rem_euclid(360.0);
    // rem_euclid can return exactly 360.0 for tiny negative inputs
    if d >= 360.0 {
        0.0
    } else {
        d
    }
}

/// Linear interpolation between two coordinates.
pub fn interpolate(a: &Coordinate, b: &Coordinate, fraction: f64) -> Coordinate {
    Coordinate {
        latitude: a.latitude + (b.latitude - a.latitude) * fraction,
        longitude: a.longitude + (b.longitude - a.longitude) * fraction,
    }
}

/// Result of projecting a point onto one segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProjection {
    /// Closest point on the segment.
    pub point: Coordinate,
    /// Position of `point` along the segment, in [0, 1].
    pub fraction: f64,
}

/// Projects `p` onto the segment `start..end`.
///
/// The fraction is clamped to [0, 1], so the result never lies outside the
/// segment. A zero-length segment projects to its start.
pub fn nearest_point_on_segment(
    p: &Coordinate,
    start: &Coordinate,
    end: &Coordinate,
) -> SegmentProjection {
    let mean_lat = ((start.latitude + end.latitude) / 2.0).to_radians();
    let kx = mean_lat.cos();

    let dx = (end.longitude - start.longitude) * kx;
    let dy = end.latitude - start.latitude;
    let len_sq = dx * dx + dy * dy;

    if len_sq <= f64::EPSILON * f64::EPSILON {
        return SegmentProjection {
            point: *start,
            fraction: 0.0,
        };
    }

    let px = (p.longitude - start.longitude) * kx;
    let py = p.latitude - start.latitude;
    let fraction = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);

    SegmentProjection {
        point: interpolate(start, end, fraction),
        fraction,
    }
}

/// Result of projecting a point onto a whole path.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PathProjection {
    /// Closest point on the path.
    pub point: Coordinate,
    /// Index of the segment (`points[i]..points[i + 1]`) containing `point`.
    pub segment_index: usize,
    /// Position of `point` along that segment, in [0, 1].
    pub fraction: f64,
    /// Distance from the input point to `point`, in metres.
    pub distance: f64,
}

/// Projects `p` onto every segment of `points` and returns the closest.
///
/// Ties keep the earliest segment. Returns `None` for fewer than two points.
pub fn nearest_point_on_path(p: &Coordinate, points: &[Coordinate]) -> Option<PathProjection> {
    project_segments(p, points).min_by(|a, b| a.distance.total_cmp(&b.distance))
}

/// Projects `p` onto each segment of `points`, in path order.
pub fn project_segments<'a>(
    p: &'a Coordinate,
    points: &'a [Coordinate],
) -> impl Iterator<Item = PathProjection> + 'a {
    points.windows(2).enumerate().map(move |(i, seg)| {
        let proj = nearest_point_on_segment(p, &seg[0], &seg[1]);
        PathProjection {
            point: proj.point,
            segment_index: i,
            fraction: proj.fraction,
            distance: distance(p, &proj.point),
        }
    })
}

/// Total length of a polyline in metres.
pub fn path_length(points: &[Coordinate]) -> f64 {
    points.windows(2).map(|w| distance(&w[0], &w[1])).sum()
}

/// Prefix sums of segment lengths.
///
/// The result has the same length as `points`; element `i` is the distance
/// along the path from the first point to `points[i]`.
pub fn cumulative_lengths(points: &[Coordinate]) -> Vec<f64> {
    let mut out = Vec::with_capacity(points.len());
    let mut total = 0.0;
    if !points.is_empty() {
        out.push(0.0);
    }
    for w in points.windows(2) {
        total += distance(&w[0], &w[1]);
        out.push(total);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_distance_one_degree_longitude_at_equator() {
        let d = distance(&c(0.0, 0.0), &c(0.0, 1.0));
        assert!((d - 111_195.0).abs() < 10.0, "got {}", d);
    }

    #[test]
    fn test_distance_is_symmetric_and_zero_on_self() {
        let a = c(12.9716, 77.5946);
        let b = c(12.9352, 77.6245);
        assert!((distance(&a, &b) - distance(&b, &a)).abs() < 1e-9);
        assert_eq!(distance(&a, &a), 0.0);
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let o = c(0.0, 0.0);
        assert!((bearing(&o, &c(1.0, 0.0)) - 0.0).abs() < 0.1);
        assert!((bearing(&o, &c(0.0, 1.0)) - 90.0).abs() < 0.1);
        assert!((bearing(&o, &c(-1.0, 0.0)) - 180.0).abs() < 0.1);
        assert!((bearing(&o, &c(0.0, -1.0)) - 270.0).abs() < 0.1);
    }

    #[test]
    fn test_normalize_degrees() {
        assert_eq!(normalize_degrees(370.0), 10.0);
        assert_eq!(normalize_degrees(-10.0), 350.0);
        assert_eq!(normalize_degrees(360.0), 0.0);
    }

    #[test]
    fn test_segment_projection_interior() {
        let proj = nearest_point_on_segment(&c(0.001, 0.005), &c(0.0, 0.0), &c(0.0, 0.01));
        assert!((proj.fraction - 0.5).abs() < 1e-9);
        assert!(proj.point.latitude.abs() < 1e-12);
        assert!((proj.point.longitude - 0.005).abs() < 1e-12);
    }

    #[test]
    fn test_segment_projection_clamped() {
        let before = nearest_point_on_segment(&c(0.0, -0.01), &c(0.0, 0.0), &c(0.0, 0.01));
        assert_eq!(before.fraction, 0.0);
        assert_eq!(before.point, c(0.0, 0.0));

        let after = nearest_point_on_segment(&c(0.0, 0.05), &c(0.0, 0.0), &c(0.0, 0.01));
        assert_eq!(after.fraction, 1.0);
        assert_eq!(after.point, c(0.0, 0.01));
    }

    #[test]
    fn test_segment_projection_degenerate() {
        let p = c(1.0, 1.0);
        let proj = nearest_point_on_segment(&c(2.0, 2.0), &p, &p);
        assert_eq!(proj.fraction, 0.0);
        assert_eq!(proj.point, p);
    }

    #[test]
    fn test_path_projection_picks_global_minimum() {
        // L-shaped path: east then north
        let points = [c(0.0, 0.0), c(0.0, 0.01), c(0.01, 0.01)];
        let proj = nearest_point_on_path(&c(0.005, 0.0101), &points).unwrap();
        assert_eq!(proj.segment_index, 1);
        assert!((proj.fraction - 0.5).abs() < 1e-6);
        assert!(proj.distance < 15.0);
    }

    #[test]
    fn test_path_projection_needs_two_points() {
        assert!(nearest_point_on_path(&c(0.0, 0.0), &[c(0.0, 0.0)]).is_none());
        assert!(nearest_point_on_path(&c(0.0, 0.0), &[]).is_none());
    }

    #[test]
    fn test_cumulative_lengths() {
        let points = [c(0.0, 0.0), c(0.0, 0.004), c(0.0, 0.01)];
        let cum = cumulative_lengths(&points);
        assert_eq!(cum.len(), 3);
        assert_eq!(cum[0], 0.0);
        assert!((cum[2] - path_length(&points)).abs() < 1e-9);
        assert!((cum[1] / cum[2] - 0.4).abs() < 1e-6);
    }

    #[test]
    fn test_cumulative_lengths_empty() {
        assert!(cumulative_lengths(&[]).is_empty());
        assert_eq!(path_length(&[]), 0.0);
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        fn coord() -> impl Strategy<Value = Coordinate> {
            (-80.0..80.0_f64, -179.0..179.0_f64).prop_map(|(lat, lon)| c(lat, lon))
        }

        fn nearby(origin: Coordinate) -> impl Strategy<Value = Coordinate> {
            (-0.05..0.05_f64, -0.05..0.05_f64)
                .prop_map(move |(dlat, dlon)| c(origin.latitude + dlat, origin.longitude + dlon))
        }

        proptest! {
            #[test]
            fn test_projection_stays_on_segment(
                (start, end, p) in coord().prop_flat_map(|o| (Just(o), nearby(o), nearby(o))),
            ) {
                let proj = nearest_point_on_segment(&p, &start, &end);
                prop_assert!((0.0..=1.0).contains(&proj.fraction));

                let eps = 1e-9;
                let (lat_lo, lat_hi) = (start.latitude.min(end.latitude), start.latitude.max(end.latitude));
                let (lon_lo, lon_hi) = (start.longitude.min(end.longitude), start.longitude.max(end.longitude));
                prop_assert!(proj.point.latitude >= lat_lo - eps && proj.point.latitude <= lat_hi + eps);
                prop_assert!(proj.point.longitude >= lon_lo - eps && proj.point.longitude <= lon_hi + eps);
            }

            #[test]
            fn test_cumulative_lengths_monotonic(
                points in coord().prop_flat_map(|o| prop::collection::vec(nearby(o), 0..12)),
            ) {
                let cum = cumulative_lengths(&points);
                prop_assert_eq!(cum.len(), points.len());
                prop_assert!(cum.windows(2).all(|w| w[1] >= w[0]));
                if let Some(last) = cum.last() {
                    prop_assert!((last - path_length(&points)).abs() < 1e-6);
                }
            }

            #[test]
            fn test_distance_symmetric(a in coord(), b in coord()) {
                let ab = distance(&a, &b);
                prop_assert!(ab >= 0.0);
                prop_assert!((ab - distance(&b, &a)).abs() < 1e-6);
            }
        }
    }
}
