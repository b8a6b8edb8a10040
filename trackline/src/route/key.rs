//! Rounded endpoint pairs used as cache and throttle keys.

use std::fmt;

use crate::coord::Coordinate;

/// An (origin, destination) pair rounded to a fixed number of decimals.
///
/// Two requests whose endpoints differ by less than the rounding step map to
/// the same key and therefore share a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RouteKey {
    origin: (i64, i64),
    destination: (i64, i64),
    precision: u32,
}

impl RouteKey {
    /// Rounds both endpoints to `precision` decimal places.
    pub fn new(origin: &Coordinate, destination: &Coordinate, precision: u32) -> Self {
        Self {
            origin: origin.rounded(precision),
            destination: destination.rounded(precision),
            precision,
        }
    }

    pub fn precision(&self) -> u32 {
        self.precision
    }
}

impl fmt::Display for RouteKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scale = 10f64.powi(self.precision as i32);
        let p = self.precision as usize;
        write!(
            f,
            "{:.p$},{:.p$}->{:.p$},{:.p$}",
            self.origin.0 as f64 / scale,
            self.origin.1 as f64 / scale,
            self.destination.0 as f64 / scale,
            self.destination.1 as f64 / scale,
        )
    }
}
