//! Geographic coordinate and position-fix types.
//!
//! Every coordinate that enters the tracking core is validated here first:
//! values that are not finite or fall outside the WGS84 ranges are rejected
//! before any geometry runs on them.

mod fix;
mod types;

pub use fix::{Fix, FixMessage};
pub use types::{Coordinate, CoordError, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};
