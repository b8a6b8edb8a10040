//! Encoded polyline decoding.
//!
//! Routing providers return route geometry in the encoded polyline format:
//! each coordinate is the delta from the previous one, scaled by
//! `10^precision`, zig-zag encoded and split into 5-bit chunks offset by 63.
//! Google Directions and OSRM's `polyline` geometry use precision 5, OSRM's
//! `polyline6` uses precision 6.

use thiserror::Error;

use crate::coord::Coordinate;

/// Errors decoding an encoded polyline.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolylineError {
    /// A character outside the `?`..=`~` alphabet.
    #[error("Invalid polyline character {character:?} at position {position}")]
    InvalidCharacter { position: usize, character: char },

    /// Input ended in the middle of a value.
    #[error("Polyline ended mid-value at position {0}")]
    Truncated(usize),

    /// A value used more chunks than fit in 64 bits.
    #[error("Polyline value overflows at position {0}")]
    Overflow(usize),

    /// A decoded point is outside the valid coordinate range.
    #[error("Decoded point {index} out of range ({latitude}, {longitude})")]
    OutOfRange {
        index: usize,
        latitude: f64,
        longitude: f64,
    },
}

/// Decodes an encoded polyline into coordinates.
pub fn decode_polyline(encoded: &str, precision: u32) -> Result<Vec<Coordinate>, PolylineError> {
    let factor = 10f64.powi(precision as i32);
    let bytes = encoded.as_bytes();

    let mut points = Vec::with_capacity(bytes.len() / 4);
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lon: i64 = 0;

    while index < bytes.len() {
        lat += next_value(bytes, &mut index)?;
        lon += next_value(bytes, &mut index)?;

        let latitude = lat as f64 / factor;
        let longitude = lon as f64 / factor;
        let point = Coordinate::new(latitude, longitude).map_err(|_| PolylineError::OutOfRange {
            index: points.len(),
            latitude,
            longitude,
        })?;
        points.push(point);
    }

    Ok(points)
}

fn next_value(bytes: &[u8], index: &mut usize) -> Result<i64, PolylineError> {
    let mut result: i64 = 0;
    let mut shift = 0u32;

    loop {
        let byte = *bytes.get(*index).ok_or(PolylineError::Truncated(*index))?;
        if !(63..=126).contains(&byte) {
            return Err(PolylineError::InvalidCharacter {
                position: *index,
                character: byte as char,
            });
        }
        if shift > 60 {
            return Err(PolylineError::Overflow(*index));
        }

        let chunk = (byte - 63) as i64;
        *index += 1;
        result |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    Ok(if result & 1 != 0 {
        !(result >> 1)
    } else {
        result >> 1
    })
}
