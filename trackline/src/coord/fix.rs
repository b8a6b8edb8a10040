//! Raw position fixes as they arrive from the fix channel.

use serde::{Deserialize, Serialize};

use super::types::{CoordError, Coordinate};

/// Wire shape of a position message.
///
/// Field names follow the channel's JSON (`latitude`, `longitude`,
/// `heading`, `progressHint`); `lat`/`lng` are accepted as aliases.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixMessage {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lng", alias = "lon")]
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heading: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_hint: Option<f64>,
}

impl FixMessage {
    /// Creates a message with only a position.
    pub fn at(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            heading: None,
            progress_hint: None,
        }
    }

    /// Sets the reported heading.
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }
}

/// One validated position observation for the tracked agent.
///
/// Fixes are consumed on arrival and never retained; their timestamp is
/// implicit in arrival order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fix {
    pub coordinate: Coordinate,
    /// Reported heading in degrees [0, 360), if the source had one.
    pub heading: Option<f64>,
    /// Source-provided progress estimate in [0, 1].
    pub progress_hint: Option<f64>,
}

impl Fix {
    /// Creates a fix with only a coordinate.
    pub fn new(coordinate: Coordinate) -> Self {
        Self {
            coordinate,
            heading: None,
            progress_hint: None,
        }
    }

    /// Sets the reported heading.
    pub fn with_heading(mut self, heading: f64) -> Self {
        self.heading = Some(heading);
        self
    }

    /// Sets the progress hint.
    pub fn with_progress_hint(mut self, hint: f64) -> Self {
        self.progress_hint = Some(hint);
        self
    }

    /// Checks the fix coordinate.
    pub fn validate(&self) -> Result<(), CoordError> {
        self.coordinate.validate().map(|_| ())
    }
}

impl TryFrom<FixMessage> for Fix {
    type Error = CoordError;

    /// Validates the position. A heading or hint that is not usable is
    /// dropped rather than failing the whole fix.
    fn try_from(msg: FixMessage) -> Result<Self, Self::Error> {
        let coordinate = Coordinate::new(msg.latitude, msg.longitude)?;
        let heading = msg
            .heading
            .filter(|h| h.is_finite())
            .map(|h| h.rem_euclid(360.0));
        let progress_hint = msg
            .progress_hint
            .filter(|p| p.is_finite() && (0.0..=1.0).contains(p));

        Ok(Self {
            coordinate,
            heading,
            progress_hint,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_deserialize_camel_case() {
        let json = r#"{"latitude": 12.97, "longitude": 77.59, "heading": 45.0, "progressHint": 0.3}"#;
        let msg: FixMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.heading, Some(45.0));
        assert_eq!(msg.progress_hint, Some(0.3));
    }

    #[test]
    fn test_message_deserialize_aliases() {
        let json = r#"{"lat": 12.97, "lng": 77.59}"#;
        let msg: FixMessage = serde_json::from_str(json).unwrap();
        assert_eq!(msg.latitude, 12.97);
        assert_eq!(msg.longitude, 77.59);
        assert!(msg.heading.is_none());
    }

    #[test]
    fn test_fix_from_message_normalizes_heading() {
        let fix = Fix::try_from(FixMessage::at(1.0, 2.0).with_heading(-90.0)).unwrap();
        assert_eq!(fix.heading, Some(270.0));
    }

    #[test]
    fn test_fix_from_message_drops_bad_extras() {
        let msg = FixMessage {
            latitude: 1.0,
            longitude: 2.0,
            heading: Some(f64::NAN),
            progress_hint: Some(1.5),
        };
        let fix = Fix::try_from(msg).unwrap();
        assert!(fix.heading.is_none());
        assert!(fix.progress_hint.is_none());
    }

    #[test]
    fn test_fix_from_message_rejects_bad_position() {
        assert!(Fix::try_from(FixMessage::at(f64::NAN, 2.0)).is_err());
        assert!(Fix::try_from(FixMessage::at(10.0, 200.0)).is_err());
    }
}
