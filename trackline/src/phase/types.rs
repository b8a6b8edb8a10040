//! Phase and endpoint types.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::Coordinate;
use crate::route::RouteKey;

/// Active leg of a journey, owned by the order lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Phase {
    /// No agent assigned yet.
    #[default]
    Unassigned,
    /// Agent travelling to the pickup point.
    ToOrigin,
    /// Agent waiting at the pickup point.
    AtOrigin,
    /// Agent travelling to the drop-off point.
    ToDestination,
    /// Journey finished.
    Completed,
}

impl Phase {
    /// Phases in which the agent is moving and its position drives routing.
    pub fn is_travelling(&self) -> bool {
        matches!(self, Phase::ToOrigin | Phase::ToDestination)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Unassigned => "unassigned",
            Phase::ToOrigin => "to-origin",
            Phase::AtOrigin => "at-origin",
            Phase::ToDestination => "to-destination",
            Phase::Completed => "completed",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a [`Phase`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown phase '{0}' (expected unassigned, to-origin, at-origin, to-destination or completed)")]
pub struct PhaseParseError(pub String);

impl FromStr for Phase {
    type Err = PhaseParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "unassigned" => Ok(Phase::Unassigned),
            "to-origin" => Ok(Phase::ToOrigin),
            "at-origin" => Ok(Phase::AtOrigin),
            "to-destination" => Ok(Phase::ToDestination),
            "completed" => Ok(Phase::Completed),
            _ => Err(PhaseParseError(s.to_string())),
        }
    }
}

/// Points known about a journey at a given moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct KnownPoints {
    /// Pickup point.
    pub journey_origin: Coordinate,
    /// Drop-off point.
    pub journey_destination: Coordinate,
    /// Where the agent was when the journey was assigned.
    pub journey_start: Option<Coordinate>,
    /// Latest known agent position.
    pub agent_position: Option<Coordinate>,
}

impl KnownPoints {
    pub fn new(journey_origin: Coordinate, journey_destination: Coordinate) -> Self {
        Self {
            journey_origin,
            journey_destination,
            journey_start: None,
            agent_position: None,
        }
    }

    pub fn with_journey_start(mut self, start: Coordinate) -> Self {
        self.journey_start = Some(start);
        self
    }

    pub fn with_agent_position(mut self, position: Coordinate) -> Self {
        self.agent_position = Some(position);
        self
    }
}

/// An origin-destination pair to route between.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Endpoints {
    pub origin: Coordinate,
    pub destination: Coordinate,
}

impl Endpoints {
    pub fn new(origin: Coordinate, destination: Coordinate) -> Self {
        Self {
            origin,
            destination,
        }
    }

    /// Route key of this pair at `precision` decimals.
    pub fn key(&self, precision: u32) -> RouteKey {
        RouteKey::new(&self.origin, &self.destination, precision)
    }
}

impl fmt::Display for Endpoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.origin, self.destination)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_parse_and_display() {
        for phase in [
            Phase::Unassigned,
            Phase::ToOrigin,
            Phase::AtOrigin,
            Phase::ToDestination,
            Phase::Completed,
        ] {
            assert_eq!(phase.to_string().parse::<Phase>(), Ok(phase));
        }
        assert_eq!("TO_DESTINATION".parse::<Phase>(), Ok(Phase::ToDestination));
        assert!("delivered".parse::<Phase>().is_err());
    }

    #[test]
    fn test_travelling_phases() {
        assert!(Phase::ToOrigin.is_travelling());
        assert!(Phase::ToDestination.is_travelling());
        assert!(!Phase::AtOrigin.is_travelling());
        assert!(!Phase::Completed.is_travelling());
    }
}
