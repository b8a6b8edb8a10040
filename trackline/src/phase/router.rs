//! Endpoint selection and change detection.

use tracing::debug;

use super::types::{Endpoints, KnownPoints, Phase};
use crate::route::RouteKey;

/// Endpoint pair for `phase`, or `None` when nothing should be rendered.
pub fn select_endpoints(phase: Phase, known: &KnownPoints) -> Option<Endpoints> {
    match phase {
        Phase::ToOrigin => {
            let origin = known.agent_position.or(known.journey_start)?;
            Some(Endpoints::new(origin, known.journey_origin))
        }
        Phase::AtOrigin => Some(Endpoints::new(
            known.journey_origin,
            known.journey_destination,
        )),
        Phase::ToDestination => {
            let origin = known.agent_position.unwrap_or(known.journey_origin);
            Some(Endpoints::new(origin, known.journey_destination))
        }
        Phase::Unassigned | Phase::Completed => None,
    }
}

/// Outcome of [`PhaseRouter::update`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EndpointChange {
    /// Same pair as before (within key precision).
    Unchanged,
    /// A different pair; the current path is stale.
    Changed(Endpoints),
    /// Nothing should be rendered any more.
    Cleared,
}

/// Tracks the selected endpoint pair across lifecycle updates.
#[derive(Debug, Clone)]
pub struct PhaseRouter {
    key_precision: u32,
    current: Option<(Endpoints, RouteKey)>,
}

impl PhaseRouter {
    /// Creates a router comparing pairs at `key_precision` decimals.
    pub fn new(key_precision: u32) -> Self {
        Self {
            key_precision,
            current: None,
        }
    }

    /// The pair selected by the last update.
    pub fn current(&self) -> Option<Endpoints> {
        self.current.map(|(endpoints, _)| endpoints)
    }

    pub fn current_key(&self) -> Option<RouteKey> {
        self.current.map(|(_, key)| key)
    }

    /// Re-selects endpoints and reports whether they changed.
    pub fn update(&mut self, phase: Phase, known: &KnownPoints) -> EndpointChange {
        match select_endpoints(phase, known) {
            None => {
                if self.current.take().is_some() {
                    debug!(%phase, "Endpoints cleared");
                    EndpointChange::Cleared
                } else {
                    EndpointChange::Unchanged
                }
            }
            Some(endpoints) => {
                let key = endpoints.key(self.key_precision);
                if self.current.map(|(_, k)| k) == Some(key) {
                    return EndpointChange::Unchanged;
                }
                debug!(%phase, endpoints = %endpoints, "Endpoints changed");
                self.current = Some((endpoints, key));
                EndpointChange::Changed(endpoints)
            }
        }
    }

    /// Forgets the current pair.
    pub fn reset(&mut self) {
        self.current = None;
    }
}
