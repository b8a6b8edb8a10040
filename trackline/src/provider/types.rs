//! Provider types and traits

use std::future::Future;

use thiserror::Error;

use crate::coord::Coordinate;

/// Errors that can occur during provider operations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProviderError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    HttpError(String),

    /// Response body could not be understood
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Provider answered but has no route between the points
    #[error("No route found between the requested points")]
    NoRoute,

    /// Provider rejected the request (quota, key, etc.)
    #[error("Provider error: {0}")]
    ProviderSpecific(String),

    /// Provider could not be constructed from its configuration
    #[error("Invalid provider configuration: {0}")]
    InvalidConfig(String),
}

/// Async trait for routing providers.
///
/// Implementors ask an external routing service for the path between two
/// points and return its geometry as coordinates in travel order.
///
/// Callers are expected to rate-limit through the route cache and throttle;
/// providers never retry on their own.
pub trait RouteProvider: Send + Sync {
    /// Computes the travel path from `origin` to `destination`.
    ///
    /// # Returns
    ///
    /// The route geometry (origin first) or an error.
    fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> impl Future<Output = Result<Vec<Coordinate>, ProviderError>> + Send;

    /// Returns the provider's name for logging and identification.
    fn name(&self) -> &str;
}
