//! OSRM routing provider.
//!
//! Talks to an OSRM `route` service (self-hosted or the public demo server).
//!
//! # API Endpoint
//!
//! `GET {base}/route/v1/{profile}/{lon},{lat};{lon},{lat}?overview=full&geometries=polyline`
//!
//! Note that OSRM puts longitude first. The route geometry comes back as a
//! precision-5 encoded polyline.

use serde::Deserialize;
use tracing::debug;

use crate::coord::Coordinate;
use crate::geometry::decode_polyline;
use crate::provider::{AsyncHttpClient, ProviderError, RouteProvider};

/// Default OSRM profile.
pub const DEFAULT_OSRM_PROFILE: &str = "driving";

#[derive(Deserialize)]
struct OsrmResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Deserialize)]
struct OsrmRoute {
    geometry: String,
}

/// OSRM routing provider.
pub struct OsrmProvider<C: AsyncHttpClient> {
    http_client: C,
    base_url: String,
    profile: String,
}

impl<C: AsyncHttpClient> OsrmProvider<C> {
    /// Creates a provider for the OSRM server at `base_url`.
    pub fn new(http_client: C, base_url: impl Into<String>) -> Self {
        Self::with_profile(http_client, base_url, DEFAULT_OSRM_PROFILE)
    }

    /// Creates a provider using a specific routing profile (`driving`, `bike`, `foot`).
    pub fn with_profile(
        http_client: C,
        base_url: impl Into<String>,
        profile: impl Into<String>,
    ) -> Self {
        let base_url: String = base_url.into();
        Self {
            http_client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: profile.into(),
        }
    }

    fn build_url(&self, origin: &Coordinate, destination: &Coordinate) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=polyline",
            self.base_url,
            self.profile,
            origin.longitude,
            origin.latitude,
            destination.longitude,
            destination.latitude
        )
    }
}

/// Parses an OSRM route response body into coordinates.
fn parse_response(body: &[u8]) -> Result<Vec<Coordinate>, ProviderError> {
    let response: OsrmResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("OSRM JSON: {}", e)))?;

    match response.code.as_str() {
        "Ok" => {}
        "NoRoute" | "NoSegment" => return Err(ProviderError::NoRoute),
        other => {
            return Err(ProviderError::ProviderSpecific(format!(
                "OSRM {}: {}",
                other,
                response.message.unwrap_or_default()
            )))
        }
    }

    let route = response.routes.first().ok_or(ProviderError::NoRoute)?;
    decode_polyline(&route.geometry, 5)
        .map_err(|e| ProviderError::InvalidResponse(format!("OSRM geometry: {}", e)))
}

impl<C: AsyncHttpClient> RouteProvider for OsrmProvider<C> {
    async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let url = self.build_url(&origin, &destination);
        let body = self.http_client.get(&url).await?;
        let points = parse_response(&body)?;
        debug!(points = points.len(), "OSRM route decoded");
        Ok(points)
    }

    fn name(&self) -> &str {
        "OSRM"
    }
}
