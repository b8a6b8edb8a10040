//! Google Directions routing provider.
//!
//! Uses the Google Maps Platform Directions API and requires an API key with
//! the Directions API enabled.
//!
//! # API Endpoint
//!
//! `GET https://maps.googleapis.com/maps/api/directions/json?origin={lat},{lng}&destination={lat},{lng}&mode={mode}&key={API_KEY}`
//!
//! The route geometry is taken from `routes[0].overview_polyline.points`,
//! a precision-5 encoded polyline.

use serde::Deserialize;
use tracing::debug;

use crate::coord::Coordinate;
use crate::geometry::decode_polyline;
use crate::provider::{AsyncHttpClient, ProviderError, RouteProvider};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";

/// Default travel mode for courier routes.
pub const DEFAULT_TRAVEL_MODE: &str = "driving";

#[derive(Deserialize)]
struct DirectionsResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    routes: Vec<DirectionsRoute>,
}

#[derive(Deserialize)]
struct DirectionsRoute {
    overview_polyline: EncodedPolyline,
}

#[derive(Deserialize)]
struct EncodedPolyline {
    points: String,
}

/// Google Directions API provider.
///
/// # Pricing
///
/// Google Maps Platform is a paid service; every cache miss is a billable
/// request, which is why the gateway caches and throttles.
pub struct GoogleDirectionsProvider<C: AsyncHttpClient> {
    http_client: C,
    api_key: String,
    mode: String,
    base_url: String,
}

impl<C: AsyncHttpClient> GoogleDirectionsProvider<C> {
    /// Creates a provider with the given API key.
    pub fn new(http_client: C, api_key: impl Into<String>) -> Self {
        Self {
            http_client,
            api_key: api_key.into(),
            mode: DEFAULT_TRAVEL_MODE.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Sets the travel mode (`driving`, `bicycling`, `walking`, `two_wheeler`).
    pub fn with_mode(mut self, mode: impl Into<String>) -> Self {
        self.mode = mode.into();
        self
    }

    /// Points the provider at a different host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    fn build_url(&self, origin: &Coordinate, destination: &Coordinate) -> String {
        format!(
            "{}/maps/api/directions/json?origin={:.6},{:.6}&destination={:.6},{:.6}&mode={}&key={}",
            self.base_url,
            origin.latitude,
            origin.longitude,
            destination.latitude,
            destination.longitude,
            self.mode,
            self.api_key
        )
    }
}

fn parse_response(body: &[u8]) -> Result<Vec<Coordinate>, ProviderError> {
    let response: DirectionsResponse = serde_json::from_slice(body)
        .map_err(|e| ProviderError::InvalidResponse(format!("Directions JSON: {}", e)))?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" | "NOT_FOUND" => return Err(ProviderError::NoRoute),
        other => {
            return Err(ProviderError::ProviderSpecific(format!(
                "Directions {}: {}",
                other,
                response.error_message.unwrap_or_default()
            )))
        }
    }

    let route = response.routes.first().ok_or(ProviderError::NoRoute)?;
    decode_polyline(&route.overview_polyline.points, 5)
        .map_err(|e| ProviderError::InvalidResponse(format!("Directions polyline: {}", e)))
}

impl<C: AsyncHttpClient> RouteProvider for GoogleDirectionsProvider<C> {
    async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        let url = self.build_url(&origin, &destination);
        let body = self.http_client.get(&url).await?;
        let points = parse_response(&body)?;
        debug!(points = points.len(), "Directions route decoded");
        Ok(points)
    }

    fn name(&self) -> &str {
        "Google Directions"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::MockAsyncHttpClient;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn test_url_contains_key_and_mode() {
        let provider = GoogleDirectionsProvider::new(MockAsyncHttpClient::ok(""), "KEY123")
            .with_mode("two_wheeler");
        let url = provider.build_url(&c(12.5, 77.25), &c(13.0, 77.75));
        assert!(url.starts_with("https://maps.googleapis.com/maps/api/directions/json?"));
        assert!(url.contains("origin=12.500000,77.250000"));
        assert!(url.contains("destination=13.000000,77.750000"));
        assert!(url.contains("mode=two_wheeler"));
        assert!(url.ends_with("key=KEY123"));
    }

    #[tokio::test]
    async fn test_compute_route_ok() {
        let body = r#"{"status":"OK","routes":[{"overview_polyline":{"points":"_p~iF~ps|U_ulLnnqC_mqNvxq`@"}}]}"#;
        let provider =
            GoogleDirectionsProvider::new(MockAsyncHttpClient::ok(body), "KEY").with_base_url("http://local/");
        let points = provider
            .compute_route(c(38.5, -120.2), c(43.252, -126.453))
            .await
            .unwrap();
        assert_eq!(points.len(), 3);
    }

    #[test]
    fn test_zero_results() {
        let body = br#"{"status":"ZERO_RESULTS","routes":[]}"#;
        assert_eq!(parse_response(body), Err(ProviderError::NoRoute));
    }

    #[test]
    fn test_denied_request() {
        let body = br#"{"status":"REQUEST_DENIED","error_message":"The provided API key is invalid."}"#;
        let err = parse_response(body).unwrap_err();
        assert!(matches!(err, ProviderError::ProviderSpecific(ref m) if m.contains("REQUEST_DENIED")));
    }

    #[test]
    fn test_ok_without_routes() {
        let body = br#"{"status":"OK","routes":[]}"#;
        assert_eq!(parse_response(body), Err(ProviderError::NoRoute));
    }
}
