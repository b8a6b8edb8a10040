//! Provider factory for centralized provider creation.
//!
//! [`ProviderFactory`] turns a [`ProviderConfig`] into an [`AnyRouteProvider`],
//! an enum over the concrete providers. The enum implements [`RouteProvider`]
//! by static dispatch, so the gateway stays generic without boxing futures.

use super::google::{GoogleDirectionsProvider, DEFAULT_TRAVEL_MODE};
use super::http::AsyncReqwestClient;
use super::osrm::{OsrmProvider, DEFAULT_OSRM_PROFILE};
use super::straight::StraightLineProvider;
use super::types::{ProviderError, RouteProvider};
use crate::coord::Coordinate;

/// Configuration for creating a provider.
///
/// # Example
///
/// ```
/// use trackline::provider::ProviderConfig;
///
/// let osrm = ProviderConfig::osrm("https://router.project-osrm.org");
/// let google = ProviderConfig::google("YOUR_API_KEY");
/// assert!(google.requires_api_key());
/// assert!(!osrm.requires_api_key());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderConfig {
    /// OSRM route service.
    Osrm {
        /// Server base URL, e.g. `https://router.project-osrm.org`
        base_url: String,
        /// Routing profile (`driving`, `bike`, `foot`)
        profile: String,
    },

    /// Google Directions API.
    ///
    /// Requires a Google Maps Platform API key with the Directions API enabled.
    Google {
        /// Google Maps Platform API key
        api_key: String,
        /// Travel mode
        mode: String,
    },

    /// Straight line between the endpoints. No network access.
    Straight,
}

impl ProviderConfig {
    /// OSRM configuration with the default profile.
    pub fn osrm(base_url: impl Into<String>) -> Self {
        Self::Osrm {
            base_url: base_url.into(),
            profile: DEFAULT_OSRM_PROFILE.to_string(),
        }
    }

    /// Google Directions configuration with the default travel mode.
    pub fn google(api_key: impl Into<String>) -> Self {
        Self::Google {
            api_key: api_key.into(),
            mode: DEFAULT_TRAVEL_MODE.to_string(),
        }
    }

    /// Straight-line configuration.
    pub fn straight() -> Self {
        Self::Straight
    }

    /// Returns the provider name for this configuration.
    pub fn name(&self) -> &str {
        match self {
            Self::Osrm { .. } => "OSRM",
            Self::Google { .. } => "Google Directions",
            Self::Straight => "Straight line",
        }
    }

    /// Returns whether this provider requires an API key.
    pub fn requires_api_key(&self) -> bool {
        matches!(self, Self::Google { .. })
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self::Straight
    }
}

/// A configured routing provider.
pub enum AnyRouteProvider {
    Osrm(OsrmProvider<AsyncReqwestClient>),
    Google(GoogleDirectionsProvider<AsyncReqwestClient>),
    Straight(StraightLineProvider),
}

impl RouteProvider for AnyRouteProvider {
    async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        match self {
            Self::Osrm(p) => p.compute_route(origin, destination).await,
            Self::Google(p) => p.compute_route(origin, destination).await,
            Self::Straight(p) => p.compute_route(origin, destination).await,
        }
    }

    fn name(&self) -> &str {
        match self {
            Self::Osrm(p) => p.name(),
            Self::Google(p) => p.name(),
            Self::Straight(p) => p.name(),
        }
    }
}

/// Factory for creating provider instances.
///
/// # Example
///
/// ```ignore
/// use trackline::provider::{AsyncReqwestClient, ProviderConfig, ProviderFactory};
///
/// let factory = ProviderFactory::new(AsyncReqwestClient::new()?);
/// let provider = factory.create(&ProviderConfig::google("YOUR_API_KEY"))?;
/// ```
pub struct ProviderFactory {
    http_client: AsyncReqwestClient,
}

impl ProviderFactory {
    /// Create a new provider factory with the given HTTP client.
    pub fn new(http_client: AsyncReqwestClient) -> Self {
        Self { http_client }
    }

    /// Create a provider from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::InvalidConfig`] for an empty API key or base URL.
    pub fn create(self, config: &ProviderConfig) -> Result<AnyRouteProvider, ProviderError> {
        match config {
            ProviderConfig::Osrm { base_url, profile } => {
                if base_url.trim().is_empty() {
                    return Err(ProviderError::InvalidConfig(
                        "OSRM base URL is empty".to_string(),
                    ));
                }
                Ok(AnyRouteProvider::Osrm(OsrmProvider::with_profile(
                    self.http_client,
                    base_url.clone(),
                    profile.clone(),
                )))
            }
            ProviderConfig::Google { api_key, mode } => {
                if api_key.trim().is_empty() {
                    return Err(ProviderError::InvalidConfig(
                        "Google Directions requires an API key".to_string(),
                    ));
                }
                Ok(AnyRouteProvider::Google(
                    GoogleDirectionsProvider::new(self.http_client, api_key.clone())
                        .with_mode(mode.clone()),
                ))
            }
            ProviderConfig::Straight => Ok(AnyRouteProvider::Straight(StraightLineProvider)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn factory() -> ProviderFactory {
        ProviderFactory::new(AsyncReqwestClient::new().unwrap())
    }

    #[test]
    fn test_config_names() {
        assert_eq!(ProviderConfig::osrm("http://x").name(), "OSRM");
        assert_eq!(ProviderConfig::google("k").name(), "Google Directions");
        assert_eq!(ProviderConfig::Straight.name(), "Straight line");
    }

    #[test]
    fn test_create_osrm() {
        let provider = factory()
            .create(&ProviderConfig::osrm("http://localhost:5000"))
            .unwrap();
        assert!(matches!(provider, AnyRouteProvider::Osrm(_)));
        assert_eq!(provider.name(), "OSRM");
    }

    #[test]
    fn test_google_requires_key() {
        let result = factory().create(&ProviderConfig::google("  "));
        assert!(matches!(result, Err(ProviderError::InvalidConfig(_))));
    }

    #[test]
    fn test_osrm_requires_url() {
        let result = factory().create(&ProviderConfig::osrm(""));
        assert!(matches!(result, Err(ProviderError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_straight_dispatch() {
        let provider = factory().create(&ProviderConfig::Straight).unwrap();
        let a = Coordinate::new(0.0, 0.0).unwrap();
        let b = Coordinate::new(0.0, 0.01).unwrap();
        assert_eq!(provider.compute_route(a, b).await.unwrap(), vec![a, b]);
    }
}
