//! Route gateway: validation, cache, throttle and provider calls.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use super::cache::RouteCache;
use super::config::RouteCacheConfig;
use super::key::RouteKey;
use crate::coord::{CoordError, Coordinate};
use crate::geometry::{distance, Path, PathError};
use crate::provider::{ProviderError, RouteProvider};

/// Errors resolving a route.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RouteError {
    /// Origin or destination is not a usable coordinate.
    #[error("Invalid route endpoint: {0}")]
    InvalidEndpoint(#[source] CoordError),

    /// The provider failed or found no route.
    #[error("Route unavailable: {0}")]
    RouteUnavailable(#[source] ProviderError),

    /// The provider answered with geometry that is not a usable path.
    #[error("Provider returned a malformed route: {0}")]
    MalformedRoute(#[source] PathError),
}

/// Successful outcome of [`RouteGateway::resolve_route`].
#[derive(Debug, Clone, PartialEq)]
pub enum RouteResolution {
    /// A path between the endpoints.
    Resolved(Path),
    /// Origin and destination are close enough that no route is needed.
    NoRouteNeeded,
}

/// Snapshot of gateway counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RouteGatewayStats {
    /// Requests answered from the cache.
    pub cache_hits: u64,
    /// Requests that joined an earlier request for the same key.
    pub throttled: u64,
    /// Calls made to the routing provider.
    pub provider_calls: u64,
    /// Provider calls that failed.
    pub provider_failures: u64,
}

impl fmt::Display for RouteGatewayStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} cache hits, {} throttled, {} provider calls ({} failed)",
            self.cache_hits, self.throttled, self.provider_calls, self.provider_failures
        )
    }
}

#[derive(Default)]
struct Counters {
    cache_hits: AtomicU64,
    throttled: AtomicU64,
    provider_calls: AtomicU64,
    provider_failures: AtomicU64,
}

type SharedResolution = Shared<BoxFuture<'static, Result<Path, RouteError>>>;

struct InFlight {
    issued_at: Instant,
    origin: Coordinate,
    destination: Coordinate,
    result: SharedResolution,
}

/// Length of one rounding step of a route key, in metres of latitude.
fn key_step_meters(precision: u32) -> f64 {
    const METERS_PER_DEGREE: f64 = 111_320.0;
    METERS_PER_DEGREE / 10f64.powi(precision as i32)
}

/// Front door for route requests.
///
/// Cheap to share behind an `Arc`; every session of a process can use the
/// same gateway and cache.
pub struct RouteGateway<P: RouteProvider + 'static> {
    provider: Arc<P>,
    cache: Arc<dyn RouteCache>,
    config: RouteCacheConfig,
    requests: Mutex<HashMap<RouteKey, InFlight>>,
    counters: Arc<Counters>,
}

impl<P: RouteProvider + 'static> RouteGateway<P> {
    /// Creates a gateway over `provider` and `cache`.
    pub fn new(provider: P, cache: Arc<dyn RouteCache>, config: RouteCacheConfig) -> Self {
        Self::with_shared_provider(Arc::new(provider), cache, config)
    }

    /// Creates a gateway over a provider that is already shared.
    pub fn with_shared_provider(
        provider: Arc<P>,
        cache: Arc<dyn RouteCache>,
        config: RouteCacheConfig,
    ) -> Self {
        info!(
            provider = provider.name(),
            ttl_secs = config.ttl.as_secs(),
            throttle_ms = config.throttle_window.as_millis() as u64,
            "Route gateway ready"
        );
        Self {
            provider,
            cache,
            config,
            requests: Mutex::new(HashMap::new()),
            counters: Arc::new(Counters::default()),
        }
    }

    pub fn config(&self) -> &RouteCacheConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<dyn RouteCache> {
        &self.cache
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    /// Rounded key for an endpoint pair under this gateway's precision.
    pub fn key_for(&self, origin: &Coordinate, destination: &Coordinate) -> RouteKey {
        RouteKey::new(origin, destination, self.config.key_precision)
    }

    /// Resolves the path from `origin` to `destination`.
    ///
    /// # Errors
    ///
    /// - [`RouteError::InvalidEndpoint`] for non-finite or out-of-range input
    /// - [`RouteError::RouteUnavailable`] when the provider fails; any cached
    ///   path for the key is left as it was
    /// - [`RouteError::MalformedRoute`] when the provider's geometry is unusable
    pub async fn resolve_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<RouteResolution, RouteError> {
        let origin = origin.validate().map_err(RouteError::InvalidEndpoint)?;
        let destination = destination
            .validate()
            .map_err(RouteError::InvalidEndpoint)?;

        if distance(&origin, &destination) < self.config.min_route_distance_m {
            debug!(%origin, %destination, "Endpoints coincide, no route needed");
            return Ok(RouteResolution::NoRouteNeeded);
        }

        let key = self.key_for(&origin, &destination);
        if let Some(path) = self.cache.get(&key) {
            self.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Route cache hit");
            return Ok(RouteResolution::Resolved(path));
        }

        let pending = self.join_or_issue(key, origin, destination);
        pending.await.map(RouteResolution::Resolved)
    }

    /// Returns the shared result for `key`, issuing a provider call unless
    /// an equivalent one was issued within the throttle window.
    ///
    /// Requests are equivalent when they share a key, or when their endpoints
    /// together differ by no more than one rounding step. The second case
    /// covers pairs that straddle a rounding boundary.
    fn join_or_issue(
        &self,
        key: RouteKey,
        origin: Coordinate,
        destination: Coordinate,
    ) -> SharedResolution {
        let now = Instant::now();
        let window = self.config.throttle_window;
        let mut requests = self.requests.lock();

        requests.retain(|_, r| now.saturating_duration_since(r.issued_at) < window);

        let tolerance = key_step_meters(self.config.key_precision);
        let existing = requests.get(&key).or_else(|| {
            requests.values().find(|r| {
                distance(&r.origin, &origin) + distance(&r.destination, &destination) <= tolerance
            })
        });
        if let Some(existing) = existing {
            self.counters.throttled.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, "Route request throttled, joining earlier request");
            return existing.result.clone();
        }

        let result = self.issue(key, origin, destination);
        requests.insert(
            key,
            InFlight {
                issued_at: now,
                origin,
                destination,
                result: result.clone(),
            },
        );
        result
    }

    fn issue(&self, key: RouteKey, origin: Coordinate, destination: Coordinate) -> SharedResolution {
        let provider = Arc::clone(&self.provider);
        let cache = Arc::clone(&self.cache);
        let counters = Arc::clone(&self.counters);

        async move {
            counters.provider_calls.fetch_add(1, Ordering::Relaxed);
            debug!(key = %key, provider = provider.name(), "Requesting route from provider");

            let points = match provider.compute_route(origin, destination).await {
                Ok(points) => points,
                Err(e) => {
                    counters.provider_failures.fetch_add(1, Ordering::Relaxed);
                    warn!(key = %key, provider = provider.name(), error = %e, "Route provider failed");
                    return Err(RouteError::RouteUnavailable(e));
                }
            };

            let path = Path::new(points).map_err(|e| {
                counters.provider_failures.fetch_add(1, Ordering::Relaxed);
                warn!(key = %key, error = %e, "Provider route rejected");
                RouteError::MalformedRoute(e)
            })?;

            debug!(
                key = %key,
                points = path.len(),
                length_m = path.total_length() as u64,
                "Route resolved"
            );
            cache.insert(key, path.clone());
            Ok(path)
        }
        .boxed()
        .shared()
    }

    /// Current counter values.
    pub fn stats(&self) -> RouteGatewayStats {
        RouteGatewayStats {
            cache_hits: self.counters.cache_hits.load(Ordering::Relaxed),
            throttled: self.counters.throttled.load(Ordering::Relaxed),
            provider_calls: self.counters.provider_calls.load(Ordering::Relaxed),
            provider_failures: self.counters.provider_failures.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::route::MemoryRouteCache;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    /// Provider that counts calls, optionally waits, and can be told to fail.
    struct CountingProvider {
        calls: AtomicUsize,
        delay: Duration,
        fail: std::sync::atomic::AtomicBool,
        points: Option<Vec<Coordinate>>,
    }

    impl CountingProvider {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: Duration::ZERO,
                fail: std::sync::atomic::AtomicBool::new(false),
                points: None,
            }
        }

        fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn set_failing(&self, fail: bool) {
            self.fail.store(fail, Ordering::SeqCst);
        }
    }

    impl RouteProvider for CountingProvider {
        async fn compute_route(
            &self,
            origin: Coordinate,
            destination: Coordinate,
        ) -> Result<Vec<Coordinate>, ProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if !self.delay.is_zero() {
                tokio::time::sleep(self.delay).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                return Err(ProviderError::HttpError("unreachable".into()));
            }
            Ok(self
                .points
                .clone()
                .unwrap_or_else(|| vec![origin, destination]))
        }

        fn name(&self) -> &str {
            "counting"
        }
    }

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    fn gateway(provider: Arc<CountingProvider>) -> RouteGateway<CountingProvider> {
        RouteGateway::with_shared_provider(
            provider,
            Arc::new(MemoryRouteCache::default()),
            RouteCacheConfig::default(),
        )
    }

    #[tokio::test(start_paused = true)]
    async fn test_cache_idempotence() {
        let provider = Arc::new(CountingProvider::new());
        let gw = gateway(Arc::clone(&provider));

        let first = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await.unwrap();
        tokio::time::advance(Duration::from_secs(60)).await;
        let second = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);
        assert_eq!(gw.stats().cache_hits, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetches() {
        let provider = Arc::new(CountingProvider::new());
        let gw = gateway(Arc::clone(&provider));

        gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await.unwrap();
        tokio::time::advance(Duration::from_secs(5 * 60 + 1)).await;
        gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await.unwrap();

        assert_eq!(provider.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_joins_in_flight_request() {
        let provider = Arc::new(CountingProvider::new().with_delay(Duration::from_millis(500)));
        let gw = gateway(Arc::clone(&provider));

        let (a, b) = tokio::join!(
            gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)),
            gw.resolve_route(c(0.00001, 0.0), c(0.0, 0.01)),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls(), 1);
        assert_eq!(gw.stats().throttled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_throttle_joins_across_rounding_boundary() {
        let provider = Arc::new(CountingProvider::new().with_delay(Duration::from_millis(500)));
        let gw = gateway(Arc::clone(&provider));

        // A few centimetres apart, but rounded into different keys
        let a_origin = c(0.000049, 0.0);
        let b_origin = c(0.000051, 0.0);
        let destination = c(0.0, 0.01);
        assert_ne!(gw.key_for(&a_origin, &destination), gw.key_for(&b_origin, &destination));

        let (a, b) = tokio::join!(
            gw.resolve_route(a_origin, destination),
            gw.resolve_route(b_origin, destination),
        );

        assert_eq!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls(), 1);
        assert_eq!(gw.stats().throttled, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_distinct_requests_are_not_throttled() {
        let provider = Arc::new(CountingProvider::new().with_delay(Duration::from_millis(500)));
        let gw = gateway(Arc::clone(&provider));

        let (a, b) = tokio::join!(
            gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)),
            gw.resolve_route(c(0.001, 0.0), c(0.0, 0.01)),
        );

        assert_ne!(a.unwrap(), b.unwrap());
        assert_eq!(provider.calls(), 2);
        assert_eq!(gw.stats().throttled, 0);
    }

    #[test]
    fn test_key_step_meters() {
        assert!((key_step_meters(4) - 11.132).abs() < 1e-9);
        assert!((key_step_meters(5) - 1.1132).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_within_window_is_not_retried() {
        let provider = Arc::new(CountingProvider::new());
        provider.set_failing(true);
        let gw = gateway(Arc::clone(&provider));

        let first = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await;
        let second = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await;

        assert!(matches!(first, Err(RouteError::RouteUnavailable(_))));
        assert_eq!(first, second);
        assert_eq!(provider.calls(), 1);

        tokio::time::advance(Duration::from_secs(3)).await;
        let _ = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await;
        assert_eq!(provider.calls(), 2);
        assert_eq!(gw.stats().provider_failures, 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failure_keeps_cached_path() {
        let provider = Arc::new(CountingProvider::new());
        let gw = gateway(Arc::clone(&provider));
        let key = gw.key_for(&c(0.0, 0.0), &c(0.0, 0.01));

        let RouteResolution::Resolved(original) =
            gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await.unwrap()
        else {
            panic!("expected a path");
        };

        // Past the TTL but inside the purge horizon
        tokio::time::advance(Duration::from_secs(6 * 60)).await;
        provider.set_failing(true);
        let result = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await;

        assert!(matches!(result, Err(RouteError::RouteUnavailable(_))));
        assert_eq!(gw.cache().entry(&key).map(|e| e.path), Some(original));
    }

    #[tokio::test]
    async fn test_coincident_endpoints_need_no_route() {
        let provider = Arc::new(CountingProvider::new());
        let gw = gateway(Arc::clone(&provider));

        let result = gw.resolve_route(c(1.0, 1.0), c(1.00001, 1.0)).await.unwrap();
        assert_eq!(result, RouteResolution::NoRouteNeeded);
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_invalid_endpoint() {
        let provider = Arc::new(CountingProvider::new());
        let gw = gateway(Arc::clone(&provider));

        let bad = Coordinate {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        let result = gw.resolve_route(bad, c(0.0, 0.01)).await;
        assert!(matches!(result, Err(RouteError::InvalidEndpoint(_))));
        assert_eq!(provider.calls(), 0);
    }

    #[tokio::test]
    async fn test_malformed_provider_route() {
        let mut provider = CountingProvider::new();
        provider.points = Some(vec![c(0.0, 0.0)]);
        let provider = Arc::new(provider);
        let gw = gateway(Arc::clone(&provider));

        let result = gw.resolve_route(c(0.0, 0.0), c(0.0, 0.01)).await;
        assert!(matches!(
            result,
            Err(RouteError::MalformedRoute(PathError::TooFewPoints(1)))
        ));
        assert!(gw.cache().is_empty());
    }
}
