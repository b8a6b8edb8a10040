//! Straight-line provider.
//!
//! Answers every request with the two-point path from origin to destination.
//! Used when no routing backend is configured, and in tests.

use crate::coord::Coordinate;
use crate::provider::{ProviderError, RouteProvider};

/// Provider that routes in a straight line.
#[derive(Debug, Default, Clone, Copy)]
pub struct StraightLineProvider;

impl RouteProvider for StraightLineProvider {
    async fn compute_route(
        &self,
        origin: Coordinate,
        destination: Coordinate,
    ) -> Result<Vec<Coordinate>, ProviderError> {
        Ok(vec![origin, destination])
    }

    fn name(&self) -> &str {
        "Straight line"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_returns_endpoints() {
        let a = Coordinate::new(1.0, 2.0).unwrap();
        let b = Coordinate::new(1.5, 2.5).unwrap();
        let points = StraightLineProvider.compute_route(a, b).await.unwrap();
        assert_eq!(points, vec![a, b]);
    }
}
