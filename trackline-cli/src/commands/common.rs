//! Common types and utilities shared across CLI commands.

use std::str::FromStr;
use std::sync::Arc;

use tracing::info;
use trackline::config::ConfigFile;
use trackline::phase::{Phase, PhaseParseError};
use trackline::provider::{AnyRouteProvider, AsyncReqwestClient, ProviderFactory};
use trackline::route::{MemoryRouteCache, RouteGateway};

use crate::error::CliError;

/// A phase switch during replay: apply `phase` before fix number `index`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseAt {
    pub index: usize,
    pub phase: Phase,
}

impl FromStr for PhaseAt {
    type Err = String;

    /// Parses `N:PHASE`, e.g. `12:at-origin`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (index, phase) = s
            .split_once(':')
            .ok_or_else(|| format!("expected N:PHASE, got '{}'", s))?;
        let index = index
            .trim()
            .parse()
            .map_err(|_| format!("'{}' is not a fix index", index))?;
        let phase: Phase = phase.parse().map_err(|e: PhaseParseError| e.to_string())?;
        Ok(Self { index, phase })
    }
}

/// Builds a route gateway for the configured provider.
pub fn build_gateway(config: &ConfigFile) -> Result<Arc<RouteGateway<AnyRouteProvider>>, CliError> {
    let provider_config = config.provider.to_provider_config()?;
    let client = AsyncReqwestClient::with_timeout(config.provider.timeout())?;
    let provider = ProviderFactory::new(client).create(&provider_config)?;

    info!(provider = provider_config.name(), "Routing provider ready");

    let route_config = config.tracking.route.clone();
    let cache = Arc::new(MemoryRouteCache::new(&route_config));
    Ok(Arc::new(RouteGateway::new(provider, cache, route_config)))
}
