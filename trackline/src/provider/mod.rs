//! Routing provider abstraction.
//!
//! This module provides the trait and implementations for asking an external
//! routing service for the travel path between two coordinates. The tracking
//! core never computes routes itself; it only consumes a provider's answer.
//!
//! # Factory Pattern
//!
//! For centralized provider creation, use the [`ProviderFactory`]:
//!
//! ```ignore
//! use trackline::provider::{AsyncReqwestClient, ProviderConfig, ProviderFactory};
//!
//! let http_client = AsyncReqwestClient::new()?;
//! let factory = ProviderFactory::new(http_client);
//! let provider = factory.create(&ProviderConfig::osrm("https://router.project-osrm.org"))?;
//! ```

mod factory;
mod google;
mod http;
mod osrm;
mod straight;
mod types;

pub use factory::{AnyRouteProvider, ProviderConfig, ProviderFactory};
pub use google::{GoogleDirectionsProvider, DEFAULT_TRAVEL_MODE};
pub use http::{AsyncHttpClient, AsyncReqwestClient};
pub use osrm::{OsrmProvider, DEFAULT_OSRM_PROFILE};
pub use straight::StraightLineProvider;
pub use types::{ProviderError, RouteProvider};

#[cfg(test)]
pub use http::tests::MockAsyncHttpClient;
