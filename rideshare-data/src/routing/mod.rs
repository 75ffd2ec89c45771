//! Network routing backed by the Google Maps web services.
//!
//! [`MapsRoutingProvider`] implements [`rideshare_core::RoutingProvider`] on
//! top of a [`MapsApi`]. The production transport is [`HttpMapsApi`]; tests
//! substitute [`test_support::StubMapsApi`].
//!
//! # Example
//!
//! ```no_run
//! use std::time::Duration;
//! use rideshare_data::routing::{MapsApiConfig, MapsRoutingProvider};
//!
//! let config = MapsApiConfig::new("api-key")
//!     .with_timeout(Duration::from_secs(10))
//!     .with_user_agent("my-app/1.0");
//! let provider = MapsRoutingProvider::from_config(config)?
//!     .with_cache_ttl(Duration::from_secs(60));
//! # let _ = provider;
//! # Ok::<(), rideshare_data::routing::ProviderBuildError>(())
//! ```

mod api;
mod cache;
pub mod google;
mod provider;

#[doc(hidden)]
pub mod test_support;

pub use api::{
    AUTOCOMPLETE_ENDPOINT, DEFAULT_BASE_URL, DEFAULT_USER_AGENT, DIRECTIONS_ENDPOINT,
    DISTANCE_MATRIX_ENDPOINT, HttpMapsApi, MapsApi, MapsApiConfig, PLACE_DETAILS_ENDPOINT,
    ProviderBuildError,
};
pub use cache::TtlCache;
pub use provider::{DEFAULT_CACHE_TTL, MapsRoutingProvider};
