//! Route durations, detour costs and place lookup.
//!
//! [`RoutingProvider`] abstracts the routing backend. This crate ships
//! [`EstimatorRoutingProvider`], a deterministic haversine estimate that needs
//! no network; the data crate adds a mapping-API-backed implementation.

mod error;
mod estimator;
mod provider;

pub use error::RoutingError;
pub use estimator::{EstimatorConfig, EstimatorRoutingProvider};
pub use provider::{
    DEFAULT_AUTOCOMPLETE_LIMIT, DetourQuote, Location, PlaceDetails, PlaceSuggestion,
    RoutingProvider, minutes_from_seconds,
};
