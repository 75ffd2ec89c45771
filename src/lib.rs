//! Facade crate for the campus rideshare matcher.
//!
//! This crate re-exports the core domain types and exposes the SQLite and
//! mapping-API adapters behind the `data` feature.

#![forbid(unsafe_code)]

pub use rideshare_core::{
    AvailabilityError, CampusRegistry, DayOfWeek, DetourMatch, DetourQuote, Direction,
    DriverAvailability, EstimatorConfig, EstimatorRoutingProvider, GeoCoordinate, Location,
    MatchEngine, MatchEngineConfig, MatchError, MatchOutcome, MatchRequest, MatchScore,
    PlaceDetails, PlaceSuggestion, Role, RoleGroup, RoutingError, RoutingFailurePolicy,
    RoutingProvider, ScheduleEntry, ScheduleStore, StoreError, TimeError, TimeMatch, TimeOfDay,
    UnknownCampus, driver_availability, haversine_distance_km,
};

#[cfg(feature = "data")]
pub use rideshare_data::{
    Dataset, MapsApiConfig, MapsRoutingProvider, SqliteScheduleStore, load_dataset,
    persist_dataset,
};
