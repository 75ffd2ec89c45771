//! Core domain for the campus rideshare matcher.
//!
//! Users register a weekly commute schedule and the [`MatchEngine`] pairs
//! them with compatible drivers or passengers. Time-of-day values, campus
//! lookup and detour quoting live here; persistence and network routing are
//! reached through the [`ScheduleStore`] and [`RoutingProvider`] traits so
//! adapters can be swapped without touching the matching rules.

mod availability;
mod batch;
mod campus;
mod coordinate;
mod matching;
mod schedule;
mod store;
mod time;

pub mod routing;

#[doc(hidden)]
pub mod test_support;

pub use availability::{AvailabilityError, DriverAvailability, driver_availability};
pub use batch::{map_with_concurrency, try_map_with_concurrency};
pub use campus::{CampusRegistry, UnknownCampus};
pub use coordinate::{EARTH_RADIUS_KM, GeoCoordinate, haversine_distance_km};
pub use matching::{
    DEFAULT_DETOUR_CONCURRENCY, DEGRADED_NOTE, DetourMatch, MatchEngine, MatchEngineConfig,
    MatchError, MatchOutcome, MatchRequest, MatchScore, RoutingFailurePolicy, TimeMatch,
};
pub use routing::{
    DEFAULT_AUTOCOMPLETE_LIMIT, DetourQuote, EstimatorConfig, EstimatorRoutingProvider, Location,
    PlaceDetails, PlaceSuggestion, RoutingError, RoutingProvider, minutes_from_seconds,
};
pub use schedule::{
    CandidateQuery, CandidateRow, CandidateUser, DayOfWeek, Direction, InvalidDayOfWeek,
    LabelError, RequesterProfile, Role, RoleGroup, ScheduleEntry, TimeBand,
};
pub use store::{ScheduleStore, StoreError};
pub use time::{MINUTES_PER_DAY, TimeError, TimeOfDay, format_time_of_day, parse_time_of_day};
