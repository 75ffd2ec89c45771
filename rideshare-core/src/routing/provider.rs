//! Routing capability trait and the values it exchanges.

use std::fmt;

use async_trait::async_trait;

use crate::GeoCoordinate;

use super::error::RoutingError;

/// Suggestion count used when callers do not choose a limit.
pub const DEFAULT_AUTOCOMPLETE_LIMIT: usize = 5;

/// A place suggested for free-text address entry.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceSuggestion {
    /// Provider-specific place id.
    pub place_id: String,
    /// Human-readable description.
    pub label: String,
}

/// Full details of a resolved place.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaceDetails {
    /// Provider-specific place id.
    pub place_id: String,
    /// Short name.
    pub label: String,
    /// Formatted postal address.
    pub address: String,
    /// Position of the place, flattened to `lat`/`lng` when serialised.
    #[cfg_attr(feature = "serde", serde(flatten))]
    pub location: GeoCoordinate,
}

/// A route endpoint understood by routing providers.
///
/// The display form is the string passed upstream: `"lat,lng"` for
/// coordinates and `"place_id:<id>"` for provider place ids.
///
/// ```
/// use rideshare_core::{GeoCoordinate, Location};
///
/// let home = Location::from(GeoCoordinate::new(49.29, -123.12));
/// assert_eq!(home.to_string(), "49.29,-123.12");
/// assert_eq!(Location::Place("abc".into()).to_string(), "place_id:abc");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    /// A latitude/longitude pair.
    Coordinate(GeoCoordinate),
    /// A provider place id.
    Place(String),
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Coordinate(point) => write!(f, "{},{}", point.lat, point.lng),
            Self::Place(id) => write!(f, "place_id:{id}"),
        }
    }
}

impl From<GeoCoordinate> for Location {
    fn from(point: GeoCoordinate) -> Self {
        Self::Coordinate(point)
    }
}

/// Cost of routing a driver through an intermediate stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DetourQuote {
    /// Direct origin to destination duration in minutes.
    pub base_minutes: u32,
    /// Origin to stop plus stop to destination, in minutes.
    pub via_minutes: u32,
    /// `via_minutes - base_minutes`, clamped at zero.
    pub extra_minutes: u32,
}

impl DetourQuote {
    /// Build a quote, deriving the non-negative extra time.
    ///
    /// ```
    /// use rideshare_core::DetourQuote;
    ///
    /// assert_eq!(DetourQuote::new(20, 26).extra_minutes, 6);
    /// assert_eq!(DetourQuote::new(20, 18).extra_minutes, 0);
    /// ```
    #[must_use]
    pub const fn new(base_minutes: u32, via_minutes: u32) -> Self {
        Self {
            base_minutes,
            via_minutes,
            extra_minutes: via_minutes.saturating_sub(base_minutes),
        }
    }
}

/// Convert an upstream duration in seconds to whole minutes, rounding up.
///
/// Negative and `NaN` inputs yield zero.
#[must_use]
pub fn minutes_from_seconds(seconds: f64) -> u32 {
    ceil_minutes(seconds / 60.0)
}

/// Round a fractional minute count up to a whole number, flooring at zero.
pub(crate) fn ceil_minutes(minutes: f64) -> u32 {
    if minutes.is_nan() || minutes <= 0.0 {
        return 0;
    }
    let minutes = minutes.ceil();
    if minutes >= f64::from(u32::MAX) {
        return u32::MAX;
    }
    whole_to_u32(minutes)
}

#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "callers pass a positive whole number below u32::MAX"
)]
fn whole_to_u32(value: f64) -> u32 {
    value as u32
}

/// Answers route-duration and detour questions and resolves places.
///
/// Implementations are shared between concurrent matching tasks and must be
/// `Send + Sync`. The haversine estimator completes without suspending; the
/// mapping-API provider in the data crate performs network I/O.
#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Suggest at most `limit` places for `query`.
    ///
    /// An empty or whitespace-only query yields an empty list, never an error.
    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceSuggestion>, RoutingError>;

    /// Resolve a place id.
    ///
    /// Fails with [`RoutingError::PlaceNotFound`] for unknown ids.
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, RoutingError>;

    /// One-way driving time from `origin` to `destination` in whole minutes.
    async fn route_duration_minutes(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<u32, RoutingError>;

    /// Extra time for a driver at `driver_origin` who stops at
    /// `passenger_stop` before continuing to `destination`.
    async fn detour_extra_minutes(
        &self,
        driver_origin: &Location,
        passenger_stop: &Location,
        destination: &Location,
    ) -> Result<DetourQuote, RoutingError>;
}
