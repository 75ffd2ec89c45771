//! Network-free routing based on straight-line distance.
//!
//! Durations are `ceil(distance_km / speed_kmh * 60 + overhead_minutes)`.
//! Place lookups are served from a fixed catalogue so address entry works in
//! offline environments and tests.

use async_trait::async_trait;

use crate::{GeoCoordinate, haversine_distance_km};

use super::error::RoutingError;
use super::provider::{
    DetourQuote, Location, PlaceDetails, PlaceSuggestion, RoutingProvider, ceil_minutes,
};

/// Default assumed driving speed.
const DEFAULT_SPEED_KMH: f64 = 35.0;

/// Default fixed per-trip overhead.
const DEFAULT_OVERHEAD_MINUTES: f64 = 2.0;

/// Tuning for [`EstimatorRoutingProvider`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EstimatorConfig {
    /// Assumed average speed in km/h. Must be positive.
    pub speed_kmh: f64,
    /// Minutes added to every trip for parking, lights and the like.
    pub overhead_minutes: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            speed_kmh: DEFAULT_SPEED_KMH,
            overhead_minutes: DEFAULT_OVERHEAD_MINUTES,
        }
    }
}

impl EstimatorConfig {
    /// Set the assumed speed.
    #[must_use]
    pub fn with_speed_kmh(mut self, speed_kmh: f64) -> Self {
        self.speed_kmh = speed_kmh;
        self
    }

    /// Set the per-trip overhead.
    #[must_use]
    pub fn with_overhead_minutes(mut self, overhead_minutes: f64) -> Self {
        self.overhead_minutes = overhead_minutes;
        self
    }
}

const CATALOGUE: [(&str, &str, &str, f64, f64); 10] = [
    (
        "ubc-campus",
        "University of British Columbia (UBC) Campus",
        "2329 West Mall, Vancouver, BC V6T 1Z4, Canada",
        49.2606,
        -123.2460,
    ),
    (
        "ubc-bookstore",
        "UBC Bookstore",
        "6200 University Blvd, Vancouver, BC V6T 1Z4, Canada",
        49.2602,
        -123.2405,
    ),
    (
        "ubc-aquatic",
        "UBC Aquatic Centre",
        "6080 Student Union Blvd, Vancouver, BC V6T 1Z1, Canada",
        49.2667,
        -123.2485,
    ),
    (
        "kitsilano",
        "Kitsilano Beach",
        "1499 Arbutus St, Vancouver, BC V6J 5N2, Canada",
        49.2744,
        -123.1545,
    ),
    (
        "granville-island",
        "Granville Island Public Market",
        "1689 Johnston St, Vancouver, BC V6H 3R9, Canada",
        49.2723,
        -123.1340,
    ),
    (
        "downtown-waterfront",
        "Waterfront Station",
        "601 W Cordova St, Vancouver, BC V6B 1G1, Canada",
        49.2856,
        -123.1116,
    ),
    (
        "metrotown",
        "Metropolis at Metrotown",
        "4700 Kingsway, Burnaby, BC V5H 4N2, Canada",
        49.2266,
        -123.0036,
    ),
    (
        "ubc-hospital",
        "UBC Hospital",
        "2211 Wesbrook Mall, Vancouver, BC V6T 2B5, Canada",
        49.2647,
        -123.2480,
    ),
    (
        "gas-town",
        "Gastown Steam Clock",
        "305 Water St, Vancouver, BC V6B 1B9, Canada",
        49.2844,
        -123.1087,
    ),
    (
        "canada-place",
        "Canada Place",
        "999 Canada Pl, Vancouver, BC V6C 3T4, Canada",
        49.2888,
        -123.1114,
    ),
];

fn default_places() -> Vec<PlaceDetails> {
    CATALOGUE
        .iter()
        .map(|&(place_id, label, address, lat, lng)| PlaceDetails {
            place_id: place_id.to_owned(),
            label: label.to_owned(),
            address: address.to_owned(),
            location: GeoCoordinate::new(lat, lng),
        })
        .collect()
}

/// Deterministic [`RoutingProvider`] that needs no network access.
///
/// # Examples
///
/// ```
/// use rideshare_core::{EstimatorRoutingProvider, GeoCoordinate};
///
/// let estimator = EstimatorRoutingProvider::new();
/// let campus = GeoCoordinate::new(49.2606, -123.2460);
/// // A zero-length trip still pays the fixed overhead.
/// assert_eq!(estimator.estimate_minutes(campus, campus), 2);
/// ```
#[derive(Debug, Clone)]
pub struct EstimatorRoutingProvider {
    config: EstimatorConfig,
    places: Vec<PlaceDetails>,
}

impl Default for EstimatorRoutingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl EstimatorRoutingProvider {
    /// Create an estimator with default tuning and the built-in catalogue.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(EstimatorConfig::default())
    }

    /// Create an estimator with explicit tuning.
    #[must_use]
    pub fn with_config(config: EstimatorConfig) -> Self {
        Self {
            config,
            places: default_places(),
        }
    }

    /// Replace the place catalogue.
    #[must_use]
    pub fn with_places(mut self, places: Vec<PlaceDetails>) -> Self {
        self.places = places;
        self
    }

    /// Active tuning.
    #[must_use]
    pub fn config(&self) -> EstimatorConfig {
        self.config
    }

    /// Estimated driving minutes between two coordinates.
    #[must_use]
    pub fn estimate_minutes(&self, origin: GeoCoordinate, destination: GeoCoordinate) -> u32 {
        let km = haversine_distance_km(origin, destination);
        ceil_minutes(km / self.config.speed_kmh * 60.0 + self.config.overhead_minutes)
    }

    /// Estimated detour for stopping at `stop` between `origin` and
    /// `destination`.
    #[must_use]
    pub fn estimate_detour(
        &self,
        origin: GeoCoordinate,
        stop: GeoCoordinate,
        destination: GeoCoordinate,
    ) -> DetourQuote {
        let base = self.estimate_minutes(origin, destination);
        let via = self
            .estimate_minutes(origin, stop)
            .saturating_add(self.estimate_minutes(stop, destination));
        DetourQuote::new(base, via)
    }

    fn find_place(&self, place_id: &str) -> Result<&PlaceDetails, RoutingError> {
        self.places
            .iter()
            .find(|place| place.place_id == place_id)
            .ok_or_else(|| RoutingError::PlaceNotFound {
                place_id: place_id.to_owned(),
            })
    }

    fn resolve(&self, location: &Location) -> Result<GeoCoordinate, RoutingError> {
        match location {
            Location::Coordinate(point) => Ok(*point),
            Location::Place(id) => self.find_place(id).map(|place| place.location),
        }
    }
}

#[async_trait]
impl RoutingProvider for EstimatorRoutingProvider {
    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceSuggestion>, RoutingError> {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return Ok(Vec::new());
        }
        Ok(self
            .places
            .iter()
            .filter(|place| {
                place.label.to_lowercase().contains(&needle)
                    || place.address.to_lowercase().contains(&needle)
            })
            .take(limit)
            .map(|place| PlaceSuggestion {
                place_id: place.place_id.clone(),
                label: place.label.clone(),
            })
            .collect())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, RoutingError> {
        self.find_place(place_id).cloned()
    }

    async fn route_duration_minutes(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<u32, RoutingError> {
        Ok(self.estimate_minutes(self.resolve(origin)?, self.resolve(destination)?))
    }

    async fn detour_extra_minutes(
        &self,
        driver_origin: &Location,
        passenger_stop: &Location,
        destination: &Location,
    ) -> Result<DetourQuote, RoutingError> {
        Ok(self.estimate_detour(
            self.resolve(driver_origin)?,
            self.resolve(passenger_stop)?,
            self.resolve(destination)?,
        ))
    }
}
