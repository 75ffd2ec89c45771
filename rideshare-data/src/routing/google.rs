//! Google Maps Platform response types.
//!
//! Only the fields the routing provider reads are modelled. Every response
//! carries a top-level `status` (`"OK"` on success) and an optional
//! `error_message`.
//!
//! See: <https://developers.google.com/maps/documentation>

use serde::Deserialize;

/// Status value for a successful response or matrix element.
pub const STATUS_OK: &str = "OK";

/// Status value for a successful query with no results.
pub const STATUS_ZERO_RESULTS: &str = "ZERO_RESULTS";

/// Status value for an unknown place id.
pub const STATUS_NOT_FOUND: &str = "NOT_FOUND";

/// A `{ "value": seconds }` duration object.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct DurationValue {
    /// Duration in seconds.
    pub value: f64,
}

/// A latitude/longitude pair.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct LatLng {
    /// Latitude in degrees.
    pub lat: f64,
    /// Longitude in degrees.
    pub lng: f64,
}

/// Places Autocomplete response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AutocompleteResponse {
    /// Top-level status.
    pub status: String,
    /// Diagnostic message accompanying a failure status.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Suggestions in relevance order.
    #[serde(default)]
    pub predictions: Vec<Prediction>,
}

/// One autocomplete suggestion.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Prediction {
    /// Google place id.
    pub place_id: String,
    /// Full human-readable description.
    pub description: String,
}

/// Place Details response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceDetailsResponse {
    /// Top-level status.
    pub status: String,
    /// Diagnostic message accompanying a failure status.
    #[serde(default)]
    pub error_message: Option<String>,
    /// The resolved place.
    #[serde(default)]
    pub result: Option<PlaceResult>,
}

/// Fields requested from Place Details.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct PlaceResult {
    /// Google place id.
    #[serde(default)]
    pub place_id: Option<String>,
    /// Short place name.
    #[serde(default)]
    pub name: Option<String>,
    /// Postal address.
    #[serde(default)]
    pub formatted_address: Option<String>,
    /// Position of the place.
    #[serde(default)]
    pub geometry: Option<Geometry>,
}

/// Geometry block of a place.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Geometry {
    /// Representative point.
    pub location: LatLng,
}

/// Distance Matrix response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DistanceMatrixResponse {
    /// Top-level status.
    pub status: String,
    /// Diagnostic message accompanying a failure status.
    #[serde(default)]
    pub error_message: Option<String>,
    /// One row per origin.
    #[serde(default)]
    pub rows: Vec<MatrixRow>,
}

/// Matrix row for one origin.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatrixRow {
    /// One element per destination.
    #[serde(default)]
    pub elements: Vec<MatrixElement>,
}

/// Result for one origin/destination pair.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MatrixElement {
    /// Element status; `"OK"` when a route was found.
    pub status: String,
    /// Typical duration.
    #[serde(default)]
    pub duration: Option<DurationValue>,
    /// Duration given current traffic, when available.
    #[serde(default)]
    pub duration_in_traffic: Option<DurationValue>,
}

/// Directions response.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DirectionsResponse {
    /// Top-level status.
    pub status: String,
    /// Diagnostic message accompanying a failure status.
    #[serde(default)]
    pub error_message: Option<String>,
    /// Candidate routes, best first.
    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

/// A single route.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct DirectionsRoute {
    /// One leg per consecutive pair of origin, waypoints and destination.
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

/// A leg between two consecutive stops.
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
pub struct DirectionsLeg {
    /// Leg duration.
    #[serde(default)]
    pub duration: Option<DurationValue>,
}

impl AutocompleteResponse {
    /// Whether the query succeeded, including with no results.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK || self.status == STATUS_ZERO_RESULTS
    }
}

impl PlaceDetailsResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }
}

impl DistanceMatrixResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// The element for the first origin and first destination.
    #[must_use]
    pub fn first_element(&self) -> Option<&MatrixElement> {
        self.rows.first()?.elements.first()
    }
}

impl MatrixElement {
    /// Duration in seconds, preferring the traffic-aware value.
    #[must_use]
    pub fn seconds(&self) -> Option<f64> {
        self.duration_in_traffic
            .or(self.duration)
            .map(|duration| duration.value)
    }
}

impl DirectionsResponse {
    /// Check if the response indicates success.
    #[must_use]
    pub fn is_ok(&self) -> bool {
        self.status == STATUS_OK
    }

    /// Legs of the first route, or an empty slice.
    #[must_use]
    pub fn first_route_legs(&self) -> &[DirectionsLeg] {
        self.routes.first().map_or(&[], |route| route.legs.as_slice())
    }
}
