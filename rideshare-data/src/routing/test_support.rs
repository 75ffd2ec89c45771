//! Test utilities for the mapping API.
//!
//! [`StubMapsApi`] returns canned wire responses per endpoint and records the
//! requests it receives, so provider behaviour (caching, fallback, waypoint
//! handling) can be checked without network access.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use rideshare_core::RoutingError;

use super::api::MapsApi;
use super::google::{
    AutocompleteResponse, DirectionsLeg, DirectionsResponse, DirectionsRoute,
    DistanceMatrixResponse, DurationValue, MatrixElement, MatrixRow, PlaceDetailsResponse,
    STATUS_NOT_FOUND, STATUS_OK, STATUS_ZERO_RESULTS,
};

/// Arguments of a recorded directions request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectionsCall {
    /// Upstream origin string.
    pub origin: String,
    /// Upstream destination string.
    pub destination: String,
    /// Upstream waypoint string, if any.
    pub waypoint: Option<String>,
}

/// Stub [`MapsApi`] for testing.
///
/// Unconfigured endpoints answer with an empty `ZERO_RESULTS` (autocomplete,
/// matrix, directions) or `NOT_FOUND` (place details) payload.
///
/// # Example
///
/// ```
/// use rideshare_data::routing::test_support::{StubMapsApi, matrix_with_seconds};
///
/// let api = StubMapsApi::default().with_matrix(Ok(matrix_with_seconds(300.0)));
/// assert_eq!(api.matrix_calls(), 0);
/// ```
#[derive(Debug)]
pub struct StubMapsApi {
    autocomplete: Result<AutocompleteResponse, RoutingError>,
    details: Result<PlaceDetailsResponse, RoutingError>,
    matrix: Result<DistanceMatrixResponse, RoutingError>,
    directions: Result<DirectionsResponse, RoutingError>,
    waypoint_directions: Option<Result<DirectionsResponse, RoutingError>>,
    autocomplete_inputs: Mutex<Vec<String>>,
    matrix_calls: AtomicUsize,
    directions_calls: Mutex<Vec<DirectionsCall>>,
}

impl Default for StubMapsApi {
    fn default() -> Self {
        Self {
            autocomplete: Ok(AutocompleteResponse {
                status: STATUS_ZERO_RESULTS.to_owned(),
                ..AutocompleteResponse::default()
            }),
            details: Ok(PlaceDetailsResponse {
                status: STATUS_NOT_FOUND.to_owned(),
                ..PlaceDetailsResponse::default()
            }),
            matrix: Ok(DistanceMatrixResponse {
                status: STATUS_ZERO_RESULTS.to_owned(),
                ..DistanceMatrixResponse::default()
            }),
            directions: Ok(DirectionsResponse {
                status: STATUS_ZERO_RESULTS.to_owned(),
                ..DirectionsResponse::default()
            }),
            waypoint_directions: None,
            autocomplete_inputs: Mutex::default(),
            matrix_calls: AtomicUsize::new(0),
            directions_calls: Mutex::default(),
        }
    }
}

impl StubMapsApi {
    /// Answer autocomplete requests with `response`.
    #[must_use]
    pub fn with_autocomplete(mut self, response: Result<AutocompleteResponse, RoutingError>) -> Self {
        self.autocomplete = response;
        self
    }

    /// Answer place-details requests with `response`.
    #[must_use]
    pub fn with_details(mut self, response: Result<PlaceDetailsResponse, RoutingError>) -> Self {
        self.details = response;
        self
    }

    /// Answer distance-matrix requests with `response`.
    #[must_use]
    pub fn with_matrix(mut self, response: Result<DistanceMatrixResponse, RoutingError>) -> Self {
        self.matrix = response;
        self
    }

    /// Answer directions requests with `response`.
    ///
    /// Also used for waypoint requests unless
    /// [`StubMapsApi::with_waypoint_directions`] is set.
    #[must_use]
    pub fn with_directions(mut self, response: Result<DirectionsResponse, RoutingError>) -> Self {
        self.directions = response;
        self
    }

    /// Answer directions requests that carry a waypoint with `response`.
    #[must_use]
    pub fn with_waypoint_directions(
        mut self,
        response: Result<DirectionsResponse, RoutingError>,
    ) -> Self {
        self.waypoint_directions = Some(response);
        self
    }

    /// Trimmed inputs received by autocomplete, in call order.
    #[must_use]
    pub fn autocomplete_inputs(&self) -> Vec<String> {
        self.autocomplete_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of distance-matrix requests received.
    #[must_use]
    pub fn matrix_calls(&self) -> usize {
        self.matrix_calls.load(Ordering::SeqCst)
    }

    /// Directions requests received, in call order.
    #[must_use]
    pub fn directions_calls(&self) -> Vec<DirectionsCall> {
        self.directions_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl MapsApi for StubMapsApi {
    async fn place_autocomplete(
        &self,
        input: &str,
    ) -> Result<AutocompleteResponse, RoutingError> {
        self.autocomplete_inputs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(input.to_owned());
        self.autocomplete.clone()
    }

    async fn place_details(&self, _place_id: &str) -> Result<PlaceDetailsResponse, RoutingError> {
        self.details.clone()
    }

    async fn distance_matrix(
        &self,
        _origin: &str,
        _destination: &str,
    ) -> Result<DistanceMatrixResponse, RoutingError> {
        self.matrix_calls.fetch_add(1, Ordering::SeqCst);
        self.matrix.clone()
    }

    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        waypoint: Option<&str>,
    ) -> Result<DirectionsResponse, RoutingError> {
        self.directions_calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(DirectionsCall {
                origin: origin.to_owned(),
                destination: destination.to_owned(),
                waypoint: waypoint.map(str::to_owned),
            });
        match (&self.waypoint_directions, waypoint) {
            (Some(response), Some(_)) => response.clone(),
            _ => self.directions.clone(),
        }
    }
}

/// A one-by-one matrix whose element has `status` and optional duration.
#[must_use]
pub fn matrix_element(status: &str, seconds: Option<f64>) -> DistanceMatrixResponse {
    DistanceMatrixResponse {
        status: STATUS_OK.to_owned(),
        error_message: None,
        rows: vec![MatrixRow {
            elements: vec![MatrixElement {
                status: status.to_owned(),
                duration: seconds.map(|value| DurationValue { value }),
                duration_in_traffic: None,
            }],
        }],
    }
}

/// A successful one-by-one matrix lasting `seconds`.
#[must_use]
pub fn matrix_with_seconds(seconds: f64) -> DistanceMatrixResponse {
    matrix_element(STATUS_OK, Some(seconds))
}

/// A successful directions response with one leg per entry of `seconds`.
#[must_use]
pub fn directions_with_legs(seconds: &[f64]) -> DirectionsResponse {
    DirectionsResponse {
        status: STATUS_OK.to_owned(),
        error_message: None,
        routes: vec![DirectionsRoute {
            legs: seconds
                .iter()
                .map(|&value| DirectionsLeg {
                    duration: Some(DurationValue { value }),
                })
                .collect(),
        }],
    }
}
