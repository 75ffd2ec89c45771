//! `RoutingProvider` backed by the Google Maps web services.
//!
//! Durations come from the Distance Matrix service, falling back to
//! Directions when the matrix call fails for any reason. Detour quotes use
//! two Directions calls: one direct and one through the stop. Both results
//! are memoised in [`TtlCache`]s keyed by the upstream location strings.

use std::time::Duration;

use async_trait::async_trait;
use log::debug;
use rideshare_core::{
    DetourQuote, GeoCoordinate, Location, PlaceDetails, PlaceSuggestion, RoutingError,
    RoutingProvider, minutes_from_seconds,
};

use super::api::{
    AUTOCOMPLETE_ENDPOINT, DIRECTIONS_ENDPOINT, DISTANCE_MATRIX_ENDPOINT, HttpMapsApi, MapsApi,
    MapsApiConfig, PLACE_DETAILS_ENDPOINT, ProviderBuildError,
};
use super::cache::TtlCache;
use super::google::{DirectionsLeg, STATUS_NOT_FOUND, STATUS_OK};

/// Lifetime of cached durations and detour quotes.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(5 * 60);

/// Routing provider that talks to a [`MapsApi`].
///
/// # Example
///
/// ```no_run
/// use rideshare_core::{GeoCoordinate, Location, RoutingProvider};
/// use rideshare_data::routing::{MapsApiConfig, MapsRoutingProvider};
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = MapsRoutingProvider::from_config(MapsApiConfig::new("api-key"))?;
/// let home = Location::from(GeoCoordinate::new(49.2634, -123.1686));
/// let campus = Location::from(GeoCoordinate::new(49.2606, -123.2460));
/// let minutes = provider.route_duration_minutes(&home, &campus).await?;
/// # let _ = minutes;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct MapsRoutingProvider<A> {
    api: A,
    durations: TtlCache<String, u32>,
    detours: TtlCache<String, DetourQuote>,
}

impl MapsRoutingProvider<HttpMapsApi> {
    /// Build a provider over HTTPS.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built from `config`.
    pub fn from_config(config: MapsApiConfig) -> Result<Self, ProviderBuildError> {
        Ok(Self::new(HttpMapsApi::with_config(config)?))
    }
}

impl<A: MapsApi> MapsRoutingProvider<A> {
    /// Wrap `api` with empty caches using [`DEFAULT_CACHE_TTL`].
    #[must_use]
    pub fn new(api: A) -> Self {
        Self {
            api,
            durations: TtlCache::new(DEFAULT_CACHE_TTL),
            detours: TtlCache::new(DEFAULT_CACHE_TTL),
        }
    }

    /// Replace both caches with empty ones using `ttl`.
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.durations = TtlCache::new(ttl);
        self.detours = TtlCache::new(ttl);
        self
    }

    /// The underlying API client.
    #[must_use]
    pub fn api(&self) -> &A {
        &self.api
    }

    async fn matrix_minutes(&self, origin: &str, destination: &str) -> Result<u32, RoutingError> {
        let response = self.api.distance_matrix(origin, destination).await?;
        if !response.is_ok() {
            return Err(RoutingError::Status {
                endpoint: DISTANCE_MATRIX_ENDPOINT,
                status: response.status,
                message: response.error_message,
            });
        }
        let element = response
            .first_element()
            .ok_or(RoutingError::MissingField {
                endpoint: DISTANCE_MATRIX_ENDPOINT,
                field: "rows[0].elements[0]",
            })?;
        if element.status != STATUS_OK {
            return Err(RoutingError::Status {
                endpoint: DISTANCE_MATRIX_ENDPOINT,
                status: element.status.clone(),
                message: None,
            });
        }
        let seconds = element.seconds().ok_or(RoutingError::MissingField {
            endpoint: DISTANCE_MATRIX_ENDPOINT,
            field: "rows[0].elements[0].duration",
        })?;
        Ok(minutes_from_seconds(seconds))
    }

    /// Leg durations in seconds of the first route.
    async fn directions_legs(
        &self,
        origin: &str,
        destination: &str,
        waypoint: Option<&str>,
    ) -> Result<Vec<f64>, RoutingError> {
        let response = self.api.directions(origin, destination, waypoint).await?;
        if !response.is_ok() {
            return Err(RoutingError::Status {
                endpoint: DIRECTIONS_ENDPOINT,
                status: response.status,
                message: response.error_message,
            });
        }
        response
            .first_route_legs()
            .iter()
            .map(leg_seconds)
            .collect()
    }

    async fn direct_directions_minutes(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<u32, RoutingError> {
        let legs = self.directions_legs(origin, destination, None).await?;
        let first = legs.first().ok_or(RoutingError::MissingField {
            endpoint: DIRECTIONS_ENDPOINT,
            field: "routes[0].legs[0]",
        })?;
        Ok(minutes_from_seconds(*first))
    }

    async fn via_directions_minutes(
        &self,
        origin: &str,
        waypoint: &str,
        destination: &str,
    ) -> Result<u32, RoutingError> {
        let legs = self
            .directions_legs(origin, destination, Some(waypoint))
            .await?;
        match legs.as_slice() {
            [to_stop, from_stop, ..] => Ok(minutes_from_seconds(to_stop + from_stop)),
            _ => Err(RoutingError::MissingField {
                endpoint: DIRECTIONS_ENDPOINT,
                field: "routes[0].legs[1]",
            }),
        }
    }
}

fn leg_seconds(leg: &DirectionsLeg) -> Result<f64, RoutingError> {
    leg.duration
        .map(|duration| duration.value)
        .ok_or(RoutingError::MissingField {
            endpoint: DIRECTIONS_ENDPOINT,
            field: "routes[0].legs[].duration",
        })
}

#[async_trait]
impl<A: MapsApi> RoutingProvider for MapsRoutingProvider<A> {
    async fn autocomplete(
        &self,
        query: &str,
        limit: usize,
    ) -> Result<Vec<PlaceSuggestion>, RoutingError> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let response = self.api.place_autocomplete(query).await?;
        if !response.is_ok() {
            return Err(RoutingError::Status {
                endpoint: AUTOCOMPLETE_ENDPOINT,
                status: response.status,
                message: response.error_message,
            });
        }
        Ok(response
            .predictions
            .into_iter()
            .take(limit)
            .map(|prediction| PlaceSuggestion {
                place_id: prediction.place_id,
                label: prediction.description,
            })
            .collect())
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetails, RoutingError> {
        let response = self.api.place_details(place_id).await?;
        if response.status == STATUS_NOT_FOUND {
            return Err(RoutingError::PlaceNotFound {
                place_id: place_id.to_owned(),
            });
        }
        if !response.is_ok() {
            return Err(RoutingError::Status {
                endpoint: PLACE_DETAILS_ENDPOINT,
                status: response.status,
                message: response.error_message,
            });
        }
        let result = response.result.ok_or(RoutingError::MissingField {
            endpoint: PLACE_DETAILS_ENDPOINT,
            field: "result",
        })?;
        let geometry = result.geometry.ok_or(RoutingError::MissingField {
            endpoint: PLACE_DETAILS_ENDPOINT,
            field: "result.geometry.location",
        })?;
        Ok(PlaceDetails {
            place_id: result.place_id.unwrap_or_else(|| place_id.to_owned()),
            label: result.name.unwrap_or_default(),
            address: result.formatted_address.unwrap_or_default(),
            location: GeoCoordinate::new(geometry.location.lat, geometry.location.lng),
        })
    }

    async fn route_duration_minutes(
        &self,
        origin: &Location,
        destination: &Location,
    ) -> Result<u32, RoutingError> {
        let (origin, destination) = (origin.to_string(), destination.to_string());
        let key = format!("dur|{origin}|{destination}");
        if let Some(minutes) = self.durations.get(&key) {
            debug!("duration cache hit for {key}");
            return Ok(minutes);
        }

        let minutes = match self.matrix_minutes(&origin, &destination).await {
            Ok(minutes) => minutes,
            Err(err) => {
                debug!("distance matrix failed ({err}); falling back to directions");
                self.direct_directions_minutes(&origin, &destination)
                    .await?
            }
        };
        self.durations.insert(key, minutes);
        Ok(minutes)
    }

    async fn detour_extra_minutes(
        &self,
        origin: &Location,
        waypoint: &Location,
        destination: &Location,
    ) -> Result<DetourQuote, RoutingError> {
        let (origin, waypoint, destination) = (
            origin.to_string(),
            waypoint.to_string(),
            destination.to_string(),
        );
        let key = format!("detour|{origin}|{waypoint}|{destination}");
        if let Some(quote) = self.detours.get(&key) {
            debug!("detour cache hit for {key}");
            return Ok(quote);
        }

        let (base, via) = tokio::try_join!(
            self.direct_directions_minutes(&origin, &destination),
            self.via_directions_minutes(&origin, &waypoint, &destination),
        )?;
        let quote = DetourQuote::new(base, via);
        self.detours.insert(key, quote);
        Ok(quote)
    }
}
