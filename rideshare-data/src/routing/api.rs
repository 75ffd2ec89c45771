//! HTTP transport for the Google Maps web services.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::ACCEPT;
use rideshare_core::RoutingError;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use super::google::{
    AutocompleteResponse, DirectionsResponse, DistanceMatrixResponse, PlaceDetailsResponse,
};

/// Endpoint name of the Places Autocomplete service.
pub const AUTOCOMPLETE_ENDPOINT: &str = "place/autocomplete";
/// Endpoint name of the Place Details service.
pub const PLACE_DETAILS_ENDPOINT: &str = "place/details";
/// Endpoint name of the Distance Matrix service.
pub const DISTANCE_MATRIX_ENDPOINT: &str = "distancematrix";
/// Endpoint name of the Directions service.
pub const DIRECTIONS_ENDPOINT: &str = "directions";

/// Default user agent for mapping API requests.
pub const DEFAULT_USER_AGENT: &str = "campus-rideshare/0.1";

/// Default base URL of the Google Maps web services.
pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";

/// Default request timeout in seconds.
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Characters of a response body kept in error messages.
const BODY_SNIPPET_CHARS: usize = 200;

/// Place Details fields requested from the service.
const PLACE_DETAILS_FIELDS: &str = "place_id,name,formatted_address,geometry";

/// Error type for [`HttpMapsApi`] construction failures.
#[derive(Debug, Error)]
pub enum ProviderBuildError {
    /// Failed to build the HTTP client.
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
    /// No API key was configured.
    #[error("a Google Maps API key is required")]
    MissingApiKey,
    /// The base URL could not be parsed.
    #[error("invalid base URL {base_url:?}: {source}")]
    InvalidBaseUrl {
        /// The rejected URL.
        base_url: String,
        /// Parser failure.
        #[source]
        source: url::ParseError,
    },
}

/// Raw access to the four mapping endpoints the routing provider needs.
///
/// Implementations return the decoded wire response without interpreting its
/// `status`; transport failures are reported as [`RoutingError`]. Locations
/// are passed in their upstream string form (see
/// [`rideshare_core::Location`]).
#[async_trait]
pub trait MapsApi: Send + Sync {
    /// Query Places Autocomplete with free text.
    async fn place_autocomplete(&self, input: &str)
    -> Result<AutocompleteResponse, RoutingError>;

    /// Fetch Place Details for a place id.
    async fn place_details(&self, place_id: &str) -> Result<PlaceDetailsResponse, RoutingError>;

    /// Query a one-by-one driving Distance Matrix.
    async fn distance_matrix(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DistanceMatrixResponse, RoutingError>;

    /// Request driving directions, optionally through one waypoint.
    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        waypoint: Option<&str>,
    ) -> Result<DirectionsResponse, RoutingError>;
}

/// Configuration for [`HttpMapsApi`].
#[derive(Clone)]
pub struct MapsApiConfig {
    /// Base URL of the web services, without a trailing endpoint.
    pub base_url: String,
    /// API key appended to every request.
    pub api_key: String,
    /// Request timeout duration.
    pub timeout: Duration,
    /// User agent string for requests.
    pub user_agent: String,
}

impl fmt::Debug for MapsApiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapsApiConfig")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

impl MapsApiConfig {
    /// Create a configuration for the public Google endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_owned(),
            api_key: api_key.into(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_owned(),
        }
    }

    /// Set the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the user agent string.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

/// [`MapsApi`] over HTTPS using `reqwest`.
///
/// Requests are plain `GET`s with the key in the query string. Non-2xx
/// answers and bodies that are not JSON are reported with a short body
/// snippet; the request URL is never included in errors.
pub struct HttpMapsApi {
    client: Client,
    base: Url,
    config: MapsApiConfig,
}

impl fmt::Debug for HttpMapsApi {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpMapsApi")
            .field("client", &self.client)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl HttpMapsApi {
    /// Create a client for the public endpoint with the given key.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the HTTP client fails to
    /// build.
    pub fn new(api_key: impl Into<String>) -> Result<Self, ProviderBuildError> {
        Self::with_config(MapsApiConfig::new(api_key))
    }

    /// Create a client with explicit configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the base URL does not parse or
    /// the HTTP client fails to build.
    pub fn with_config(config: MapsApiConfig) -> Result<Self, ProviderBuildError> {
        if config.api_key.trim().is_empty() {
            return Err(ProviderBuildError::MissingApiKey);
        }
        let base =
            Url::parse(&config.base_url).map_err(|source| ProviderBuildError::InvalidBaseUrl {
                base_url: config.base_url.clone(),
                source,
            })?;
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .connect_timeout(config.timeout)
            .timeout(config.timeout)
            .build()
            .map_err(ProviderBuildError::HttpClient)?;
        Ok(Self {
            client,
            base,
            config,
        })
    }

    /// Configuration this client was built with.
    #[must_use]
    pub fn config(&self) -> &MapsApiConfig {
        &self.config
    }

    /// Build `{base}/{endpoint}/json?{params}&key=...`.
    fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Url {
        let mut url = self.base.clone();
        let path = format!("{}/{endpoint}/json", self.base.path().trim_end_matches('/'));
        url.set_path(&path);
        url.query_pairs_mut()
            .extend_pairs(params)
            .append_pair("key", &self.config.api_key);
        url
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        params: &[(&str, &str)],
    ) -> Result<T, RoutingError> {
        let url = self.endpoint_url(endpoint, params);
        let response = self
            .client
            .get(url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .map_err(|err| self.convert_reqwest_error(endpoint, err))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|err| self.convert_reqwest_error(endpoint, err))?;

        if !status.is_success() {
            return Err(RoutingError::Http {
                endpoint,
                status: status.as_u16(),
                body: snippet(&body),
            });
        }

        serde_json::from_str(&body).map_err(|_| RoutingError::InvalidJson {
            endpoint,
            status: status.as_u16(),
            body: snippet(&body),
        })
    }

    /// Convert a reqwest error to a `RoutingError`, discarding the URL.
    fn convert_reqwest_error(&self, endpoint: &'static str, error: reqwest::Error) -> RoutingError {
        if error.is_timeout() {
            return RoutingError::Timeout {
                endpoint,
                timeout_secs: self.config.timeout.as_secs(),
            };
        }

        if let Some(status) = error.status() {
            return RoutingError::Http {
                endpoint,
                status: status.as_u16(),
                body: String::new(),
            };
        }

        RoutingError::Network {
            endpoint,
            message: error.without_url().to_string(),
        }
    }
}

fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}

#[async_trait]
impl MapsApi for HttpMapsApi {
    async fn place_autocomplete(
        &self,
        input: &str,
    ) -> Result<AutocompleteResponse, RoutingError> {
        self.get_json(AUTOCOMPLETE_ENDPOINT, &[("input", input)])
            .await
    }

    async fn place_details(&self, place_id: &str) -> Result<PlaceDetailsResponse, RoutingError> {
        self.get_json(
            PLACE_DETAILS_ENDPOINT,
            &[("place_id", place_id), ("fields", PLACE_DETAILS_FIELDS)],
        )
        .await
    }

    async fn distance_matrix(
        &self,
        origin: &str,
        destination: &str,
    ) -> Result<DistanceMatrixResponse, RoutingError> {
        self.get_json(
            DISTANCE_MATRIX_ENDPOINT,
            &[
                ("origins", origin),
                ("destinations", destination),
                ("mode", "driving"),
            ],
        )
        .await
    }

    async fn directions(
        &self,
        origin: &str,
        destination: &str,
        waypoint: Option<&str>,
    ) -> Result<DirectionsResponse, RoutingError> {
        let mut params = vec![("origin", origin), ("destination", destination)];
        if let Some(waypoint) = waypoint {
            params.push(("waypoints", waypoint));
        }
        self.get_json(DIRECTIONS_ENDPOINT, &params).await
    }
}
