use thiserror::Error;

/// Errors from [`crate::RoutingProvider`] operations.
///
/// Variants carry the upstream endpoint name rather than the request URL so
/// credentials embedded in query strings never reach logs or callers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutingError {
    /// The place id is unknown to the provider.
    #[error("place {place_id:?} not found")]
    PlaceNotFound {
        /// The id that failed to resolve.
        place_id: String,
    },

    /// The upstream service answered with a non-success HTTP status.
    #[error("{endpoint} returned HTTP {status}: {body}")]
    Http {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Leading portion of the response body.
        body: String,
    },

    /// The request failed before a response arrived.
    #[error("network error calling {endpoint}: {message}")]
    Network {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// Transport error message.
        message: String,
    },

    /// The request exceeded its timeout.
    #[error("{endpoint} timed out after {timeout_secs}s")]
    Timeout {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// Configured timeout in seconds.
        timeout_secs: u64,
    },

    /// The response body was not the expected JSON document.
    #[error("{endpoint} returned invalid JSON (HTTP {status}): {body}")]
    InvalidJson {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// HTTP status code.
        status: u16,
        /// Leading portion of the response body.
        body: String,
    },

    /// The provider reported a non-success status in the response payload.
    #[error("{endpoint} returned status {status}{}", message.as_deref().map(|m| format!(": {m}")).unwrap_or_default())]
    Status {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// Upstream status code, e.g. `"ZERO_RESULTS"`.
        status: String,
        /// Upstream error message, when supplied.
        message: Option<String>,
    },

    /// A successful response lacked a required field.
    #[error("{endpoint} response missing {field}")]
    MissingField {
        /// Upstream endpoint name.
        endpoint: &'static str,
        /// Path of the missing field.
        field: &'static str,
    },
}
