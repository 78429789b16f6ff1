use impact_core::Endpoint;
use thiserror::Error;

/// Errors produced while resolving an endpoint location.
#[derive(Debug, Error)]
pub enum GeocodeError {
    /// The underlying HTTP client could not be constructed or the base URL
    /// is not a valid URL.
    #[error("geocoder setup error: {0}")]
    Setup(String),

    /// Network or TLS failure, or a non-2xx HTTP status, talking to the
    /// geocoding service.
    #[error("{endpoint} geocode transport error: {source}")]
    Transport {
        endpoint: Endpoint,
        #[source]
        source: reqwest::Error,
    },

    /// The service answered with a non-OK status or no results.
    #[error("{endpoint} geocode failed: {status}")]
    Failed { endpoint: Endpoint, status: String },

    /// The response body was not the expected JSON shape.
    #[error("{endpoint} geocode returned an unreadable body: {source}")]
    Deserialize {
        endpoint: Endpoint,
        #[source]
        source: serde_json::Error,
    },
}

impl GeocodeError {
    /// The endpoint whose lookup failed, when one is attributable.
    #[must_use]
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self {
            GeocodeError::Setup(_) => None,
            GeocodeError::Transport { endpoint, .. }
            | GeocodeError::Failed { endpoint, .. }
            | GeocodeError::Deserialize { endpoint, .. } => Some(*endpoint),
        }
    }

    /// Short status string for the debug view (the service status where one
    /// exists, a fixed reason code otherwise).
    #[must_use]
    pub fn status_label(&self) -> String {
        match self {
            GeocodeError::Setup(_) => "SETUP_ERROR".to_owned(),
            GeocodeError::Transport { .. } => "TRANSPORT_ERROR".to_owned(),
            GeocodeError::Failed { status, .. } => status.clone(),
            GeocodeError::Deserialize { .. } => "BAD_RESPONSE".to_owned(),
        }
    }
}
