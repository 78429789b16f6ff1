use thiserror::Error;

/// Which backend interaction an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Query,
    Poll,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Query => write!(f, "query"),
            Phase::Poll => write!(f, "poll"),
        }
    }
}

/// Errors returned by the backend query client and the poll loop.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The backend base URL is not a valid URL.
    #[error("query client setup error: {0}")]
    Setup(String),

    /// Network or TLS failure, or a non-2xx HTTP status.
    #[error("{phase} transport error: {source}")]
    Transport {
        phase: Phase,
        #[source]
        source: reqwest::Error,
    },

    /// The response body was not the expected shape.
    #[error("malformed {phase} response for {context}: {reason}")]
    Malformed {
        phase: Phase,
        context: String,
        reason: String,
    },

    /// The poll attempt cap was reached with the job still incomplete.
    #[error("job still incomplete after {attempts} polls ({waited_ms} ms waited)")]
    JobTimeout { attempts: u32, waited_ms: u64 },
}
