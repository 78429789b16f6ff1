//! HTTP client for the impact query backend.
//!
//! Two GET endpoints: `/query` submits a location pair and `/bq_job` reads
//! the status of a long-running job. Neither call retries here — the poll
//! loop owns retry policy.

use std::time::Duration;

use reqwest::{Client, Url};

use impact_core::{NetworkData, ResolvedLocation};

use crate::error::{Phase, QueryError};
use crate::types::QueryResponse;
use crate::wire;

/// Client for the query backend.
///
/// Use [`QueryClient::new`] with the configured base URL; tests point it at
/// a wiremock server.
pub struct QueryClient {
    client: Client,
    base_url: String,
}

impl QueryClient {
    /// Creates a client for the backend at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns [`QueryError::Setup`] if `base_url` is not a valid URL, or
    /// [`QueryError::Transport`] if the underlying `reqwest::Client` cannot
    /// be constructed.
    pub fn new(base_url: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, QueryError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()
            .map_err(|source| QueryError::Transport {
                phase: Phase::Query,
                source,
            })?;

        let trimmed = base_url.trim_end_matches('/');
        Url::parse(trimmed)
            .map_err(|e| QueryError::Setup(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            client,
            base_url: trimmed.to_owned(),
        })
    }

    /// Submits the initial query for a resolved location pair.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Transport`] on network failure or a non-2xx status.
    /// - [`QueryError::Malformed`] if the body is not a query response.
    pub async fn submit(
        &self,
        client_loc: &ResolvedLocation,
        server_loc: &ResolvedLocation,
    ) -> Result<QueryResponse, QueryError> {
        let params = wire::query_params(client_loc, server_loc);
        let url = format!("{}/query?{params}", self.base_url);
        tracing::info!(%params, "submitting query");

        let body = self.request_text(Phase::Query, &url).await?;
        serde_json::from_str(&body).map_err(|e| QueryError::Malformed {
            phase: Phase::Query,
            context: "query response".to_owned(),
            reason: e.to_string(),
        })
    }

    /// Reads the current status of a long-running job.
    ///
    /// The body is the `network data` object shape directly: incomplete
    /// status (with a possibly rotated `jobID`) or the completed statistics.
    ///
    /// # Errors
    ///
    /// - [`QueryError::Transport`] on network failure or a non-2xx status.
    /// - [`QueryError::Malformed`] if the body is not a job status object.
    pub async fn fetch_job_status(&self, job_id: &str) -> Result<NetworkData, QueryError> {
        let url = format!("{}/bq_job?jobID={job_id}", self.base_url);

        let body = self.request_text(Phase::Poll, &url).await?;
        let value: serde_json::Value =
            serde_json::from_str(&body).map_err(|e| QueryError::Malformed {
                phase: Phase::Poll,
                context: format!("job {job_id}"),
                reason: e.to_string(),
            })?;

        NetworkData::from_value(value).map_err(|reason| QueryError::Malformed {
            phase: Phase::Poll,
            context: format!("job {job_id}"),
            reason,
        })
    }

    /// Sends a GET request, asserts a 2xx status, and returns the body.
    async fn request_text(&self, phase: Phase, url: &str) -> Result<String, QueryError> {
        let transport = |source| QueryError::Transport { phase, source };
        let response = self.client.get(url).send().await.map_err(transport)?;
        let response = response.error_for_status().map_err(transport)?;
        response.text().await.map_err(transport)
    }
}
