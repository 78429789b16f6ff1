//! Polling for long-running backend jobs.
//!
//! A `/query` response that arrives incomplete carries a job identifier; the
//! poll loop re-reads `/bq_job` on a growing schedule until the job
//! completes, the attempt cap is reached, or the transport stays down past
//! its bounded retries.

use std::time::Duration;

use impact_core::{AppConfig, NetworkData, NetworkStats};

use crate::client::QueryClient;
use crate::error::{Phase, QueryError};
use crate::retry::retry_transport;

/// Tunables for one poll loop.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// First wait interval in milliseconds.
    pub initial_wait_ms: u64,
    /// Maximum number of polls before giving up with
    /// [`QueryError::JobTimeout`].
    pub max_attempts: u32,
    /// Additional attempts per poll when the request itself fails.
    pub transport_retries: u32,
    /// Base delay for the transport-retry back-off.
    pub transport_backoff_ms: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            initial_wait_ms: 3_000,
            max_attempts: 10,
            transport_retries: 3,
            transport_backoff_ms: 1_000,
        }
    }
}

impl PollConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            initial_wait_ms: config.poll_initial_wait_ms,
            max_attempts: config.poll_max_attempts,
            transport_retries: config.poll_transport_retries,
            transport_backoff_ms: config.poll_transport_backoff_ms,
        }
    }
}

/// Wait-interval schedule between polls.
///
/// The stored interval doubles on every tick and the delay handed back is
/// half the doubled value, so the observed waits are `initial, 2·initial,
/// 4·initial, …`. The double-then-halve sequence is the schedule the
/// dashboard has always run and is kept as-is.
#[derive(Debug)]
pub struct Backoff {
    wait_ms: u64,
}

impl Backoff {
    #[must_use]
    pub fn new(initial_wait_ms: u64) -> Self {
        Self {
            wait_ms: initial_wait_ms,
        }
    }

    /// Advances the schedule and returns the next delay.
    pub fn next_delay(&mut self) -> Duration {
        self.wait_ms = self.wait_ms.saturating_mul(2);
        Duration::from_millis(self.wait_ms / 2)
    }
}

impl QueryClient {
    /// Polls a job until it completes, re-reading the job identifier from
    /// every response (the backend may rotate it between polls).
    ///
    /// # Errors
    ///
    /// - [`QueryError::JobTimeout`] once `max_attempts` polls have seen an
    ///   incomplete job.
    /// - [`QueryError::Transport`] when a poll request keeps failing past
    ///   its bounded retries.
    /// - [`QueryError::Malformed`] if a poll body is not a job status.
    pub async fn poll_until_complete(
        &self,
        job_id: &str,
        config: &PollConfig,
    ) -> Result<NetworkStats, QueryError> {
        let mut backoff = Backoff::new(config.initial_wait_ms);
        let mut job_id = job_id.to_owned();
        let mut waited_ms = 0u64;

        for attempt in 1..=config.max_attempts {
            let delay = backoff.next_delay();
            waited_ms =
                waited_ms.saturating_add(u64::try_from(delay.as_millis()).unwrap_or(u64::MAX));
            tokio::time::sleep(delay).await;

            let status = retry_transport(config.transport_retries, config.transport_backoff_ms, || {
                let job_id = job_id.clone();
                async move { self.fetch_job_status(&job_id).await }
            })
            .await?;

            match status {
                NetworkData::Complete(stats) => {
                    tracing::info!(attempt, job_id = %job_id, "job complete");
                    return Ok(stats);
                }
                NetworkData::Partial { job_id: next } => {
                    if next != job_id {
                        tracing::debug!(old = %job_id, new = %next, "job identifier rotated");
                    }
                    job_id = next;
                    tracing::info!(attempt, job_id = %job_id, "job still running");
                }
                other @ (NetworkData::Absent | NetworkData::Loading) => {
                    return Err(QueryError::Malformed {
                        phase: Phase::Poll,
                        context: format!("job {job_id}"),
                        reason: format!("expected a job status object, got {other:?}"),
                    });
                }
            }
        }

        Err(QueryError::JobTimeout {
            attempts: config.max_attempts,
            waited_ms,
        })
    }
}
