//! Bounded retry with back-off and jitter for genuine transport failures.
//!
//! "Job still processing" is not an error and never lands here; this module
//! only re-attempts a poll request whose transport failed, so that a flaky
//! network blip does not kill an otherwise healthy poll loop while a dead
//! backend still fails promptly.

use std::future::Future;
use std::time::Duration;

use crate::error::QueryError;

/// Returns `true` for errors worth re-attempting after a back-off delay:
/// network-level failures (timeout, connection reset) and HTTP 5xx.
/// Malformed bodies and setup errors are returned immediately — retrying
/// won't fix them.
pub(crate) fn is_transient(err: &QueryError) -> bool {
    match err {
        QueryError::Transport { source, .. } => {
            source.is_timeout()
                || source.is_connect()
                || source.status().is_some_and(|s| s.is_server_error())
        }
        QueryError::Setup(_) | QueryError::Malformed { .. } | QueryError::JobTimeout { .. } => {
            false
        }
    }
}

/// Runs `operation` with up to `max_retries` additional attempts on
/// transient errors, sleeping `backoff_base_ms * 2^(attempt-1)` ± 25 %
/// jitter between attempts (capped at 60 s). Non-transient errors are
/// returned immediately.
pub(crate) async fn retry_transport<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, QueryError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, QueryError>>,
{
    const MAX_DELAY_MS: u64 = 60_000;
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_transient(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms.saturating_mul(1u64 << (attempt - 1).min(10));
                let capped = computed.min(MAX_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let delay_ms = (capped as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    error = %err,
                    "transient backend error — retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}
