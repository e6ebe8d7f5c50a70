use std::future::Future;

use crate::services::transport::TransportError;

/// How many times a single call is attempted before its failure surfaces.
///
/// Retries are immediate and only cover [`TransportError::Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
}

impl RetryPolicy {
    /// Job submission, state polls and result fetches: a failure ends the
    /// request.
    pub const POLLING: RetryPolicy = RetryPolicy { max_attempts: 1 };

    /// Single-shot GET variants: a first try plus up to three retries.
    pub const SIMPLE_GET: RetryPolicy = RetryPolicy { max_attempts: 4 };
}

/// Run `op` until it succeeds, fails with a non-retryable error, or the
/// policy's attempts are used up. `op` receives the 1-based attempt number.
pub async fn with_retry<T, F, Fut>(policy: RetryPolicy, mut op: F) -> Result<T, TransportError>
where
    F: FnMut(u32) -> Fut,
    Fut: Future<Output = Result<T, TransportError>>,
{
    let mut attempt = 1;
    loop {
        match op(attempt).await {
            Err(e) if e.is_retryable() && attempt < policy.max_attempts => {
                tracing::warn!(
                    attempt = attempt,
                    max_attempts = policy.max_attempts,
                    error = %e,
                    "Request failed, retrying"
                );
                metrics::counter!("request_retries_total").increment(1);
                attempt += 1;
            }
            result => return result,
        }
    }
}
