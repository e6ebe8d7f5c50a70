//! Poll-fetch client
//!
//! A backend job is driven in three strictly sequential steps:
//!
//! 1. **start**: GET the job endpoint with the filter parameters, answered by
//!    `{ "stateUrl": ... }`
//! 2. **poll**: GET `stateUrl` until it answers `{ "done": true, "resultUrl": ... }`,
//!    sleeping a fixed interval after every `done: false`
//! 3. **fetch**: GET `resultUrl` once and decode the payload
//!
//! Each call to [`PollFetchClient::request_data`] is an independent run; the
//! client keeps no state between runs. A cancelled run drops its in-flight
//! request (which aborts it in the transport) and never yields a value.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use reqwest::Url;
use serde::de::DeserializeOwned;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::models::job::{JobHandle, JobStatus};
use crate::models::params::RequestParameters;
use crate::services::error::FetchError;
use crate::services::retry::{with_retry, RetryPolicy};
use crate::services::transport::Transport;

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Timing of the poll phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Fixed delay after every `done: false` status.
    pub interval: Duration,
    /// Give up after this many polls without completion.
    pub max_polls: Option<u32>,
    /// Give up when the whole run takes longer than this.
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_polls: None,
            deadline: None,
        }
    }
}

/// Client for the backend's start/poll/fetch job protocol.
#[derive(Clone)]
pub struct PollFetchClient {
    transport: Arc<dyn Transport>,
    base_url: Url,
    policy: PollPolicy,
}

/// Bookkeeping of one `request_data` run.
struct Run<'a> {
    request_id: Uuid,
    cancel: &'a CancellationToken,
    started: Instant,
    deadline: Option<Instant>,
    polls: u32,
}

impl Run<'_> {
    fn timeout(&self) -> FetchError {
        FetchError::Timeout {
            polls: self.polls,
            elapsed: self.started.elapsed(),
        }
    }

    /// Race `fut` against cancellation and the run deadline. Cancellation
    /// wins ties so a late value never escapes a cancelled run.
    async fn guard<F: Future>(&self, fut: F) -> Result<F::Output, FetchError> {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(FetchError::Cancelled),
            _ = sleep_until(self.deadline) => Err(self.timeout()),
            out = fut => Ok(out),
        }
    }
}

async fn sleep_until(deadline: Option<Instant>) {
    match deadline {
        Some(at) => tokio::time::sleep_until(at).await,
        None => std::future::pending::<()>().await,
    }
}

impl PollFetchClient {
    pub fn new(transport: Arc<dyn Transport>, base_url: Url, policy: PollPolicy) -> Self {
        Self {
            transport,
            base_url,
            policy,
        }
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Submit a job to `endpoint`, wait for it to finish and fetch its result.
    ///
    /// `endpoint` may be absolute or relative to the base URL. Yields exactly
    /// one value or one error; a run whose `cancel` token fires returns
    /// [`FetchError::Cancelled`].
    pub async fn request_data<R: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &RequestParameters,
        cancel: &CancellationToken,
    ) -> Result<R, FetchError> {
        let started = Instant::now();
        let mut run = Run {
            request_id: Uuid::new_v4(),
            cancel,
            started,
            deadline: self.policy.deadline.map(|d| started + d),
            polls: 0,
        };

        metrics::counter!("poll_fetch_requests_total").increment(1);
        tracing::debug!(request_id = %run.request_id, endpoint = endpoint, "Submitting job");

        let result = self.drive(&mut run, endpoint, params).await;

        let elapsed = run.started.elapsed();
        metrics::histogram!("poll_fetch_duration_seconds").record(elapsed.as_secs_f64());

        match &result {
            Ok(_) => tracing::info!(
                request_id = %run.request_id,
                endpoint = endpoint,
                polls = run.polls,
                elapsed_ms = elapsed.as_millis() as u64,
                "Job result fetched"
            ),
            Err(FetchError::Cancelled) => tracing::debug!(
                request_id = %run.request_id,
                polls = run.polls,
                "Job request cancelled"
            ),
            Err(e) => {
                metrics::counter!("poll_fetch_failures_total", "kind" => e.kind()).increment(1);
                tracing::warn!(
                    request_id = %run.request_id,
                    endpoint = endpoint,
                    polls = run.polls,
                    kind = e.kind(),
                    error = %e,
                    "Job request failed"
                );
            }
        }

        result
    }

    async fn drive<R: DeserializeOwned>(
        &self,
        run: &mut Run<'_>,
        endpoint: &str,
        params: &RequestParameters,
    ) -> Result<R, FetchError> {
        let query = params.to_query()?;
        let start_url = self
            .resolve(endpoint)
            .map_err(|reason| FetchError::Transport(format!("invalid endpoint {:?}: {}", endpoint, reason)))?;

        let handle: JobHandle = self.step(run, &start_url, &query).await?;
        let state_url = self.resolve(&handle.state_url).map_err(|reason| {
            FetchError::Protocol(format!("invalid stateUrl {:?}: {}", handle.state_url, reason))
        })?;
        tracing::debug!(request_id = %run.request_id, state_url = %state_url, "Job submitted");

        let result_url = loop {
            let status: JobStatus = self.step(run, &state_url, &[]).await?;
            run.polls += 1;
            metrics::counter!("poll_fetch_polls_total").increment(1);

            if status.done {
                break status.result_url.ok_or_else(|| {
                    FetchError::Protocol(format!("job at {} is done but has no resultUrl", state_url))
                })?;
            }

            if let Some(max_polls) = self.policy.max_polls {
                if run.polls >= max_polls {
                    return Err(run.timeout());
                }
            }

            tracing::trace!(request_id = %run.request_id, poll = run.polls, "Job not done yet");
            run.guard(tokio::time::sleep(self.policy.interval)).await?;
        };

        let result_url = self.resolve(&result_url).map_err(|reason| {
            FetchError::Protocol(format!("invalid resultUrl {:?}: {}", result_url, reason))
        })?;
        self.step(run, &result_url, &[]).await
    }

    /// One GET of the protocol, decoded into the shape expected at this step.
    async fn step<T: DeserializeOwned>(
        &self,
        run: &Run<'_>,
        url: &Url,
        query: &[(String, String)],
    ) -> Result<T, FetchError> {
        let body = run
            .guard(with_retry(RetryPolicy::POLLING, |_| {
                self.transport.get_json(url, query)
            }))
            .await??;

        serde_json::from_value(body)
            .map_err(|e| FetchError::Protocol(format!("unexpected response from {}: {}", url, e)))
    }

    /// Absolute targets are used as-is, everything else joins the base URL.
    fn resolve(&self, target: &str) -> Result<Url, String> {
        self.base_url.join(target).map_err(|e| e.to_string())
    }
}
