use std::sync::Arc;

use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;

use crate::models::graph::GraphResult;
use crate::services::error::FetchError;
use crate::services::retry::{with_retry, RetryPolicy};
use crate::services::transport::Transport;

/// Single-shot GET of a fixed resource, without the job protocol.
///
/// Transport failures are retried under [`RetryPolicy::SIMPLE_GET`].
#[derive(Clone)]
pub struct SimpleGetClient {
    transport: Arc<dyn Transport>,
    resource: Url,
    policy: RetryPolicy,
}

impl SimpleGetClient {
    pub fn new(transport: Arc<dyn Transport>, resource: Url) -> Self {
        Self {
            transport,
            resource,
            policy: RetryPolicy::SIMPLE_GET,
        }
    }

    pub fn resource(&self) -> &Url {
        &self.resource
    }

    /// Fetch the resource as raw JSON.
    pub async fn send_get_request(&self, cancel: &CancellationToken) -> Result<Value, FetchError> {
        self.fetch(cancel).await
    }

    /// Fetch the resource as a graph payload.
    pub async fn send_get_request_for_image_graph(
        &self,
        cancel: &CancellationToken,
    ) -> Result<GraphResult, FetchError> {
        self.fetch(cancel).await
    }

    async fn fetch<T: DeserializeOwned>(&self, cancel: &CancellationToken) -> Result<T, FetchError> {
        let attempt = with_retry(self.policy, |attempt| {
            tracing::debug!(url = %self.resource, attempt = attempt, "GET");
            self.transport.get_json(&self.resource, &[])
        });

        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            body = attempt => body,
        };

        let body = body.map_err(|e| {
            let err = FetchError::from(e);
            tracing::warn!(url = %self.resource, kind = err.kind(), error = %err, "GET failed");
            err
        })?;

        serde_json::from_value(body).map_err(|e| {
            FetchError::Protocol(format!("unexpected response from {}: {}", self.resource, e))
        })
    }
}
