use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value;

/// Request/response seam between the clients and the network.
///
/// Every backend call is a GET with query parameters answered by a JSON body.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<Value, TransportError>;
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    /// The request never produced a response (unreachable host, DNS,
    /// connect or read timeout, malformed request).
    #[error("{0}")]
    Connection(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// The backend answered 2xx but the body is not JSON.
    #[error("invalid response body from {url}: {reason}")]
    Body { url: String, reason: String },
}

impl TransportError {
    /// Only failures that never reached the backend are worth repeating.
    pub fn is_retryable(&self) -> bool {
        matches!(self, TransportError::Connection(_))
    }
}

/// `reqwest`-backed transport.
pub struct HttpTransport {
    http: Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Result<Self, TransportError> {
        let http = Client::builder()
            .user_agent(concat!("procmine-client/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        Ok(Self { http })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get_json(&self, url: &Url, query: &[(String, String)]) -> Result<Value, TransportError> {
        tracing::trace!(url = %url, params = query.len(), "GET");

        let response = self
            .http
            .get(url.clone())
            .query(query)
            .send()
            .await
            .map_err(|e| TransportError::Connection(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            // Report the URL as sent, query string included
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: format!("Http failure response for {}: {}", response.url(), status),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                TransportError::Body {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            } else {
                TransportError::Connection(e.to_string())
            }
        })
    }
}
