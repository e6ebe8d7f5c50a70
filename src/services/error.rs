use std::time::Duration;

use crate::models::params::ParamsError;
use crate::services::transport::TransportError;

/// Failure of a backend call, whatever step it happened in.
#[derive(Debug, Clone, thiserror::Error)]
pub enum FetchError {
    /// Client side: the request never got a response, or could not be built.
    #[error("transport error: {0}")]
    Transport(String),

    /// Server side: non-2xx response.
    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    /// The response did not have the expected shape.
    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("gave up after {polls} polls ({elapsed:?})")]
    Timeout { polls: u32, elapsed: Duration },

    #[error("request cancelled")]
    Cancelled,
}

impl FetchError {
    /// The single human-readable message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            FetchError::Server { status, message } => {
                format!("Error Code: {}\nMessage: {}", status, message)
            }
            FetchError::Transport(description) | FetchError::Protocol(description) => {
                format!("Error: {}", description)
            }
            FetchError::Timeout { polls, elapsed } => format!(
                "Error: request did not complete after {} polls in {:.1}s",
                polls,
                elapsed.as_secs_f64()
            ),
            FetchError::Cancelled => "Error: request cancelled".to_string(),
        }
    }

    pub fn is_server_side(&self) -> bool {
        matches!(self, FetchError::Server { .. })
    }

    /// Label used for the `kind` field of logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::Transport(_) => "transport",
            FetchError::Server { .. } => "server",
            FetchError::Protocol(_) => "protocol",
            FetchError::Timeout { .. } => "timeout",
            FetchError::Cancelled => "cancelled",
        }
    }
}

impl From<TransportError> for FetchError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Connection(description) => FetchError::Transport(description),
            TransportError::Status { status, message } => FetchError::Server { status, message },
            TransportError::Body { url, reason } => {
                FetchError::Protocol(format!("invalid response body from {}: {}", url, reason))
            }
        }
    }
}

impl From<ParamsError> for FetchError {
    fn from(err: ParamsError) -> Self {
        FetchError::Transport(err.to_string())
    }
}
