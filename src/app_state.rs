use std::sync::Arc;

use crate::config::{ClientConfig, ConfigError};
use crate::services::{
    backend::ProcessMiningApi,
    poll_fetch::PollFetchClient,
    simple_get::SimpleGetClient,
    transport::{HttpTransport, Transport, TransportError},
};

/// Clients shared by every consumer, all on one transport.
#[derive(Clone)]
pub struct AppState {
    pub api: Arc<ProcessMiningApi>,
    pub simple: Arc<SimpleGetClient>,
}

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to build HTTP client: {0}")]
    Transport(#[from] TransportError),
}

impl AppState {
    pub fn new(config: &ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, StateError> {
        let poll_fetch = PollFetchClient::new(
            Arc::clone(&transport),
            config.base_url()?,
            config.poll_policy()?,
        );
        let simple = SimpleGetClient::new(transport, config.simple_get_url()?);

        Ok(Self {
            api: Arc::new(ProcessMiningApi::new(poll_fetch)),
            simple: Arc::new(simple),
        })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, StateError> {
        let transport = HttpTransport::new(config.request_timeout())?;
        Self::new(config, Arc::new(transport))
    }
}
