use std::time::Duration;

use reqwest::Url;
use serde::Deserialize;

use crate::services::poll_fetch::PollPolicy;

/// Environment variable prefix for all client settings.
pub const ENV_PREFIX: &str = "PROCMINE_";

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    /// Backend host name or address (e.g., "localhost")
    pub backend_host: String,

    /// Backend port
    #[serde(default = "default_backend_port")]
    pub backend_port: u16,

    /// URL scheme used to reach the backend ("http" or "https")
    #[serde(default = "default_backend_scheme")]
    pub backend_scheme: String,

    /// Fixed delay between two state polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,

    /// Maximum number of state polls per request. Unset polls until done.
    #[serde(default)]
    pub max_polls: Option<u32>,

    /// Overall deadline per request, in seconds. Unset waits indefinitely.
    #[serde(default)]
    pub poll_deadline_secs: Option<u64>,

    /// Per-call HTTP timeout, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,

    /// Resource fetched by the single-shot GET variants
    #[serde(default = "default_simple_get_path")]
    pub simple_get_path: String,
}

fn default_backend_port() -> u16 {
    5000
}

fn default_backend_scheme() -> String {
    "http".to_string()
}

fn default_poll_interval_ms() -> u64 {
    250
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_simple_get_path() -> String {
    "assets/tests/response.json".to_string()
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read configuration from environment: {0}")]
    Env(#[from] envy::Error),

    #[error("Invalid backend URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    #[error("Poll interval must be at least 1 ms")]
    ZeroPollInterval,
}

impl ClientConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Ok(envy::prefixed(ENV_PREFIX).from_env()?)
    }

    /// Build the configuration from explicit `(name, value)` pairs using the
    /// same prefixed names as the environment.
    pub fn from_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        Ok(envy::prefixed(ENV_PREFIX).from_iter(vars)?)
    }

    /// Root URL of the backend. Always ends with `/` so relative routes join
    /// beneath it.
    pub fn base_url(&self) -> Result<Url, ConfigError> {
        let raw = format!(
            "{}://{}:{}/",
            self.backend_scheme, self.backend_host, self.backend_port
        );
        Url::parse(&raw).map_err(|e| ConfigError::InvalidBaseUrl {
            url: raw.clone(),
            reason: e.to_string(),
        })
    }

    pub fn simple_get_url(&self) -> Result<Url, ConfigError> {
        let base = self.base_url()?;
        base.join(&self.simple_get_path)
            .map_err(|e| ConfigError::InvalidBaseUrl {
                url: format!("{}{}", base, self.simple_get_path),
                reason: e.to_string(),
            })
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn poll_policy(&self) -> Result<PollPolicy, ConfigError> {
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::ZeroPollInterval);
        }

        Ok(PollPolicy {
            interval: Duration::from_millis(self.poll_interval_ms),
            max_polls: self.max_polls,
            deadline: self.poll_deadline_secs.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_defaults_applied() {
        let config =
            ClientConfig::from_vars(vars(&[("PROCMINE_BACKEND_HOST", "localhost")])).unwrap();

        assert_eq!(config.backend_port, 5000);
        assert_eq!(config.backend_scheme, "http");
        assert_eq!(config.poll_interval_ms, 250);
        assert_eq!(config.max_polls, None);
        assert_eq!(config.poll_deadline_secs, None);
        assert_eq!(config.simple_get_path, "assets/tests/response.json");

        let policy = config.poll_policy().unwrap();
        assert_eq!(policy.interval, Duration::from_millis(250));
        assert!(policy.max_polls.is_none());
        assert!(policy.deadline.is_none());
    }

    #[test]
    fn test_missing_host_is_error() {
        let result = ClientConfig::from_vars(vars(&[("PROCMINE_BACKEND_PORT", "8080")]));
        assert!(matches!(result, Err(ConfigError::Env(_))));
    }

    #[test]
    fn test_limits_and_urls() {
        let config = ClientConfig::from_vars(vars(&[
            ("PROCMINE_BACKEND_HOST", "miner.internal"),
            ("PROCMINE_BACKEND_PORT", "8080"),
            ("PROCMINE_MAX_POLLS", "40"),
            ("PROCMINE_POLL_DEADLINE_SECS", "60"),
        ]))
        .unwrap();

        assert_eq!(
            config.base_url().unwrap().as_str(),
            "http://miner.internal:8080/"
        );
        assert_eq!(
            config.simple_get_url().unwrap().as_str(),
            "http://miner.internal:8080/assets/tests/response.json"
        );

        let policy = config.poll_policy().unwrap();
        assert_eq!(policy.max_polls, Some(40));
        assert_eq!(policy.deadline, Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let config = ClientConfig::from_vars(vars(&[
            ("PROCMINE_BACKEND_HOST", "localhost"),
            ("PROCMINE_POLL_INTERVAL_MS", "0"),
        ]))
        .unwrap();

        assert!(matches!(
            config.poll_policy(),
            Err(ConfigError::ZeroPollInterval)
        ));
    }

    #[test]
    fn test_invalid_host_rejected() {
        let config =
            ClientConfig::from_vars(vars(&[("PROCMINE_BACKEND_HOST", "bad host")])).unwrap();
        assert!(matches!(
            config.base_url(),
            Err(ConfigError::InvalidBaseUrl { .. })
        ));
    }
}
