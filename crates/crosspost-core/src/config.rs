//! Configuration module
//!
//! A single base-URL setting selects the backend host; everything else
//! (allow-lists, size ceilings) is compiled in. Environment variables:
//! `CROSSPOST_API_URL` (or `API_URL`), optional `CROSSPOST_TOKEN` to seed a
//! credential, `CROSSPOST_POLL_INTERVAL_MS`, `CROSSPOST_REQUEST_TIMEOUT_SECS`.

use std::env;
use std::time::Duration;

use crate::constants::{DEFAULT_POLL_INTERVAL_MS, DEFAULT_REQUEST_TIMEOUT_SECS};

/// Client configuration, resolved once at startup.
#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub base_url: String,
    pub request_timeout: Duration,
    pub poll_interval: Duration,
    /// Credential carried over from a previous `login` invocation, if any.
    pub token: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8000")
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll_interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            token: None,
        }
    }

    /// Resolve configuration from the environment.
    pub fn from_env() -> Self {
        let base_url = env::var("CROSSPOST_API_URL")
            .or_else(|_| env::var("API_URL"))
            .unwrap_or_else(|_| "http://localhost:8000".to_string());

        let mut config = Self::new(base_url);
        config.token = env::var("CROSSPOST_TOKEN").ok().filter(|t| !t.is_empty());

        if let Some(ms) = env::var("CROSSPOST_POLL_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.poll_interval = Duration::from_millis(ms.max(100));
        }
        if let Some(secs) = env::var("CROSSPOST_REQUEST_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.request_timeout = Duration::from_secs(secs.max(1));
        }

        config
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trailing_slash_stripped() {
        let config = ClientConfig::new("http://localhost:8000/");
        assert_eq!(config.base_url, "http://localhost:8000");
    }

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:8000");
        assert_eq!(config.poll_interval, Duration::from_millis(3000));
        assert!(config.token.is_none());
    }

    #[test]
    fn test_with_token() {
        let config = ClientConfig::new("http://api.example.com").with_token("abc");
        assert_eq!(config.token.as_deref(), Some("abc"));
    }
}
