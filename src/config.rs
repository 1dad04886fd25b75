//! Runtime configuration
//!
//! Read from the environment, then overridden by command-line flags.

use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8000";

const BASE_URL_VAR: &str = "MEDINTAKE_BASE_URL";
const TIMEOUT_VAR: &str = "MEDINTAKE_TIMEOUT_SECS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid service URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("Invalid request timeout {0:?}: expected a whole number of seconds")]
    InvalidTimeout(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the diagnostic service, without a trailing slash
    pub base_url: String,
    /// `None` waits indefinitely
    pub request_timeout: Option<Duration>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: None,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(url) = lookup(BASE_URL_VAR).filter(|u| !u.trim().is_empty()) {
            config.base_url = url;
        }

        if let Some(raw) = lookup(TIMEOUT_VAR).filter(|t| !t.trim().is_empty()) {
            let secs = raw
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigError::InvalidTimeout(raw.clone()))?;
            config.request_timeout = timeout_from_secs(secs);
        }

        config.validate()
    }

    /// Apply command-line overrides on top of the environment
    pub fn with_overrides(
        mut self,
        base_url: Option<String>,
        timeout_secs: Option<u64>,
    ) -> Result<Self, ConfigError> {
        if let Some(url) = base_url {
            self.base_url = url;
        }
        if let Some(secs) = timeout_secs {
            self.request_timeout = timeout_from_secs(secs);
        }
        self.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        let url = reqwest::Url::parse(&self.base_url).map_err(|e| ConfigError::InvalidUrl {
            url: self.base_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: self.base_url,
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        self.base_url = self.base_url.trim_end_matches('/').to_string();
        Ok(self)
    }
}

/// Zero disables the timeout
fn timeout_from_secs(secs: u64) -> Option<Duration> {
    (secs > 0).then_some(Duration::from_secs(secs))
}
