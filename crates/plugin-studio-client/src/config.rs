use std::env;

use reqwest::Url;
use thiserror::Error;

pub const BASE_URL_ENV: &str = "PLUGIN_STUDIO_BASE_URL";
pub const TIMEOUT_MS_ENV: &str = "PLUGIN_STUDIO_TIMEOUT_MS";
pub const REQUEST_ATTEMPTS_ENV: &str = "PLUGIN_STUDIO_REQUEST_ATTEMPTS";

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;
pub const MIN_TIMEOUT_MS: u64 = 250;
pub const DEFAULT_REQUEST_ATTEMPTS: usize = 2;
pub const MAX_REQUEST_ATTEMPTS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid PLUGIN_STUDIO_BASE_URL: {0}")]
    InvalidBaseUrl(String),
    #[error("invalid PLUGIN_STUDIO_TIMEOUT_MS: {0}")]
    InvalidTimeoutMs(String),
    #[error("invalid PLUGIN_STUDIO_REQUEST_ATTEMPTS: {0}")]
    InvalidRequestAttempts(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_ms: u64,
    /// Attempts for idempotent GETs. POSTs are always sent once.
    pub request_attempts: usize,
}

impl ClientConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            request_attempts: DEFAULT_REQUEST_ATTEMPTS,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Reads the configuration through `lookup`. Unset and blank values fall
    /// back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let base_url = match read(BASE_URL_ENV) {
            Some(raw) => validate_base_url(&raw)?,
            None => DEFAULT_BASE_URL.to_string(),
        };
        let timeout_ms = match read(TIMEOUT_MS_ENV) {
            Some(raw) => raw
                .parse::<u64>()
                .map_err(|error| ConfigError::InvalidTimeoutMs(format!("{raw}: {error}")))?
                .max(MIN_TIMEOUT_MS),
            None => DEFAULT_TIMEOUT_MS,
        };
        let request_attempts = match read(REQUEST_ATTEMPTS_ENV) {
            Some(raw) => raw
                .parse::<usize>()
                .map_err(|error| ConfigError::InvalidRequestAttempts(format!("{raw}: {error}")))?
                .clamp(1, MAX_REQUEST_ATTEMPTS),
            None => DEFAULT_REQUEST_ATTEMPTS,
        };

        Ok(Self {
            base_url,
            timeout_ms,
            request_attempts,
        })
    }
}

/// Accepts absolute http(s) URLs with a host and strips trailing slashes.
pub fn validate_base_url(raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let url = Url::parse(trimmed)
        .map_err(|error| ConfigError::InvalidBaseUrl(format!("{trimmed}: {error}")))?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "{trimmed}: scheme must be http or https"
        )));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(ConfigError::InvalidBaseUrl(format!(
            "{trimmed}: missing host"
        )));
    }
    Ok(trimmed.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(values: &[(&str, &str)]) -> Result<ClientConfig, ConfigError> {
        let values: HashMap<&str, &str> = values.iter().copied().collect();
        ClientConfig::from_lookup(|key| values.get(key).map(ToString::to_string))
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = config_from(&[]).expect("config");
        assert_eq!(config, ClientConfig::new(DEFAULT_BASE_URL));
    }

    #[test]
    fn env_overrides_are_applied_and_clamped() {
        let config = config_from(&[
            (BASE_URL_ENV, " https://studio.example.com/ "),
            (TIMEOUT_MS_ENV, "10"),
            (REQUEST_ATTEMPTS_ENV, "0"),
        ])
        .expect("config");

        assert_eq!(config.base_url, "https://studio.example.com");
        assert_eq!(config.timeout_ms, MIN_TIMEOUT_MS);
        assert_eq!(config.request_attempts, 1);
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let config = config_from(&[(BASE_URL_ENV, "  "), (TIMEOUT_MS_ENV, "")]).expect("config");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_ms, DEFAULT_TIMEOUT_MS);
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config_from(&[(TIMEOUT_MS_ENV, "soon")]),
            Err(ConfigError::InvalidTimeoutMs(_))
        ));
        assert!(matches!(
            config_from(&[(REQUEST_ATTEMPTS_ENV, "-1")]),
            Err(ConfigError::InvalidRequestAttempts(_))
        ));
        assert!(matches!(
            config_from(&[(BASE_URL_ENV, "ftp://files.example.com")]),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
        assert!(matches!(
            config_from(&[(BASE_URL_ENV, "localhost:5000/x")]),
            Err(ConfigError::InvalidBaseUrl(_))
        ));
    }
}
