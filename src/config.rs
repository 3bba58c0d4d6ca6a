use std::env;
use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_QUOTA_URL: &str = "https://app.firmware.ai/api/v1/quota";
pub const DEFAULT_TIMEOUT_MS: u64 = 5_000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid quota URL {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("timeout must be a positive number of milliseconds, got {0:?}")]
    InvalidTimeout(String),
}

/// Runtime configuration for the quota reporter.
/// Values are sourced from environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_url: String,
    pub timeout: Duration,
    pub user_agent: String,
    /// IANA zone name used to render reset times; `None` means "detect".
    pub display_tz: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_QUOTA_URL.to_string(),
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            user_agent: default_user_agent(),
            display_tz: None,
        }
    }
}

impl Config {
    /// Load configuration from environment.
    ///
    /// Env vars:
    /// - FIRMWARE_QUOTA_URL (default: https://app.firmware.ai/api/v1/quota)
    /// - FIRMWARE_QUOTA_TIMEOUT_MS (default: 5000)
    /// - FIRMWARE_QUOTA_USER_AGENT (default: firmware-quota/<version>)
    /// - FIRMWARE_QUOTA_TZ, then TZ (default: system zone)
    ///
    /// The credential itself is not part of the config; see `credentials`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut cfg = Self::default();
        if let Ok(url) = env::var("FIRMWARE_QUOTA_URL") {
            cfg = cfg.with_api_url(&url)?;
        }
        if let Ok(raw) = env::var("FIRMWARE_QUOTA_TIMEOUT_MS") {
            cfg.timeout = parse_timeout_ms(&raw)?;
        }
        if let Ok(ua) = env::var("FIRMWARE_QUOTA_USER_AGENT") {
            if !ua.trim().is_empty() {
                cfg.user_agent = ua;
            }
        }
        cfg.display_tz = env::var("FIRMWARE_QUOTA_TZ")
            .or_else(|_| env::var("TZ"))
            .ok()
            .filter(|s| !s.trim().is_empty());
        Ok(cfg)
    }

    pub fn with_api_url(mut self, raw: &str) -> Result<Self, ConfigError> {
        self.api_url = validate_url(raw)?;
        Ok(self)
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

fn default_user_agent() -> String {
    format!("firmware-quota/{}", env!("CARGO_PKG_VERSION"))
}

pub fn parse_timeout_ms(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(ms) if ms > 0 => Ok(Duration::from_millis(ms)),
        _ => Err(ConfigError::InvalidTimeout(raw.to_string())),
    }
}

fn validate_url(raw: &str) -> Result<String, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: raw.to_string(),
        reason,
    };
    let parsed = url::Url::parse(raw.trim()).map_err(|e| invalid(e.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed.to_string()),
        other => Err(invalid(format!("unsupported scheme {other}"))),
    }
}
