//! Dispatcher configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {value}")]
    InvalidValue { var: &'static str, value: String },

    #[error("invalid dispatch config: {0}")]
    Invalid(String),
}

/// Rolling-window quota for outbound calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Calls allowed within one window.
    pub max_calls: usize,
    /// Window length in seconds.
    pub window_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_calls: 300,
            window_secs: 3600,
        }
    }
}

impl RateLimitConfig {
    pub fn window(&self) -> Duration {
        Duration::from_secs(self.window_secs)
    }
}

/// Configuration for the dispatcher and its worker pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of concurrent workers draining the queue.
    pub worker_count: usize,
    /// Outbound call quota shared by all workers.
    pub rate_limit: RateLimitConfig,
    /// How long a paused worker waits before checking the run flag again (ms).
    pub idle_poll_ms: u64,
    /// POST target; `{destination}` is replaced with the job's destination id.
    pub endpoint: String,
    /// Timeout for one outbound request (ms).
    pub request_timeout_ms: u64,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            worker_count: 5,
            rate_limit: RateLimitConfig::default(),
            idle_poll_ms: 1000,
            endpoint: "http://127.0.0.1:8081/destinations/{destination}/messages".to_string(),
            request_timeout_ms: 30_000,
        }
    }
}

impl DispatchConfig {
    pub fn idle_poll(&self) -> Duration {
        Duration::from_millis(self.idle_poll_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Build a config from environment variables, falling back to defaults.
    ///
    /// - `DISPATCH_ENDPOINT` (URL template containing `{destination}`)
    /// - `DISPATCH_WORKERS` (default: 5)
    /// - `DISPATCH_RATE_CALLS` (default: 300)
    /// - `DISPATCH_RATE_WINDOW_SECS` (default: 3600)
    /// - `DISPATCH_IDLE_POLL_MS` (default: 1000)
    /// - `DISPATCH_TIMEOUT_MS` (default: 30000)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Same as [`DispatchConfig::from_env`] with an injectable variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut cfg = Self::default();

        if let Some(endpoint) = lookup("DISPATCH_ENDPOINT").and_then(non_empty) {
            cfg.endpoint = endpoint;
        }
        if let Some(v) = parse_var(&lookup, "DISPATCH_WORKERS")? {
            cfg.worker_count = v;
        }
        if let Some(v) = parse_var(&lookup, "DISPATCH_RATE_CALLS")? {
            cfg.rate_limit.max_calls = v;
        }
        if let Some(v) = parse_var(&lookup, "DISPATCH_RATE_WINDOW_SECS")? {
            cfg.rate_limit.window_secs = v;
        }
        if let Some(v) = parse_var(&lookup, "DISPATCH_IDLE_POLL_MS")? {
            cfg.idle_poll_ms = v;
        }
        if let Some(v) = parse_var(&lookup, "DISPATCH_TIMEOUT_MS")? {
            cfg.request_timeout_ms = v;
        }

        cfg.validate()?;
        Ok(cfg)
    }

    /// Reject configurations the pool cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.worker_count == 0 {
            return Err(ConfigError::Invalid("worker_count must be at least 1".into()));
        }
        if self.rate_limit.max_calls == 0 || self.rate_limit.window_secs == 0 {
            return Err(ConfigError::Invalid(
                "rate limit needs at least one call per non-empty window".into(),
            ));
        }
        if !self.endpoint.starts_with("http://") && !self.endpoint.starts_with("https://") {
            return Err(ConfigError::Invalid(format!(
                "endpoint must be an http(s) URL, got {}",
                self.endpoint
            )));
        }
        Ok(())
    }
}

fn non_empty(s: String) -> Option<String> {
    let trimmed = s.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    var: &'static str,
) -> Result<Option<T>, ConfigError> {
    match lookup(var).and_then(non_empty) {
        None => Ok(None),
        Some(value) => value
            .parse::<T>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidValue { var, value }),
    }
}
