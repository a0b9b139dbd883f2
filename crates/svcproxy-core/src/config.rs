//! Proxy policy configuration.

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Retries beyond this make `2^n` backoff ceilings meaningless.
pub const MAX_RETRIES_LIMIT: u32 = 32;

/// Immutable retry/timeout policy for a [`ServiceProxy`](crate::proxy::ServiceProxy).
///
/// Usually loaded once per process and shared behind an `Arc`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Retries after the first failed attempt to open the connection.
    #[serde(default = "default_max_retries")]
    pub max_open_retries: u32,
    /// Retries after the first failed attempt of an invocation.
    #[serde(default = "default_max_retries")]
    pub max_call_retries: u32,
    /// Fixed wait (seconds) when a reconnect found the proxy already open.
    #[serde(default = "default_reconnect_wait_secs")]
    pub reconnect_wait_secs: u64,
    /// Exponential backoff slot (milliseconds).
    #[serde(default = "default_retry_time_slot_ms")]
    pub retry_time_slot_ms: u64,
    /// Default per-call arena size in bytes.
    #[serde(default = "default_call_arena_size")]
    pub call_arena_size: usize,
    /// Per-attempt invocation timeout (milliseconds). `None` = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub call_timeout_ms: Option<u64>,
    /// Bound on the graceful close drain (milliseconds). `None` = unbounded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub close_timeout_ms: Option<u64>,
}

fn default_max_retries() -> u32 { 5 }
fn default_reconnect_wait_secs() -> u64 { 30 }
fn default_retry_time_slot_ms() -> u64 { 100 }
fn default_call_arena_size() -> usize { 64 * 1024 }

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            max_open_retries: default_max_retries(),
            max_call_retries: default_max_retries(),
            reconnect_wait_secs: default_reconnect_wait_secs(),
            retry_time_slot_ms: default_retry_time_slot_ms(),
            call_arena_size: default_call_arena_size(),
            call_timeout_ms: None,
            close_timeout_ms: None,
        }
    }
}

impl ProxyConfig {
    /// Parse and validate a JSON document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Reject values the retry loops cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_retries("max_open_retries", self.max_open_retries)?;
        check_retries("max_call_retries", self.max_call_retries)?;
        if self.retry_time_slot_ms == 0 {
            return Err(invalid("retry_time_slot_ms", "must be greater than zero"));
        }
        if self.call_arena_size == 0 {
            return Err(invalid("call_arena_size", "must be greater than zero"));
        }
        if self.call_timeout_ms == Some(0) {
            return Err(invalid("call_timeout_ms", "must be greater than zero when set"));
        }
        if self.close_timeout_ms == Some(0) {
            return Err(invalid("close_timeout_ms", "must be greater than zero when set"));
        }
        Ok(())
    }

    pub fn reconnect_wait(&self) -> Duration {
        Duration::from_secs(self.reconnect_wait_secs)
    }

    pub fn retry_time_slot(&self) -> Duration {
        Duration::from_millis(self.retry_time_slot_ms)
    }

    pub fn call_timeout(&self) -> Option<Duration> {
        self.call_timeout_ms.map(Duration::from_millis)
    }

    pub fn close_timeout(&self) -> Option<Duration> {
        self.close_timeout_ms.map(Duration::from_millis)
    }
}

fn check_retries(field: &'static str, value: u32) -> Result<(), ConfigError> {
    if value > MAX_RETRIES_LIMIT {
        return Err(invalid(
            field,
            format!("{value} exceeds the limit of {MAX_RETRIES_LIMIT}"),
        ));
    }
    Ok(())
}

fn invalid(field: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        field,
        reason: reason.into(),
    }
}
