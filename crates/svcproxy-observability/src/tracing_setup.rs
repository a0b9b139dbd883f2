//! Tracing / logging initialisation helpers.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log level per component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Global default level: "trace" | "debug" | "info" | "warn" | "error"
    #[serde(default = "default_level")]
    pub level: String,
    /// Override per component: crate name → level
    #[serde(default)]
    pub components: BTreeMap<String, String>,
    /// Emit JSON structured logs (true) or human-readable text (false)
    #[serde(default)]
    pub json: bool,
}

fn default_level() -> String {
    "info".to_string()
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            components: BTreeMap::new(),
            json: false,
        }
    }
}

impl LogConfig {
    /// Parse a JSON logging section.
    pub fn from_json_str(json: &str) -> Result<Self, LoggingError> {
        Ok(serde_json::from_str(json)?)
    }

    /// `EnvFilter` directive string, e.g. `"info,svcproxy_core=debug"`.
    pub fn directives(&self) -> String {
        let mut directives = self.level.clone();
        for (component, level) in &self.components {
            directives.push_str(&format!(",{}={}", component.replace('-', "_"), level));
        }
        directives
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{directives}': {reason}")]
    Filter { directives: String, reason: String },

    #[error("failed to install global subscriber: {0}")]
    Install(#[from] tracing_subscriber::util::TryInitError),

    #[error("failed to parse logging configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Initialise tracing with the given log config.
/// Should be called once at application startup; an unparseable filter
/// falls back to `info`, and a second call is ignored.
pub fn init_tracing(config: &LogConfig) {
    if try_init_tracing(config).is_err() {
        let fallback = LogConfig {
            level: default_level(),
            components: BTreeMap::new(),
            json: config.json,
        };
        let _ = try_init_tracing(&fallback);
    }
}

/// Like [`init_tracing`], but reports a bad filter or an already-installed
/// global subscriber instead of recovering.
pub fn try_init_tracing(config: &LogConfig) -> Result<(), LoggingError> {
    let directives = config.directives();
    let filter = EnvFilter::try_new(&directives).map_err(|e| LoggingError::Filter {
        directives: directives.clone(),
        reason: e.to_string(),
    })?;

    if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json())
            .try_init()?;
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer())
            .try_init()?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_info_text() {
        let config = LogConfig::default();
        assert_eq!(config.directives(), "info");
        assert!(!config.json);
    }

    #[test]
    fn component_overrides_use_crate_names() {
        let mut config = LogConfig::default();
        config.level = "warn".into();
        config.components.insert("svcproxy-core".into(), "debug".into());
        assert_eq!(config.directives(), "warn,svcproxy_core=debug");
    }

    #[test]
    fn parses_partial_json() {
        let config = LogConfig::from_json_str(r#"{ "json": true }"#).unwrap();
        assert_eq!(config.level, "info");
        assert!(config.json);
    }

    #[test]
    fn bad_filter_reported() {
        let config = LogConfig {
            level: "info,svcproxy_core=loud".into(),
            ..Default::default()
        };
        assert!(matches!(
            try_init_tracing(&config),
            Err(LoggingError::Filter { .. })
        ));
    }

    #[test]
    fn second_install_reported() {
        init_tracing(&LogConfig::default());
        assert!(matches!(
            try_init_tracing(&LogConfig::default()),
            Err(LoggingError::Install(_))
        ));
    }
}
