//! svcproxy-observability — structured logging setup for processes that
//! host service proxies.
//!
//! The proxy crates only emit `tracing` events. Call [`init_tracing`] once
//! at startup to route them somewhere:
//!
//! ```no_run
//! use svcproxy_observability::{init_tracing, LogConfig};
//!
//! let mut config = LogConfig::default();
//! config.components.insert("svcproxy-core".into(), "debug".into());
//! init_tracing(&config);
//! ```

pub mod tracing_setup;

pub use tracing_setup::{init_tracing, try_init_tracing, LogConfig, LoggingError};
