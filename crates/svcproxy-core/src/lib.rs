//! svcproxy-core — resilient client-side proxy for remote services.
//!
//! # Overview
//!
//! A [`ServiceProxy`] wraps a connection-oriented [`Channel`] and takes the
//! retry burden off its callers:
//!
//! - [`lifecycle`] — opens, closes and aborts the connection under one lock
//! - [`executor`] — runs an operation, classifies failures, backs off or
//!   reconnects, and gives up with a typed error
//! - [`policy`] — failure classification, exponential backoff, retry bookkeeping
//! - [`ProxyConfig`] — retry caps, waits, timeouts and arena sizing
//!
//! ```text
//! invoke → attempt → ok ───────────────────────────────→ response
//!                  → err → classify → Fatal / budget out → ClientCallError
//!                                   → RetryWithBackoff   → sleep → attempt
//!                                   → Reconnect          → open  → attempt
//! ```

pub mod arena;
pub mod channel;
pub mod config;
pub mod detached;
pub mod error;
pub mod executor;
pub mod lifecycle;
pub mod policy;
pub mod proxy;
pub mod types;

pub use arena::CallArena;
pub use channel::Channel;
pub use config::ProxyConfig;
pub use detached::PendingCall;
pub use error::{ChannelError, ClientCallError, ConfigError, ConnectionError, ProxyError};
pub use policy::FailureAction;
pub use proxy::ServiceProxy;
pub use types::{EndpointAddress, OpenOutcome, ProxyState};
