//! Error taxonomy for the service proxy.
//!
//! [`ChannelError`] is what a [`Channel`](crate::channel::Channel) reports
//! for one operation. The proxy turns those into [`ConnectionError`] (the
//! lifecycle could not be driven) or [`ClientCallError`] (an invocation ran
//! out of attempts or hit a fatal failure). [`ConfigError`] is raised at
//! construction time only.

use std::time::Duration;

use thiserror::Error;

use crate::policy::classify::{classify, FailureAction};
use crate::types::EndpointAddress;

/// Error codes a channel reports for a single open/close/abort/invoke.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The call arena (or the channel itself) ran out of memory.
    #[error("out of memory")]
    OutOfMemory,

    /// The endpoint exists but is not accepting requests right now.
    #[error("endpoint not available")]
    EndpointNotAvailable,

    /// The endpoint rejected the request because it is overloaded.
    #[error("endpoint too busy")]
    EndpointTooBusy,

    /// The operation did not complete in time.
    #[error("operation timed out after {ms}ms")]
    OperationTimedOut { ms: u64 },

    /// A channel or service quota was exceeded.
    #[error("quota exceeded")]
    QuotaExceeded,

    /// The connection to the endpoint was lost.
    #[error("endpoint disconnected")]
    EndpointDisconnected,

    /// The endpoint address could not be resolved.
    #[error("endpoint not found")]
    EndpointNotFound,

    /// The endpoint could not be reached.
    #[error("endpoint unreachable")]
    EndpointUnreachable,

    /// No live connection handle exists for this proxy.
    #[error("proxy is not open")]
    NotOpen,

    /// The operation is not valid in the channel's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// The remote service returned a fault.
    #[error("service fault: {0}")]
    Fault(String),

    /// Anything else the channel could not map onto a known code.
    #[error("{0}")]
    Other(String),
}

impl ChannelError {
    /// The recovery the proxy should attempt for this failure.
    pub fn classify(&self) -> FailureAction {
        classify(self)
    }

    /// Returns `true` if another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        !self.is_fatal()
    }

    /// Returns `true` if the proxy gives up on this failure at once.
    pub fn is_fatal(&self) -> bool {
        self.classify() == FailureAction::Fatal
    }

    /// Returns `true` if the failure points at a lost connection.
    pub fn is_disconnect(&self) -> bool {
        self.classify() == FailureAction::Reconnect
    }
}

/// The proxy could not open, close or abort its connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("failed to open proxy for service at '{address}' after {attempts} attempt(s): {source}")]
    Open {
        address: EndpointAddress,
        attempts: u32,
        source: ChannelError,
    },

    #[error("failed to close proxy for service at '{address}': {source}")]
    Close {
        address: EndpointAddress,
        source: ChannelError,
    },

    #[error("failed to abort proxy for service at '{address}': {source}")]
    Abort {
        address: EndpointAddress,
        source: ChannelError,
    },
}

impl ConnectionError {
    /// The channel failure behind this error.
    pub fn channel_error(&self) -> &ChannelError {
        match self {
            Self::Open { source, .. } | Self::Close { source, .. } | Self::Abort { source, .. } => {
                source
            }
        }
    }
}

/// An invocation failed for good: fatal error or retry budget exhausted.
#[derive(Debug, Error)]
#[error(
    "{operation} failed after {attempts} attempt(s) in {:.3} second(s): {source}",
    .elapsed.as_secs_f64()
)]
pub struct ClientCallError {
    /// Label the caller gave the operation.
    pub operation: String,
    /// Total attempts made, including the first.
    pub attempts: u32,
    /// Wall-clock time from the first attempt to giving up.
    pub elapsed: Duration,
    /// Diagnostic from the last failed attempt.
    pub source: ChannelError,
}

impl ClientCallError {
    /// Returns `true` if the proxy gave up without retrying.
    pub fn was_fatal(&self) -> bool {
        self.source.is_fatal()
    }
}

/// Invalid proxy policy or construction arguments.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("endpoint address must not be empty")]
    EmptyAddress,

    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("failed to parse proxy configuration: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read proxy configuration from '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Any failure surfaced by [`ServiceProxy`](crate::proxy::ServiceProxy).
#[derive(Debug, Error)]
pub enum ProxyError {
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    #[error(transparent)]
    Call(#[from] ClientCallError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    /// A detached call's task ended without producing an outcome (it panicked).
    #[error("detached call to {operation} did not complete: {reason}")]
    Detached { operation: String, reason: String },
}

impl ProxyError {
    /// The channel failure behind this error, if there is one.
    pub fn channel_error(&self) -> Option<&ChannelError> {
        match self {
            Self::Connection(e) => Some(e.channel_error()),
            Self::Call(e) => Some(&e.source),
            Self::Config(_) | Self::Detached { .. } => None,
        }
    }
}
