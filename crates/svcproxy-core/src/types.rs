//! Shared value types: endpoint address, lifecycle state, open outcome.

use std::fmt;

use crate::error::ConfigError;

/// Immutable address of the remote service endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EndpointAddress(String);

impl EndpointAddress {
    /// Wrap `address`, rejecting blank strings.
    pub fn new(address: impl Into<String>) -> Result<Self, ConfigError> {
        let address = address.into();
        if address.trim().is_empty() {
            return Err(ConfigError::EmptyAddress);
        }
        Ok(Self(address))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EndpointAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for EndpointAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Lifecycle state of a proxy's connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProxyState {
    /// No live connection. `open` is required before calls succeed.
    Closed,
    /// Connection established and usable.
    Open,
    /// Connection broke; it must be closed (or aborted) before reuse.
    Faulted,
}

impl ProxyState {
    pub(crate) fn as_u8(self) -> u8 {
        match self {
            Self::Closed => 0,
            Self::Open => 1,
            Self::Faulted => 2,
        }
    }

    pub(crate) fn from_u8(raw: u8) -> Self {
        match raw {
            1 => Self::Open,
            2 => Self::Faulted,
            _ => Self::Closed,
        }
    }

    /// Returns `true` if a connection is held that `close`/`abort` would stop.
    pub fn is_running(self) -> bool {
        matches!(self, Self::Open | Self::Faulted)
    }
}

impl fmt::Display for ProxyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Closed => write!(f, "closed"),
            Self::Open => write!(f, "open"),
            Self::Faulted => write!(f, "faulted"),
        }
    }
}

/// What [`ProxyLifecycle::open`](crate::lifecycle::ProxyLifecycle::open) did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    /// The proxy was closed or faulted and is now open.
    Opened,
    /// The proxy was already open; nothing was done.
    AlreadyOpen,
}

impl OpenOutcome {
    pub fn was_opened(self) -> bool {
        self == Self::Opened
    }
}
