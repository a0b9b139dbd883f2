//! Maps channel error codes onto a recovery action.

use crate::error::ChannelError;

/// Recommended recovery for a failed channel operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureAction {
    /// Not worth another attempt.
    Fatal,
    /// The connection is believed lost: reopen, then retry.
    Reconnect,
    /// Transient resource pressure: wait, then retry on the same connection.
    RetryWithBackoff,
}

/// Classify `error`. Pure: the same code always maps to the same action.
pub fn classify(error: &ChannelError) -> FailureAction {
    match error {
        ChannelError::OutOfMemory
        | ChannelError::EndpointNotAvailable
        | ChannelError::EndpointTooBusy
        | ChannelError::OperationTimedOut { .. }
        | ChannelError::QuotaExceeded => FailureAction::RetryWithBackoff,

        ChannelError::EndpointDisconnected
        | ChannelError::EndpointNotFound
        | ChannelError::EndpointUnreachable => FailureAction::Reconnect,

        // A proxy the caller closed stays closed until the caller opens it.
        ChannelError::NotOpen
        | ChannelError::InvalidOperation(_)
        | ChannelError::Fault(_)
        | ChannelError::Other(_) => FailureAction::Fatal,
    }
}
