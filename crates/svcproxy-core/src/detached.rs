//! Handle to an invocation running on its own Tokio task.

use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::task::JoinHandle;

use crate::error::ProxyError;

/// Outcome of a detached call, resolved by awaiting it.
///
/// There is no way to cancel the call: dropping a `PendingCall` only stops
/// observing it, and the task still runs its retry loop to completion.
#[must_use = "a detached call's outcome is lost unless it is awaited"]
pub struct PendingCall<T> {
    operation: String,
    task: JoinHandle<Result<T, ProxyError>>,
}

impl<T> PendingCall<T> {
    pub(crate) fn new(operation: String, task: JoinHandle<Result<T, ProxyError>>) -> Self {
        Self { operation, task }
    }

    /// Label of the operation being run.
    pub fn operation(&self) -> &str {
        &self.operation
    }

    /// Returns `true` once the call has succeeded or given up.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl<T> Future for PendingCall<T> {
    type Output = Result<T, ProxyError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.task).poll(cx) {
            Poll::Pending => Poll::Pending,
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(join)) => Poll::Ready(Err(ProxyError::Detached {
                operation: self.operation.clone(),
                reason: join.to_string(),
            })),
        }
    }
}
