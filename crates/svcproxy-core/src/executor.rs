//! Runs one remote operation with classification-driven retries.

use tracing::{debug, info, warn};

use crate::arena::CallArena;
use crate::channel::Channel;
use crate::error::{ChannelError, ClientCallError, ProxyError};
use crate::lifecycle::ProxyLifecycle;
use crate::policy::retry::pause;
use crate::policy::{Backoff, FailureAction, HoldFlag, RetryContext};
use crate::types::OpenOutcome;

/// Invokes operations over a lifecycle-managed connection.
///
/// Invocations are not serialized against each other; only the reconnect
/// path goes through the lifecycle lock.
pub struct CallExecutor<'a, C: Channel> {
    lifecycle: &'a ProxyLifecycle<C>,
    hold: &'a HoldFlag,
}

impl<'a, C: Channel> CallExecutor<'a, C> {
    pub fn new(lifecycle: &'a ProxyLifecycle<C>, hold: &'a HoldFlag) -> Self {
        Self { lifecycle, hold }
    }

    /// Run `request`, retrying per the proxy's policy.
    ///
    /// Each attempt gets its own [`CallArena`] of `arena_size` bytes.
    pub async fn invoke(
        &self,
        operation: &str,
        arena_size: usize,
        request: &C::Request,
    ) -> Result<C::Response, ProxyError> {
        let config = self.lifecycle.config();
        let backoff = Backoff::new(config.retry_time_slot());
        let mut ctx = RetryContext::start(config.max_call_retries);

        loop {
            let error = match self.attempt(arena_size, request).await {
                Ok(response) => {
                    self.hold.release();
                    return Ok(response);
                }
                Err(e) => e,
            };

            let action = error.classify();
            if action == FailureAction::Fatal || ctx.exhausted() {
                return Err(ClientCallError {
                    operation: operation.to_string(),
                    attempts: ctx.attempts(),
                    elapsed: ctx.elapsed(),
                    source: error,
                }
                .into());
            }

            if self.hold.engage() {
                warn!(
                    address = %self.lifecycle.address(),
                    operation,
                    max_retries = ctx.max_retries(),
                    error = %error,
                    "failed call to operation in service, proxy will retry"
                );
            }

            if action == FailureAction::Reconnect {
                match self.lifecycle.open().await? {
                    OpenOutcome::Opened => info!(
                        address = %self.lifecycle.address(),
                        operation,
                        "proxy for service was re-opened after loss of connection"
                    ),
                    // Someone else reconnected, or the disconnect was not real.
                    OpenOutcome::AlreadyOpen => pause(config.reconnect_wait()).await,
                }
            } else {
                let delay = backoff.jittered(ctx.attempt());
                debug!(
                    operation,
                    attempt = ctx.attempt(),
                    delay_ms = delay.as_millis() as u64,
                    "backing off before retry"
                );
                pause(delay).await;
            }

            ctx.advance();
        }
    }

    async fn attempt(
        &self,
        arena_size: usize,
        request: &C::Request,
    ) -> Result<C::Response, ChannelError> {
        let handle = self
            .lifecycle
            .handle()
            .await
            .ok_or(ChannelError::NotOpen)?;
        let mut arena = CallArena::acquire(arena_size);

        let call = self
            .lifecycle
            .channel()
            .invoke(&handle, request, &mut arena);
        match self.lifecycle.config().call_timeout() {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .unwrap_or_else(|_| {
                    Err(ChannelError::OperationTimedOut {
                        ms: limit.as_millis() as u64,
                    })
                }),
            None => call.await,
        }
    }
}
