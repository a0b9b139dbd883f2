//! Connection lifecycle: Closed → Open → (Faulted) → Closed.
//!
//! State transitions:
//! - `Closed`/`Faulted` → `Open`:  [`ProxyLifecycle::open`] succeeds
//! - `Open` → `Closed`:            [`ProxyLifecycle::close`] (graceful) or [`ProxyLifecycle::abort`]
//! - `Faulted` → `Closed`:         either of the above
//!
//! Every transition runs under one exclusive lock that guards the handle
//! and its state together, so no caller ever sees a half-open proxy.

use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

use crate::channel::Channel;
use crate::config::ProxyConfig;
use crate::error::{ChannelError, ConfigError, ConnectionError};
use crate::policy::retry::pause;
use crate::policy::{Backoff, FailureAction, RetryContext};
use crate::types::{EndpointAddress, OpenOutcome, ProxyState};

struct ProxySlot<H> {
    handle: Option<Arc<H>>,
    state: ProxyState,
}

/// Owns a channel handle and serializes every change to its state.
pub struct ProxyLifecycle<C: Channel> {
    channel: Arc<C>,
    address: EndpointAddress,
    config: Arc<ProxyConfig>,
    slot: Mutex<ProxySlot<C::Handle>>,
    // Last state written under the lock; read when a transition is in flight.
    published: AtomicU8,
}

impl<C: Channel> ProxyLifecycle<C> {
    /// Create a closed lifecycle. Fails if `config` does not validate.
    pub fn new(
        channel: Arc<C>,
        address: EndpointAddress,
        config: Arc<ProxyConfig>,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            channel,
            address,
            config,
            slot: Mutex::new(ProxySlot {
                handle: None,
                state: ProxyState::Closed,
            }),
            published: AtomicU8::new(ProxyState::Closed.as_u8()),
        })
    }

    pub fn address(&self) -> &EndpointAddress {
        &self.address
    }

    pub fn config(&self) -> &ProxyConfig {
        &self.config
    }

    pub fn channel(&self) -> &Arc<C> {
        &self.channel
    }

    /// Current state.
    ///
    /// Asks the channel when no transition is running; otherwise returns the
    /// state published by the last completed transition instead of waiting.
    pub fn state(&self) -> ProxyState {
        match self.slot.try_lock() {
            Ok(mut slot) => self.refresh(&mut slot),
            Err(_) => self.published_state(),
        }
    }

    /// State as of the last completed transition, without touching the lock.
    pub fn published_state(&self) -> ProxyState {
        ProxyState::from_u8(self.published.load(Ordering::Acquire))
    }

    /// Snapshot the handle for one call attempt. The lock is released on return.
    pub(crate) async fn handle(&self) -> Option<Arc<C::Handle>> {
        self.slot.lock().await.handle.clone()
    }

    /// Open the connection, retrying transient failures.
    ///
    /// Returns [`OpenOutcome::AlreadyOpen`] without doing anything if the
    /// proxy is open. A faulted connection is kept until a new one is
    /// established, so a failed open leaves the state as it was.
    pub async fn open(&self) -> Result<OpenOutcome, ConnectionError> {
        let mut slot = self.slot.lock().await;

        match self.refresh(&mut slot) {
            ProxyState::Open => return Ok(OpenOutcome::AlreadyOpen),
            ProxyState::Faulted => {}
            ProxyState::Closed => slot.handle = None,
        }

        let backoff = Backoff::new(self.config.retry_time_slot());
        let mut ctx = RetryContext::start(self.config.max_open_retries);

        loop {
            let error = match self.channel.open(&self.address).await {
                Ok(handle) => {
                    if let Some(stale) = slot.handle.take() {
                        if let Err(e) = self.shutdown(&stale, true).await {
                            warn!(
                                address = %self.address,
                                error = %e,
                                "failed to release faulted connection after reopening"
                            );
                        }
                    }
                    slot.handle = Some(Arc::new(handle));
                    self.publish(&mut slot, ProxyState::Open);
                    if ctx.attempt() > 0 {
                        info!(
                            address = %self.address,
                            attempts = ctx.attempts(),
                            elapsed_secs = ctx.elapsed().as_secs_f64(),
                            "proxy for service opened after retrying"
                        );
                    }
                    return Ok(OpenOutcome::Opened);
                }
                Err(e) => e,
            };

            let action = error.classify();
            if action == FailureAction::Fatal || ctx.exhausted() {
                return Err(ConnectionError::Open {
                    address: self.address.clone(),
                    attempts: ctx.attempts(),
                    source: error,
                });
            }

            if ctx.attempt() == 0 {
                warn!(
                    address = %self.address,
                    max_retries = ctx.max_retries(),
                    error = %error,
                    "failed to open proxy for service, will re-attempt"
                );
            }

            // Connectivity problems retry at a constant interval, resource
            // pressure with exponential backoff.
            let delay = match action {
                FailureAction::Reconnect => self.config.reconnect_wait(),
                _ => backoff.jittered(ctx.attempt()),
            };
            debug!(
                address = %self.address,
                attempt = ctx.attempt(),
                delay_ms = delay.as_millis() as u64,
                "waiting before next open attempt"
            );
            pause(delay).await;
            ctx.advance();
        }
    }

    /// Gracefully close the connection and reset the proxy for reuse.
    ///
    /// Returns `true` if an open or faulted connection was stopped, `false`
    /// if the proxy was already closed.
    pub async fn close(&self) -> Result<bool, ConnectionError> {
        let mut slot = self.slot.lock().await;
        let state = self.refresh(&mut slot);

        let result = match slot.handle.take() {
            Some(handle) if state.is_running() => self
                .shutdown(&handle, state == ProxyState::Faulted)
                .await
                .map(|()| true),
            _ => Ok(false),
        };

        self.publish(&mut slot, ProxyState::Closed);
        if let Ok(true) = result {
            debug!(address = %self.address, "proxy closed");
        }
        result
    }

    /// Tear the connection down immediately and reset the proxy for reuse.
    ///
    /// Returns `true` if an open or faulted connection was stopped. If the
    /// channel refuses to abort, the proxy keeps its handle and state.
    pub async fn abort(&self) -> Result<bool, ConnectionError> {
        let mut slot = self.slot.lock().await;
        let state = self.refresh(&mut slot);

        if state == ProxyState::Open {
            if let Some(handle) = slot.handle.as_deref() {
                self.channel
                    .abort(handle)
                    .await
                    .map_err(|source| ConnectionError::Abort {
                        address: self.address.clone(),
                        source,
                    })?;
            }
        }

        // An aborted connection is faulted; close it like any other.
        let result = match slot.handle.take() {
            Some(handle) if state.is_running() => {
                self.shutdown(&handle, true).await.map(|()| true)
            }
            _ => Ok(false),
        };

        self.publish(&mut slot, ProxyState::Closed);
        if let Ok(true) = result {
            debug!(address = %self.address, "proxy aborted");
        }
        result
    }

    async fn shutdown(&self, handle: &C::Handle, faulted: bool) -> Result<(), ConnectionError> {
        let drain = self.channel.close(handle);
        let result = match self.config.close_timeout() {
            Some(limit) => tokio::time::timeout(limit, drain)
                .await
                .unwrap_or_else(|_| {
                    Err(ChannelError::OperationTimedOut {
                        ms: limit.as_millis() as u64,
                    })
                }),
            None => drain.await,
        };

        match result {
            Ok(()) => Ok(()),
            // Closing a broken connection is a no-op.
            Err(ChannelError::InvalidOperation(detail)) if faulted => {
                warn!(
                    address = %self.address,
                    detail = %detail,
                    "proxy for service was closed, but with an error"
                );
                Ok(())
            }
            Err(source) => Err(ConnectionError::Close {
                address: self.address.clone(),
                source,
            }),
        }
    }

    fn refresh(&self, slot: &mut ProxySlot<C::Handle>) -> ProxyState {
        let state = match slot.handle.as_deref() {
            Some(handle) => self.channel.query_state(handle),
            None => ProxyState::Closed,
        };
        self.publish(slot, state);
        slot.state
    }

    fn publish(&self, slot: &mut ProxySlot<C::Handle>, state: ProxyState) {
        slot.state = state;
        self.published.store(state.as_u8(), Ordering::Release);
    }
}

impl<C: Channel> fmt::Debug for ProxyLifecycle<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyLifecycle")
            .field("address", &self.address)
            .field("state", &self.published_state())
            .finish()
    }
}

impl<C: Channel> Drop for ProxyLifecycle<C> {
    fn drop(&mut self) {
        let Some(handle) = self.slot.get_mut().handle.take() else {
            return;
        };
        let state = self.channel.query_state(&handle);
        if !state.is_running() {
            return;
        }

        let channel = Arc::clone(&self.channel);
        let address = self.address.clone();
        match tokio::runtime::Handle::try_current() {
            Ok(runtime) => {
                runtime.spawn(teardown(channel, handle, state, address));
            }
            Err(_) => error!(
                address = %address,
                state = %state,
                "proxy dropped outside a Tokio runtime, connection was not shut down"
            ),
        }
    }
}

/// Best-effort shutdown of a dropped proxy. Nobody is left to receive an
/// error, so failures are only logged.
async fn teardown<C: Channel>(
    channel: Arc<C>,
    handle: Arc<C::Handle>,
    state: ProxyState,
    address: EndpointAddress,
) {
    if state == ProxyState::Open {
        if let Err(e) = channel.abort(&handle).await {
            error!(address = %address, error = %e, "failed to abort proxy for service during teardown");
        }
    }
    match channel.close(&handle).await {
        Ok(()) | Err(ChannelError::InvalidOperation(_)) => {
            debug!(address = %address, "proxy torn down");
        }
        Err(e) => {
            error!(address = %address, error = %e, "failed to close proxy for service during teardown");
        }
    }
}
