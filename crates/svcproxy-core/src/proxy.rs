//! `ServiceProxy` — lifecycle manager and call executor behind one handle.

use std::fmt;
use std::sync::Arc;

use crate::channel::Channel;
use crate::config::ProxyConfig;
use crate::detached::PendingCall;
use crate::error::{ConfigError, ConnectionError, ProxyError};
use crate::executor::CallExecutor;
use crate::lifecycle::ProxyLifecycle;
use crate::policy::HoldFlag;
use crate::types::{EndpointAddress, OpenOutcome, ProxyState};

/// Client-side proxy to one remote service endpoint.
///
/// Share it as `Arc<ServiceProxy<C>>`: every method takes `&self`, calls
/// run concurrently, and lifecycle changes are serialized internally.
/// Dropping a proxy that is still open aborts the connection in the
/// background.
pub struct ServiceProxy<C: Channel> {
    lifecycle: ProxyLifecycle<C>,
    hold: HoldFlag,
}

impl<C: Channel> ServiceProxy<C> {
    /// Build a closed proxy to `address` with its own copy of `config`.
    pub fn new(
        channel: Arc<C>,
        address: impl Into<String>,
        config: ProxyConfig,
    ) -> Result<Self, ConfigError> {
        Self::with_shared_config(channel, address, Arc::new(config))
    }

    /// Build a closed proxy reading a process-wide configuration.
    pub fn with_shared_config(
        channel: Arc<C>,
        address: impl Into<String>,
        config: Arc<ProxyConfig>,
    ) -> Result<Self, ConfigError> {
        let address = EndpointAddress::new(address)?;
        Ok(Self {
            lifecycle: ProxyLifecycle::new(channel, address, config)?,
            hold: HoldFlag::new(),
        })
    }

    pub fn address(&self) -> &EndpointAddress {
        self.lifecycle.address()
    }

    pub fn config(&self) -> &ProxyConfig {
        self.lifecycle.config()
    }

    pub fn state(&self) -> ProxyState {
        self.lifecycle.state()
    }

    /// Returns `true` while a failure burst is being retried.
    pub fn is_on_hold(&self) -> bool {
        self.hold.is_engaged()
    }

    /// See [`ProxyLifecycle::open`].
    pub async fn open(&self) -> Result<OpenOutcome, ConnectionError> {
        self.lifecycle.open().await
    }

    /// See [`ProxyLifecycle::close`].
    pub async fn close(&self) -> Result<bool, ConnectionError> {
        self.lifecycle.close().await
    }

    /// See [`ProxyLifecycle::abort`].
    pub async fn abort(&self) -> Result<bool, ConnectionError> {
        self.lifecycle.abort().await
    }

    /// Run one operation, retrying transient failures and reconnecting
    /// lost connections. `arena_size` bounds scratch memory per attempt.
    pub async fn invoke(
        &self,
        operation: &str,
        arena_size: usize,
        request: &C::Request,
    ) -> Result<C::Response, ProxyError> {
        CallExecutor::new(&self.lifecycle, &self.hold)
            .invoke(operation, arena_size, request)
            .await
    }

    /// [`invoke`](Self::invoke) with the configured default arena size.
    pub async fn invoke_default(
        &self,
        operation: &str,
        request: &C::Request,
    ) -> Result<C::Response, ProxyError> {
        self.invoke(operation, self.config().call_arena_size, request)
            .await
    }

    /// Start [`invoke`](Self::invoke) on a separate Tokio task.
    ///
    /// Must be called within a Tokio runtime.
    pub fn invoke_detached(
        self: &Arc<Self>,
        operation: impl Into<String>,
        arena_size: usize,
        request: C::Request,
    ) -> PendingCall<C::Response> {
        let operation = operation.into();
        let proxy = Arc::clone(self);
        let label = operation.clone();
        let task = tokio::spawn(async move { proxy.invoke(&label, arena_size, &request).await });
        PendingCall::new(operation, task)
    }
}

impl<C: Channel> fmt::Debug for ServiceProxy<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceProxy")
            .field("lifecycle", &self.lifecycle)
            .field("on_hold", &self.hold.is_engaged())
            .finish()
    }
}
