//! The `Channel` trait — the transport the proxy drives.
//!
//! A channel knows how to establish a connection to an endpoint and how to
//! run one request over it. It knows nothing about retries: every method
//! reports the raw [`ChannelError`] and the proxy decides what to do next.

use async_trait::async_trait;

use crate::arena::CallArena;
use crate::error::ChannelError;
use crate::types::{EndpointAddress, ProxyState};

/// Connection-oriented transport underneath a [`ServiceProxy`](crate::proxy::ServiceProxy).
///
/// # Thread Safety
/// Implementations must be `Send + Sync`: a single channel serves every
/// task sharing the proxy, and `invoke` may run concurrently with itself.
///
/// # Handles
/// `open` produces a handle that the proxy owns. While a call is running
/// the proxy lends it out read-only; lifecycle methods are never run
/// concurrently for the same proxy.
#[async_trait]
pub trait Channel: Send + Sync + 'static {
    /// Live connection to one endpoint.
    type Handle: Send + Sync + 'static;
    /// Description of one remote operation with its arguments.
    type Request: Send + Sync + 'static;
    /// Result of one remote operation.
    type Response: Send + 'static;

    /// Establish a connection to `address`.
    async fn open(&self, address: &EndpointAddress) -> Result<Self::Handle, ChannelError>;

    /// Graceful shutdown: wait for in-flight sessions to finish.
    async fn close(&self, handle: &Self::Handle) -> Result<(), ChannelError>;

    /// Immediate shutdown: drop in-flight sessions. Leaves the handle faulted.
    async fn abort(&self, handle: &Self::Handle) -> Result<(), ChannelError>;

    /// Current state of the connection behind `handle`.
    fn query_state(&self, handle: &Self::Handle) -> ProxyState;

    /// Run `request` over the connection, using `arena` for scratch memory.
    async fn invoke(
        &self,
        handle: &Self::Handle,
        request: &Self::Request,
        arena: &mut CallArena,
    ) -> Result<Self::Response, ChannelError>;
}
