//! Scripted in-memory channel and log capture shared by the integration tests.
#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

use svcproxy_core::{CallArena, Channel, ChannelError, EndpointAddress, ProxyConfig, ProxyState};

pub const ADDRESS: &str = "http://localhost:8989/calculator";

/// Small slot, long reconnect wait: makes "did it wait?" easy to observe.
pub fn test_config() -> ProxyConfig {
    ProxyConfig {
        max_open_retries: 3,
        max_call_retries: 3,
        reconnect_wait_secs: 30,
        retry_time_slot_ms: 10,
        call_arena_size: 1024,
        call_timeout_ms: None,
        close_timeout_ms: None,
    }
}

pub struct MockHandle {
    pub id: u32,
    state: Arc<Mutex<ProxyState>>,
}

/// Channel whose failures are queued up front by the test.
#[derive(Default)]
pub struct ScriptedChannel {
    open_failures: Mutex<VecDeque<ChannelError>>,
    invoke_failures: Mutex<VecDeque<ChannelError>>,
    close_failures: Mutex<VecDeque<ChannelError>>,
    abort_failures: Mutex<VecDeque<ChannelError>>,
    current: Mutex<Option<Arc<Mutex<ProxyState>>>>,
    invoke_delay: Mutex<Duration>,
    close_delay: Mutex<Duration>,
    keep_open_on_disconnect: AtomicBool,
    yield_in_invoke: AtomicBool,
    opens: AtomicU32,
    closes: AtomicU32,
    aborts: AtomicU32,
    invokes: AtomicU32,
}

impl ScriptedChannel {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn fail_opens(&self, errors: impl IntoIterator<Item = ChannelError>) {
        self.open_failures.lock().unwrap().extend(errors);
    }

    pub fn fail_invokes(&self, errors: impl IntoIterator<Item = ChannelError>) {
        self.invoke_failures.lock().unwrap().extend(errors);
    }

    pub fn fail_next_close(&self, error: ChannelError) {
        self.close_failures.lock().unwrap().push_back(error);
    }

    pub fn fail_next_abort(&self, error: ChannelError) {
        self.abort_failures.lock().unwrap().push_back(error);
    }

    /// Break the live connection as if the peer went away.
    pub fn fault_connection(&self) {
        if let Some(state) = self.current.lock().unwrap().as_ref() {
            *state.lock().unwrap() = ProxyState::Faulted;
        }
    }

    pub fn set_invoke_delay(&self, delay: Duration) {
        *self.invoke_delay.lock().unwrap() = delay;
    }

    pub fn set_close_delay(&self, delay: Duration) {
        *self.close_delay.lock().unwrap() = delay;
    }

    /// Disconnect errors no longer fault the handle.
    pub fn keep_open_on_disconnect(&self) {
        self.keep_open_on_disconnect.store(true, Ordering::SeqCst);
    }

    /// Every invoke yields once before looking at its script.
    pub fn yield_in_invoke(&self) {
        self.yield_in_invoke.store(true, Ordering::SeqCst);
    }

    pub fn opens(&self) -> u32 {
        self.opens.load(Ordering::SeqCst)
    }

    pub fn closes(&self) -> u32 {
        self.closes.load(Ordering::SeqCst)
    }

    pub fn aborts(&self) -> u32 {
        self.aborts.load(Ordering::SeqCst)
    }

    pub fn invokes(&self) -> u32 {
        self.invokes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Channel for ScriptedChannel {
    type Handle = MockHandle;
    type Request = String;
    type Response = String;

    async fn open(&self, _address: &EndpointAddress) -> Result<MockHandle, ChannelError> {
        let id = self.opens.fetch_add(1, Ordering::SeqCst) + 1;
        if let Some(e) = self.open_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        let state = Arc::new(Mutex::new(ProxyState::Open));
        *self.current.lock().unwrap() = Some(Arc::clone(&state));
        Ok(MockHandle { id, state })
    }

    async fn close(&self, handle: &MockHandle) -> Result<(), ChannelError> {
        self.closes.fetch_add(1, Ordering::SeqCst);
        let delay = *self.close_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if let Some(e) = self.close_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        *handle.state.lock().unwrap() = ProxyState::Closed;
        Ok(())
    }

    async fn abort(&self, handle: &MockHandle) -> Result<(), ChannelError> {
        self.aborts.fetch_add(1, Ordering::SeqCst);
        if let Some(e) = self.abort_failures.lock().unwrap().pop_front() {
            return Err(e);
        }
        *handle.state.lock().unwrap() = ProxyState::Faulted;
        Ok(())
    }

    fn query_state(&self, handle: &MockHandle) -> ProxyState {
        *handle.state.lock().unwrap()
    }

    async fn invoke(
        &self,
        handle: &MockHandle,
        request: &String,
        arena: &mut CallArena,
    ) -> Result<String, ChannelError> {
        self.invokes.fetch_add(1, Ordering::SeqCst);
        if self.yield_in_invoke.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
        let delay = *self.invoke_delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }

        if self.query_state(handle) != ProxyState::Open {
            return Err(ChannelError::EndpointDisconnected);
        }
        let scripted = self.invoke_failures.lock().unwrap().pop_front();
        if let Some(e) = scripted {
            if e.is_disconnect() && !self.keep_open_on_disconnect.load(Ordering::SeqCst) {
                *handle.state.lock().unwrap() = ProxyState::Faulted;
            }
            return Err(e);
        }

        let echoed = arena.alloc_copy(request.as_bytes())?;
        Ok(String::from_utf8_lossy(echoed).into_owned())
    }
}

/// Counts events per level for the current thread's subscriber.
#[derive(Clone, Default)]
pub struct LogCounter {
    warn: Arc<AtomicUsize>,
    info: Arc<AtomicUsize>,
    error: Arc<AtomicUsize>,
}

impl LogCounter {
    pub fn warnings(&self) -> usize {
        self.warn.load(Ordering::SeqCst)
    }

    pub fn notices(&self) -> usize {
        self.info.load(Ordering::SeqCst)
    }

    pub fn criticals(&self) -> usize {
        self.error.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for LogCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let counter = match *event.metadata().level() {
            Level::WARN => &self.warn,
            Level::INFO => &self.info,
            Level::ERROR => &self.error,
            _ => return,
        };
        counter.fetch_add(1, Ordering::SeqCst);
    }
}

/// Install a counting subscriber for the current thread.
pub fn capture_logs() -> (LogCounter, DefaultGuard) {
    let counter = LogCounter::default();
    let subscriber = tracing_subscriber::registry().with(counter.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (counter, guard)
}
