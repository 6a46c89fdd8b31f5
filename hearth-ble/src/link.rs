//! Connection state machine and write serialization

use std::sync::Arc;

use tokio::sync::{Mutex, Notify, RwLock};

use crate::config::LinkConfig;
use crate::error::TransportError;
use crate::transport::GattTransport;

/// Where the link currently is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Disconnected,
    Connecting,
    Connected,
}

impl std::fmt::Display for LinkState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            LinkState::Disconnected => "disconnected",
            LinkState::Connecting => "connecting",
            LinkState::Connected => "connected",
        };
        f.write_str(s)
    }
}

struct Inner<T> {
    /// Single-writer discipline: every transport access goes through this
    /// mutex, so at most one write is in flight at the GATT layer.
    transport: Mutex<T>,
    state: RwLock<LinkState>,
    /// Woken when a dead handle is detected; the supervisor reconnects.
    link_down: Notify,
    config: LinkConfig,
}

/// Handle to the one BLE link. Cheap to clone; all clones share the same
/// transport, state, and supervisor wakeup.
pub struct Link<T: GattTransport> {
    inner: Arc<Inner<T>>,
}

impl<T: GattTransport> Clone for Link<T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<T: GattTransport> Link<T> {
    pub fn new(transport: T, config: LinkConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                transport: Mutex::new(transport),
                state: RwLock::new(LinkState::Disconnected),
                link_down: Notify::new(),
                config,
            }),
        }
    }

    pub async fn state(&self) -> LinkState {
        *self.inner.state.read().await
    }

    pub async fn is_ready(&self) -> bool {
        self.state().await == LinkState::Connected
    }

    /// Establish the link, retrying forever at a fixed interval.
    ///
    /// Returns only on success. The fireplace may be powered off or out of
    /// range for hours; the bridge must still come up and eventually serve.
    pub async fn connect(&self) {
        let mut attempt: u64 = 0;
        loop {
            attempt += 1;
            self.set_state(LinkState::Connecting).await;
            let result = self.inner.transport.lock().await.connect().await;
            match result {
                Ok(()) => {
                    self.set_state(LinkState::Connected).await;
                    tracing::info!(attempt, "link established");
                    return;
                }
                Err(e) => {
                    tracing::warn!(
                        attempt,
                        backoff = ?self.inner.config.retry_backoff,
                        "connect failed: {e}"
                    );
                    tokio::time::sleep(self.inner.config.retry_backoff).await;
                }
            }
        }
    }

    /// Supervise the link for the life of the process: connect, then park
    /// until a dead handle is reported, then reconnect.
    pub async fn run(&self) {
        loop {
            if self.state().await != LinkState::Connected {
                self.connect().await;
            }
            // Spurious wakeups while still connected just loop back to park.
            self.inner.link_down.notified().await;
        }
    }

    /// Non-blocking readiness gate for the request path.
    ///
    /// Never connects; that stays in the supervisor. If the handle died
    /// without a disconnect event, this is where it gets noticed.
    pub async fn ensure_ready(&self) -> Result<(), TransportError> {
        if self.state().await != LinkState::Connected {
            return Err(TransportError::NotConnected);
        }
        let transport = self.inner.transport.lock().await;
        if !transport.is_connected().await {
            drop(transport);
            self.mark_down().await;
            return Err(TransportError::NotConnected);
        }
        Ok(())
    }

    /// The single serialized write path.
    ///
    /// A failed write is surfaced to the caller, never retried here.
    pub async fn send(&self, payload: &[u8]) -> Result<(), TransportError> {
        let mut transport = self.inner.transport.lock().await;
        if self.state().await != LinkState::Connected {
            return Err(TransportError::NotConnected);
        }
        if !transport.is_connected().await {
            drop(transport);
            self.mark_down().await;
            return Err(TransportError::NotConnected);
        }
        match transport.write(payload).await {
            Ok(()) => {
                tracing::debug!(len = payload.len(), "wrote command frame");
                Ok(())
            }
            Err(e) => {
                if !transport.is_connected().await {
                    drop(transport);
                    self.mark_down().await;
                }
                Err(e)
            }
        }
    }

    async fn set_state(&self, state: LinkState) {
        let mut guard = self.inner.state.write().await;
        if *guard != state {
            tracing::info!(from = %*guard, to = %state, "link state change");
            *guard = state;
        }
    }

    async fn mark_down(&self) {
        self.set_state(LinkState::Disconnected).await;
        self.inner.link_down.notify_one();
    }
}
