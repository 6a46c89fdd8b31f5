//! Scriptable in-memory transport
//!
//! Always compiled so downstream crates can drive their own tests with it.

use std::sync::{Arc, Mutex};

use crate::error::TransportError;
use crate::transport::GattTransport;

#[derive(Debug, Default)]
struct FakeInner {
    connected: bool,
    connect_attempts: u32,
    failing_connects: u32,
    failing_writes: u32,
    writes: Vec<Vec<u8>>,
}

/// Fake GATT session for tests. Clones share state, so a test can keep a
/// handle for inspection after moving the transport into a [`crate::Link`].
#[derive(Debug, Clone, Default)]
pub struct FakeTransport {
    inner: Arc<Mutex<FakeInner>>,
}

impl FakeTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script the next `n` connect attempts to fail.
    pub fn fail_connects(&self, n: u32) {
        self.lock().failing_connects = n;
    }

    /// Script the next `n` writes to fail.
    pub fn fail_writes(&self, n: u32) {
        self.lock().failing_writes = n;
    }

    /// Kill the session without telling anyone, like a device that walked
    /// out of range.
    pub fn sever(&self) {
        self.lock().connected = false;
    }

    pub fn connect_attempts(&self) -> u32 {
        self.lock().connect_attempts
    }

    pub fn writes(&self) -> Vec<Vec<u8>> {
        self.lock().writes.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, FakeInner> {
        self.inner.lock().expect("fake transport mutex poisoned")
    }
}

#[async_trait::async_trait]
impl GattTransport for FakeTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        let mut inner = self.lock();
        inner.connect_attempts += 1;
        if inner.failing_connects > 0 {
            inner.failing_connects -= 1;
            return Err(TransportError::DeviceNotFound(btleplug::api::BDAddr::from(
                [0u8; 6],
            )));
        }
        inner.connected = true;
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        self.lock().connected
    }

    async fn write(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let mut inner = self.lock();
        if !inner.connected {
            return Err(TransportError::NotConnected);
        }
        if inner.failing_writes > 0 {
            inner.failing_writes -= 1;
            return Err(TransportError::WriteFailed(
                "scripted write failure".to_string(),
            ));
        }
        inner.writes.push(payload.to_vec());
        Ok(())
    }
}
