//! Transport seam between the link supervisor and the radio

use crate::error::TransportError;

/// A GATT session to the fireplace.
///
/// The production implementation is [`crate::BtleTransport`]; tests inject
/// [`crate::FakeTransport`] through this trait so the connection state
/// machine and the HTTP layer can be exercised without a radio.
#[async_trait::async_trait]
pub trait GattTransport: Send + Sync {
    /// Establish a full session: locate the device, connect, and resolve
    /// the command characteristic. Any previous session is replaced.
    async fn connect(&mut self) -> Result<(), TransportError>;

    /// Probe whether the current session is still alive.
    async fn is_connected(&self) -> bool;

    /// Acknowledged characteristic write. Resolves once the transport
    /// acks the payload or reports an error.
    async fn write(&mut self, payload: &[u8]) -> Result<(), TransportError>;
}
