//! btleplug-backed transport for the fireplace

use btleplug::api::{BDAddr, Central, Manager as _, Peripheral as _, ScanFilter, WriteType};
use btleplug::platform::{Adapter, Manager, Peripheral};
use std::time::Duration;
use uuid::Uuid;

use crate::error::TransportError;
use crate::transport::GattTransport;

/// Live GATT session: the peripheral handle plus the resolved
/// command characteristic.
struct Session {
    peripheral: Peripheral,
    characteristic: btleplug::api::Characteristic,
}

/// Production transport over btleplug.
///
/// Holds at most one session. `connect` replaces the session wholesale;
/// a stale handle is never reused.
pub struct BtleTransport {
    address: BDAddr,
    characteristic: Uuid,
    scan_window: Duration,
    session: Option<Session>,
}

impl BtleTransport {
    pub fn new(address: BDAddr, characteristic: Uuid, scan_window: Duration) -> Self {
        Self {
            address,
            characteristic,
            scan_window,
            session: None,
        }
    }

    async fn adapter() -> Result<Adapter, TransportError> {
        let manager = Manager::new().await?;
        let adapters = manager.adapters().await?;
        adapters.into_iter().next().ok_or(TransportError::NoAdapter)
    }

    async fn find_peripheral(&self, adapter: &Adapter) -> Result<Peripheral, TransportError> {
        adapter.start_scan(ScanFilter::default()).await?;
        tokio::time::sleep(self.scan_window).await;

        let peripherals = adapter.peripherals().await?;
        adapter.stop_scan().await?;

        peripherals
            .into_iter()
            .find(|p| p.address() == self.address)
            .ok_or(TransportError::DeviceNotFound(self.address))
    }
}

#[async_trait::async_trait]
impl GattTransport for BtleTransport {
    async fn connect(&mut self) -> Result<(), TransportError> {
        // Drop any stale session first; disconnect is best effort.
        if let Some(old) = self.session.take() {
            let _ = old.peripheral.disconnect().await;
        }

        let adapter = Self::adapter().await?;
        let peripheral = self.find_peripheral(&adapter).await?;

        peripheral.connect().await?;
        peripheral.discover_services().await?;

        let characteristic = peripheral
            .characteristics()
            .into_iter()
            .find(|c| c.uuid == self.characteristic)
            .ok_or(TransportError::CharacteristicNotFound(self.characteristic))?;

        tracing::debug!(address = %self.address, "session established");
        self.session = Some(Session {
            peripheral,
            characteristic,
        });
        Ok(())
    }

    async fn is_connected(&self) -> bool {
        match &self.session {
            Some(session) => session.peripheral.is_connected().await.unwrap_or(false),
            None => false,
        }
    }

    async fn write(&mut self, payload: &[u8]) -> Result<(), TransportError> {
        let session = self.session.as_ref().ok_or(TransportError::NotConnected)?;
        session
            .peripheral
            .write(&session.characteristic, payload, WriteType::WithResponse)
            .await?;
        Ok(())
    }
}
