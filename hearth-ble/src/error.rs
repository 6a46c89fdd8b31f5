//! Error types for the BLE link

use thiserror::Error;

/// Failures while establishing or using the GATT link
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("no Bluetooth adapter found")]
    NoAdapter,

    #[error("device {0} not found during scan")]
    DeviceNotFound(btleplug::api::BDAddr),

    #[error("characteristic {0} not found on device")]
    CharacteristicNotFound(uuid::Uuid),

    #[error("not connected")]
    NotConnected,

    #[error("write failed: {0}")]
    WriteFailed(String),

    #[error("BLE error: {0}")]
    Ble(#[from] btleplug::Error),
}
