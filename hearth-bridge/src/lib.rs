//! The fireplace bridge daemon: a small HTTP control plane in front of the
//! BLE link. Each `GET /control/...` call becomes one GATT write.

pub mod config;
pub mod control;
pub mod http;
pub mod state;

pub use config::BridgeConfig;
pub use control::Bridge;
pub use state::DeviceState;
