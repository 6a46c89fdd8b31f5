//! Bridge configuration: JSON file with flag overrides

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Daemon configuration. Every field except `device` has a default; the
/// device address has to come from the file or a flag.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// BLE hardware address of the fireplace, e.g. "C4:5D:83:AB:12:34".
    pub device: Option<String>,
    /// Writable command characteristic UUID.
    pub characteristic: String,
    /// HTTP listen address.
    pub listen: String,
    /// Seconds between reconnect attempts.
    pub retry_backoff_secs: u64,
    /// Seconds a scan runs before peripherals are matched.
    pub scan_window_secs: u64,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            device: None,
            characteristic: hearth_proto::COMMAND_CHARACTERISTIC.to_string(),
            listen: "0.0.0.0:8000".to_string(),
            retry_backoff_secs: 5,
            scan_window_secs: 5,
        }
    }
}

impl BridgeConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let data = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&data)?)
    }

    pub fn retry_backoff(&self) -> Duration {
        Duration::from_secs(self.retry_backoff_secs)
    }

    pub fn scan_window(&self) -> Duration {
        Duration::from_secs(self.scan_window_secs)
    }
}
