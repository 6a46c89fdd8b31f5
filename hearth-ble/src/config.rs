//! Link timing configuration

use std::time::Duration;

/// Timing knobs for the connection supervisor
#[derive(Debug, Clone)]
pub struct LinkConfig {
    /// Fixed wait between failed connection attempts. The retry loop never
    /// grows this and never gives up.
    pub retry_backoff: Duration,
    /// How long a scan runs before peripherals are inspected.
    pub scan_window: Duration,
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            retry_backoff: Duration::from_secs(5),
            scan_window: Duration::from_secs(5),
        }
    }
}

impl LinkConfig {
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    pub fn with_scan_window(mut self, window: Duration) -> Self {
        self.scan_window = window;
        self
    }
}
