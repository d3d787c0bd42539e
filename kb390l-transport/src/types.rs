//! Transport types

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::protocol::{timing, DEFAULT_BUFFER_LEN};

/// Identifies one HID interface of a physical device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIds {
    pub vendor_id: u16,
    pub product_id: u16,
    pub usage_page: u16,
    pub usage: u16,
    /// Interface to fall back to when the platform reports no usage page
    pub interface: Option<i32>,
}

impl DeviceIds {
    /// Same identifiers with a pre-resolved interface number
    pub fn with_interface(self, interface: Option<i32>) -> Self {
        Self { interface, ..self }
    }
}

/// Tunables for the HID backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    /// Pause after each feature report and each raw chunk
    pub write_delay_ms: u64,
    /// Per-read timeout for chunked reads without an explicit timeout
    pub read_timeout_ms: u64,
    /// Used when the report descriptor does not size input reports
    pub input_report_len: usize,
    /// Used when the report descriptor does not size output reports
    pub output_report_len: usize,
    /// Interface number of the control endpoint, for platforms without usage pages
    pub control_interface: Option<i32>,
    /// Interface number of the event endpoint, for platforms without usage pages
    pub event_interface: Option<i32>,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            write_delay_ms: timing::WRITE_DELAY_MS,
            read_timeout_ms: timing::READ_TIMEOUT_MS,
            input_report_len: DEFAULT_BUFFER_LEN,
            output_report_len: DEFAULT_BUFFER_LEN,
            control_interface: None,
            event_interface: None,
        }
    }
}

impl TransportConfig {
    pub fn write_delay(&self) -> Duration {
        Duration::from_millis(self.write_delay_ms)
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

/// Device arrival/removal, as reported by the device monitor
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorEvent {
    /// A matching device appeared; the locator is only meant for logging
    Arrival(String),
    Removal,
}
