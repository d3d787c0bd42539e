//! Transport layer for the HV-KB390L gaming keyboard
//!
//! The keyboard exposes two vendor HID interfaces:
//!
//! - a control endpoint taking 9-byte feature reports and raw page data
//! - an event endpoint emitting 4-byte notifications
//!
//! This crate provides the wire protocol (commands, framing, checksum), a
//! [`Transport`] capability trait both endpoints are driven through, the
//! hidapi implementation of it, and a udev device monitor.

pub mod chunked;
pub mod descriptor;
pub mod error;
pub mod protocol;
pub mod types;

mod hid;

#[cfg(all(target_os = "linux", feature = "hotplug"))]
mod monitor;

pub use error::TransportError;
pub use hid::{HidContext, HidTransport};
pub use protocol::{cmd, Report, PAGE_SIZE, REPORT_SIZE};
pub use types::{DeviceIds, MonitorEvent, TransportConfig};

#[cfg(all(target_os = "linux", feature = "hotplug"))]
pub use monitor::DeviceMonitor;

use std::time::Duration;

/// One HID endpoint of the keyboard
///
/// All calls block. Feature reports are strictly request/reply, so callers
/// must not interleave two exchanges on the same endpoint.
pub trait Transport {
    /// Open the interface matching `ids`, dropping any handle held before
    fn open(&mut self, ids: &DeviceIds) -> Result<(), TransportError>;

    /// Release the handle; further I/O fails with `Disconnected`
    fn close(&mut self);

    /// Whether a handle is currently held
    fn is_valid(&self) -> bool;

    /// Send a feature report, report id in byte 0
    ///
    /// # Returns
    /// Number of bytes sent
    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError>;

    /// Receive a feature report into `buf`, report id in byte 0
    ///
    /// # Returns
    /// Number of bytes received
    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError>;

    /// Write raw data, split into output-report-sized chunks
    ///
    /// # Arguments
    /// * `report_id` - Prefixed to every chunk
    /// * `data` - Payload without report id
    ///
    /// # Returns
    /// Number of payload bytes written
    fn write(&mut self, report_id: u8, data: &[u8]) -> Result<usize, TransportError>;

    /// Read raw data until `buf` is full or a read times out
    ///
    /// # Arguments
    /// * `buf` - Destination, filled from the front
    /// * `timeout` - Per-read timeout; `None` uses the configured default
    ///
    /// # Returns
    /// Number of bytes read, short on timeout
    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize, TransportError>;

    /// Negotiated `(input, output)` report lengths
    fn buffer_lengths(&self) -> (usize, usize);
}
