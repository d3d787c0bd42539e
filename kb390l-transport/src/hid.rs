//! hidapi-backed transport

use std::sync::Arc;
use std::time::Duration;

use hidapi::{DeviceInfo, HidApi, HidDevice};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::chunked::{read_chunked, write_chunked};
use crate::descriptor::{report_lengths, ReportLengths};
use crate::error::TransportError;
use crate::types::{DeviceIds, TransportConfig};
use crate::Transport;

/// Process-wide handle to the HID library.
///
/// Construct it once and clone it into every endpoint that needs it; the
/// library is released when the last clone is dropped.
#[derive(Clone)]
pub struct HidContext {
    api: Arc<Mutex<HidApi>>,
}

impl HidContext {
    pub fn new() -> Result<Self, TransportError> {
        let api = HidApi::new()?;
        Ok(Self {
            api: Arc::new(Mutex::new(api)),
        })
    }

    /// Find and open the interface described by `ids`.
    ///
    /// Usage page/usage wins; the interface number is only consulted when no
    /// interface of the device reports a usage page at all.
    pub fn open(&self, ids: &DeviceIds) -> Result<HidDevice, TransportError> {
        let mut api = self.api.lock();
        api.refresh_devices()?;

        let candidates: Vec<&DeviceInfo> = api
            .device_list()
            .filter(|d| d.vendor_id() == ids.vendor_id && d.product_id() == ids.product_id)
            .collect();

        let by_usage = candidates
            .iter()
            .find(|d| d.usage_page() == ids.usage_page && d.usage() == ids.usage);

        let by_interface = || {
            let no_usage_pages = candidates.iter().all(|d| d.usage_page() == 0);
            ids.interface.filter(|_| no_usage_pages).and_then(|iface| {
                candidates
                    .iter()
                    .find(|d| d.interface_number() == iface)
            })
        };

        let Some(info) = by_usage.or_else(by_interface) else {
            return Err(TransportError::DeviceNotFound(format!(
                "{:04X}:{:04X} usage {:04X}:{:04X}",
                ids.vendor_id, ids.product_id, ids.usage_page, ids.usage
            )));
        };

        debug!(
            "Opening {:04X}:{:04X} interface {} at {:?}",
            ids.vendor_id,
            ids.product_id,
            info.interface_number(),
            info.path()
        );
        Ok(info.open_device(&api)?)
    }
}

/// One HID endpoint (control or event) of the keyboard
pub struct HidTransport {
    context: HidContext,
    device: Option<HidDevice>,
    config: TransportConfig,
    lengths: ReportLengths,
}

impl HidTransport {
    /// Create a closed endpoint; call [`Transport::open`] to acquire a handle
    pub fn new(context: HidContext, config: TransportConfig) -> Self {
        Self {
            context,
            device: None,
            lengths: ReportLengths {
                input: config.input_report_len,
                output: config.output_report_len,
            },
            config,
        }
    }

    /// Report lengths of the opened interface, from its report descriptor.
    ///
    /// A direction the descriptor does not size keeps the configured length.
    fn discover_lengths(&self, device: &HidDevice) -> ReportLengths {
        let configured = ReportLengths {
            input: self.config.input_report_len,
            output: self.config.output_report_len,
        };
        let mut buf = [0u8; hidapi::MAX_REPORT_DESCRIPTOR_SIZE];
        let discovered = match device.get_report_descriptor(&mut buf) {
            Ok(len) => report_lengths(&buf[..len]),
            Err(e) => {
                debug!("No report descriptor: {}", e);
                None
            }
        };
        let Some(found) = discovered else {
            return configured;
        };
        ReportLengths {
            input: if found.input > 0 { found.input } else { configured.input },
            output: if found.output > 0 { found.output } else { configured.output },
        }
    }

    fn device(&self) -> Result<&HidDevice, TransportError> {
        self.device.as_ref().ok_or(TransportError::Disconnected)
    }
}

impl Transport for HidTransport {
    fn open(&mut self, ids: &DeviceIds) -> Result<(), TransportError> {
        // Release the old handle before claiming a new one
        self.close();
        match self.context.open(ids) {
            Ok(device) => {
                self.lengths = self.discover_lengths(&device);
                info!(
                    "Opened HID interface {:04X}:{:04X} (in {} / out {} bytes)",
                    ids.usage_page, ids.usage, self.lengths.input, self.lengths.output
                );
                self.device = Some(device);
                Ok(())
            }
            Err(e) => {
                warn!("Failed to open {:04X}:{:04X}: {}", ids.usage_page, ids.usage, e);
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        self.device = None;
    }

    fn is_valid(&self) -> bool {
        self.device.is_some()
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        let device = self.device()?;
        device.send_feature_report(data)?;
        std::thread::sleep(self.config.write_delay());
        // hidapi reports success without a count; a feature report is all-or-nothing
        Ok(data.len())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        let device = self.device()?;
        Ok(device.get_feature_report(buf)?)
    }

    fn write(&mut self, report_id: u8, data: &[u8]) -> Result<usize, TransportError> {
        let device = self.device()?;
        let delay = self.config.write_delay();
        write_chunked(report_id, data, self.lengths.output, |chunk| {
            let written = device.write(chunk)?;
            std::thread::sleep(delay);
            Ok(written)
        })
    }

    fn read(&mut self, buf: &mut [u8], timeout: Option<Duration>) -> Result<usize, TransportError> {
        let device = self.device()?;
        let timeout = timeout.unwrap_or_else(|| self.config.read_timeout());
        let timeout_ms = i32::try_from(timeout.as_millis()).unwrap_or(i32::MAX);
        read_chunked(buf, |out| Ok(device.read_timeout(out, timeout_ms)?))
    }

    fn buffer_lengths(&self) -> (usize, usize) {
        (self.lengths.input, self.lengths.output)
    }
}
