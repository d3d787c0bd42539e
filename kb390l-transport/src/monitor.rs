//! udev hot-plug monitor

use std::pin::Pin;
use std::task::{Context, Poll};

use futures::Stream;
use tokio_udev::{AsyncMonitorSocket, EventType, MonitorBuilder};
use tracing::{debug, info};

use crate::error::TransportError;
use crate::types::MonitorEvent;

/// Stream of arrival/removal events for one vendor/product pair.
///
/// Must be polled from within a tokio runtime.
pub struct DeviceMonitor {
    socket: AsyncMonitorSocket,
    vendor_id: String,
    product_id: String,
}

impl DeviceMonitor {
    pub fn new(vendor_id: u16, product_id: u16) -> Result<Self, TransportError> {
        let socket = MonitorBuilder::new()
            .and_then(|b| b.match_subsystem_devtype("usb", "usb_device"))
            .and_then(|b| b.listen())
            .and_then(AsyncMonitorSocket::new)
            .map_err(|e| TransportError::Monitor(e.to_string()))?;

        Ok(Self {
            socket,
            vendor_id: format!("{vendor_id:04x}"),
            product_id: format!("{product_id:04x}"),
        })
    }

    fn translate(&self, event: &tokio_udev::Event) -> Option<MonitorEvent> {
        let matches = |key: &str, want: &str| {
            event
                .property_value(key)
                .and_then(|v| v.to_str())
                .is_some_and(|v| v.eq_ignore_ascii_case(want))
        };
        if !matches("ID_VENDOR_ID", &self.vendor_id) || !matches("ID_MODEL_ID", &self.product_id) {
            return None;
        }

        match event.event_type() {
            EventType::Add => {
                let path = event.syspath().display().to_string();
                info!("Detected device arrival at {}", path);
                Some(MonitorEvent::Arrival(path))
            }
            EventType::Remove => {
                info!("Detected device removal");
                Some(MonitorEvent::Removal)
            }
            other => {
                debug!("Ignoring udev action {:?}", other);
                None
            }
        }
    }
}

impl Stream for DeviceMonitor {
    type Item = Result<MonitorEvent, TransportError>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            match Pin::new(&mut this.socket).poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if let Some(translated) = this.translate(&event) {
                        return Poll::Ready(Some(Ok(translated)));
                    }
                }
                Poll::Ready(Some(Err(e))) => {
                    return Poll::Ready(Some(Err(TransportError::Monitor(e.to_string()))))
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}
