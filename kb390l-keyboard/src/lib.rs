//! Configuration session for the HV-KB390L gaming keyboard
//!
//! [`Keyboard`] owns the control and event endpoints of one keyboard and a
//! cache of every page and flag response it has seen. Two kinds of settings
//! exist on the device:
//!
//! - flags (speed, lighting, game mode) are single bytes inside an 8-byte
//!   response and are written through to the device immediately
//! - pages (buttons, enabled mask, macros) are blocks of 64-byte units that
//!   are edited in the cache and only reach the device on [`Keyboard::save`]

pub mod backup;
pub mod buttons;
pub mod cache;
pub mod connection;
pub mod error;
pub mod events;
pub mod led;
pub mod macros;
pub mod settings;

pub use buttons::{ButtonAction, ButtonTable, EnabledMask, KeyIndex, MacroRepeat, MouseButton};
pub use cache::{PageCache, PageKey};
pub use connection::ConnectionState;
pub use error::KeyboardError;
pub use events::{Notification, SessionEvent};
pub use led::{LightDirection, LightSettings, LightType};
pub use macros::{Macro, MacroAction, MacroKind, MacroTarget};
pub use settings::{ReportRate, ResponseTime};

use std::time::Duration;

use kb390l_transport::protocol::limits::RESET_ALL;
use kb390l_transport::protocol::{device, offset, timing, ENABLED_BUTTONS_WRITE_UNITS};
use kb390l_transport::{cmd, DeviceIds, Report, Transport, PAGE_SIZE, REPORT_SIZE};
use tracing::{debug, warn};

/// Only real pages take byte access. Flag responses share the cache keyspace
/// and saving one as a page would send a zeroed set command.
fn check_byte_page(page: u8) -> Result<(), KeyboardError> {
    match page {
        cmd::BUTTONS | cmd::ENABLED_BUTTONS | cmd::DIY => Ok(()),
        _ => Err(KeyboardError::InvalidParameter(format!(
            "{} is not a byte-addressable page",
            cmd::name(page)
        ))),
    }
}

/// Observer callback for session events
pub type Observer = Box<dyn FnMut(&SessionEvent)>;

/// One keyboard: its two endpoints, the page cache and event observers
pub struct Keyboard<T: Transport> {
    control: T,
    events: T,
    control_ids: DeviceIds,
    event_ids: DeviceIds,
    cache: PageCache,
    observers: Vec<Observer>,
    state: ConnectionState,
    polling: bool,
    event_read_timeout: Duration,
}

impl<T: Transport> Keyboard<T> {
    /// Create a session over two closed endpoints.
    ///
    /// No I/O happens until [`Keyboard::connect`] or an arrival event.
    pub fn new(control: T, events: T) -> Self {
        Self {
            control,
            events,
            control_ids: device::CONTROL,
            event_ids: device::EVENTS,
            cache: PageCache::new(),
            observers: Vec::new(),
            state: ConnectionState::Disconnected,
            polling: false,
            event_read_timeout: Duration::from_millis(timing::EVENT_READ_TIMEOUT_MS),
        }
    }

    /// Override the identifiers used to open the two endpoints
    pub fn with_device_ids(mut self, control: DeviceIds, events: DeviceIds) -> Self {
        self.control_ids = control;
        self.event_ids = events;
        self
    }

    /// Per-read timeout used while draining notifications
    pub fn with_event_read_timeout(mut self, timeout: Duration) -> Self {
        self.event_read_timeout = timeout;
        self
    }

    pub fn control(&self) -> &T {
        &self.control
    }

    pub fn events(&self) -> &T {
        &self.events
    }

    // === Framing ===

    /// Send one 9-byte feature report and read back the reply
    pub fn report(&mut self, command: u8, args: [u8; 6]) -> Result<Report, KeyboardError> {
        self.exchange(&Report::new(command, args))
    }

    fn exchange(&mut self, request: &Report) -> Result<Report, KeyboardError> {
        if !self.control.is_valid() {
            return Err(KeyboardError::NotConnected);
        }

        debug!("send {:?}", request);

        let sent = self.control.send_feature_report(&request.to_bytes())?;
        if sent != REPORT_SIZE {
            warn!("send failed: got {} expected {}", sent, REPORT_SIZE);
            return Err(KeyboardError::ShortTransfer {
                what: "send",
                expected: REPORT_SIZE,
                actual: sent,
            });
        }

        let mut buf = [0u8; REPORT_SIZE];
        let read = self.control.get_feature_report(&mut buf)?;
        if read != REPORT_SIZE {
            warn!("recv failed: got {} expected {}", read, REPORT_SIZE);
            return Err(KeyboardError::ShortTransfer {
                what: "recv",
                expected: REPORT_SIZE,
                actual: read,
            });
        }

        let response = Report::parse(&buf).ok_or_else(|| {
            KeyboardError::UnexpectedResponse(format!("unparseable reply {buf:02X?}"))
        })?;
        debug!("recv {:?}", response);
        Ok(response)
    }

    // === Pages ===

    /// Page contents, from the cache or fetched from the device
    pub fn read_page(&mut self, page: u8, index: u8) -> Result<Vec<u8>, KeyboardError> {
        let key = PageKey::new(page, index);
        if let Some(bytes) = self.cache.get(key) {
            return Ok(bytes.to_vec());
        }

        let query = Report::page_query(page, index);
        let header = self.exchange(&query)?;
        if header.cmd() != query.cmd() || header.byte(3) != Some(index) {
            warn!("readPage: invalid response: {:?}", header);
            return Err(KeyboardError::UnexpectedResponse(format!(
                "{key:?}: header {header:?}"
            )));
        }

        let units = if page == cmd::ENABLED_BUTTONS {
            1
        } else {
            header.byte(4).unwrap_or(0) as usize
        };
        let len = units * PAGE_SIZE;

        let mut bytes = vec![0u8; len];
        let read = self.control.read(&mut bytes, None)?;
        if read != len {
            warn!("readPage: read failed: got {} expected {}", read, len);
            return Err(KeyboardError::ShortTransfer {
                what: "page read",
                expected: len,
                actual: read,
            });
        }

        debug!("readPage {:?} {:02X?}", key, bytes);
        self.cache.insert_clean(key, bytes.clone());
        Ok(bytes)
    }

    /// Write a whole page to the device and mark it clean.
    ///
    /// The cache itself is left alone; callers stage their bytes there first.
    pub fn write_page(&mut self, data: &[u8], page: u8, index: u8) -> Result<(), KeyboardError> {
        let key = PageKey::new(page, index);
        let units = if page == cmd::ENABLED_BUTTONS {
            ENABLED_BUTTONS_WRITE_UNITS
        } else {
            u8::try_from(data.len() / PAGE_SIZE).map_err(|_| {
                KeyboardError::InvalidParameter(format!("{key:?}: {} bytes", data.len()))
            })?
        };

        if !self.control.is_valid() {
            return Err(KeyboardError::NotConnected);
        }

        let header = Report::page_header(page, index, units);
        debug!("send {:?}", header);
        let sent = self.control.send_feature_report(&header.to_bytes())?;
        if sent != REPORT_SIZE {
            warn!("writePage: send failed: got {} expected {}", sent, REPORT_SIZE);
            return Err(KeyboardError::ShortTransfer {
                what: "page header",
                expected: REPORT_SIZE,
                actual: sent,
            });
        }

        debug!("writePage {:?} {:02X?}", key, data);
        let written = self.control.write(0, data)?;
        if written != data.len() {
            warn!("writePage: write failed: got {} expected {}", written, data.len());
            return Err(KeyboardError::ShortTransfer {
                what: "page write",
                expected: data.len(),
                actual: written,
            });
        }

        self.cache.mark_clean(key);
        Ok(())
    }

    /// Single byte of an index-0 page
    pub fn read_byte(&mut self, page: u8, offset: usize) -> Result<u8, KeyboardError> {
        check_byte_page(page)?;
        let bytes = self.read_page(page, 0)?;
        bytes.get(offset).copied().ok_or_else(|| {
            KeyboardError::InvalidParameter(format!(
                "offset {offset} beyond {}-byte {} page",
                bytes.len(),
                cmd::name(page)
            ))
        })
    }

    /// Stage a single byte of an index-0 page; committed by [`Keyboard::save`]
    pub fn write_byte(&mut self, page: u8, offset: usize, value: u8) -> Result<(), KeyboardError> {
        check_byte_page(page)?;
        let mut bytes = self.read_page(page, 0)?;
        let len = bytes.len();
        let Some(slot) = bytes.get_mut(offset) else {
            return Err(KeyboardError::InvalidParameter(format!(
                "offset {offset} beyond {len}-byte {} page",
                cmd::name(page)
            )));
        };
        if *slot != value {
            *slot = value;
            self.stage(PageKey::new(page, 0), bytes);
        }
        Ok(())
    }

    /// Put locally edited page bytes in the cache and mark them dirty
    pub(crate) fn stage(&mut self, key: PageKey, bytes: Vec<u8>) {
        debug!("stage {:?}", key);
        self.cache.insert_dirty(key, bytes);
    }

    // === Flags ===

    /// Cached or freshly fetched flag response for `command`
    fn flag_response(&mut self, command: u8) -> Result<[u8; REPORT_SIZE], KeyboardError> {
        let key = PageKey::new(command, 0);
        if let Some(bytes) = self.cache.get(key) {
            if let Ok(cached) = <[u8; REPORT_SIZE]>::try_from(bytes) {
                return Ok(cached);
            }
        }

        let bytes = self.fetch_flag(command)?;
        self.cache.insert_clean(key, bytes.to_vec());
        Ok(bytes)
    }

    /// Query a flag response from the device, bypassing the cache
    fn fetch_flag(&mut self, command: u8) -> Result<[u8; REPORT_SIZE], KeyboardError> {
        let query = command | cmd::FLAG_GET;
        let response = self.report(query, [0; 6])?;
        if response.cmd() != query {
            warn!("flag: invalid response: {:?}", response);
            return Err(KeyboardError::UnexpectedResponse(format!(
                "{}: {:?}",
                cmd::name(command),
                response
            )));
        }
        Ok(response.to_bytes())
    }

    /// Byte at `offset` of the flag response for `command`
    pub fn flag(&mut self, command: u8, offset: usize) -> Result<u8, KeyboardError> {
        let response = self.flag_response(command)?;
        response.get(offset).copied().ok_or_else(|| {
            KeyboardError::InvalidParameter(format!("flag offset {offset} out of range"))
        })
    }

    /// Change one byte of a flag response and push all six arguments back.
    ///
    /// Flags are written through; nothing is staged for [`Keyboard::save`].
    pub fn set_flag(&mut self, command: u8, value: u8, offset: usize) -> Result<(), KeyboardError> {
        if !(2..REPORT_SIZE - 1).contains(&offset) {
            return Err(KeyboardError::InvalidParameter(format!(
                "flag offset {offset} out of range"
            )));
        }

        let mut response = self.flag_response(command)?;
        if response[offset] == value {
            return Ok(());
        }

        response[offset] = value;
        let mut args = [0u8; 6];
        args.copy_from_slice(&response[2..8]);
        self.report(command, args)?;
        self.cache.replace(PageKey::new(command, 0), response.to_vec());
        Ok(())
    }

    /// Send a single-value setting verbatim, then refresh its cached response
    pub(crate) fn push_flag(&mut self, command: u8, value: u8) -> Result<(), KeyboardError> {
        self.report(command, [value, 0, 0, 0, 0, 0])?;

        let key = PageKey::new(command, 0);
        if let Some(cached) = self.cache.get(key) {
            let mut updated = cached.to_vec();
            if let Some(slot) = updated.get_mut(offset::FLAG) {
                *slot = value;
            }
            self.cache.replace(key, updated);
        }
        Ok(())
    }

    // === Save ===

    /// Whether any page holds edits the device has not seen
    pub fn unsaved_changes(&self) -> bool {
        self.cache.has_dirty()
    }

    /// Whether one page holds edits the device has not seen
    pub fn is_dirty(&self, page: u8, index: u8) -> bool {
        self.cache.is_dirty(PageKey::new(page, index))
    }

    /// Write every dirty page in key order.
    ///
    /// Stops at the first failure; that page and every later one stay dirty.
    pub fn save(&mut self) -> Result<(), KeyboardError> {
        for (key, bytes) in self.cache.dirty_pages() {
            if let Err(e) = self.write_page(&bytes, key.page(), key.index()) {
                warn!("save: {:?} failed: {}", key, e);
                return Err(e);
            }
        }
        Ok(())
    }

    /// Forget every cached page and flag, staged edits included
    pub fn discard_changes(&mut self) {
        self.cache.clear();
    }

    // === Device ===

    /// Whether the device answers a ping.
    ///
    /// Always goes to the device; a cached reply says nothing about liveness.
    pub fn ping(&mut self) -> bool {
        match self.fetch_flag(cmd::PING) {
            Ok(_) => true,
            Err(e) => {
                debug!("ping failed: {}", e);
                false
            }
        }
    }

    /// Restore every setting to its factory value
    pub fn reset_to_factory_defaults(&mut self) -> Result<(), KeyboardError> {
        self.report(cmd::RESET, [RESET_ALL, 0, 0, 0, 0, 0])?;
        Ok(())
    }
}
