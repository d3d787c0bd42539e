//! Event endpoint notifications and session observers

use kb390l_transport::protocol::notify;
use kb390l_transport::Transport;
use tracing::{debug, info, warn};

use crate::{Keyboard, KeyboardError};

/// A decoded 4-byte notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notification {
    /// Settings changed on the device; cached pages are stale
    Changed,
    /// An advanced button fired
    Advanced(u8),
    /// Anything else; logged and dropped
    Unknown([u8; notify::LEN]),
}

impl Notification {
    pub fn parse(bytes: [u8; notify::LEN]) -> Self {
        match bytes {
            [notify::MARKER, notify::CHANGED, _, _] => Self::Changed,
            [notify::MARKER, notify::ADVANCED, index, _] => Self::Advanced(index),
            other => Self::Unknown(other),
        }
    }
}

/// What the session tells its observers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Connected,
    Disconnected,
    /// The device changed its own configuration; re-read anything displayed
    Changed,
    /// An advanced button fired with the given index
    AdvancedCommand(u8),
}

impl<T: Transport> Keyboard<T> {
    /// Register an observer; all observers run before the triggering call returns
    pub fn subscribe<F>(&mut self, observer: F)
    where
        F: FnMut(&SessionEvent) + 'static,
    {
        self.observers.push(Box::new(observer));
    }

    pub(crate) fn emit(&mut self, event: SessionEvent) {
        debug!("event {:?}", event);
        for observer in &mut self.observers {
            observer(&event);
        }
    }

    /// Whether the event loop is running
    pub fn is_polling(&self) -> bool {
        self.polling
    }

    /// Drain pending notifications from the event endpoint.
    ///
    /// Meant to be called on a fixed interval. Each read is bounded by the
    /// event read timeout, so a quiet endpoint returns promptly.
    ///
    /// # Returns
    /// Number of notifications handled
    pub fn poll_events(&mut self) -> Result<usize, KeyboardError> {
        if !self.polling {
            return Ok(0);
        }

        let mut handled = 0;
        loop {
            let mut buf = [0u8; notify::LEN];
            let read = match self.events.read(&mut buf, Some(self.event_read_timeout)) {
                Ok(read) => read,
                Err(e) => {
                    warn!("event read failed: {}", e);
                    return Err(e.into());
                }
            };
            if read < notify::LEN {
                break;
            }

            self.handle_notification(Notification::parse(buf));
            handled += 1;
        }
        Ok(handled)
    }

    /// Apply one notification as if it had arrived on the event endpoint
    pub fn handle_notification(&mut self, notification: Notification) {
        match notification {
            Notification::Changed => {
                info!("Device reported a configuration change");
                self.cache.clear();
                self.emit(SessionEvent::Changed);
            }
            Notification::Advanced(index) => {
                self.emit(SessionEvent::AdvancedCommand(index));
            }
            Notification::Unknown(bytes) => {
                debug!("Unhandled event {:02X?}", bytes);
            }
        }
    }
}
