//! Arrival/removal handling

use kb390l_transport::Transport;
use tracing::{debug, info, warn};

use crate::events::SessionEvent;
use crate::Keyboard;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected,
}

impl<T: Transport> Keyboard<T> {
    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ConnectionState::Connected
    }

    /// (Re)open both endpoints and check the device answers.
    ///
    /// The event loop only starts when the event endpoint opened too. The
    /// cache is kept, so edits staged before a reconnect survive it.
    ///
    /// # Returns
    /// Whether the session is now connected
    pub fn connect(&mut self) -> bool {
        self.polling = false;

        let ids = self.control_ids;
        if let Err(e) = self.control.open(&ids) {
            warn!("Control endpoint unavailable: {}", e);
            self.set_disconnected();
            return false;
        }
        if !self.ping() {
            warn!("Keyboard did not answer ping");
            self.set_disconnected();
            return false;
        }

        let (input, output) = self.control.buffer_lengths();
        debug!("Control endpoint report lengths: in {} out {}", input, output);

        let ids = self.event_ids;
        match self.events.open(&ids) {
            Ok(()) => self.polling = self.events.is_valid(),
            Err(e) => warn!("Event endpoint unavailable, notifications disabled: {}", e),
        }

        self.state = ConnectionState::Connected;
        self.emit(SessionEvent::Connected);
        true
    }

    /// A matching device appeared
    pub fn on_arrival(&mut self, locator: &str) -> bool {
        info!("Detected device arrival at {}", locator);
        self.connect()
    }

    /// The device went away: stop polling and drop both handles
    pub fn on_removal(&mut self) {
        info!("Detected device removal");
        self.polling = false;
        self.control.close();
        self.events.close();
        if self.state == ConnectionState::Connected {
            self.state = ConnectionState::Disconnected;
            self.emit(SessionEvent::Disconnected);
        }
    }

    fn set_disconnected(&mut self) {
        let was_connected = self.state == ConnectionState::Connected;
        self.state = ConnectionState::Disconnected;
        if was_connected {
            self.emit(SessionEvent::Disconnected);
        }
    }
}
