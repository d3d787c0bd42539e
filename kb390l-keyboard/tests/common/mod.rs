//! Scripted in-memory keyboard used by the integration tests

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use kb390l_keyboard::Keyboard;
use kb390l_transport::protocol::notify;
use kb390l_transport::{cmd, DeviceIds, Report, Transport, TransportError, PAGE_SIZE};

/// Everything the fake firmware knows, shared by both endpoints
#[derive(Default)]
pub struct DeviceState {
    /// Page contents by (command, index)
    pub pages: HashMap<(u8, u8), Vec<u8>>,
    /// Flag response arguments (bytes 2..8) by command
    pub flags: HashMap<u8, [u8; 6]>,
    pub notifications: VecDeque<[u8; notify::LEN]>,

    /// Every feature report received, in order
    pub sent: Vec<[u8; 9]>,
    /// Page header queries served
    pub page_reads: usize,
    /// Raw page writes accepted: (command, index, bytes)
    pub page_writes: Vec<(u8, u8, Vec<u8>)>,

    /// Reject the raw write with this 0-based number
    pub fail_write: Option<usize>,
    /// Device plugged in
    pub absent: bool,
    /// Feature reports go unanswered
    pub mute: bool,
    /// Event interface cannot be opened
    pub no_event_endpoint: bool,

    reply: Option<[u8; 9]>,
    pending_read: VecDeque<u8>,
    pending_write: Option<(u8, u8)>,
}

pub type Shared = Rc<RefCell<DeviceState>>;

fn page_len(page: u8) -> usize {
    match page {
        cmd::BUTTONS => 8 * PAGE_SIZE,
        cmd::MACRO => 3 * PAGE_SIZE,
        _ => PAGE_SIZE,
    }
}

fn is_page(command: u8) -> bool {
    matches!(command, cmd::BUTTONS | cmd::ENABLED_BUTTONS | cmd::MACRO | cmd::DIY)
}

impl DeviceState {
    pub fn page(&self, page: u8, index: u8) -> Vec<u8> {
        self.pages
            .get(&(page, index))
            .cloned()
            .unwrap_or_else(|| vec![0; page_len(page)])
    }

    pub fn set_page(&mut self, page: u8, index: u8, bytes: Vec<u8>) {
        self.pages.insert((page, index), bytes);
    }

    pub fn last_sent(&self) -> [u8; 9] {
        *self.sent.last().expect("no report sent")
    }

    fn answer(&mut self, data: &[u8]) {
        let report = Report::parse(data).expect("feature report must be 9 bytes");
        assert!(report.is_sealed(), "bad checksum in {report:?}");
        self.sent.push(report.to_bytes());

        let command = report.cmd() & !cmd::FLAG_GET;
        let index = data[3];
        let is_get = report.cmd() & cmd::FLAG_GET != 0;

        let args = if is_get && is_page(command) {
            let bytes = self.page(command, index);
            let units = (bytes.len() / PAGE_SIZE) as u8;
            self.pending_read = bytes.into();
            self.page_reads += 1;
            [0, index, units, 0, 0, 0]
        } else if is_get {
            self.flags.get(&command).copied().unwrap_or_default()
        } else if is_page(command) {
            self.pending_write = Some((command, index));
            report.args()
        } else if command == cmd::RESET {
            self.pages.clear();
            self.flags.clear();
            report.args()
        } else {
            self.flags.insert(command, report.args());
            report.args()
        };

        self.reply = Some(Report::new(report.cmd(), args).to_bytes());
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Control,
    Events,
}

/// One endpoint of the fake keyboard
pub struct MockEndpoint {
    state: Shared,
    role: Role,
    open: bool,
}

impl Transport for MockEndpoint {
    fn open(&mut self, _ids: &DeviceIds) -> Result<(), TransportError> {
        self.open = false;
        let state = self.state.borrow();
        if state.absent || (self.role == Role::Events && state.no_event_endpoint) {
            return Err(TransportError::DeviceNotFound("mock".into()));
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn is_valid(&self) -> bool {
        self.open
    }

    fn send_feature_report(&mut self, data: &[u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        let mut state = self.state.borrow_mut();
        if state.mute {
            return Ok(data.len());
        }
        state.answer(data);
        Ok(data.len())
    }

    fn get_feature_report(&mut self, buf: &mut [u8]) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        match self.state.borrow_mut().reply.take() {
            Some(reply) => {
                buf[..reply.len()].copy_from_slice(&reply);
                Ok(reply.len())
            }
            None => Ok(0),
        }
    }

    fn write(&mut self, report_id: u8, data: &[u8]) -> Result<usize, TransportError> {
        assert_eq!(report_id, 0);
        let mut state = self.state.borrow_mut();
        let (page, index) = state.pending_write.take().expect("raw write without header");
        if state.fail_write == Some(state.page_writes.len()) {
            state.fail_write = None;
            return Ok(0);
        }
        state.pages.insert((page, index), data.to_vec());
        state.page_writes.push((page, index, data.to_vec()));
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8], _timeout: Option<Duration>) -> Result<usize, TransportError> {
        if !self.open {
            return Err(TransportError::Disconnected);
        }
        let mut state = self.state.borrow_mut();
        match self.role {
            Role::Control => {
                let n = buf.len().min(state.pending_read.len());
                for slot in &mut buf[..n] {
                    *slot = state.pending_read.pop_front().unwrap_or_default();
                }
                Ok(n)
            }
            Role::Events => match state.notifications.pop_front() {
                Some(event) => {
                    buf[..event.len()].copy_from_slice(&event);
                    Ok(event.len())
                }
                None => Ok(0),
            },
        }
    }

    fn buffer_lengths(&self) -> (usize, usize) {
        (64, 64)
    }
}

/// A session over a fresh fake device, not yet connected
pub fn keyboard() -> (Keyboard<MockEndpoint>, Shared) {
    let state: Shared = Rc::new(RefCell::new(DeviceState::default()));
    let endpoint = |role| MockEndpoint {
        state: state.clone(),
        role,
        open: false,
    };
    let kb = Keyboard::new(endpoint(Role::Control), endpoint(Role::Events));
    (kb, state)
}

/// A session over a fresh fake device, connected and polling
pub fn connected_keyboard() -> (Keyboard<MockEndpoint>, Shared) {
    let (mut kb, state) = keyboard();
    assert!(kb.connect());
    state.borrow_mut().sent.clear();
    (kb, state)
}

/// Recorded session events
pub fn record_events(kb: &mut Keyboard<MockEndpoint>) -> Rc<RefCell<Vec<kb390l_keyboard::SessionEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = log.clone();
    kb.subscribe(move |event| sink.borrow_mut().push(*event));
    log
}
