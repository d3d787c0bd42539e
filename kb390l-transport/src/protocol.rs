//! Protocol constants and report framing for the HV-KB390L

use std::fmt;

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// Feature report commands
pub mod cmd {
    pub const PING: u8 = 0x00;
    pub const REPORT_RATE: u8 = 0x01;
    pub const RESPONSE_TIME: u8 = 0x04;
    /// Lighting flags live in the control response
    pub const CONTROL: u8 = 0x08;
    pub const GAME_MODE: u8 = 0x09;
    pub const BUTTONS: u8 = 0x0D;
    pub const ENABLED_BUTTONS: u8 = 0x0E;
    pub const MACRO: u8 = 0x11;
    pub const DIY: u8 = 0x12;
    pub const RESET: u8 = 0x13;
    pub const COLOR: u8 = 0x14;

    /// High bit turns any command into its "get" form
    pub const FLAG_GET: u8 = 0x80;

    /// Get human-readable name for command byte
    pub fn name(cmd: u8) -> &'static str {
        match cmd & !FLAG_GET {
            PING => "PING",
            REPORT_RATE => "REPORT_RATE",
            RESPONSE_TIME => "RESPONSE_TIME",
            CONTROL => "CONTROL",
            GAME_MODE => "GAME_MODE",
            BUTTONS => "BUTTONS",
            ENABLED_BUTTONS => "ENABLED_BUTTONS",
            MACRO => "MACRO",
            DIY => "DIY",
            RESET => "RESET",
            COLOR => "COLOR",
            _ => "UNKNOWN",
        }
    }
}

/// Notifications delivered on the event endpoint
pub mod notify {
    /// Every notification is this long
    pub const LEN: usize = 4;
    /// First byte of every well-formed notification
    pub const MARKER: u8 = 4;
    /// A user-assigned "advanced" button fired; byte 2 carries its index
    pub const ADVANCED: u8 = 0x00;
    /// Configuration changed on the device itself (onboard Fn shortcuts)
    pub const CHANGED: u8 = 0x04;
}

/// Byte offsets inside a flag response
pub mod offset {
    /// Offset used by every single-value flag
    pub const FLAG: usize = 2;
    pub const LIGHT_TYPE: usize = 3;
    pub const LIGHT_DELAY: usize = 4;
    pub const LIGHT_BRIGHTNESS: usize = 5;
    pub const LIGHT_DIRECTION: usize = 7;
}

/// Legal value ranges accepted by the firmware
pub mod limits {
    /// Report rate is encoded as `125 << value` Hz
    pub const MAX_REPORT_RATE: u8 = 3;
    /// Response time is encoded as `value * 2` ms
    pub const MIN_RESPONSE_TIME: u8 = 1;
    pub const MAX_RESPONSE_TIME: u8 = 10;
    pub const MAX_LIGHT_TYPE: u8 = 240;
    pub const MAX_LIGHT_DELAY: u8 = 10;
    pub const MAX_LIGHT_BRIGHTNESS: u8 = 50;
    pub const MAX_LIGHT_DIRECTION: u8 = 4;
    pub const MIN_MACRO: u8 = 0;
    pub const MAX_MACRO: u8 = 31;
    pub const MACRO_COUNT: usize = MAX_MACRO as usize + 1;
    /// Bits per 3-byte row of the enabled-buttons mask
    pub const BUTTONS_PER_ROW: usize = 21;
    /// Argument to RESET that wipes every setting
    pub const RESET_ALL: u8 = 0xFF;
}

/// USB identifiers of the keyboard's two vendor interfaces
pub mod device {
    use crate::types::DeviceIds;

    pub const VENDOR_ID: u16 = 0x04D9;
    pub const PRODUCT_ID: u16 = 0xA131;

    /// Feature reports and bulk page transfers
    pub const CONTROL_USAGE_PAGE: u16 = 0xFF01;
    pub const CONTROL_USAGE: u16 = 0x0001;
    /// 4-byte asynchronous notifications
    pub const EVENT_USAGE_PAGE: u16 = 0xFF02;
    pub const EVENT_USAGE: u16 = 0x0001;

    pub const CONTROL: DeviceIds = DeviceIds {
        vendor_id: VENDOR_ID,
        product_id: PRODUCT_ID,
        usage_page: CONTROL_USAGE_PAGE,
        usage: CONTROL_USAGE,
        interface: None,
    };

    pub const EVENTS: DeviceIds = DeviceIds {
        vendor_id: VENDOR_ID,
        product_id: PRODUCT_ID,
        usage_page: EVENT_USAGE_PAGE,
        usage: EVENT_USAGE,
        interface: None,
    };
}

/// HID communication timing defaults
pub mod timing {
    /// Pause after every feature report and raw chunk so the firmware keeps up
    pub const WRITE_DELAY_MS: u64 = 20;
    /// Per-read timeout for bulk page reads
    pub const READ_TIMEOUT_MS: u64 = 3000;
    /// Event endpoint poll period
    pub const EVENT_POLL_INTERVAL_MS: u64 = 10;
    /// Per-read timeout while draining notifications
    pub const EVENT_READ_TIMEOUT_MS: u64 = 20;
}

/// Unit of page geometry; every page is a multiple of this
pub const PAGE_SIZE: usize = 64;

/// Length of every feature report, report id and checksum included
pub const REPORT_SIZE: usize = 9;

/// Input/output report length assumed until the device says otherwise
pub const DEFAULT_BUFFER_LEN: usize = 64;

/// Unit count the firmware expects in an enabled-buttons write header
pub const ENABLED_BUTTONS_WRITE_UNITS: u8 = 18;

/// Checksum byte that brings the sum of `bytes` plus itself to 0 mod 256
pub fn checksum(bytes: &[u8]) -> u8 {
    let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
    sum.wrapping_neg()
}

/// A 9-byte feature report: `[0, cmd, arg2..arg7, checksum]`
#[derive(Clone, Copy, PartialEq, Eq, IntoBytes, FromBytes, KnownLayout, Immutable)]
#[repr(C)]
pub struct Report {
    report_id: u8,
    cmd: u8,
    args: [u8; 6],
    checksum: u8,
}

impl Report {
    /// Build a report and seal it with its checksum
    pub fn new(cmd: u8, args: [u8; 6]) -> Self {
        let mut report = Self {
            report_id: 0,
            cmd,
            args,
            checksum: 0,
        };
        report.checksum = checksum(&report.as_bytes()[..REPORT_SIZE - 1]);
        report
    }

    /// Request for a page's header: `cmd | FLAG_GET` with the index in byte 3
    pub fn page_query(page: u8, index: u8) -> Self {
        Self::new(page | cmd::FLAG_GET, [0, index, 0, 0, 0, 0])
    }

    /// Header announcing a page write of `units` 64-byte blocks
    pub fn page_header(page: u8, index: u8, units: u8) -> Self {
        Self::new(page, [0, index, units, 0, 0, 0])
    }

    /// Reinterpret a received buffer, which must be exactly one report long
    pub fn parse(bytes: &[u8]) -> Option<Self> {
        Self::read_from_bytes(bytes).ok()
    }

    pub fn cmd(&self) -> u8 {
        self.cmd
    }

    /// Arguments as they sit on the wire (bytes 2..8)
    pub fn args(&self) -> [u8; 6] {
        self.args
    }

    /// Byte at an absolute wire offset
    pub fn byte(&self, offset: usize) -> Option<u8> {
        self.as_bytes().get(offset).copied()
    }

    /// Whether the 9-byte sum is 0 mod 256
    pub fn is_sealed(&self) -> bool {
        checksum(self.as_bytes()) == 0
    }

    pub fn to_bytes(&self) -> [u8; REPORT_SIZE] {
        let mut buf = [0u8; REPORT_SIZE];
        buf.copy_from_slice(self.as_bytes());
        buf
    }
}

impl fmt::Debug for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {:02X?}", cmd::name(self.cmd), self.as_bytes())
    }
}

/// HID keyboard usage codes, as stored in button and macro pages
pub mod hid {
    #[rustfmt::skip]
    const NAMES: &[(u8, &str)] = &[
        (0x04, "A"), (0x05, "B"), (0x06, "C"), (0x07, "D"),
        (0x08, "E"), (0x09, "F"), (0x0A, "G"), (0x0B, "H"),
        (0x0C, "I"), (0x0D, "J"), (0x0E, "K"), (0x0F, "L"),
        (0x10, "M"), (0x11, "N"), (0x12, "O"), (0x13, "P"),
        (0x14, "Q"), (0x15, "R"), (0x16, "S"), (0x17, "T"),
        (0x18, "U"), (0x19, "V"), (0x1A, "W"), (0x1B, "X"),
        (0x1C, "Y"), (0x1D, "Z"),
        (0x1E, "1"), (0x1F, "2"), (0x20, "3"), (0x21, "4"),
        (0x22, "5"), (0x23, "6"), (0x24, "7"), (0x25, "8"),
        (0x26, "9"), (0x27, "0"),
        (0x28, "Enter"), (0x29, "Escape"), (0x2A, "Backspace"),
        (0x2B, "Tab"), (0x2C, "Space"), (0x2D, "Minus"), (0x2E, "Equal"),
        (0x2F, "LBracket"), (0x30, "RBracket"), (0x31, "Backslash"),
        (0x32, "NonUSHash"), (0x33, "Semicolon"), (0x34, "Quote"),
        (0x35, "Grave"), (0x36, "Comma"), (0x37, "Dot"), (0x38, "Slash"),
        (0x39, "CapsLock"),
        (0x3A, "F1"), (0x3B, "F2"), (0x3C, "F3"), (0x3D, "F4"),
        (0x3E, "F5"), (0x3F, "F6"), (0x40, "F7"), (0x41, "F8"),
        (0x42, "F9"), (0x43, "F10"), (0x44, "F11"), (0x45, "F12"),
        (0x46, "PrintScr"), (0x47, "ScrollLock"), (0x48, "Pause"),
        (0x49, "Insert"), (0x4A, "Home"), (0x4B, "PageUp"),
        (0x4C, "Delete"), (0x4D, "End"), (0x4E, "PageDown"),
        (0x4F, "Right"), (0x50, "Left"), (0x51, "Down"), (0x52, "Up"),
        (0x53, "NumLock"), (0x54, "KPSlash"), (0x55, "KPAsterisk"),
        (0x56, "KPMinus"), (0x57, "KPPlus"), (0x58, "KPEnter"),
        (0x59, "KP1"), (0x5A, "KP2"), (0x5B, "KP3"), (0x5C, "KP4"),
        (0x5D, "KP5"), (0x5E, "KP6"), (0x5F, "KP7"), (0x60, "KP8"),
        (0x61, "KP9"), (0x62, "KP0"), (0x63, "KPDot"),
        (0x64, "NonUSBackslash"), (0x65, "App"),
        (0xE0, "LCtrl"), (0xE1, "LShift"), (0xE2, "LAlt"), (0xE3, "LGUI"),
        (0xE4, "RCtrl"), (0xE5, "RShift"), (0xE6, "RAlt"), (0xE7, "RGUI"),
    ];

    /// Get the name of a HID keyboard usage code
    pub fn key_name(code: u8) -> Option<&'static str> {
        NAMES.iter().find(|(c, _)| *c == code).map(|(_, n)| *n)
    }

    /// Look up a usage code by name (case-insensitive).
    ///
    /// `0xNN` hex literals are accepted for codes without a name.
    pub fn key_code(name: &str) -> Option<u8> {
        if let Some(hex) = name.strip_prefix("0x").or_else(|| name.strip_prefix("0X")) {
            return u8::from_str_radix(hex, 16).ok();
        }
        NAMES
            .iter()
            .find(|(_, n)| n.eq_ignore_ascii_case(name))
            .map(|(c, _)| *c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_zeroes_sum() {
        for payload in [
            [0u8, 0, 0, 0, 0, 0, 0, 0],
            [0, 0x81, 0, 0, 0, 0, 0, 0],
            [0, 0x13, 0xFF, 0, 0, 0, 0, 0],
            [0xFF; 8],
            [0, 1, 2, 3, 4, 5, 6, 7],
        ] {
            let sum = payload
                .iter()
                .fold(checksum(&payload), |acc, &b| acc.wrapping_add(b));
            assert_eq!(sum, 0, "payload {payload:02X?}");
        }
    }

    #[test]
    fn test_ping_report_bytes() {
        let report = Report::new(cmd::PING | cmd::FLAG_GET, [0; 6]);
        assert_eq!(report.to_bytes(), [0, 0x80, 0, 0, 0, 0, 0, 0, 0x80]);
        assert!(report.is_sealed());
    }

    #[test]
    fn test_reset_report_bytes() {
        let report = Report::new(cmd::RESET, [limits::RESET_ALL, 0, 0, 0, 0, 0]);
        // 0x13 + 0xFF = 0x112 -> 0x12, negated 0xEE
        assert_eq!(report.to_bytes()[8], 0xEE);
    }

    #[test]
    fn test_page_framing() {
        let query = Report::page_query(cmd::MACRO, 5);
        assert_eq!(query.cmd(), 0x91);
        assert_eq!(query.byte(3), Some(5));
        assert!(query.is_sealed());

        let header = Report::page_header(cmd::BUTTONS, 0, 8);
        assert_eq!(header.to_bytes()[..5], [0, 0x0D, 0, 0, 8]);
        assert!(header.is_sealed());
    }

    #[test]
    fn test_parse_requires_exact_length() {
        let bytes = Report::new(cmd::GAME_MODE, [1, 0, 0, 0, 0, 0]).to_bytes();
        let parsed = Report::parse(&bytes).unwrap();
        assert_eq!(parsed.args()[0], 1);
        assert!(Report::parse(&bytes[..8]).is_none());
    }

    #[test]
    fn test_command_names_ignore_get_flag() {
        assert_eq!(cmd::name(cmd::MACRO), "MACRO");
        assert_eq!(cmd::name(cmd::MACRO | cmd::FLAG_GET), "MACRO");
        assert_eq!(cmd::name(0x7F), "UNKNOWN");
    }

    #[test]
    fn test_hid_names() {
        assert_eq!(hid::key_name(0x04), Some("A"));
        assert_eq!(hid::key_code("space"), Some(0x2C));
        assert_eq!(hid::key_code("0x68"), Some(0x68));
        assert_eq!(hid::key_code("Nope"), None);
    }
}
