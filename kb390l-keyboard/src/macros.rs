//! Macro pages
//!
//! Each of the 32 macro slots is a 192-byte page:
//!
//! ```text
//! [count_hi, count_lo] ([delay, value] [ext_hi, ext_lo]?)* 0 ...
//! ```
//!
//! `delay` has bit 7 set for a release. A press is stored as a 1-tick down
//! followed by an up of the same value. A delay of 0x7F means the real delay
//! follows as a big-endian u16.

use kb390l_transport::protocol::limits;
use kb390l_transport::{cmd, Transport, PAGE_SIZE};

use crate::buttons::MouseButton;
use crate::{Keyboard, KeyboardError, PageKey};

/// Size of one macro page
pub const MACRO_PAGE_LEN: usize = 3 * PAGE_SIZE;

const UP_FLAG: u8 = 0x80;
const EXTENDED_DELAY: u8 = 0x7F;
/// Down delay that, followed by a matching up, marks a press
const PRESS_MARKER: u8 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroKind {
    Down,
    Up,
    /// Down immediately followed by up
    Press,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroTarget {
    Key,
    Button,
}

/// One step of a macro
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MacroAction {
    pub kind: MacroKind,
    /// HID usage code, or a [`MouseButton`] code from 0xF0 up
    pub value: u8,
    /// Pause after the step, in milliseconds
    pub delay: u16,
}

impl MacroAction {
    pub fn new(kind: MacroKind, value: u8, delay: u16) -> Self {
        Self { kind, value, delay }
    }

    pub fn target(&self) -> MacroTarget {
        if self.value < MouseButton::FIRST_CODE {
            MacroTarget::Key
        } else {
            MacroTarget::Button
        }
    }
}

/// Decoded macro slot
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Macro {
    /// Play count; 0 means the slot is empty
    pub repeat: u16,
    pub actions: Vec<MacroAction>,
}

impl Macro {
    pub fn new(repeat: u16, actions: Vec<MacroAction>) -> Self {
        Self { repeat, actions }
    }

    pub fn is_empty(&self) -> bool {
        self.repeat == 0 || self.repeat == u16::MAX
    }

    /// Serialize into a zero-padded 192-byte page.
    ///
    /// Actions with value 0 are unassigned and skipped.
    pub fn encode(&self) -> Result<Vec<u8>, KeyboardError> {
        if self.is_empty() && !self.actions.is_empty() {
            return Err(KeyboardError::InvalidParameter(format!(
                "Macro repeat count must be 1-{}, got {}",
                u16::MAX - 1,
                self.repeat
            )));
        }

        let mut bytes = Vec::with_capacity(MACRO_PAGE_LEN);
        bytes.extend_from_slice(&self.repeat.to_be_bytes());

        for action in self.actions.iter().filter(|a| a.value != 0) {
            let (delay, extended) = match u8::try_from(action.delay) {
                Ok(d) if d < EXTENDED_DELAY => (d, None),
                _ => (EXTENDED_DELAY, Some(action.delay)),
            };
            let value = action.value;

            match action.kind {
                MacroKind::Down => bytes.extend_from_slice(&[delay, value]),
                MacroKind::Press => {
                    bytes.extend_from_slice(&[PRESS_MARKER, value, delay | UP_FLAG, value])
                }
                MacroKind::Up => bytes.extend_from_slice(&[delay | UP_FLAG, value]),
            }
            if let Some(extended) = extended {
                bytes.extend_from_slice(&extended.to_be_bytes());
            }
        }

        if bytes.len() > MACRO_PAGE_LEN {
            return Err(KeyboardError::InvalidParameter(format!(
                "Macro needs {} bytes, a slot holds {MACRO_PAGE_LEN}",
                bytes.len()
            )));
        }
        bytes.resize(MACRO_PAGE_LEN, 0);
        Ok(bytes)
    }

    /// Parse a macro page; never fails, stopping at the first zero value
    pub fn decode(bytes: &[u8]) -> Self {
        let mut padded = bytes.to_vec();
        padded.extend_from_slice(&[0; 4]);

        let repeat = u16::from_be_bytes([padded[0], padded[1]]);
        let mut result = Self {
            repeat,
            actions: Vec::new(),
        };
        if result.is_empty() {
            return Self::default();
        }

        let mut i = 2;
        while i + 1 < bytes.len() {
            let mut delay = padded[i];
            let value = padded[i + 1];
            if value == 0 {
                break;
            }

            let kind = if delay & UP_FLAG != 0 {
                delay &= !UP_FLAG;
                MacroKind::Up
            } else if delay == PRESS_MARKER
                && padded[i + 2] & UP_FLAG != 0
                && padded[i + 3] == value
            {
                delay = padded[i + 2] & !UP_FLAG;
                i += 2;
                MacroKind::Press
            } else {
                MacroKind::Down
            };

            let delay = if delay == EXTENDED_DELAY {
                let extended = u16::from_be_bytes([padded[i + 2], padded[i + 3]]);
                i += 2;
                extended
            } else {
                u16::from(delay)
            };

            result.actions.push(MacroAction::new(kind, value, delay));
            i += 2;
        }

        result
    }
}

fn check_index(index: u8) -> Result<(), KeyboardError> {
    if index > limits::MAX_MACRO {
        return Err(KeyboardError::InvalidParameter(format!(
            "Macro index must be {}-{}, got {index}",
            limits::MIN_MACRO,
            limits::MAX_MACRO
        )));
    }
    Ok(())
}

impl<T: Transport> Keyboard<T> {
    /// Raw bytes of macro slot `index`
    pub fn macro_bytes(&mut self, index: u8) -> Result<Vec<u8>, KeyboardError> {
        check_index(index)?;
        self.read_page(cmd::MACRO, index)
    }

    /// Stage raw bytes for macro slot `index`; committed by [`Keyboard::save`]
    pub fn set_macro_bytes(&mut self, index: u8, bytes: Vec<u8>) -> Result<(), KeyboardError> {
        let current = self.macro_bytes(index)?;
        if current != bytes {
            self.stage(PageKey::new(cmd::MACRO, index), bytes);
        }
        Ok(())
    }

    pub fn macro_at(&mut self, index: u8) -> Result<Macro, KeyboardError> {
        Ok(Macro::decode(&self.macro_bytes(index)?))
    }

    /// Stage macro slot `index`; committed by [`Keyboard::save`]
    pub fn set_macro(&mut self, index: u8, value: &Macro) -> Result<(), KeyboardError> {
        check_index(index)?;
        let bytes = value.encode()?;
        self.set_macro_bytes(index, bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: u8 = 0x04;
    const B: u8 = 0x05;

    #[test]
    fn test_encode_layout() {
        let m = Macro::new(
            2,
            vec![
                MacroAction::new(MacroKind::Down, A, 10),
                MacroAction::new(MacroKind::Press, B, 20),
                MacroAction::new(MacroKind::Up, A, 300),
            ],
        );
        let bytes = m.encode().unwrap();

        assert_eq!(bytes.len(), MACRO_PAGE_LEN);
        assert_eq!(
            bytes[..14],
            [0, 2, 10, A, 1, B, 0x80 | 20, B, 0xFF, A, 0x01, 0x2C, 0, 0]
        );
        assert!(bytes[14..].iter().all(|&b| b == 0));
    }

    #[test]
    fn test_roundtrip_with_extended_delays() {
        let m = Macro::new(
            5,
            vec![
                MacroAction::new(MacroKind::Press, A, 126),
                MacroAction::new(MacroKind::Press, B, 127),
                MacroAction::new(MacroKind::Down, 0xE1, 1000),
                MacroAction::new(MacroKind::Press, MouseButton::Right.code(), 0),
                MacroAction::new(MacroKind::Up, 0xE1, 65535),
            ],
        );
        assert_eq!(Macro::decode(&m.encode().unwrap()), m);
    }

    #[test]
    fn test_unassigned_actions_are_skipped() {
        let m = Macro::new(
            1,
            vec![
                MacroAction::new(MacroKind::Press, 0, 5),
                MacroAction::new(MacroKind::Press, A, 5),
            ],
        );
        let decoded = Macro::decode(&m.encode().unwrap());
        assert_eq!(decoded.actions, vec![MacroAction::new(MacroKind::Press, A, 5)]);
    }

    #[test]
    fn test_empty_slots() {
        assert!(Macro::decode(&[0u8; MACRO_PAGE_LEN]).is_empty());
        assert_eq!(Macro::decode(&[0xFFu8; MACRO_PAGE_LEN]), Macro::default());
        assert_eq!(Macro::default().encode().unwrap(), vec![0u8; MACRO_PAGE_LEN]);
        assert!(Macro::new(0, vec![MacroAction::new(MacroKind::Down, A, 1)])
            .encode()
            .is_err());
    }

    #[test]
    fn test_oversize_macro_is_rejected() {
        // 4 bytes per press + 2 for the count: 48 presses need 194 bytes
        let actions = vec![MacroAction::new(MacroKind::Press, A, 1); 48];
        assert!(Macro::new(1, actions).encode().is_err());

        let actions = vec![MacroAction::new(MacroKind::Press, A, 1); 47];
        assert!(Macro::new(1, actions).encode().is_ok());
    }

    #[test]
    fn test_decode_stops_at_end_of_page() {
        let mut bytes = vec![0u8; MACRO_PAGE_LEN];
        bytes[1] = 1;
        for pair in bytes[2..].chunks_exact_mut(2) {
            pair.copy_from_slice(&[3, A]);
        }
        let m = Macro::decode(&bytes);
        assert_eq!(m.actions.len(), (MACRO_PAGE_LEN - 2) / 2);
        assert!(m.actions.iter().all(|a| a.kind == MacroKind::Down));
    }

    #[test]
    fn test_targets() {
        assert_eq!(MacroAction::new(MacroKind::Down, A, 0).target(), MacroTarget::Key);
        assert_eq!(
            MacroAction::new(MacroKind::Down, MouseButton::WheelUp.code(), 0).target(),
            MacroTarget::Button
        );
    }
}
