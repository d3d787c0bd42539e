//! Button remapping and the enabled-buttons mask
//!
//! The BUTTONS page holds one little-endian 32-bit action word per key
//! index; the ENABLED_BUTTONS page packs one bit per key into 3-byte rows of
//! 21 keys. Both are decoded, edited and re-encoded as a whole before being
//! staged for [`Keyboard::save`].

use std::fmt;
use std::str::FromStr;

use kb390l_transport::protocol::{hid, limits};
use kb390l_transport::{cmd, Transport};
use zerocopy::byteorder::little_endian::U32;
use zerocopy::{FromBytes, IntoBytes};

use crate::{Keyboard, KeyboardError, PageKey};

macro_rules! key_indices {
    ($($variant:ident = $value:literal => $name:literal,)*) => {
        /// Position of a physical key in the button and enabled-buttons pages
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u8)]
        pub enum KeyIndex {
            $($variant = $value,)*
        }

        impl KeyIndex {
            /// Every key slot, reserved ones included, in page order
            pub const ALL: &'static [KeyIndex] = &[$(KeyIndex::$variant,)*];

            pub fn name(self) -> &'static str {
                match self {
                    $(KeyIndex::$variant => $name,)*
                }
            }
        }
    };
}

key_indices! {
    LCtrl = 0 => "LCtrl",
    Super = 1 => "Super",
    LAlt = 2 => "LAlt",
    Reserved1 = 3 => "Reserved1",
    Reserved2 = 4 => "Reserved2",
    Space = 5 => "Space",
    Reserved3 = 6 => "Reserved3",
    Reserved4 = 7 => "Reserved4",
    Reserved5 = 8 => "Reserved5",
    RAlt = 9 => "RAlt",
    FnKey = 10 => "Fn",
    Menu = 11 => "Menu",
    Reserved6 = 12 => "Reserved6",
    RCtrl = 13 => "RCtrl",
    Left = 14 => "Left",
    Down = 15 => "Down",
    Right = 16 => "Right",
    LShift = 21 => "LShift",
    Z = 22 => "Z",
    X = 23 => "X",
    C = 24 => "C",
    V = 25 => "V",
    B = 26 => "B",
    N = 27 => "N",
    M = 28 => "M",
    Comma = 29 => "Comma",
    Dot = 30 => "Dot",
    Slash = 31 => "Slash",
    Reserved7 = 32 => "Reserved7",
    RShift = 33 => "RShift",
    Reserved8 = 34 => "Reserved8",
    Reserved9 = 35 => "Reserved9",
    Up = 36 => "Up",
    CapsLock = 42 => "CapsLock",
    A = 43 => "A",
    S = 44 => "S",
    D = 45 => "D",
    F = 46 => "F",
    G = 47 => "G",
    H = 48 => "H",
    J = 49 => "J",
    K = 50 => "K",
    L = 51 => "L",
    Semicolon = 52 => "Semicolon",
    Quote = 53 => "Quote",
    Reserved10 = 54 => "Reserved10",
    Enter = 55 => "Enter",
    Tab = 63 => "Tab",
    Q = 64 => "Q",
    W = 65 => "W",
    E = 66 => "E",
    R = 67 => "R",
    T = 68 => "T",
    Y = 69 => "Y",
    U = 70 => "U",
    I = 71 => "I",
    O = 72 => "O",
    P = 73 => "P",
    LBracket = 74 => "LBracket",
    RBracket = 75 => "RBracket",
    Backslash = 76 => "Backslash",
    Delete = 77 => "Delete",
    End = 78 => "End",
    PageDown = 79 => "PageDown",
    Grave = 84 => "Grave",
    Digit1 = 85 => "1",
    Digit2 = 86 => "2",
    Digit3 = 87 => "3",
    Digit4 = 88 => "4",
    Digit5 = 89 => "5",
    Digit6 = 90 => "6",
    Digit7 = 91 => "7",
    Digit8 = 92 => "8",
    Digit9 = 93 => "9",
    Digit0 = 94 => "0",
    Minus = 95 => "Minus",
    Equal = 96 => "Equal",
    Backspace = 97 => "Backspace",
    Insert = 98 => "Insert",
    Home = 99 => "Home",
    PageUp = 100 => "PageUp",
    Escape = 105 => "Escape",
    Reserved11 = 106 => "Reserved11",
    F1 = 107 => "F1",
    F2 = 108 => "F2",
    F3 = 109 => "F3",
    F4 = 110 => "F4",
    F5 = 111 => "F5",
    F6 = 112 => "F6",
    F7 = 113 => "F7",
    F8 = 114 => "F8",
    F9 = 115 => "F9",
    F10 = 116 => "F10",
    F11 = 117 => "F11",
    F12 = 118 => "F12",
    SysRq = 119 => "SysRq",
    ScrollLock = 120 => "ScrollLock",
    Pause = 121 => "Pause",
}

impl KeyIndex {
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: u8) -> Option<Self> {
        Self::ALL.iter().copied().find(|k| *k as u8 == index)
    }

    /// Row of the enabled-buttons mask holding this key
    pub fn mask_row(self) -> usize {
        self.index() / limits::BUTTONS_PER_ROW
    }

    /// Bit within [`KeyIndex::mask_row`]
    pub fn mask_bit(self) -> usize {
        self.index() % limits::BUTTONS_PER_ROW
    }
}

impl fmt::Display for KeyIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyIndex {
    type Err = KeyboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|k| k.name().eq_ignore_ascii_case(s))
            .or_else(|| s.parse::<u8>().ok().and_then(Self::from_index))
            .ok_or_else(|| KeyboardError::InvalidParameter(format!("Unknown key: {s}")))
    }
}

/// Mouse buttons, encoded above the keyboard usage range
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MouseButton {
    Left = 0xF0,
    Right = 0xF1,
    Middle = 0xF2,
    Back = 0xF3,
    Forward = 0xF4,
    WheelLeft = 0xF5,
    WheelRight = 0xF6,
    WheelUp = 0xF7,
    WheelDown = 0xF8,
}

impl MouseButton {
    pub const ALL: [MouseButton; 9] = [
        Self::Left,
        Self::Right,
        Self::Middle,
        Self::Back,
        Self::Forward,
        Self::WheelLeft,
        Self::WheelRight,
        Self::WheelUp,
        Self::WheelDown,
    ];

    /// Lowest code that denotes a mouse button rather than a key
    pub const FIRST_CODE: u8 = 0xF0;

    pub fn from_code(code: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|b| *b as u8 == code)
    }

    pub fn code(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Left => "LButton",
            Self::Right => "RButton",
            Self::Middle => "MButton",
            Self::Back => "Back",
            Self::Forward => "Forward",
            Self::WheelLeft => "WheelLeft",
            Self::WheelRight => "WheelRight",
            Self::WheelUp => "WheelUp",
            Self::WheelDown => "WheelDown",
        }
    }
}

impl fmt::Display for MouseButton {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for MouseButton {
    type Err = KeyboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|b| b.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| KeyboardError::InvalidParameter(format!("Unknown mouse button: {s}")))
    }
}

/// How a macro bound to a button replays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(u8)]
pub enum MacroRepeat {
    #[default]
    Once = 0,
    /// As many times as the macro's own repeat count says
    Times = 1,
    UntilReleased = 2,
}

impl MacroRepeat {
    fn from_byte(b: u8) -> Option<Self> {
        match b {
            0 => Some(Self::Once),
            1 => Some(Self::Times),
            2 => Some(Self::UntilReleased),
            _ => None,
        }
    }

    fn label(self) -> &'static str {
        match self {
            Self::Once => "once",
            Self::Times => "times",
            Self::UntilReleased => "held",
        }
    }
}

mod mode {
    pub const KEY: u8 = 0;
    pub const MOUSE: u8 = 1;
    pub const FUNCTION_KEY: u8 = 2;
    pub const COMMAND: u8 = 3;
    pub const MACRO: u8 = 4;
    pub const ADVANCED: u8 = 10;
}

/// What a key does when pressed.
///
/// Stored as `arg3 << 24 | arg2 << 16 | arg1 << 8 | mode`. Words that do not
/// fit any known shape decode as [`ButtonAction::Custom`], so decoding and
/// re-encoding never changes a word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ButtonAction {
    /// Up to three HID usage codes; all zero disables the key
    Key([u8; 3]),
    Mouse(MouseButton),
    /// The Fn modifier
    FunctionKey,
    /// 16-bit consumer/system command
    Command(u16),
    Macro { index: u8, repeat: MacroRepeat },
    /// Raises an advanced-command notification carrying `index`
    Advanced(u8),
    Custom(u32),
}

impl ButtonAction {
    /// Disabled key
    pub const OFF: Self = Self::Key([0; 3]);

    pub fn decode(word: u32) -> Self {
        let [kind, arg1, arg2, arg3] = word.to_le_bytes();
        let decoded = match kind {
            mode::KEY => Some(Self::Key([arg1, arg2, arg3])),
            mode::MOUSE if arg1 == 0 && arg3 == 0 => MouseButton::from_code(arg2).map(Self::Mouse),
            mode::FUNCTION_KEY if word >> 8 == 0 => Some(Self::FunctionKey),
            mode::COMMAND if arg1 == 0 => Some(Self::Command((word >> 16) as u16)),
            mode::MACRO if arg3 == 0 && arg2 <= limits::MAX_MACRO => {
                MacroRepeat::from_byte(arg1).map(|repeat| Self::Macro { index: arg2, repeat })
            }
            mode::ADVANCED if arg1 == 0 && arg3 == 0 => Some(Self::Advanced(arg2)),
            _ => None,
        };
        decoded.unwrap_or(Self::Custom(word))
    }

    pub fn encode(self) -> u32 {
        let (mode, arg1, arg2, arg3) = match self {
            Self::Key([a1, a2, a3]) => (mode::KEY, a1, a2, a3),
            Self::Mouse(button) => (mode::MOUSE, 0, button.code(), 0),
            Self::FunctionKey => (mode::FUNCTION_KEY, 0, 0, 0),
            Self::Command(code) => {
                let [lo, hi] = code.to_le_bytes();
                (mode::COMMAND, 0, lo, hi)
            }
            Self::Macro { index, repeat } => (mode::MACRO, repeat as u8, index, 0),
            Self::Advanced(index) => (mode::ADVANCED, 0, index, 0),
            Self::Custom(word) => return word,
        };
        u32::from_le_bytes([mode, arg1, arg2, arg3])
    }
}

fn usage_label(code: u8) -> String {
    match hid::key_name(code) {
        Some(name) => name.to_string(),
        None => format!("0x{code:02X}"),
    }
}

fn parse_usage(s: &str) -> Result<u8, KeyboardError> {
    hid::key_code(s).ok_or_else(|| KeyboardError::InvalidParameter(format!("Unknown key code: {s}")))
}

fn parse_number<N: TryFrom<u32>>(s: &str) -> Result<N, KeyboardError> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u32::from_str_radix(hex, 16),
        None => s.parse::<u32>(),
    };
    parsed
        .ok()
        .and_then(|v| N::try_from(v).ok())
        .ok_or_else(|| KeyboardError::InvalidParameter(format!("Invalid number: {s}")))
}

/// Text form: `off`, `key:LCtrl+C`, `mouse:LButton`, `fn`, `command:0x00E9`,
/// `macro:3[:once|times|held]`, `advanced:7`, `raw:0x0000002C`
impl fmt::Display for ButtonAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::Key([0, 0, 0]) => f.write_str("off"),
            Self::Key([0, code, 0]) => write!(f, "key:{}", usage_label(code)),
            Self::Key([a1, a2, 0]) => write!(f, "key:{}+{}", usage_label(a1), usage_label(a2)),
            Self::Key([a1, a2, a3]) => write!(
                f,
                "key:{}+{}+{}",
                usage_label(a1),
                usage_label(a2),
                usage_label(a3)
            ),
            Self::Mouse(button) => write!(f, "mouse:{button}"),
            Self::FunctionKey => f.write_str("fn"),
            Self::Command(code) => write!(f, "command:0x{code:04X}"),
            Self::Macro { index, repeat } => write!(f, "macro:{index}:{}", repeat.label()),
            Self::Advanced(index) => write!(f, "advanced:{index}"),
            Self::Custom(word) => write!(f, "raw:0x{word:08X}"),
        }
    }
}

impl FromStr for ButtonAction {
    type Err = KeyboardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (kind, arg) = s.split_once(':').unwrap_or((s, ""));

        match kind.to_ascii_lowercase().as_str() {
            "off" if arg.is_empty() => Ok(Self::OFF),
            "fn" if arg.is_empty() => Ok(Self::FunctionKey),
            "key" => {
                let codes = arg.split('+').map(parse_usage).collect::<Result<Vec<_>, _>>()?;
                match codes.as_slice() {
                    [code] => Ok(Self::Key([0, *code, 0])),
                    [a1, a2] => Ok(Self::Key([*a1, *a2, 0])),
                    [a1, a2, a3] => Ok(Self::Key([*a1, *a2, *a3])),
                    _ => Err(KeyboardError::InvalidParameter(format!(
                        "A key action takes 1-3 key codes: {s}"
                    ))),
                }
            }
            "mouse" => Ok(Self::Mouse(arg.parse()?)),
            "command" => Ok(Self::Command(parse_number(arg)?)),
            "macro" => {
                let (index, repeat) = arg.split_once(':').unwrap_or((arg, "once"));
                let index: u8 = parse_number(index)?;
                if index > limits::MAX_MACRO {
                    return Err(KeyboardError::InvalidParameter(format!(
                        "Macro index must be {}-{}, got {index}",
                        limits::MIN_MACRO,
                        limits::MAX_MACRO
                    )));
                }
                let repeat = match repeat.to_ascii_lowercase().as_str() {
                    "once" => MacroRepeat::Once,
                    "times" => MacroRepeat::Times,
                    "held" => MacroRepeat::UntilReleased,
                    other => {
                        return Err(KeyboardError::InvalidParameter(format!(
                            "Unknown macro repeat mode: {other}"
                        )))
                    }
                };
                Ok(Self::Macro { index, repeat })
            }
            "advanced" => Ok(Self::Advanced(parse_number(arg)?)),
            "raw" => Ok(Self::decode(parse_number(arg)?)),
            _ => Err(KeyboardError::InvalidParameter(format!(
                "Unknown button action: {s}"
            ))),
        }
    }
}

/// Decoded BUTTONS page: one action word per key index
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ButtonTable {
    words: Vec<u32>,
}

impl ButtonTable {
    pub fn decode(bytes: &[u8]) -> Result<Self, KeyboardError> {
        let words = <[U32]>::ref_from_bytes(bytes).map_err(|_| {
            KeyboardError::UnexpectedResponse(format!(
                "buttons page of {} bytes is not a whole number of words",
                bytes.len()
            ))
        })?;
        Ok(Self {
            words: words.iter().map(|w| w.get()).collect(),
        })
    }

    pub fn encode(&self) -> Vec<u8> {
        let words: Vec<U32> = self.words.iter().map(|&w| U32::new(w)).collect();
        words.as_bytes().to_vec()
    }

    fn slot(&self, key: KeyIndex) -> Result<usize, KeyboardError> {
        let index = key.index();
        if index >= self.words.len() {
            return Err(KeyboardError::UnexpectedResponse(format!(
                "buttons page has no slot for {key}"
            )));
        }
        Ok(index)
    }

    pub fn get(&self, key: KeyIndex) -> Result<ButtonAction, KeyboardError> {
        Ok(ButtonAction::decode(self.words[self.slot(key)?]))
    }

    /// Returns whether the stored word changed
    pub fn set(&mut self, key: KeyIndex, action: ButtonAction) -> Result<bool, KeyboardError> {
        let slot = self.slot(key)?;
        let word = action.encode();
        let changed = self.words[slot] != word;
        self.words[slot] = word;
        Ok(changed)
    }
}

/// Decoded ENABLED_BUTTONS page: 21-bit rows stored in 3 little-endian bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnabledMask {
    rows: Vec<u32>,
    /// Bytes past the last whole row, kept verbatim
    tail: Vec<u8>,
}

impl EnabledMask {
    const ROW_BYTES: usize = 3;

    pub fn decode(bytes: &[u8]) -> Self {
        let chunks = bytes.chunks_exact(Self::ROW_BYTES);
        let tail = chunks.remainder().to_vec();
        let rows = chunks
            .map(|row| u32::from_le_bytes([row[0], row[1], row[2], 0]))
            .collect();
        Self { rows, tail }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut bytes: Vec<u8> = self
            .rows
            .iter()
            .flat_map(|row| row.to_le_bytes().into_iter().take(Self::ROW_BYTES))
            .collect();
        bytes.extend_from_slice(&self.tail);
        bytes
    }

    fn row(&self, key: KeyIndex) -> Result<usize, KeyboardError> {
        let row = key.mask_row();
        if row >= self.rows.len() {
            return Err(KeyboardError::UnexpectedResponse(format!(
                "enabled-buttons page has no row for {key}"
            )));
        }
        Ok(row)
    }

    pub fn is_enabled(&self, key: KeyIndex) -> Result<bool, KeyboardError> {
        let row = self.row(key)?;
        Ok(self.rows[row] & (1 << key.mask_bit()) != 0)
    }

    /// Returns whether the bit changed
    pub fn set_enabled(&mut self, key: KeyIndex, enabled: bool) -> Result<bool, KeyboardError> {
        let row = self.row(key)?;
        let mask = 1u32 << key.mask_bit();
        let before = self.rows[row];
        if enabled {
            self.rows[row] |= mask;
        } else {
            self.rows[row] &= !mask;
        }
        Ok(self.rows[row] != before)
    }
}

impl<T: Transport> Keyboard<T> {
    /// The whole decoded button table
    pub fn buttons(&mut self) -> Result<ButtonTable, KeyboardError> {
        let bytes = self.read_page(cmd::BUTTONS, 0)?;
        ButtonTable::decode(&bytes)
    }

    pub fn button(&mut self, key: KeyIndex) -> Result<ButtonAction, KeyboardError> {
        self.buttons()?.get(key)
    }

    /// Stage a new action for `key`; committed by [`Keyboard::save`]
    pub fn set_button(&mut self, key: KeyIndex, action: ButtonAction) -> Result<(), KeyboardError> {
        let mut table = self.buttons()?;
        if table.set(key, action)? {
            self.stage(PageKey::new(cmd::BUTTONS, 0), table.encode());
        }
        Ok(())
    }

    pub fn enabled_buttons(&mut self) -> Result<EnabledMask, KeyboardError> {
        let bytes = self.read_page(cmd::ENABLED_BUTTONS, 0)?;
        Ok(EnabledMask::decode(&bytes))
    }

    pub fn button_enabled(&mut self, key: KeyIndex) -> Result<bool, KeyboardError> {
        self.enabled_buttons()?.is_enabled(key)
    }

    /// Stage enabling or disabling `key`; committed by [`Keyboard::save`]
    pub fn set_button_enabled(&mut self, key: KeyIndex, enabled: bool) -> Result<(), KeyboardError> {
        let mut mask = self.enabled_buttons()?;
        if mask.set_enabled(key, enabled)? {
            self.stage(PageKey::new(cmd::ENABLED_BUTTONS, 0), mask.encode());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_index_positions() {
        assert_eq!(KeyIndex::LCtrl as u8, 0);
        assert_eq!(KeyIndex::LShift as u8, 21);
        assert_eq!(KeyIndex::CapsLock as u8, 42);
        assert_eq!(KeyIndex::PageDown as u8, 79);
        assert_eq!(KeyIndex::PageUp as u8, 100);
        assert_eq!(KeyIndex::Pause as u8, 121);
        assert_eq!(KeyIndex::ALL.len(), 98);
        assert_eq!(KeyIndex::from_index(17), None);
        assert_eq!("capslock".parse::<KeyIndex>().unwrap(), KeyIndex::CapsLock);
        assert_eq!("43".parse::<KeyIndex>().unwrap(), KeyIndex::A);
    }

    #[test]
    fn test_mask_geometry() {
        assert_eq!(KeyIndex::LShift.mask_row(), 1);
        assert_eq!(KeyIndex::LShift.mask_bit(), 0);
        assert_eq!(KeyIndex::Right.mask_bit(), 16);
        assert_eq!(KeyIndex::Pause.mask_row(), 5);
        assert_eq!(KeyIndex::Pause.mask_bit(), 16);
    }

    #[test]
    fn test_action_words() {
        assert_eq!(ButtonAction::decode(0x002C_0000), ButtonAction::Key([0, 0x2C, 0]));
        assert_eq!(ButtonAction::Mouse(MouseButton::Middle).encode(), 0x00F2_0001);
        assert_eq!(ButtonAction::Command(0x1234).encode(), 0x1234_0003);
        assert_eq!(
            ButtonAction::decode(0x0003_0104),
            ButtonAction::Macro {
                index: 3,
                repeat: MacroRepeat::Times
            }
        );
        assert_eq!(ButtonAction::Advanced(9).encode(), 0x0009_000A);
        assert_eq!(ButtonAction::decode(0x0000_0002), ButtonAction::FunctionKey);
    }

    #[test]
    fn test_unknown_words_survive_decode() {
        for word in [0xDEAD_BEFE, 0x0000_00FE, 0x00E0_0001, 0x0100_0002, 0x0050_0004] {
            let action = ButtonAction::decode(word);
            assert!(matches!(action, ButtonAction::Custom(_)), "{word:08X}");
            assert_eq!(action.encode(), word);
        }
    }

    #[test]
    fn test_action_text() {
        for text in [
            "off",
            "key:Space",
            "key:LCtrl+C",
            "key:LCtrl+LShift+Escape",
            "mouse:WheelUp",
            "fn",
            "command:0x00E9",
            "macro:31:held",
            "advanced:7",
            "raw:0xDEADBEFE",
        ] {
            let action: ButtonAction = text.parse().unwrap();
            assert_eq!(action.to_string(), text);
        }
        assert_eq!(
            "macro:2".parse::<ButtonAction>().unwrap(),
            ButtonAction::Macro {
                index: 2,
                repeat: MacroRepeat::Once
            }
        );
        assert!("macro:32".parse::<ButtonAction>().is_err());
        assert!("key:Nope".parse::<ButtonAction>().is_err());
        assert!("key:A+B+C+D".parse::<ButtonAction>().is_err());
    }

    #[test]
    fn test_button_table_edit() {
        let mut bytes = vec![0u8; 512];
        bytes[5 * 4 + 2] = 0x2C;
        let mut table = ButtonTable::decode(&bytes).unwrap();
        assert_eq!(table.get(KeyIndex::Space).unwrap(), ButtonAction::Key([0, 0x2C, 0]));

        assert!(!table.set(KeyIndex::Space, ButtonAction::Key([0, 0x2C, 0])).unwrap());
        assert!(table.set(KeyIndex::A, ButtonAction::Mouse(MouseButton::Left)).unwrap());

        let encoded = table.encode();
        assert_eq!(encoded.len(), 512);
        assert_eq!(encoded[43 * 4..43 * 4 + 4], [0x01, 0x00, 0xF0, 0x00]);
    }

    #[test]
    fn test_enabled_mask_edit() {
        let mut bytes = vec![0u8; 64];
        bytes[63] = 0xAA;
        let mut mask = EnabledMask::decode(&bytes);
        assert!(!mask.is_enabled(KeyIndex::Up).unwrap());

        assert!(mask.set_enabled(KeyIndex::Up, true).unwrap());
        assert!(!mask.set_enabled(KeyIndex::Up, true).unwrap());
        assert!(mask.is_enabled(KeyIndex::Up).unwrap());

        let encoded = mask.encode();
        assert_eq!(encoded.len(), 64);
        // Up = 36: row 1, bit 15 -> byte 3 + 1, bit 7
        assert_eq!(encoded[4], 0x80);
        assert_eq!(encoded[63], 0xAA);
    }
}
