//! Macro sequence text syntax.
//!
//! Parses a comma-separated sequence into steps, converts them to a
//! [`Macro`] for the keyboard's macro pages, and rebuilds the text from a
//! decoded macro for display.
//!
//! # Syntax
//!
//! ```text
//! A,B,C                  press keys in sequence
//! LShift:down,A,LShift:up explicit down/up
//! A:press,B:release       long forms of A and B:up
//! A(50ms),B              delay after a step
//! A,200ms,B              standalone delay, overrides the preceding step's
//! LButton,WheelUp        mouse buttons
//! ```
//!
//! Steps without a delay use the sequence's default delay.

use std::fmt;
use std::str::FromStr;

use kb390l_keyboard::{Macro, MacroAction, MacroKind, MouseButton};
use kb390l_transport::protocol::hid;
use thiserror::Error;

/// Delay applied to steps that do not name one
pub const DEFAULT_DELAY_MS: u16 = 10;

/// One step of a macro sequence as written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MacroStep {
    /// Down then up
    Press { code: u8, delay: Option<u16> },
    Down { code: u8, delay: Option<u16> },
    Up { code: u8, delay: Option<u16> },
    /// Overrides the delay of the preceding step
    Delay(u16),
}

/// A parsed macro sequence with its default delay and repeat count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroSeq {
    pub steps: Vec<MacroStep>,
    pub default_delay: u16,
    pub repeat: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseMacroSeqError {
    #[error("empty macro sequence")]
    EmptySequence,
    #[error("unknown key or button: \"{0}\"")]
    UnknownKey(String),
    #[error("invalid delay: \"{0}\"")]
    InvalidDelay(String),
    #[error("invalid direction: \"{0}\" (expected down or up)")]
    InvalidDirection(String),
    #[error("delay \"{0}\" has no step before it")]
    LeadingDelay(String),
}

/// Parse a delay like `50ms`
fn parse_delay(s: &str) -> Result<u16, ParseMacroSeqError> {
    let s = s.trim();
    s.strip_suffix("ms")
        .and_then(|n| n.trim().parse::<u16>().ok())
        .ok_or_else(|| ParseMacroSeqError::InvalidDelay(s.to_string()))
}

fn is_delay_token(s: &str) -> bool {
    s.strip_suffix("ms")
        .is_some_and(|n| n.trim().parse::<u16>().is_ok())
}

/// Split a trailing `(50ms)` off a token
fn split_paren_delay(s: &str) -> Result<(&str, Option<u16>), ParseMacroSeqError> {
    match (s.rfind('('), s.strip_suffix(')')) {
        (Some(open), Some(inner)) => Ok((&s[..open], Some(parse_delay(&inner[open + 1..])?))),
        _ => Ok((s, None)),
    }
}

/// Key usage name, mouse button name or `0xNN`
fn resolve_code(name: &str) -> Result<u8, ParseMacroSeqError> {
    let name = name.trim();
    hid::key_code(name)
        .or_else(|| name.parse::<MouseButton>().ok().map(MouseButton::code))
        .filter(|&code| code != 0)
        .ok_or_else(|| ParseMacroSeqError::UnknownKey(name.to_string()))
}

fn code_name(code: u8) -> String {
    if let Some(button) = MouseButton::from_code(code) {
        return button.name().to_string();
    }
    match hid::key_name(code) {
        Some(name) => name.to_string(),
        None => format!("0x{code:02X}"),
    }
}

impl FromStr for MacroSeq {
    type Err = ParseMacroSeqError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut steps = Vec::new();

        for token in s.split(',').map(str::trim).filter(|t| !t.is_empty()) {
            if is_delay_token(token) {
                if steps.is_empty() {
                    return Err(ParseMacroSeqError::LeadingDelay(token.to_string()));
                }
                steps.push(MacroStep::Delay(parse_delay(token)?));
                continue;
            }

            let (body, delay) = split_paren_delay(token)?;
            let step = match body.rsplit_once(':') {
                Some((key, direction)) => {
                    let code = resolve_code(key)?;
                    match direction.trim().to_ascii_lowercase().as_str() {
                        "press" => MacroStep::Press { code, delay },
                        "down" => MacroStep::Down { code, delay },
                        "up" | "release" => MacroStep::Up { code, delay },
                        _ => {
                            return Err(ParseMacroSeqError::InvalidDirection(
                                direction.trim().to_string(),
                            ))
                        }
                    }
                }
                None => MacroStep::Press {
                    code: resolve_code(body)?,
                    delay,
                },
            };
            steps.push(step);
        }

        if steps.is_empty() {
            return Err(ParseMacroSeqError::EmptySequence);
        }
        Ok(Self {
            steps,
            default_delay: DEFAULT_DELAY_MS,
            repeat: 1,
        })
    }
}

impl MacroSeq {
    /// Resolve delays and build the device-side macro
    pub fn to_macro(&self) -> Macro {
        let mut actions: Vec<MacroAction> = Vec::with_capacity(self.steps.len());
        for step in &self.steps {
            let (kind, code, delay) = match *step {
                MacroStep::Press { code, delay } => (MacroKind::Press, code, delay),
                MacroStep::Down { code, delay } => (MacroKind::Down, code, delay),
                MacroStep::Up { code, delay } => (MacroKind::Up, code, delay),
                MacroStep::Delay(ms) => {
                    if let Some(last) = actions.last_mut() {
                        last.delay = ms;
                    }
                    continue;
                }
            };
            actions.push(MacroAction::new(
                kind,
                code,
                delay.unwrap_or(self.default_delay),
            ));
        }
        Macro::new(self.repeat, actions)
    }

    /// Rebuild a sequence from a decoded macro.
    ///
    /// Delays equal to `default_delay` are left implicit.
    pub fn from_macro(value: &Macro, default_delay: u16) -> Self {
        let steps = value
            .actions
            .iter()
            .map(|action| {
                let code = action.value;
                let delay = (action.delay != default_delay).then_some(action.delay);
                match action.kind {
                    MacroKind::Press => MacroStep::Press { code, delay },
                    MacroKind::Down => MacroStep::Down { code, delay },
                    MacroKind::Up => MacroStep::Up { code, delay },
                }
            })
            .collect();
        Self {
            steps,
            default_delay,
            repeat: value.repeat,
        }
    }
}

impl fmt::Display for MacroStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (code, suffix, delay) = match *self {
            MacroStep::Press { code, delay } => (code, "", delay),
            MacroStep::Down { code, delay } => (code, ":down", delay),
            MacroStep::Up { code, delay } => (code, ":up", delay),
            MacroStep::Delay(ms) => return write!(f, "{ms}ms"),
        };
        write!(f, "{}{suffix}", code_name(code))?;
        if let Some(ms) = delay {
            write!(f, "({ms}ms)")?;
        }
        Ok(())
    }
}

impl fmt::Display for MacroSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{step}")?;
        }
        Ok(())
    }
}
