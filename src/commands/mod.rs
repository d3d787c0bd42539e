//! Command handlers for the CLI application.
//!
//! This module organizes command handlers by category:
//! - `query`: read-only commands (game mode, rate, light, buttons, macros)
//! - `set`: settings written through immediately, and staged page edits
//! - `device`: backup, restore and factory reset
//! - `watch`: notification and hot-plug loop

pub mod device;
pub mod query;
pub mod set;
pub mod watch;

use std::fmt::Display;
use std::path::{Path, PathBuf};

use anyhow::Context;
use kb390l::Config;
use kb390l_keyboard::Keyboard;
use kb390l_transport::{HidContext, HidTransport};
use thiserror::Error;

/// A keyboard session over hidapi
pub type Session = Keyboard<HidTransport>;

/// Failures, each with its process exit code
#[derive(Debug, Error)]
pub enum CliError {
    #[error("The device was not found")]
    DeviceNotFound,

    #[error("Failed to open {}: {reason}", path.display())]
    File { path: PathBuf, reason: String },

    #[error(transparent)]
    Operation(#[from] anyhow::Error),
}

impl CliError {
    pub fn file(path: &Path, reason: impl Display) -> Self {
        Self::File {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            Self::DeviceNotFound => 1,
            Self::File { .. } => 2,
            Self::Operation(_) => 3,
        }
    }
}

/// Result type for command handlers
pub type CommandResult = Result<(), CliError>;

/// Build a session over both HID endpoints; nothing is opened yet
pub fn open_session(config: &Config) -> Result<Session, CliError> {
    let context = HidContext::new().context("Failed to initialize HID API")?;
    let control = HidTransport::new(context.clone(), config.transport.clone());
    let events = HidTransport::new(context, config.transport.clone());

    Ok(Keyboard::new(control, events)
        .with_device_ids(config.control_ids(), config.event_ids())
        .with_event_read_timeout(config.events.read_timeout()))
}
