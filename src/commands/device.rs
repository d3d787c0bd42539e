//! Whole-device command handlers: backup, restore, factory reset.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::Context;

use super::{CliError, CommandResult, Session};

/// Read the config from the device into a file
pub fn backup(kb: &mut Session, path: &Path) -> CommandResult {
    eprintln!("Reading config from the device...");
    let file = File::create(path).map_err(|e| CliError::file(path, e))?;

    kb.backup_config(BufWriter::new(file))
        .context("Failed to read the config")?;

    eprintln!(
        "The config has been read from the device and written to {}",
        path.display()
    );
    Ok(())
}

/// Write the config from a file to the device
pub fn restore(kb: &mut Session, path: &Path) -> CommandResult {
    eprintln!("Writing config to the device...");
    let file = File::open(path).map_err(|e| CliError::file(path, e))?;

    kb.restore_config(BufReader::new(file))
        .context("Failed to write the config")?;

    eprintln!(
        "The config has been read from {} and written to the device",
        path.display()
    );
    Ok(())
}

/// Factory reset
pub fn reset(kb: &mut Session) -> CommandResult {
    kb.reset_to_factory_defaults()
        .context("Failed to reset the device")?;
    // Every cached page is stale now
    kb.discard_changes();
    println!("Device reset to factory settings");
    Ok(())
}
