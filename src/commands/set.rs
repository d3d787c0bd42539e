//! Set (write) command handlers.
//!
//! Speed and lighting settings reach the device immediately. Button, enable
//! and macro edits are staged in the session and committed by [`save`].

use anyhow::Context;
use kb390l::macro_seq::MacroSeq;
use kb390l_keyboard::{ButtonAction, KeyIndex, LightSettings, ResponseTime};
use tracing::info;

use super::{CommandResult, Session};
use crate::cli::LightSpec;

/// Set game mode
pub fn set_game_mode(kb: &mut Session, on: bool) -> CommandResult {
    kb.set_game_mode(on).context("Failed to set game mode")?;
    println!("Game mode set to {}", if on { "on" } else { "off" });
    Ok(())
}

/// Set report rate (0-3)
pub fn set_rate(kb: &mut Session, rate: u8) -> CommandResult {
    kb.set_report_rate(rate)
        .context("Failed to set report rate")?;
    let rate = kb.report_rate().context("Failed to read report rate")?;
    println!("Report rate set to {} ({rate})", rate.value());
    Ok(())
}

/// Set response time from milliseconds
pub fn set_response_time(kb: &mut Session, ms: u16) -> CommandResult {
    let time = ResponseTime::from_millis(ms).context("Invalid response time")?;
    kb.set_response_time(time.value())
        .context("Failed to set response time")?;
    println!("Response time set to {time}");
    Ok(())
}

/// Set backlight; fields left out keep their current value
pub fn set_light(kb: &mut Session, spec: &LightSpec) -> CommandResult {
    let current = kb.light_settings().context("Failed to read light settings")?;
    let settings = LightSettings {
        kind: spec.kind,
        delay: spec.delay.unwrap_or(current.delay),
        brightness: spec.brightness.unwrap_or(current.brightness),
        direction: spec.direction.unwrap_or(current.direction),
    };
    kb.set_light_settings(&settings)
        .context("Failed to set light settings")?;
    println!("Light set to {settings}");
    Ok(())
}

/// Stage a key remap
pub fn set_button(kb: &mut Session, key: KeyIndex, action: ButtonAction) -> CommandResult {
    kb.set_button(key, action)
        .with_context(|| format!("Failed to remap {key}"))?;
    println!("{key} -> {action}");
    Ok(())
}

/// Stage enabling or disabling a key
pub fn set_button_enabled(kb: &mut Session, key: KeyIndex, enabled: bool) -> CommandResult {
    kb.set_button_enabled(key, enabled)
        .with_context(|| format!("Failed to change enabled state of {key}"))?;
    println!("{key} {}", if enabled { "enabled" } else { "disabled" });
    Ok(())
}

/// Stage a macro slot
pub fn set_macro(
    kb: &mut Session,
    index: u8,
    seq: &MacroSeq,
    repeat: u16,
    delay: Option<u16>,
) -> CommandResult {
    let mut seq = seq.clone();
    seq.repeat = repeat;
    if let Some(delay) = delay {
        seq.default_delay = delay;
    }

    let value = seq.to_macro();
    kb.set_macro(index, &value)
        .with_context(|| format!("Failed to set macro {index}"))?;
    println!(
        "Macro {index} set to {seq}  ({} actions, delay={}ms, repeat={repeat}x)",
        value.actions.len(),
        seq.default_delay
    );
    Ok(())
}

/// Commit staged edits
pub fn save(kb: &mut Session) -> CommandResult {
    if !kb.unsaved_changes() {
        return Ok(());
    }
    info!("Writing staged changes to the device");
    kb.save().context("Failed to write changes to the device")?;
    println!("Changes saved");
    Ok(())
}
