//! Query (read-only) command handlers.

use anyhow::Context;
use kb390l::macro_seq::MacroSeq;
use kb390l_keyboard::KeyIndex;

use super::{CommandResult, Session};

/// Get game mode
pub fn game_mode(kb: &mut Session) -> CommandResult {
    let on = kb.game_mode().context("Failed to read game mode")?;
    println!("Game mode: {}", if on { "on" } else { "off" });
    Ok(())
}

/// Get report rate
pub fn rate(kb: &mut Session) -> CommandResult {
    let rate = kb.report_rate().context("Failed to read report rate")?;
    println!("Report rate: {} ({rate})", rate.value());
    Ok(())
}

/// Get response time
pub fn response_time(kb: &mut Session) -> CommandResult {
    let time = kb.response_time().context("Failed to read response time")?;
    println!("Response time: {time}");
    Ok(())
}

/// Get backlight settings
pub fn light(kb: &mut Session) -> CommandResult {
    let settings = kb.light_settings().context("Failed to read light settings")?;
    println!("Light:");
    println!(
        "  Type:       {} (#{})",
        settings.kind,
        settings.kind.list_index()
    );
    if settings.kind.has_delay() {
        println!("  Delay:      {}/10", settings.delay);
    }
    println!("  Brightness: {}/50", settings.brightness);
    if settings.kind.has_direction() {
        println!("  Direction:  {}", settings.direction);
    }
    Ok(())
}

/// Show one key's action and enabled state
pub fn button(kb: &mut Session, key: KeyIndex) -> CommandResult {
    let action = kb
        .button(key)
        .with_context(|| format!("Failed to read button {key}"))?;
    let enabled = kb
        .button_enabled(key)
        .with_context(|| format!("Failed to read enabled state of {key}"))?;
    println!(
        "{:<10} {action}{}",
        key.to_string(),
        if enabled { "" } else { " (disabled)" }
    );
    Ok(())
}

/// Show a macro slot in sequence syntax
pub fn show_macro(kb: &mut Session, index: u8, default_delay: u16) -> CommandResult {
    let value = kb
        .macro_at(index)
        .with_context(|| format!("Failed to read macro {index}"))?;
    if value.is_empty() {
        println!("Macro {index}: (empty)");
        return Ok(());
    }

    let seq = MacroSeq::from_macro(&value, default_delay);
    println!(
        "Macro {index}: {seq}  (repeat={}, default delay={default_delay}ms)",
        value.repeat
    );
    Ok(())
}

/// Everything cheap to read, for a bare invocation
pub fn all(kb: &mut Session) -> CommandResult {
    game_mode(kb)?;
    rate(kb)?;
    response_time(kb)?;
    light(kb)
}
