//! HV-KB390L configuration tool
//!
//! Exit codes: 0 success, 1 device not found, 2 file could not be opened,
//! 3 the operation failed.

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

use kb390l::Config;

// CLI definitions
mod cli;
use cli::Cli;

// Command handlers
mod commands;
use commands::{device, query, set, watch, CliError, CommandResult};

fn init_logging(verbose: bool) {
    let default = if verbose {
        "warn,kb390l=debug,kb390l_keyboard=debug,kb390l_transport=debug"
    } else {
        "warn"
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Whether any option other than --watch/--verbose/--config was given
fn has_actions(cli: &Cli) -> bool {
    cli.game_mode
        || cli.set_game_mode.is_some()
        || cli.rate
        || cli.set_rate.is_some()
        || cli.response_time
        || cli.set_response_time.is_some()
        || cli.light
        || cli.set_light.is_some()
        || !cli.button.is_empty()
        || !cli.set_button.is_empty()
        || !cli.enable_button.is_empty()
        || !cli.disable_button.is_empty()
        || !cli.show_macro.is_empty()
        || !cli.set_macro.is_empty()
        || cli.backup.is_some()
        || cli.restore.is_some()
        || cli.reset
}

fn run(cli: Cli) -> CommandResult {
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    debug!("Loading config from {:?}", config_path);
    let config =
        Config::load(&config_path).map_err(|e| CliError::file(&config_path, format!("{e:#}")))?;

    let mut kb = commands::open_session(&config)?;

    if cli.watch && !has_actions(&cli) {
        return watch::run(kb, &config.events);
    }

    // Everything else needs the device, so check it in advance
    if !kb.connect() {
        return Err(CliError::DeviceNotFound);
    }

    // Whole-device operations run alone
    if let Some(path) = &cli.backup {
        return device::backup(&mut kb, path);
    }
    if let Some(path) = &cli.restore {
        return device::restore(&mut kb, path);
    }
    if cli.reset {
        return device::reset(&mut kb);
    }

    if !has_actions(&cli) {
        return query::all(&mut kb);
    }

    // Write-through settings
    if let Some(on) = cli.set_game_mode {
        set::set_game_mode(&mut kb, on.into())?;
    }
    if cli.game_mode {
        query::game_mode(&mut kb)?;
    }
    if cli.rate {
        query::rate(&mut kb)?;
    }
    if let Some(rate) = cli.set_rate {
        set::set_rate(&mut kb, rate)?;
    }
    if cli.response_time {
        query::response_time(&mut kb)?;
    }
    if let Some(ms) = cli.set_response_time {
        set::set_response_time(&mut kb, ms)?;
    }
    if let Some(spec) = &cli.set_light {
        set::set_light(&mut kb, spec)?;
    }
    if cli.light {
        query::light(&mut kb)?;
    }

    // Staged edits
    for (key, action) in &cli.set_button {
        set::set_button(&mut kb, *key, *action)?;
    }
    for key in &cli.enable_button {
        set::set_button_enabled(&mut kb, *key, true)?;
    }
    for key in &cli.disable_button {
        set::set_button_enabled(&mut kb, *key, false)?;
    }
    for (index, seq) in &cli.set_macro {
        set::set_macro(&mut kb, *index, seq, cli.repeat, cli.macro_delay)?;
    }
    set::save(&mut kb)?;

    for key in &cli.button {
        query::button(&mut kb, *key)?;
    }
    let default_delay = cli
        .macro_delay
        .unwrap_or(kb390l::macro_seq::DEFAULT_DELAY_MS);
    for index in &cli.show_macro {
        query::show_macro(&mut kb, *index, default_delay)?;
    }

    if cli.watch {
        return watch::run(kb, &config.events);
    }
    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{e:#}");
            ExitCode::from(e.exit_code())
        }
    }
}
