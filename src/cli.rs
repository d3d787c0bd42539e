// CLI definitions using clap

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use kb390l::macro_seq::MacroSeq;
use kb390l_keyboard::{ButtonAction, KeyIndex, LightDirection, LightType};
use kb390l_transport::protocol::limits;

#[derive(Parser)]
#[command(name = "kb390l")]
#[command(author, version, about = "HV-KB390L gaming keyboard configuration tool")]
pub struct Cli {
    // === Speed ===
    /// Get the game mode
    #[arg(short = 'g', long)]
    pub game_mode: bool,

    /// Set the game mode
    #[arg(short = 'G', long, value_name = "on|off")]
    pub set_game_mode: Option<Switch>,

    /// Get the report rate (0-3)
    #[arg(short = 'r', long)]
    pub rate: bool,

    /// Select the report rate: 0=125Hz 1=250Hz 2=500Hz 3=1000Hz
    #[arg(short = 'R', long, value_name = "RATE")]
    pub set_rate: Option<u8>,

    /// Get the response time in milliseconds (2-20)
    #[arg(short = 't', long)]
    pub response_time: bool,

    /// Select the response time in milliseconds (2-20)
    #[arg(short = 'T', long, value_name = "MSECS")]
    pub set_response_time: Option<u16>,

    // === Lighting ===
    /// Show backlight settings
    #[arg(long)]
    pub light: bool,

    /// Set backlight: type name or number, then optional delay (0-10),
    /// brightness (0-50) and direction (none/right/left/up/down)
    #[arg(long, value_name = "TYPE[,DELAY,BRIGHTNESS,DIRECTION]", value_parser = parse_light)]
    pub set_light: Option<LightSpec>,

    // === Buttons ===
    /// Show what a key does and whether it is enabled
    #[arg(long, value_name = "KEY")]
    pub button: Vec<KeyIndex>,

    /// Remap a key, e.g. `Q=key:LCtrl+C`, `F1=mouse:WheelUp`, `B=macro:3:held`, `A=off`
    #[arg(long, value_name = "KEY=ACTION", value_parser = parse_button_assignment)]
    pub set_button: Vec<(KeyIndex, ButtonAction)>,

    /// Enable a key
    #[arg(long, value_name = "KEY")]
    pub enable_button: Vec<KeyIndex>,

    /// Disable a key
    #[arg(long, value_name = "KEY")]
    pub disable_button: Vec<KeyIndex>,

    // === Macros ===
    /// Show a macro slot (0-31)
    #[arg(long = "macro", value_name = "N")]
    pub show_macro: Vec<u8>,

    /// Program a macro slot, e.g. `3=LCtrl:down,C,LCtrl:up`
    #[arg(long, value_name = "N=SEQUENCE", value_parser = parse_macro_assignment)]
    pub set_macro: Vec<(u8, MacroSeq)>,

    /// Play count for --set-macro
    #[arg(long, default_value_t = 1, value_name = "COUNT")]
    pub repeat: u16,

    /// Delay between macro steps that do not name one (ms)
    #[arg(long, value_name = "MSECS")]
    pub macro_delay: Option<u16>,

    // === Device ===
    /// Backup NAND data to a file
    #[arg(long, value_name = "FILE")]
    pub backup: Option<PathBuf>,

    /// Restore NAND data from a file
    #[arg(long, value_name = "FILE")]
    pub restore: Option<PathBuf>,

    /// Reset the device to the factory settings
    #[arg(long)]
    pub reset: bool,

    /// Print device notifications until Ctrl-C, following unplug and replug
    #[arg(long)]
    pub watch: bool,

    /// Config file path (default: ~/.config/kb390l/config.toml)
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Switch {
    On,
    Off,
}

impl From<Switch> for bool {
    fn from(value: Switch) -> Self {
        value == Switch::On
    }
}

/// Backlight fields given on the command line; absent ones keep their value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LightSpec {
    pub kind: LightType,
    pub delay: Option<u8>,
    pub brightness: Option<u8>,
    pub direction: Option<LightDirection>,
}

fn parse_light(s: &str) -> Result<LightSpec, String> {
    let mut parts = s.split(',').map(str::trim);
    let kind = parts
        .next()
        .unwrap_or_default()
        .parse::<LightType>()
        .map_err(|e| e.to_string())?;

    let mut number = |what: &str, max: u8| -> Result<Option<u8>, String> {
        match parts.next() {
            None | Some("") => Ok(None),
            Some(v) => match v.parse::<u8>() {
                Ok(n) if n <= max => Ok(Some(n)),
                _ => Err(format!("{what} must be 0-{max}, got {v}")),
            },
        }
    };
    let delay = number("delay", limits::MAX_LIGHT_DELAY)?;
    let brightness = number("brightness", limits::MAX_LIGHT_BRIGHTNESS)?;

    let direction = match parts.next() {
        None | Some("") => None,
        Some(v) => Some(v.parse::<LightDirection>().map_err(|e| e.to_string())?),
    };
    if parts.next().is_some() {
        return Err("expected at most 4 comma-separated fields".into());
    }

    Ok(LightSpec {
        kind,
        delay,
        brightness,
        direction,
    })
}

fn parse_button_assignment(s: &str) -> Result<(KeyIndex, ButtonAction), String> {
    let (key, action) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=ACTION, got \"{s}\""))?;
    let key = key.trim().parse::<KeyIndex>().map_err(|e| e.to_string())?;
    let action = action
        .trim()
        .parse::<ButtonAction>()
        .map_err(|e| e.to_string())?;
    Ok((key, action))
}

fn parse_macro_assignment(s: &str) -> Result<(u8, MacroSeq), String> {
    let (index, seq) = s
        .split_once('=')
        .ok_or_else(|| format!("expected N=SEQUENCE, got \"{s}\""))?;
    let index = index
        .trim()
        .parse::<u8>()
        .ok()
        .filter(|&i| i <= limits::MAX_MACRO)
        .ok_or_else(|| format!("macro index must be 0-{}, got \"{index}\"", limits::MAX_MACRO))?;
    let seq = seq.parse::<MacroSeq>().map_err(|e| e.to_string())?;
    Ok((index, seq))
}
