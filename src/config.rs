//! Persistent settings for the command-line tool
//!
//! Stored as TOML, by default in `~/.config/kb390l/config.toml`. Every key is
//! optional; a missing file gives the defaults.
//!
//! ```toml
//! [transport]
//! write_delay_ms = 20
//! read_timeout_ms = 3000
//!
//! [events]
//! poll_interval_ms = 10
//! read_timeout_ms = 20
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use kb390l_transport::protocol::{device, timing};
use kb390l_transport::{DeviceIds, TransportConfig};
use serde::{Deserialize, Serialize};

/// Event loop tunables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// How often the event endpoint is drained
    pub poll_interval_ms: u64,
    /// Per-read timeout while draining
    pub read_timeout_ms: u64,
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: timing::EVENT_POLL_INTERVAL_MS,
            read_timeout_ms: timing::EVENT_READ_TIMEOUT_MS,
        }
    }
}

impl EventsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }

    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_timeout_ms)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub transport: TransportConfig,
    pub events: EventsConfig,
}

impl Config {
    /// `$XDG_CONFIG_HOME/kb390l/config.toml`
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("kb390l")
            .join("config.toml")
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config: Config = toml::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Identifiers of the control endpoint, with any configured interface fallback
    pub fn control_ids(&self) -> DeviceIds {
        device::CONTROL.with_interface(self.transport.control_interface)
    }

    /// Identifiers of the event endpoint, with any configured interface fallback
    pub fn event_ids(&self) -> DeviceIds {
        device::EVENTS.with_interface(self.transport.event_interface)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.transport.write_delay_ms, 20);
        assert_eq!(config.transport.read_timeout_ms, 3000);
        assert_eq!(config.events.poll_interval(), Duration::from_millis(10));
        assert_eq!(config.events.read_timeout(), Duration::from_millis(20));
    }

    #[test]
    fn test_partial_sections() {
        let config: Config = toml::from_str(
            r#"
            [transport]
            write_delay_ms = 5
            control_interface = 1

            [events]
            read_timeout_ms = 50
            "#,
        )
        .unwrap();

        assert_eq!(config.transport.write_delay_ms, 5);
        assert_eq!(config.transport.read_timeout_ms, 3000);
        assert_eq!(config.transport.input_report_len, 64);
        assert_eq!(config.events.poll_interval_ms, 10);
        assert_eq!(config.events.read_timeout_ms, 50);

        assert_eq!(config.control_ids().interface, Some(1));
        assert_eq!(config.event_ids().interface, None);
        assert_eq!(config.control_ids().usage_page, device::CONTROL_USAGE_PAGE);
    }

    #[test]
    fn test_roundtrip() {
        let mut config = Config::default();
        config.transport.event_interface = Some(2);
        config.events.poll_interval_ms = 25;

        let text = toml::to_string_pretty(&config).unwrap();
        let parsed: Config = toml::from_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_unknown_type_is_rejected() {
        assert!(toml::from_str::<Config>("[events]\npoll_interval_ms = \"fast\"").is_err());
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let path = std::env::temp_dir().join("kb390l-no-such-dir/config.toml");
        assert_eq!(Config::load(&path).unwrap(), Config::default());
    }
}
