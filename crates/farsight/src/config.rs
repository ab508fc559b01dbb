//! Display configuration.
//!
//! Loaded once at startup from a TOML file. A missing file means defaults:
//!
//! ```toml
//! provider = "127.0.0.1:1309"
//! name = "farsight-display"
//! password = ""
//! screen_width = 640
//! screen_height = 480
//! capabilities = ["mouse"]
//! boolean_format = "TrueFalse"
//! ```

use std::fs;
use std::net::SocketAddr;
use std::path::Path;

use anyhow::{bail, Context, Result};
use farsight_shared::protocol::{capabilities, ConnectHeader};
use farsight_shared::{BooleanFormat, ConversionOptions, Rect, DEFAULT_PORT};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Settings of one display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DisplayConfig {
    /// Provider to connect to.
    pub provider: SocketAddr,
    /// Name announced in the connect header.
    pub name: String,
    /// Password presented to the provider. Sent in clear text.
    pub password: String,
    /// Screen width in pixels.
    pub screen_width: u16,
    /// Screen height in pixels.
    pub screen_height: u16,
    /// Capability names: mouse, keyboard, touch, highdpi, tiltable,
    /// resizable, accessibility.
    pub capabilities: Vec<String>,
    /// How booleans bound to text render.
    pub boolean_format: BooleanFormat,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            provider: SocketAddr::from(([127, 0, 0, 1], DEFAULT_PORT)),
            name: "farsight-display".into(),
            password: String::new(),
            screen_width: 640,
            screen_height: 480,
            capabilities: vec!["mouse".into()],
            boolean_format: BooleanFormat::TrueFalse,
        }
    }
}

impl DisplayConfig {
    /// Loads the configuration at `path`, or the defaults if it does not exist.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("No config at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        let content =
            fs::read_to_string(path).with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config =
            Self::from_toml_str(&content).with_context(|| format!("Failed to parse config file {}", path.display()))?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Parses a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Fails on malformed TOML or unknown keys.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).context("Invalid display configuration")?;
        debug!("Config: {config:?}");
        Ok(config)
    }

    /// The capability bitmask for the connect header.
    ///
    /// # Errors
    ///
    /// Fails on a capability name that does not exist.
    pub fn capability_bits(&self) -> Result<u32> {
        let mut bits = 0;
        for name in &self.capabilities {
            let Some(bit) = capabilities::from_name(name) else {
                bail!("Unknown display capability '{name}'");
            };
            bits |= bit;
        }
        Ok(bits)
    }

    /// Builds the header sent at the start of the handshake.
    ///
    /// # Errors
    ///
    /// Fails on unknown capability names.
    pub fn connect_header(&self) -> Result<ConnectHeader> {
        Ok(ConnectHeader::new(
            &self.name,
            &self.password,
            self.capability_bits()?,
            self.screen_width,
            self.screen_height,
        ))
    }

    /// The screen rectangle layouts are computed against.
    #[must_use]
    pub fn screen(&self) -> Rect {
        Rect::new(0, 0, i32::from(self.screen_width), i32::from(self.screen_height))
    }

    /// Conversion options for bound properties.
    #[must_use]
    pub const fn conversion_options(&self) -> ConversionOptions {
        ConversionOptions {
            boolean_format: self.boolean_format,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_when_file_missing() {
        let path = std::env::temp_dir().join("farsight-config-that-does-not-exist.toml");
        let config = DisplayConfig::load(&path).unwrap();
        assert_eq!(config, DisplayConfig::default());
        assert_eq!(config.provider.port(), 1309);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = DisplayConfig::from_toml_str(
            r#"
            name = "kiosk"
            screen_width = 800
            capabilities = ["mouse", "touch"]
            boolean_format = "YesNo"
            "#,
        )
        .unwrap();
        assert_eq!(config.name, "kiosk");
        assert_eq!(config.screen(), Rect::new(0, 0, 800, 480));
        assert_eq!(config.capability_bits().unwrap(), capabilities::MOUSE | capabilities::TOUCH);
        assert_eq!(config.conversion_options().boolean_format, BooleanFormat::YesNo);
    }

    #[test]
    fn test_unknown_key_rejected() {
        assert!(DisplayConfig::from_toml_str("colour = \"red\"").is_err());
    }

    #[test]
    fn test_unknown_capability_rejected() {
        let config = DisplayConfig {
            capabilities: vec!["telepathy".into()],
            ..DisplayConfig::default()
        };
        assert!(config.connect_header().is_err());
    }

    #[test]
    fn test_header_from_config() {
        let config = DisplayConfig {
            name: "lobby".into(),
            password: "secret".into(),
            ..DisplayConfig::default()
        };
        let header = config.connect_header().unwrap();
        assert_eq!(header.name(), "lobby");
        assert_eq!(header.password(), "secret");
    }
}
