//! Bridge configuration, loaded from a TOML file.
//!
//! Every section and key is optional; missing ones take the defaults below.
//!
//! ```toml
//! [serial]
//! port = "/dev/ttyUSB0"
//! baud_rate = 9600
//!
//! [http]
//! bind = "0.0.0.0:8080"
//! static_dir = "data"
//!
//! [diagnostics]
//! interval_ms = 5000
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use log::info;
use serde::{Deserialize, Serialize};
use snafu::{ensure, ResultExt, Snafu};

use crate::bridge::DIAGNOSTIC_INTERVAL;
use crate::types::Millis;

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum Error {
    #[snafu(display("Could not read config file {}: {}", path.display(), source))]
    ReadConfig {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not parse config file {}: {}", path.display(), source))]
    ParseConfig {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[snafu(display("Invalid configuration: {}", reason))]
    InvalidConfig { reason: String },
}

/// The serial link to the sensor controller. Always 8N1, no flow control.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baud_rate: u32,
    /// How long an idle read may block before the loop gets control back.
    pub read_timeout_ms: u64,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            port: "/dev/ttyUSB0".into(),
            baud_rate: 9600,
            read_timeout_ms: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: SocketAddr,
    /// Directory holding `index.html` and `style.css`.
    pub static_dir: PathBuf,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([0, 0, 0, 0], 8080)),
            static_dir: PathBuf::from("data"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    pub interval_ms: Millis,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            interval_ms: DIAGNOSTIC_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    pub serial: SerialConfig,
    pub http: HttpConfig,
    pub diagnostics: DiagnosticsConfig,
}

impl BridgeConfig {
    /// Load and validate a config file.
    /// # Errors
    /// Fails if the file can't be read or parsed, or holds invalid values.
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).context(ReadConfigSnafu { path })?;
        let config = Self::from_toml(&content).context(ParseConfigSnafu { path })?;
        config.validate()?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// # Errors
    /// Returns [`Error::InvalidConfig`] naming the first bad value.
    pub fn validate(&self) -> Result<(), Error> {
        ensure!(
            !self.serial.port.trim().is_empty(),
            InvalidConfigSnafu {
                reason: "serial.port is empty"
            }
        );
        ensure!(
            self.serial.baud_rate > 0,
            InvalidConfigSnafu {
                reason: "serial.baud_rate must be positive"
            }
        );
        ensure!(
            self.serial.read_timeout_ms > 0,
            InvalidConfigSnafu {
                reason: "serial.read_timeout_ms must be positive"
            }
        );
        ensure!(
            self.diagnostics.interval_ms > 0,
            InvalidConfigSnafu {
                reason: "diagnostics.interval_ms must be positive"
            }
        );
        Ok(())
    }
}
