use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::responder::Variant;
use crate::serial::interface::{DEFAULT_BAUD_RATE, DEFAULT_QUIET_PERIOD_MS, DEFAULT_RESPONSE_TIMEOUT_MS};
use crate::serial::protocol::DEFAULT_COMMAND_INTERVAL_MS;
use crate::serial::DeviceSettings;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value: {0}")]
    Invalid(String),
}

/// Top-level configuration file.
///
/// ```toml
/// [emulator]
/// port = "/dev/ttyUSB0"
/// variant = "linvor"
///
/// [device]
/// name = "Workbench"
/// pin = "0000"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub emulator: EmulatorConfig,
    /// Settings pushed by the `configure` command.
    pub device: DeviceSettings,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmulatorConfig {
    pub port: Option<String>,
    pub baud_rate: u32,
    pub variant: Variant,
    /// Sleep between polls of an idle line, in microseconds. 0 busy-polls.
    pub idle_sleep_us: u64,
    pub response_timeout_ms: u64,
    pub quiet_period_ms: u64,
    /// Pause between the commands of `configure` on a physical port.
    pub command_interval_ms: u64,
}

impl Default for EmulatorConfig {
    fn default() -> Self {
        Self {
            port: None,
            baud_rate: DEFAULT_BAUD_RATE,
            variant: Variant::default(),
            idle_sleep_us: 1000,
            response_timeout_ms: DEFAULT_RESPONSE_TIMEOUT_MS,
            quiet_period_ms: DEFAULT_QUIET_PERIOD_MS,
            command_interval_ms: DEFAULT_COMMAND_INTERVAL_MS,
        }
    }
}

impl SimConfig {
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Load `path` if given, otherwise fall back to defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.emulator.baud_rate == 0 {
            return Err(ConfigError::Invalid("emulator.baud_rate must be non-zero".to_string()));
        }
        if self.emulator.quiet_period_ms == 0 {
            return Err(ConfigError::Invalid("emulator.quiet_period_ms must be non-zero".to_string()));
        }
        self.device
            .validate()
            .map_err(|e| ConfigError::Invalid(format!("device: {}", e)))
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}
