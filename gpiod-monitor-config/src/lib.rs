//! Config file of `gpiod-monitor`.
//!
//! ```toml
//! [debounce]
//! poll_interval = 5
//! activation_interval = 10
//! deactivation_interval = 100
//!
//! [pulse]
//! enabled = true
//! period = 500
//!
//! [[line]]
//! line = 17
//! long_hold = [3.0]
//! pulse = [0.25]
//! ```
//!
//! Intervals and periods are in milliseconds, per-line `long_hold` and `pulse` entries in seconds.

use std::path::Path;

use embassy_time::Duration;
use gpiod_monitor::{DebounceConfig, LineId, PulseConfig};
use log::debug;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;

mod error;

pub use error::{ConfigError, ConfigResult};

/// Configurations of the whole monitor
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct MonitorTomlConfig {
    /// Debounce timing
    #[serde(default)]
    pub debounce: DebounceTomlConfig,
    /// Pulse events
    #[serde(default)]
    pub pulse: PulseTomlConfig,
    /// Extra events of single lines
    #[serde(default, rename = "line")]
    pub lines: Vec<LineTomlConfig>,
}

/// Debounce timing in ms
#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct DebounceTomlConfig {
    /// Time between two polls
    #[serde_inline_default(5)]
    pub poll_interval: u64,
    /// How long a press has to be stable
    #[serde_inline_default(10)]
    pub activation_interval: u64,
    /// How long a release has to be stable
    #[serde_inline_default(100)]
    pub deactivation_interval: u64,
}

impl Default for DebounceTomlConfig {
    fn default() -> Self {
        Self {
            poll_interval: 5,
            activation_interval: 10,
            deactivation_interval: 100,
        }
    }
}

#[serde_inline_default]
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct PulseTomlConfig {
    #[serde_inline_default(false)]
    pub enabled: bool,
    /// Pulse period in ms
    #[serde_inline_default(500)]
    pub period: u64,
}

impl Default for PulseTomlConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: 500,
        }
    }
}

/// Long hold and pulse registrations of one line
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct LineTomlConfig {
    pub line: LineId,
    /// Hold durations in seconds
    #[serde(default)]
    pub long_hold: Vec<f64>,
    /// Pulse periods in seconds
    #[serde(default)]
    pub pulse: Vec<f64>,
}

impl MonitorTomlConfig {
    /// Read and validate a config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        let config = Self::from_toml_str(&content).map_err(|e| match e {
            ConfigError::TomlParse { message, .. } => ConfigError::TomlParse {
                path: path.display().to_string(),
                message,
            },
            e => e,
        })?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    /// Parse and validate a config string
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::TomlParse {
            path: "<string>".to_string(),
            message: e.message().to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> ConfigResult<()> {
        if self.debounce.poll_interval == 0 {
            return Err(ConfigError::InvalidValue {
                field: "debounce.poll_interval".to_string(),
                value: "0".to_string(),
                expected: "a poll interval of at least 1ms".to_string(),
            });
        }
        for line in self.lines.iter() {
            for (field, values) in [("long_hold", &line.long_hold), ("pulse", &line.pulse)] {
                if let Some(bad) = values.iter().find(|v| !v.is_finite() || **v < 0.0) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("line.{}.{}", line.line, field),
                        value: bad.to_string(),
                        expected: "a non-negative number of seconds".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// The timing configuration of the engine
    pub fn debounce_config(&self) -> DebounceConfig {
        DebounceConfig {
            poll_interval: Duration::from_millis(self.debounce.poll_interval),
            activation_interval: Duration::from_millis(self.debounce.activation_interval),
            deactivation_interval: Duration::from_millis(self.debounce.deactivation_interval),
            pulse: PulseConfig {
                enabled: self.pulse.enabled,
                period: Duration::from_millis(self.pulse.period),
            },
        }
    }

    /// Extra registrations of `line`, if any
    pub fn line(&self, line: LineId) -> Option<&LineTomlConfig> {
        self.lines.iter().find(|l| l.line == line)
    }
}
