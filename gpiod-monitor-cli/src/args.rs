use std::path::PathBuf;

use clap::Parser;
use embassy_time::Duration;
use gpiod_monitor::{DebounceConfig, LineId};
use gpiod_monitor_config::MonitorTomlConfig;
use log::LevelFilter;

/// Print debounced activation, release, long hold and pulse events of GPIO lines
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
pub struct Args {
    /// Increase verbosity, repeat for more
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Path to config TOML
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Poll interval in ms (overrides config)
    #[arg(long, value_name = "MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub poll_ms: Option<u64>,

    /// Time a press has to be stable in ms (overrides config)
    #[arg(long, value_name = "MS")]
    pub activation_ms: Option<u64>,

    /// Time a release has to be stable in ms (overrides config)
    #[arg(long, value_name = "MS")]
    pub deactivation_ms: Option<u64>,

    /// Enable pulses with the given period in ms (overrides config)
    #[arg(long, value_name = "MS")]
    pub pulse_ms: Option<u64>,

    /// Report lines held for this many seconds, repeatable
    #[arg(long, value_name = "SECS")]
    pub long_hold: Vec<f64>,

    /// Chip number, name or device path
    #[arg(value_name = "CHIP")]
    pub chip: String,

    /// Line offsets to monitor
    #[arg(value_name = "LINE", required = true, num_args = 1..)]
    pub lines: Vec<LineId>,
}

impl Args {
    pub fn log_level(&self) -> LevelFilter {
        match self.verbose {
            0 => LevelFilter::Error,
            1 => LevelFilter::Warn,
            2 => LevelFilter::Info,
            3 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    }

    /// Timing of the engine: config file values overridden by the flags that were given
    pub fn debounce_config(&self, file: &MonitorTomlConfig) -> DebounceConfig {
        let mut config = file.debounce_config();
        if let Some(ms) = self.poll_ms {
            config.poll_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.activation_ms {
            config.activation_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.deactivation_ms {
            config.deactivation_interval = Duration::from_millis(ms);
        }
        if let Some(ms) = self.pulse_ms {
            config.pulse.enabled = true;
            config.pulse.period = Duration::from_millis(ms);
        }
        config
    }

    /// Long hold thresholds of `line` in seconds, flags first
    pub fn long_holds(&self, line: LineId, file: &MonitorTomlConfig) -> Vec<f64> {
        let mut holds = self.long_hold.clone();
        if let Some(l) = file.line(line) {
            holds.extend(l.long_hold.iter().copied());
        }
        holds
    }

    /// Pulse periods of `line` in seconds.
    ///
    /// With pulses enabled every line gets the configured period, plus its own periods from the config file.
    pub fn pulses(&self, line: LineId, config: &DebounceConfig, file: &MonitorTomlConfig) -> Vec<f64> {
        if !config.pulse.enabled {
            return Vec::new();
        }
        let mut pulses = vec![config.pulse.period.as_millis() as f64 / 1000.0];
        if let Some(l) = file.line(line) {
            pulses.extend(l.pulse.iter().copied());
        }
        pulses
    }
}
