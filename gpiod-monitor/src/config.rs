use embassy_time::Duration;
use log::warn;

use crate::LineId;

/// Timing configuration shared by every line of one [`Engine`](crate::Engine).
///
/// All intervals are consumed with millisecond resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DebounceConfig {
    /// Time between two consecutive poll ticks
    pub poll_interval: Duration,
    /// How long an active raw signal has to persist before the line is accepted as active
    pub activation_interval: Duration,
    /// How long an inactive raw signal has to persist before the line is accepted as inactive
    pub deactivation_interval: Duration,
    /// Recurring pulse events while a line is held active
    pub pulse: PulseConfig,
}

impl Default for DebounceConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(5),
            activation_interval: Duration::from_millis(10),
            deactivation_interval: Duration::from_millis(100),
            pulse: PulseConfig::default(),
        }
    }
}

impl DebounceConfig {
    pub(crate) fn poll_ms(&self) -> u64 {
        self.poll_interval.as_millis()
    }

    /// Countdown a line starts with when its stable state is `active`.
    pub(crate) fn countdown_for(&self, active: bool) -> u64 {
        if active {
            self.deactivation_interval.as_millis()
        } else {
            self.activation_interval.as_millis()
        }
    }

    /// Number of consecutive disagreeing ticks needed to flip a line out of `active`.
    pub fn ticks_to_confirm(&self, active: bool) -> u64 {
        let poll = self.poll_ms().max(1);
        self.countdown_for(active).div_ceil(poll).max(1)
    }

    /// Log everything that makes the timing behave unexpectedly.
    pub(crate) fn check(&self) {
        let poll = self.poll_ms();
        if poll == 0 {
            warn!("Poll interval is 0ms, debounce countdowns will never expire");
            return;
        }
        for (name, interval) in [
            ("activation", self.activation_interval),
            ("deactivation", self.deactivation_interval),
        ] {
            if interval.as_millis() % poll != 0 {
                warn!(
                    "{} interval {}ms is not a multiple of the poll interval {}ms, rounding up to {}ms",
                    name,
                    interval.as_millis(),
                    poll,
                    interval.as_millis().div_ceil(poll) * poll
                );
            }
        }
    }

    /// Warn about a pulse period that fires several times within one poll tick.
    ///
    /// Returns `false` if the period is shorter than the poll interval.
    pub(crate) fn check_pulse_period(&self, line: LineId, period_ms: u64) -> bool {
        let poll = self.poll_ms();
        if period_ms < poll {
            warn!(
                "Line {}: pulse period {}ms is shorter than the poll interval {}ms, pulses will bunch up",
                line, period_ms, poll
            );
            return false;
        }
        true
    }
}

/// Config for pulse events
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PulseConfig {
    /// Fire registered pulse callbacks
    pub enabled: bool,
    /// Default pulse period
    pub period: Duration,
}

impl Default for PulseConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            period: Duration::from_millis(500),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ticks_to_confirm() {
        let config = DebounceConfig::default();
        assert_eq!(config.ticks_to_confirm(false), 2);
        assert_eq!(config.ticks_to_confirm(true), 20);

        let config = DebounceConfig {
            activation_interval: Duration::from_millis(12),
            ..DebounceConfig::default()
        };
        assert_eq!(config.ticks_to_confirm(false), 3);
    }

    #[test]
    fn test_zero_interval_still_needs_one_tick() {
        let config = DebounceConfig {
            activation_interval: Duration::from_millis(0),
            ..DebounceConfig::default()
        };
        assert_eq!(config.ticks_to_confirm(false), 1);
    }

    #[test]
    fn test_check_pulse_period() {
        let config = DebounceConfig::default();
        assert!(config.check_pulse_period(1, 5));
        assert!(config.check_pulse_period(1, 7));
        assert!(!config.check_pulse_period(1, 2));
        assert!(!config.check_pulse_period(1, 0));
    }
}
