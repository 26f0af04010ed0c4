use alloc::vec::Vec;

use log::{debug, trace};

use crate::LineId;
use crate::callback::Callback;
use crate::config::DebounceConfig;
use crate::schedule::TimedCallbackSet;

/// Debounce state
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DebounceState {
    /// A transition has been accepted in this tick
    Debounced,
    /// The raw sample disagrees with the stable state, the countdown is running
    InProgress,
    /// The raw sample agrees with the stable state
    Ignored,
}

/// Debouncer of a single line.
///
/// A raw sample that differs from the accepted state starts a countdown, every following tick with
/// the same sample decreases the countdown by the poll interval. Once the countdown is used up the
/// new state is accepted. Seeing the accepted state again in between resets the countdown.
///
/// ```text
/// poll = 5ms, activation = 15ms, deactivation = 100ms
///
/// Time [ms]:  0  5 10 15 20 25  30  35
/// Sample:     0  1  1  0  1  1   1   1
/// Countdown: 15 10  5 15 10  5 100 100
///                              ^ countdown used up, accepted as active
/// ```
///
/// While the line is active, the hold duration grows by the poll interval on every agreeing tick
/// and drives the long hold (one-shot) and pulse (recurring) schedules.
#[derive(Debug)]
pub struct LineDebouncer {
    id: LineId,
    /// The accepted state
    stable_active: bool,
    /// Remaining confirmation time in ms
    countdown: u64,
    /// Time since the current activation episode started, in ms
    hold_duration: u64,
    on_activated: Vec<Callback>,
    on_deactivated: Vec<Callback>,
    long_hold_templates: TimedCallbackSet,
    pulse_templates: TimedCallbackSet,
    long_hold_live: TimedCallbackSet,
    pulse_live: TimedCallbackSet,
}

impl LineDebouncer {
    /// Create a debouncer for an inactive line
    pub fn new(id: LineId, config: &DebounceConfig) -> Self {
        Self {
            id,
            stable_active: false,
            countdown: config.countdown_for(false),
            hold_duration: 0,
            on_activated: Vec::new(),
            on_deactivated: Vec::new(),
            long_hold_templates: TimedCallbackSet::new(),
            pulse_templates: TimedCallbackSet::new(),
            long_hold_live: TimedCallbackSet::new(),
            pulse_live: TimedCallbackSet::new(),
        }
    }

    pub fn on_activated(&mut self, callback: Callback) {
        self.on_activated.push(callback);
    }

    pub fn on_deactivated(&mut self, callback: Callback) {
        self.on_deactivated.push(callback);
    }

    /// Fire `callback` once per activation episode, when the line has been held for `offset_ms`.
    ///
    /// Takes effect from the next activation episode on.
    pub fn register_long_hold(&mut self, callback: Callback, offset_ms: u64) {
        self.long_hold_templates.insert(callback, offset_ms);
    }

    /// Fire `callback` every `period_ms` while the line is held.
    ///
    /// Takes effect from the next activation episode on.
    pub fn register_pulse(&mut self, callback: Callback, period_ms: u64) {
        self.pulse_templates.insert(callback, period_ms);
    }

    /// Feed the raw sample of one poll tick.
    ///
    /// Every callback that becomes due in this tick is invoked before returning.
    pub fn advance(&mut self, raw_active: bool, config: &DebounceConfig) -> DebounceState {
        if raw_active == self.stable_active {
            // The signal still agrees with the accepted state
            self.countdown = config.countdown_for(self.stable_active);
            if self.stable_active {
                self.hold(config);
            }
            return DebounceState::Ignored;
        }

        self.countdown = self.countdown.saturating_sub(config.poll_ms());
        trace!("Line {}: countdown {}ms", self.id, self.countdown);
        if self.countdown > 0 {
            return DebounceState::InProgress;
        }

        // Signal is stable, accept the new state
        self.stable_active = raw_active;
        debug!("Line {}: {}", self.id, if raw_active { "activated" } else { "deactivated" });
        let callbacks = if raw_active { &self.on_activated } else { &self.on_deactivated };
        for callback in callbacks {
            callback.fire(self.id);
        }
        self.countdown = config.countdown_for(raw_active);
        if raw_active {
            // A new activation episode starts from the registered schedules
            self.long_hold_live = self.long_hold_templates.snapshot();
            self.pulse_live = self.pulse_templates.snapshot();
            self.hold_duration = 0;
        }
        DebounceState::Debounced
    }

    fn hold(&mut self, config: &DebounceConfig) {
        self.hold_duration = self.hold_duration.saturating_add(config.poll_ms());
        self.long_hold_live.fire_once(self.hold_duration, self.id);
        if config.pulse.enabled {
            self.pulse_live.fire_recurring(self.hold_duration, self.id);
        }
    }

    pub fn id(&self) -> LineId {
        self.id
    }

    /// The accepted state of the line
    pub fn is_active(&self) -> bool {
        self.stable_active
    }

    pub fn countdown_ms(&self) -> u64 {
        self.countdown
    }

    /// Time the line has been held in the current activation episode, 0 while inactive
    pub fn hold_duration_ms(&self) -> u64 {
        if self.stable_active { self.hold_duration } else { 0 }
    }

    /// Offsets of the long hold callbacks still pending in the current episode
    pub fn long_hold_offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.long_hold_live.offsets()
    }

    /// Next due offsets of the pulse callbacks in the current episode
    pub fn pulse_offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.pulse_live.offsets()
    }
}
