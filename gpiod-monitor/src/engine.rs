use alloc::collections::BTreeMap;
use alloc::string::String;
use alloc::vec::Vec;
use core::ops::{Deref, DerefMut};

use embedded_hal_async::delay::DelayNs;
use log::{debug, info, warn};

use crate::backend::{LineBackend, LineSettings};
use crate::callback::Callback;
use crate::config::DebounceConfig;
use crate::debounce::LineDebouncer;
use crate::error::{MonitorError, MonitorResult};
use crate::{LineId, seconds_to_millis};

/// Debounces every registered line of one chip.
///
/// The engine owns the per-line state, the shared timing configuration and the line backend.
/// Lines are registered lazily by any of the `register*` methods, polling them requires an
/// acquired line group, see [`Engine::acquire`].
pub struct Engine<B: LineBackend> {
    chip: String,
    config: DebounceConfig,
    settings: LineSettings,
    backend: B,
    lines: BTreeMap<LineId, LineDebouncer>,
    handle: Option<B::Handle>,
}

impl<B: LineBackend> Engine<B> {
    pub fn new(chip: impl Into<String>, config: DebounceConfig, backend: B) -> Self {
        let chip = chip.into();
        debug!("Creating monitor on chip {}: {:?}", chip, config);
        config.check();
        Self {
            chip,
            config,
            settings: LineSettings::default(),
            backend,
            lines: BTreeMap::new(),
            handle: None,
        }
    }

    /// Override how lines are requested, pull-up and active-low by default
    pub fn with_line_settings(mut self, settings: LineSettings) -> Self {
        self.settings = settings;
        self
    }

    fn line_entry(&mut self, line: LineId) -> &mut LineDebouncer {
        let config = &self.config;
        self.lines.entry(line).or_insert_with(|| {
            debug!("Registering new line {}", line);
            LineDebouncer::new(line, config)
        })
    }

    /// Register a line, with optional activation and deactivation callbacks.
    ///
    /// Call it as often as needed to add more callbacks, they fire in registration order.
    pub fn register(&mut self, line: LineId, on_activated: Option<Callback>, on_deactivated: Option<Callback>) {
        debug!(
            "Line {}: activation callback {}, deactivation callback {}",
            line,
            on_activated.is_some(),
            on_deactivated.is_some()
        );
        let debouncer = self.line_entry(line);
        if let Some(callback) = on_activated {
            debouncer.on_activated(callback);
        }
        if let Some(callback) = on_deactivated {
            debouncer.on_deactivated(callback);
        }
    }

    /// Fire `callback` once per activation episode after `line` was held for `seconds`
    pub fn register_long_hold(&mut self, line: LineId, callback: Callback, seconds: f64) {
        let offset_ms = seconds_to_millis(seconds);
        debug!("Line {}: long hold callback at {}ms", line, offset_ms);
        self.line_entry(line).register_long_hold(callback, offset_ms);
    }

    /// Fire `callback` every `seconds` while `line` is held.
    ///
    /// Pulses only fire when [`PulseConfig::enabled`](crate::PulseConfig::enabled) is set.
    pub fn register_pulse(&mut self, line: LineId, callback: Callback, seconds: f64) {
        let period_ms = seconds_to_millis(seconds);
        if !self.config.pulse.enabled {
            warn!("Line {}: pulse registered while pulses are disabled", line);
        }
        self.config.check_pulse_period(line, period_ms);
        debug!("Line {}: pulse callback every {}ms", line, period_ms);
        self.line_entry(line).register_pulse(callback, period_ms);
    }

    /// Open the chip and request every registered line.
    ///
    /// The returned session releases the line group when dropped, whichever way the caller leaves.
    pub fn acquire(&mut self) -> MonitorResult<Session<'_, B>> {
        self.release();
        let lines = self.line_ids();
        if lines.is_empty() {
            warn!("Acquiring chip {} without any registered line", self.chip);
        }

        let mut handle = self.backend.open(&self.chip)?;
        debug!("Opened chip {}", self.chip);
        if let Err(e) = self.backend.request_lines(&mut handle, &lines, self.settings) {
            self.backend.close(&mut handle);
            return Err(e);
        }
        info!("Acquired lines {:?} on chip {}", lines, self.chip);
        self.handle = Some(handle);
        Ok(Session { engine: self })
    }

    /// Close the line group if it is held
    fn release(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            self.backend.close(&mut handle);
            info!("Released lines on chip {}", self.chip);
        }
    }

    /// Sample every registered line once, in ascending line order, and feed its debouncer.
    ///
    /// Callbacks run synchronously inside this call.
    pub fn tick(&mut self) -> MonitorResult<()> {
        let handle = self.handle.as_mut().ok_or(MonitorError::NotAcquired)?;
        for (id, debouncer) in self.lines.iter_mut() {
            let raw = self.backend.read(handle, *id)?;
            debouncer.advance(raw, &self.config);
        }
        Ok(())
    }

    /// Acquire the line group and poll it forever.
    ///
    /// Sleeps one poll interval before every tick. Only returns on error, cancel it by dropping the
    /// future, the line group is released either way.
    pub async fn run<D: DelayNs>(&mut self, delay: &mut D) -> MonitorResult<()> {
        let poll_ms = u32::try_from(self.config.poll_interval.as_millis()).unwrap_or(u32::MAX);
        let mut session = self.acquire()?;
        info!("Start polling every {}ms", poll_ms);
        loop {
            delay.delay_ms(poll_ms).await;
            session.tick()?;
        }
    }

    pub fn chip(&self) -> &str {
        &self.chip
    }

    pub fn config(&self) -> &DebounceConfig {
        &self.config
    }

    pub fn line(&self, line: LineId) -> Option<&LineDebouncer> {
        self.lines.get(&line)
    }

    /// Registered lines, ascending
    pub fn line_ids(&self) -> Vec<LineId> {
        self.lines.keys().copied().collect()
    }

    pub fn is_acquired(&self) -> bool {
        self.handle.is_some()
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }
}

impl<B: LineBackend> Drop for Engine<B> {
    fn drop(&mut self) {
        self.release();
    }
}

/// An acquired line group, released on drop.
///
/// Dereferences to the [`Engine`] it was acquired from.
pub struct Session<'a, B: LineBackend> {
    engine: &'a mut Engine<B>,
}

impl<B: LineBackend> Deref for Session<'_, B> {
    type Target = Engine<B>;

    fn deref(&self) -> &Self::Target {
        self.engine
    }
}

impl<B: LineBackend> DerefMut for Session<'_, B> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.engine
    }
}

impl<B: LineBackend> Drop for Session<'_, B> {
    fn drop(&mut self) {
        self.engine.release();
    }
}
