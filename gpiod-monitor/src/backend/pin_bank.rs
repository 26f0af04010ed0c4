use alloc::string::{String, ToString};
use alloc::vec::Vec;

use embedded_hal::digital::InputPin;
use log::{debug, warn};

use super::{LineBackend, LineSettings, Polarity};
use crate::LineId;
use crate::error::{MonitorError, MonitorResult};

/// A named bank of input pins, addressed by line id.
///
/// Pins are expected to be configured (direction and bias) by whoever constructs them, the bank
/// only applies the requested polarity when reading.
pub struct PinBank<In: InputPin> {
    label: String,
    pins: Vec<(LineId, In)>,
}

/// Handle of an opened [`PinBank`]
#[derive(Debug, Default)]
pub struct PinBankHandle {
    requested: Vec<LineId>,
    polarity: Polarity,
    closed: bool,
}

impl PinBankHandle {
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl<In: InputPin> PinBank<In> {
    /// Create an empty bank that answers to `label` when opened
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            pins: Vec::new(),
        }
    }

    /// Add a pin as `line`, replacing a previous pin with the same line id
    pub fn with_pin(mut self, line: LineId, pin: In) -> Self {
        self.add_pin(line, pin);
        self
    }

    pub fn add_pin(&mut self, line: LineId, pin: In) {
        if let Some(slot) = self.pins.iter_mut().find(|(id, _)| *id == line) {
            slot.1 = pin;
        } else {
            self.pins.push((line, pin));
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Mutable access to the pin of `line`
    pub fn pin_mut(&mut self, line: LineId) -> Option<&mut In> {
        self.pins.iter_mut().find(|(id, _)| *id == line).map(|(_, pin)| pin)
    }

    pub fn pins_mut(&mut self) -> impl Iterator<Item = (LineId, &mut In)> + '_ {
        self.pins.iter_mut().map(|(id, pin)| (*id, pin))
    }

    /// Hand back all pins
    pub fn into_pins(self) -> Vec<(LineId, In)> {
        self.pins
    }
}

impl<In: InputPin> LineBackend for PinBank<In> {
    type Handle = PinBankHandle;

    fn open(&mut self, chip: &str) -> MonitorResult<PinBankHandle> {
        if chip != self.label {
            return Err(MonitorError::ChipUnavailable { chip: chip.to_string() });
        }
        debug!("Opened pin bank {}", self.label);
        Ok(PinBankHandle::default())
    }

    fn request_lines(
        &mut self,
        handle: &mut PinBankHandle,
        lines: &[LineId],
        settings: LineSettings,
    ) -> MonitorResult<()> {
        if let Some(missing) = lines.iter().find(|l| self.pins.iter().all(|(id, _)| id != *l)) {
            return Err(MonitorError::LineUnavailable { line: *missing });
        }
        handle.requested = lines.to_vec();
        handle.polarity = settings.polarity;
        handle.closed = false;
        Ok(())
    }

    fn read(&mut self, handle: &mut PinBankHandle, line: LineId) -> MonitorResult<bool> {
        if handle.closed || !handle.requested.contains(&line) {
            return Err(MonitorError::LineUnavailable { line });
        }
        let pin = self.pin_mut(line).ok_or(MonitorError::LineUnavailable { line })?;
        match pin.is_high() {
            Ok(high) => Ok(handle.polarity.is_active(high)),
            Err(e) => {
                warn!("Reading line {} failed: {:?}", line, e);
                Err(MonitorError::LineUnavailable { line })
            }
        }
    }

    fn close(&mut self, handle: &mut PinBankHandle) {
        if !handle.closed {
            debug!("Closed pin bank {}", self.label);
        }
        handle.requested.clear();
        handle.closed = true;
    }
}
