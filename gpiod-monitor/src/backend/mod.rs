//! Access to the physical lines.
//!
//! The engine never touches hardware itself, it only talks to a [`LineBackend`].

pub mod pin_bank;

pub use pin_bank::PinBank;

use crate::LineId;
use crate::error::MonitorResult;

/// Pull resistor applied to a requested line
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Bias {
    #[default]
    PullUp,
    PullDown,
    Disabled,
}

/// Which electrical level counts as "active"
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Polarity {
    /// A low level is active, the usual wiring for a button against ground with a pull-up
    #[default]
    ActiveLow,
    ActiveHigh,
}

impl Polarity {
    /// Translate an electrical level into the logical state
    pub fn is_active(self, level_high: bool) -> bool {
        match self {
            Polarity::ActiveLow => !level_high,
            Polarity::ActiveHigh => level_high,
        }
    }
}

/// How the lines are requested from the chip
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LineSettings {
    pub bias: Bias,
    pub polarity: Polarity,
    /// Consumer label shown by the kernel for the requested lines
    pub consumer: &'static str,
}

impl Default for LineSettings {
    fn default() -> Self {
        Self {
            bias: Bias::PullUp,
            polarity: Polarity::ActiveLow,
            consumer: "gpiod-monitor",
        }
    }
}

/// The line I/O collaborator of the engine.
///
/// A handle is opened for a chip, the monitored lines are requested on it once, then read every
/// poll tick and finally closed.
pub trait LineBackend {
    /// An opened chip together with its requested lines
    type Handle;

    /// Open a chip, fails with [`ChipUnavailable`](crate::MonitorError::ChipUnavailable)
    fn open(&mut self, chip: &str) -> MonitorResult<Self::Handle>;

    /// Configure all `lines` as inputs with the given settings, before the first read
    fn request_lines(
        &mut self,
        handle: &mut Self::Handle,
        lines: &[LineId],
        settings: LineSettings,
    ) -> MonitorResult<()>;

    /// Read the logical state of a line, `true` means active.
    ///
    /// Fails with [`LineUnavailable`](crate::MonitorError::LineUnavailable) if the line was not requested.
    fn read(&mut self, handle: &mut Self::Handle, line: LineId) -> MonitorResult<bool>;

    /// Release the handle. Closing twice is a no-op.
    fn close(&mut self, handle: &mut Self::Handle);
}
