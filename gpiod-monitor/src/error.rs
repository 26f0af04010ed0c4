use alloc::string::String;

use crate::LineId;

/// Errors surfaced by the engine and its line backends. None of them is retried.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonitorError {
    /// The backend cannot open the chip
    #[error("gpio chip `{chip}` is unavailable")]
    ChipUnavailable { chip: String },
    /// The line was not requested or cannot be read
    #[error("line {line} is unavailable")]
    LineUnavailable { line: LineId },
    /// Lines were polled without an acquired line group
    #[error("line group is not acquired")]
    NotAcquired,
}

pub type MonitorResult<T> = Result<T, MonitorError>;
