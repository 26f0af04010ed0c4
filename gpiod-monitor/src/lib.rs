//! Debounced event emitter for digital input lines.
//!
//! Raw samples are read once per poll tick from a [`LineBackend`], filtered by a
//! per-line [`LineDebouncer`] and turned into activation, deactivation, long-hold
//! and pulse callbacks. The [`Engine`] owns every debouncer and drives the poll loop.
#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub mod backend;
pub mod callback;
pub mod config;
pub mod debounce;
pub mod engine;
pub mod error;
pub mod schedule;

pub use backend::{Bias, LineBackend, LineSettings, Polarity};
pub use callback::Callback;
pub use config::{DebounceConfig, PulseConfig};
pub use debounce::{DebounceState, LineDebouncer};
pub use engine::{Engine, Session};
pub use error::{MonitorError, MonitorResult};
pub use schedule::TimedCallbackSet;

/// Identifier of a line on a chip, the line "offset" in gpiod terms.
pub type LineId = u32;

/// Convert seconds into the millisecond unit used by the schedules.
///
/// Rounds to the nearest millisecond, negative and NaN values clamp to 0.
pub fn seconds_to_millis(seconds: f64) -> u64 {
    // Float to int casts saturate, so negative values and NaN end up as 0
    (seconds * 1000.0 + 0.5) as u64
}
