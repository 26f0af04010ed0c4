//! Linux GPIO character device backend

use std::path::{Path, PathBuf};

use gpiocdev::Request;
use gpiocdev::chip::Chip;
use gpiocdev::line::{Bias as CdevBias, Value};
use gpiod_monitor::{Bias, LineBackend, LineId, LineSettings, MonitorError, MonitorResult, Polarity};
use log::{debug, warn};

/// Map a chip identifier to its device path.
///
/// A bare number `N` is `/dev/gpiochipN`, absolute paths are kept, any other name is looked up in `/dev`.
pub fn chip_path(chip: &str) -> PathBuf {
    if !chip.is_empty() && chip.bytes().all(|b| b.is_ascii_digit()) {
        PathBuf::from(format!("/dev/gpiochip{}", chip))
    } else if Path::new(chip).is_absolute() {
        PathBuf::from(chip)
    } else {
        Path::new("/dev").join(chip)
    }
}

/// First of `lines` that does not exist on the chip or is already used by another consumer
fn unavailable_line(path: &Path, lines: &[LineId]) -> Option<LineId> {
    let chip = Chip::from_path(path).ok()?;
    lines
        .iter()
        .copied()
        .find(|&line| chip.line_info(line).map_or(true, |info| info.used))
}

#[derive(Debug, Default)]
pub struct CdevBackend;

#[derive(Debug)]
pub struct CdevHandle {
    path: PathBuf,
    request: Option<Request>,
}

impl LineBackend for CdevBackend {
    type Handle = CdevHandle;

    fn open(&mut self, chip: &str) -> MonitorResult<CdevHandle> {
        let path = chip_path(chip);
        match Chip::from_path(&path) {
            Ok(c) => {
                if let Ok(info) = c.info() {
                    debug!("Chip {}: {} lines, label {}", path.display(), info.num_lines, info.label);
                }
                Ok(CdevHandle { path, request: None })
            }
            Err(e) => {
                warn!("Failed to open {}: {}", path.display(), e);
                Err(MonitorError::ChipUnavailable { chip: chip.to_string() })
            }
        }
    }

    fn request_lines(
        &mut self,
        handle: &mut CdevHandle,
        lines: &[LineId],
        settings: LineSettings,
    ) -> MonitorResult<()> {
        if lines.is_empty() {
            debug!("No lines to request on {}", handle.path.display());
            return Ok(());
        }
        let mut builder = Request::builder();
        builder
            .on_chip(&handle.path)
            .with_consumer(settings.consumer)
            .with_lines(lines)
            .as_input()
            .with_bias(match settings.bias {
                Bias::PullUp => CdevBias::PullUp,
                Bias::PullDown => CdevBias::PullDown,
                Bias::Disabled => CdevBias::Disabled,
            });
        match settings.polarity {
            Polarity::ActiveLow => builder.as_active_low(),
            Polarity::ActiveHigh => builder.as_active_high(),
        };
        let request = builder.request().map_err(|e| {
            warn!("Failed to request lines {:?} on {}: {}", lines, handle.path.display(), e);
            match unavailable_line(&handle.path, lines) {
                Some(line) => MonitorError::LineUnavailable { line },
                None => MonitorError::ChipUnavailable {
                    chip: handle.path.display().to_string(),
                },
            }
        })?;
        handle.request = Some(request);
        Ok(())
    }

    fn read(&mut self, handle: &mut CdevHandle, line: LineId) -> MonitorResult<bool> {
        let request = handle.request.as_ref().ok_or(MonitorError::LineUnavailable { line })?;
        match request.value(line) {
            Ok(value) => Ok(value == Value::Active),
            Err(e) => {
                warn!("Failed to read line {}: {}", line, e);
                Err(MonitorError::LineUnavailable { line })
            }
        }
    }

    fn close(&mut self, handle: &mut CdevHandle) {
        if handle.request.take().is_some() {
            debug!("Released lines on {}", handle.path.display());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chip_path() {
        assert_eq!(chip_path("0"), PathBuf::from("/dev/gpiochip0"));
        assert_eq!(chip_path("12"), PathBuf::from("/dev/gpiochip12"));
        assert_eq!(chip_path("gpiochip1"), PathBuf::from("/dev/gpiochip1"));
        assert_eq!(chip_path("/dev/gpiochip2"), PathBuf::from("/dev/gpiochip2"));
    }

    #[test]
    fn test_missing_chip_is_unavailable() {
        let mut backend = CdevBackend;
        assert_eq!(
            backend.open("/nonexistent/gpiochip0").err(),
            Some(MonitorError::ChipUnavailable {
                chip: "/nonexistent/gpiochip0".to_string()
            })
        );
    }

    #[test]
    fn test_empty_request_skips_the_kernel() {
        let mut backend = CdevBackend;
        let mut handle = CdevHandle {
            path: PathBuf::from("/nonexistent/gpiochip0"),
            request: None,
        };
        assert_eq!(backend.request_lines(&mut handle, &[], LineSettings::default()), Ok(()));
        assert!(handle.request.is_none());
    }

    #[test]
    fn test_failed_request_without_chip_blames_the_chip() {
        let mut backend = CdevBackend;
        let mut handle = CdevHandle {
            path: PathBuf::from("/nonexistent/gpiochip0"),
            request: None,
        };
        assert_eq!(
            backend.request_lines(&mut handle, &[3, 4], LineSettings::default()),
            Err(MonitorError::ChipUnavailable {
                chip: "/nonexistent/gpiochip0".to_string()
            })
        );
        assert_eq!(unavailable_line(Path::new("/nonexistent/gpiochip0"), &[3, 4]), None);
    }

    #[test]
    fn test_read_before_request_fails() {
        let mut backend = CdevBackend;
        let mut handle = CdevHandle {
            path: chip_path("0"),
            request: None,
        };
        assert_eq!(backend.read(&mut handle, 4), Err(MonitorError::LineUnavailable { line: 4 }));
        backend.close(&mut handle);
    }
}
