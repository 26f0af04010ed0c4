#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use embedded_hal_async::delay::DelayNs;
use gpiod_monitor::{Callback, LineBackend, LineId, LineSettings, MonitorError, MonitorResult};

// Init logger for tests
#[ctor::ctor]
pub fn init_log() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Debug)
        .is_test(true)
        .try_init();
}

pub const CHIP: &str = "gpiochip0";

/// In-memory backend replaying scripted samples per line.
///
/// Once a line's script is exhausted its last sample repeats.
#[derive(Debug, Default)]
pub struct ScriptedBackend {
    scripts: BTreeMap<LineId, VecDeque<bool>>,
    last: BTreeMap<LineId, bool>,
    /// Lines that fail on read
    pub broken: Vec<LineId>,
    pub opens: usize,
    pub closes: usize,
    pub requested: Vec<LineId>,
    pub settings: Option<LineSettings>,
    /// Every read in order
    pub reads: Vec<LineId>,
}

#[derive(Debug)]
pub struct ScriptedHandle {
    open: bool,
}

impl ScriptedBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(mut self, line: LineId, samples: &[bool]) -> Self {
        self.scripts.entry(line).or_default().extend(samples.iter().copied());
        self
    }

    pub fn push(&mut self, line: LineId, samples: &[bool]) {
        self.scripts.entry(line).or_default().extend(samples.iter().copied());
    }
}

impl LineBackend for ScriptedBackend {
    type Handle = ScriptedHandle;

    fn open(&mut self, chip: &str) -> MonitorResult<ScriptedHandle> {
        if chip != CHIP {
            return Err(MonitorError::ChipUnavailable { chip: chip.to_string() });
        }
        self.opens += 1;
        Ok(ScriptedHandle { open: true })
    }

    fn request_lines(
        &mut self,
        _handle: &mut ScriptedHandle,
        lines: &[LineId],
        settings: LineSettings,
    ) -> MonitorResult<()> {
        if let Some(line) = lines.iter().find(|l| !self.scripts.contains_key(*l)) {
            return Err(MonitorError::LineUnavailable { line: *line });
        }
        self.requested = lines.to_vec();
        self.settings = Some(settings);
        Ok(())
    }

    fn read(&mut self, handle: &mut ScriptedHandle, line: LineId) -> MonitorResult<bool> {
        if !handle.open || !self.requested.contains(&line) || self.broken.contains(&line) {
            return Err(MonitorError::LineUnavailable { line });
        }
        self.reads.push(line);
        let sample = match self.scripts.get_mut(&line).and_then(|s| s.pop_front()) {
            Some(sample) => sample,
            None => self.last.get(&line).copied().unwrap_or(false),
        };
        self.last.insert(line, sample);
        Ok(sample)
    }

    fn close(&mut self, handle: &mut ScriptedHandle) {
        if handle.open {
            handle.open = false;
            self.closes += 1;
        }
    }
}

/// Events recorded by [`recorder`] callbacks
pub type Events = Rc<RefCell<Vec<(String, LineId)>>>;

pub fn recorder(events: &Events, name: &str) -> Callback {
    let events = events.clone();
    let name = name.to_string();
    Callback::new(move |line| events.borrow_mut().push((name.clone(), line)))
}

pub fn names(events: &Events) -> Vec<String> {
    events.borrow().iter().map(|(name, _)| name.clone()).collect()
}

/// Delay that returns immediately for `limit` sleeps, then never again.
///
/// `stalled` is set once the limit is reached so the test can cancel the loop.
pub struct CountingDelay {
    pub sleeps: usize,
    pub slept_ms: u64,
    limit: usize,
    pub stalled: Rc<Cell<bool>>,
}

impl CountingDelay {
    pub fn new(limit: usize) -> Self {
        Self {
            sleeps: 0,
            slept_ms: 0,
            limit,
            stalled: Rc::new(Cell::new(false)),
        }
    }
}

impl DelayNs for CountingDelay {
    async fn delay_ns(&mut self, ns: u32) {
        if self.sleeps >= self.limit {
            self.stalled.set(true);
            core::future::pending::<()>().await;
        }
        self.sleeps += 1;
        self.slept_ms += u64::from(ns) / 1_000_000;
    }

    async fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms.saturating_mul(1_000_000)).await
    }
}

/// Resolves once `flag` is set
pub async fn wait_for(flag: Rc<Cell<bool>>) {
    core::future::poll_fn(|_| {
        if flag.get() {
            core::task::Poll::Ready(())
        } else {
            core::task::Poll::Pending
        }
    })
    .await
}
