use alloc::vec::Vec;

use log::debug;

use crate::LineId;
use crate::callback::Callback;

/// A callback that is due once a hold duration reaches `offset_ms`.
#[derive(Clone, Debug)]
pub struct TimedCallback {
    /// Hold duration at which the callback fires next
    pub offset_ms: u64,
    /// The offset the callback was registered with, recurring entries advance by this much
    pub period_ms: u64,
    pub callback: Callback,
}

/// Buffer of timed callbacks, always sorted ascending by offset.
///
/// Entries with equal offsets keep their insertion order.
#[derive(Clone, Debug, Default)]
pub struct TimedCallbackSet {
    entries: Vec<TimedCallback>,
}

impl TimedCallbackSet {
    pub fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Insert a callback due at `offset_ms`, keeping the buffer sorted
    pub fn insert(&mut self, callback: Callback, offset_ms: u64) {
        self.push_sorted(TimedCallback {
            offset_ms,
            period_ms: offset_ms,
            callback,
        });
    }

    fn push_sorted(&mut self, entry: TimedCallback) {
        // Insert after every entry with the same offset, same result as a stable sort after push
        let idx = self.entries.partition_point(|e| e.offset_ms <= entry.offset_ms);
        self.entries.insert(idx, entry);
    }

    /// An owned copy that can be consumed without touching `self`.
    ///
    /// The copy starts from the registered offsets and shares the callbacks.
    pub fn snapshot(&self) -> Self {
        Self {
            entries: self
                .entries
                .iter()
                .map(|e| TimedCallback {
                    offset_ms: e.period_ms,
                    period_ms: e.period_ms,
                    callback: e.callback.clone(),
                })
                .collect(),
        }
    }

    /// Fire and remove every entry due at `elapsed_ms`, in ascending offset order.
    ///
    /// Returns the number of fired callbacks.
    pub fn fire_once(&mut self, elapsed_ms: u64, line: LineId) -> usize {
        let due = self.due(elapsed_ms);
        for entry in self.entries.drain(..due) {
            debug!("Line {}: long hold {}ms reached", line, entry.offset_ms);
            entry.callback.fire(line);
        }
        due
    }

    /// Fire the head entry and requeue it one period later, as long as the head is due at `elapsed_ms`.
    ///
    /// An entry fires once for every period it passed, so periods shorter than the gap between two
    /// calls catch up. Entries that cannot advance (period 0) fire once per call.
    /// Returns the number of fired callbacks.
    pub fn fire_recurring(&mut self, elapsed_ms: u64, line: LineId) -> usize {
        let mut fired = 0;
        let mut stuck = Vec::new();
        while self.next_offset().is_some_and(|offset| offset <= elapsed_ms) {
            let mut entry = self.entries.remove(0);
            entry.callback.fire(line);
            fired += 1;
            let next = entry.offset_ms.saturating_add(entry.period_ms);
            if next == entry.offset_ms {
                stuck.push(entry);
            } else {
                entry.offset_ms = next;
                self.push_sorted(entry);
            }
        }
        for entry in stuck {
            self.push_sorted(entry);
        }
        fired
    }

    /// Number of leading entries with `offset_ms <= elapsed_ms`
    fn due(&self, elapsed_ms: u64) -> usize {
        // The buffer is sorted, so the due entries are always a prefix
        self.entries.partition_point(|e| e.offset_ms <= elapsed_ms)
    }

    /// Offset of the next entry to fire
    pub fn next_offset(&self) -> Option<u64> {
        self.entries.first().map(|e| e.offset_ms)
    }

    pub fn offsets(&self) -> impl Iterator<Item = u64> + '_ {
        self.entries.iter().map(|e| e.offset_ms)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use alloc::rc::Rc;
    use core::cell::RefCell;

    use super::*;

    fn recorder() -> (Rc<RefCell<Vec<&'static str>>>, impl Fn(&'static str) -> Callback) {
        let log = Rc::new(RefCell::new(Vec::new()));
        let sink = log.clone();
        let make = move |name: &'static str| {
            let sink = sink.clone();
            Callback::new(move |_| sink.borrow_mut().push(name))
        };
        (log, make)
    }

    #[test]
    fn test_insert_keeps_sorted_and_stable() {
        let (log, cb) = recorder();
        let mut set = TimedCallbackSet::new();
        set.insert(cb("c"), 300);
        set.insert(cb("a"), 100);
        set.insert(cb("b1"), 200);
        set.insert(cb("b2"), 200);

        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![100, 200, 200, 300]);

        assert_eq!(set.fire_once(200, 1), 3);
        assert_eq!(*log.borrow(), vec!["a", "b1", "b2"]);
        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![300]);
    }

    #[test]
    fn test_fire_once_stops_at_first_future_entry() {
        let (log, cb) = recorder();
        let mut set = TimedCallbackSet::new();
        set.insert(cb("a"), 10);
        set.insert(cb("b"), 20);

        assert_eq!(set.fire_once(5, 1), 0);
        assert_eq!(set.fire_once(10, 1), 1);
        assert_eq!(set.fire_once(15, 1), 0);
        assert_eq!(set.fire_once(25, 1), 1);
        assert!(set.is_empty());
        assert_eq!(*log.borrow(), vec!["a", "b"]);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let (log, cb) = recorder();
        let mut template = TimedCallbackSet::new();
        template.insert(cb("a"), 10);

        let mut live = template.snapshot();
        live.fire_once(10, 1);
        assert!(live.is_empty());
        assert_eq!(template.len(), 1);

        // The snapshot shares the callback with the template
        template.snapshot().fire_once(10, 1);
        assert_eq!(*log.borrow(), vec!["a", "a"]);
    }

    #[test]
    fn test_recurring_requeue_restores_order() {
        let (log, cb) = recorder();
        let mut set = TimedCallbackSet::new();
        set.insert(cb("fast"), 10);
        set.insert(cb("slow"), 25);

        assert_eq!(set.fire_recurring(10, 1), 1);
        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![20, 25]);
        assert_eq!(set.fire_recurring(20, 1), 1);
        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![25, 30]);
        assert_eq!(set.fire_recurring(25, 1), 1);
        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![30, 50]);
        assert_eq!(*log.borrow(), vec!["fast", "fast", "slow"]);
    }

    #[test]
    fn test_recurring_snapshot_starts_from_period() {
        let (_log, cb) = recorder();
        let mut template = TimedCallbackSet::new();
        template.insert(cb("p"), 50);

        let mut live = template.snapshot();
        live.fire_recurring(50, 1);
        live.fire_recurring(100, 1);
        assert_eq!(live.next_offset(), Some(150));
        assert_eq!(template.snapshot().next_offset(), Some(50));
    }

    #[test]
    fn test_recurring_catches_up_within_one_call() {
        let (log, cb) = recorder();
        let mut set = TimedCallbackSet::new();
        set.insert(cb("fast"), 2);
        set.insert(cb("slow"), 7);

        // 2, 4, 6, 7, 8, 10
        assert_eq!(set.fire_recurring(10, 1), 6);
        assert_eq!(*log.borrow(), vec!["fast", "fast", "fast", "slow", "fast", "fast"]);
        assert_eq!(set.offsets().collect::<Vec<_>>(), vec![12, 14]);
    }

    #[test]
    fn test_zero_period_fires_once_per_call() {
        let (log, cb) = recorder();
        let mut set = TimedCallbackSet::new();
        set.insert(cb("z"), 0);

        assert_eq!(set.fire_recurring(5, 1), 1);
        assert_eq!(set.fire_recurring(10, 1), 1);
        assert_eq!(log.borrow().len(), 2);
    }
}
