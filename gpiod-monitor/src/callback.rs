use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::RefCell;
use core::fmt;

use crate::LineId;

/// Something that can be called with the id of the line that produced an event.
///
/// Cloning a `Callback` is cheap and the clones share the same closure, which is what lets
/// a schedule template and its per-episode working copy point at one closure.
#[derive(Clone)]
pub struct Callback(Rc<RefCell<Box<dyn FnMut(LineId)>>>);

impl Callback {
    pub fn new<F>(f: F) -> Self
    where
        F: FnMut(LineId) + 'static,
    {
        Self(Rc::new(RefCell::new(Box::new(f))))
    }

    /// Invoke the callback. Panics raised by the closure are not caught.
    pub fn fire(&self, line: LineId) {
        let mut f = self.0.borrow_mut();
        (&mut **f)(line)
    }
}

impl fmt::Debug for Callback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Callback").finish_non_exhaustive()
    }
}
