//! Suspend/resume change propagation.
//!
//! Every mutable collection in the crate embeds a [`Changeable`]: bulk
//! mutation sequences wrapped in `suspend_changes`/`resume_changes` collapse
//! to a single coalesced notification, and a reentrancy guard keeps a
//! `Changed` handler that mutates the same object from recursing without
//! bound. Notifications go to an injected [`ChangeSink`], never to a global.
//!
//! State lives in `Cell`s and all methods take `&self`, so a handler may
//! legally call back into the object that notified it; the guard decides
//! what happens then.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Receiver for coalesced change notifications.
///
/// Hosts hand one of these to each collection they observe. The same sink
/// may be shared (`Rc`) across many collections.
pub trait ChangeSink {
    fn on_changed(&self);
}

/// Sink that drops every notification. Default for collections nobody
/// observes yet.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ChangeSink for NullSink {
    fn on_changed(&self) {}
}

/// Nestable change-coalescing state.
///
/// Invariants: `suspend_level >= 0` is structural (`u32`);
/// `changes_suspended() ⇔ suspend_level > 0`.
pub struct Changeable {
    changed: Cell<bool>,
    ignore_changes: Cell<bool>,
    suspend_level: Cell<u32>,
    sink: RefCell<Rc<dyn ChangeSink>>,
}

impl std::fmt::Debug for Changeable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Changeable")
            .field("changed", &self.changed.get())
            .field("ignore_changes", &self.ignore_changes.get())
            .field("suspend_level", &self.suspend_level.get())
            .finish()
    }
}

impl Default for Changeable {
    fn default() -> Self {
        Self::new(Rc::new(NullSink))
    }
}

impl Changeable {
    pub fn new(sink: Rc<dyn ChangeSink>) -> Self {
        Self {
            changed: Cell::new(false),
            ignore_changes: Cell::new(false),
            suspend_level: Cell::new(0),
            sink: RefCell::new(sink),
        }
    }

    /// Replace the notification sink. Pending/suspension state is kept.
    pub fn set_sink(&self, sink: Rc<dyn ChangeSink>) {
        *self.sink.borrow_mut() = sink;
    }

    /// True while at least one suspend bracket is open.
    pub fn changes_suspended(&self) -> bool {
        self.suspend_level.get() > 0
    }

    /// Current nesting depth, for diagnostics.
    pub fn suspend_level(&self) -> u32 {
        self.suspend_level.get()
    }

    /// True if a change was recorded and not yet delivered.
    pub fn is_changed(&self) -> bool {
        self.changed.get()
    }

    /// Open a suspend bracket. Entering suspension from the active state
    /// clears any stale pending flag; nested calls only increment.
    pub fn suspend_changes(&self) {
        if self.suspend_level.get() == 0 {
            self.changed.set(false);
        }
        self.suspend_level.set(self.suspend_level.get() + 1);
    }

    /// Close one suspend bracket. On unwinding to level 0 with a recorded
    /// change, the coalesced notification fires exactly once. Underflow is
    /// clamped, never signaled.
    pub fn resume_changes(&self) {
        let level = self.suspend_level.get().saturating_sub(1);
        self.suspend_level.set(level);
        if level == 0 && self.changed.get() {
            self.fire();
        }
    }

    /// Record a mutation. While suspended this only sets the pending flag;
    /// while the guard is held (a handler is running) it is dropped.
    pub fn on_changed(&self) {
        if self.ignore_changes.get() {
            // Reentrant notification from inside a Changed handler.
            return;
        }
        if self.suspend_level.get() > 0 {
            self.changed.set(true);
            return;
        }
        self.changed.set(true);
        self.fire();
    }

    fn fire(&self) {
        let sink = self.sink.borrow().clone();
        self.ignore_changes.set(true);
        sink.on_changed();
        self.ignore_changes.set(false);
        self.changed.set(false);
    }

    /// Run `body` inside one suspend/resume bracket.
    ///
    /// The bulk mutators in `filter` and `scheme` use this so a loop over
    /// thousands of features delivers one notification, not thousands.
    pub fn bracket<R>(&self, body: impl FnOnce() -> R) -> R {
        self.suspend_changes();
        let out = body();
        self.resume_changes();
        out
    }

    /// Open a suspend bracket closed by the guard's drop. For mutation
    /// sequences that do not fit a single closure.
    pub fn suspend(&self) -> SuspendGuard<'_> {
        self.suspend_changes();
        SuspendGuard { owner: self }
    }
}

/// Resumes its [`Changeable`] when dropped.
#[must_use = "dropping the guard immediately ends the suspension"]
pub struct SuspendGuard<'a> {
    owner: &'a Changeable,
}

impl Drop for SuspendGuard<'_> {
    fn drop(&mut self) {
        self.owner.resume_changes();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct CountingSink {
        fired: Cell<u32>,
    }

    impl ChangeSink for CountingSink {
        fn on_changed(&self) {
            self.fired.set(self.fired.get() + 1);
        }
    }

    fn counting() -> (Rc<CountingSink>, Changeable) {
        let sink = Rc::new(CountingSink { fired: Cell::new(0) });
        let changeable = Changeable::new(sink.clone());
        (sink, changeable)
    }

    #[test]
    fn test_unsuspended_change_fires_immediately() {
        let (sink, c) = counting();
        c.on_changed();
        c.on_changed();
        assert_eq!(sink.fired.get(), 2);
    }

    #[test]
    fn test_bracket_coalesces_to_one_event() {
        let (sink, c) = counting();
        c.suspend_changes();
        for _ in 0..100 {
            c.on_changed();
        }
        assert_eq!(sink.fired.get(), 0);
        c.resume_changes();
        assert_eq!(sink.fired.get(), 1);
    }

    #[test]
    fn test_empty_bracket_fires_nothing() {
        let (sink, c) = counting();
        c.suspend_changes();
        c.resume_changes();
        assert_eq!(sink.fired.get(), 0);
    }

    #[test]
    fn test_nested_suspension_fires_only_at_outermost_resume() {
        let (sink, c) = counting();
        c.suspend_changes();
        c.suspend_changes();
        c.on_changed();
        c.resume_changes();
        assert_eq!(sink.fired.get(), 0);
        c.resume_changes();
        assert_eq!(sink.fired.get(), 1);
    }

    #[test]
    fn test_resume_underflow_is_clamped() {
        let (sink, c) = counting();
        c.resume_changes();
        c.resume_changes();
        assert_eq!(c.suspend_level(), 0);
        c.on_changed();
        assert_eq!(sink.fired.get(), 1);
    }

    #[test]
    fn test_entering_suspension_clears_stale_pending_flag() {
        let (sink, c) = counting();
        c.suspend_changes();
        c.on_changed();
        assert!(c.is_changed());
        c.resume_changes();
        assert_eq!(sink.fired.get(), 1);

        c.suspend_changes();
        assert!(!c.is_changed());
        c.resume_changes();
        assert_eq!(sink.fired.get(), 1);
    }

    /// Handler that mutates the Changeable that notified it. The nested
    /// on_changed must be swallowed by the guard, not recurse.
    struct ReentrantSink {
        target: RefCell<Option<Rc<Changeable>>>,
        fired: Cell<u32>,
    }

    impl ChangeSink for ReentrantSink {
        fn on_changed(&self) {
            self.fired.set(self.fired.get() + 1);
            if let Some(target) = self.target.borrow().as_ref() {
                target.on_changed();
            }
        }
    }

    #[test]
    fn test_reentrant_notification_is_swallowed() {
        let sink = Rc::new(ReentrantSink {
            target: RefCell::new(None),
            fired: Cell::new(0),
        });
        let c = Rc::new(Changeable::new(sink.clone()));
        *sink.target.borrow_mut() = Some(c.clone());

        c.on_changed();
        // One outer fire; the nested call inside the handler is dropped.
        assert_eq!(sink.fired.get(), 1);

        // Break the Rc cycle so the test leaks nothing.
        *sink.target.borrow_mut() = None;
    }

    #[test]
    fn test_suspend_guard_resumes_on_drop() {
        let (sink, c) = counting();
        {
            let _guard = c.suspend();
            c.on_changed();
            c.on_changed();
            assert_eq!(sink.fired.get(), 0);
        }
        assert_eq!(sink.fired.get(), 1);
        assert!(!c.changes_suspended());
    }

    #[test]
    fn test_bracket_helper_runs_body_once() {
        let (sink, c) = counting();
        let n = c.bracket(|| {
            c.on_changed();
            c.on_changed();
            42
        });
        assert_eq!(n, 42);
        assert_eq!(sink.fired.get(), 1);
    }
}
