use std::cell::RefCell;
use std::rc::Rc;

/// Delayed single-shot tasks on the UI event loop.
pub trait Scheduler {
    fn schedule(&self, delay_ms: u32, task: Box<dyn FnOnce()>) -> TimerGuard;
}

/// Handle for a scheduled task. Dropping it cancels the task if it has not run.
pub struct TimerGuard {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerGuard {
    pub fn new(cancel: impl FnOnce() + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }
}

impl Drop for TimerGuard {
    fn drop(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

/// Runs the most recently triggered task once input has been quiet for `delay_ms`.
pub struct Debouncer {
    scheduler: Rc<dyn Scheduler>,
    delay_ms: u32,
    pending: RefCell<Option<TimerGuard>>,
}

impl Debouncer {
    pub fn new(scheduler: Rc<dyn Scheduler>, delay_ms: u32) -> Self {
        Self {
            scheduler,
            delay_ms,
            pending: RefCell::new(None),
        }
    }

    pub fn trigger(&self, task: impl FnOnce() + 'static) {
        // Cancel outside the borrow; the guard's cancel hook may reach the scheduler.
        let previous = self.pending.borrow_mut().take();
        drop(previous);

        let guard = self.scheduler.schedule(self.delay_ms, Box::new(task));
        *self.pending.borrow_mut() = Some(guard);
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::testing::ManualScheduler;

    #[test]
    fn only_last_trigger_runs() {
        let clock = ManualScheduler::default();
        let debouncer = Debouncer::new(Rc::new(clock.clone()), 300);
        let seen = Rc::new(RefCell::new(Vec::new()));

        for value in 1..=4 {
            let seen = seen.clone();
            debouncer.trigger(move || seen.borrow_mut().push(value));
            clock.advance(100);
        }
        assert!(seen.borrow().is_empty());

        clock.advance(300);
        assert_eq!(*seen.borrow(), vec![4]);
        assert_eq!(clock.pending(), 0);
    }

    #[test]
    fn separated_triggers_each_run() {
        let clock = ManualScheduler::default();
        let debouncer = Debouncer::new(Rc::new(clock.clone()), 300);
        let runs = Rc::new(Cell::new(0));

        for _ in 0..2 {
            let runs = runs.clone();
            debouncer.trigger(move || runs.set(runs.get() + 1));
            clock.advance(301);
        }

        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn dropping_guard_cancels() {
        let clock = ManualScheduler::default();
        let ran = Rc::new(Cell::new(false));
        let flag = ran.clone();

        let guard = clock.schedule(50, Box::new(move || flag.set(true)));
        drop(guard);
        clock.advance(100);

        assert!(!ran.get());
    }
}
