//! Deferring work to the next UI-thread cycle.
//!
//! The menu uses this to clear the query after it closes, once the closing
//! call stack has unwound. On macOS the native dispatcher is the GCD main
//! queue (`platform::macos::MainQueueDispatcher`); headless hosts and tests
//! pump a [`DeferredQueue`] themselves.

use std::cell::RefCell;
use std::collections::VecDeque;

pub type DeferredTask = Box<dyn FnOnce()>;

pub trait MainThreadDispatcher {
    /// Run `task` on the UI thread after the current call stack returns.
    fn dispatch_deferred(&self, task: DeferredTask);
}

/// Run-loop stand-in: tasks wait until the host calls [`DeferredQueue::run_pending`].
#[derive(Default)]
pub struct DeferredQueue {
    tasks: RefCell<VecDeque<DeferredTask>>,
}

impl DeferredQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run the tasks queued before this call. Tasks they enqueue wait for
    /// the next cycle. Returns how many ran.
    pub fn run_pending(&self) -> usize {
        let ready = self.tasks.borrow().len();
        for _ in 0..ready {
            // Pop without holding the borrow so tasks can enqueue more work
            let task = self.tasks.borrow_mut().pop_front();
            match task {
                Some(task) => task(),
                None => return ready,
            }
        }
        ready
    }

    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }
}

impl MainThreadDispatcher for DeferredQueue {
    fn dispatch_deferred(&self, task: DeferredTask) {
        self.tasks.borrow_mut().push_back(task);
    }
}
