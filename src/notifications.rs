//! Named, payload-free notifications on the UI thread.
//!
//! Observers read whatever state they need (e.g. the current search query)
//! from the environment when they are called.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

/// Posted after every change of the search query that was actually applied.
pub const SEARCH_QUERY_UPDATED: &str = "searchQueryUpdated";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ObserverId(u64);

struct Observer {
    id: ObserverId,
    name: String,
    callback: Rc<dyn Fn()>,
}

#[derive(Default)]
pub struct NotificationCenter {
    next_id: Cell<u64>,
    observers: RefCell<Vec<Observer>>,
}

impl NotificationCenter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_observer<F: Fn() + 'static>(&self, name: &str, callback: F) -> ObserverId {
        let id = ObserverId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.observers.borrow_mut().push(Observer {
            id,
            name: name.to_string(),
            callback: Rc::new(callback),
        });
        id
    }

    /// Returns false if the observer was already removed.
    pub fn remove_observer(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|o| o.id != id);
        observers.len() != before
    }

    /// Deliver `name` to its observers in registration order.
    ///
    /// Callbacks are collected first so an observer may add or remove
    /// observers (or post again) while being notified.
    pub fn post(&self, name: &str) -> usize {
        let callbacks: Vec<Rc<dyn Fn()>> = self
            .observers
            .borrow()
            .iter()
            .filter(|o| o.name == name)
            .map(|o| Rc::clone(&o.callback))
            .collect();

        for callback in &callbacks {
            callback();
        }
        callbacks.len()
    }

    pub fn observer_count(&self, name: &str) -> usize {
        self.observers
            .borrow()
            .iter()
            .filter(|o| o.name == name)
            .count()
    }
}
