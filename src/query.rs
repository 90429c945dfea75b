//! Query buffer and the controller that edits it.
//!
//! The buffer only changes through [`QueryController`]: single-character
//! edits coming from the keyboard tap, text typed directly into the search
//! field, or the clear that follows a menu close. Every change that actually
//! alters the value is mirrored into the environment and announced with
//! [`SEARCH_QUERY_UPDATED`].

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::environment::AppEnvironment;
use crate::notifications::SEARCH_QUERY_UPDATED;

/// Edit requested by a consumed key event.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum QueryEdit {
    Append(char),
    DeleteLast,
}

/// The filter text. Empty means "unfiltered".
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QueryBuffer {
    value: String,
}

impl QueryBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Length in characters.
    pub fn len(&self) -> usize {
        self.value.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.value.is_empty()
    }

    /// Apply `edit`, returning whether the value changed.
    pub fn apply(&mut self, edit: QueryEdit) -> bool {
        match edit {
            QueryEdit::Append(c) => {
                self.value.push(c);
                true
            }
            QueryEdit::DeleteLast => self.value.pop().is_some(),
        }
    }

    /// Replace the whole value, returning whether it changed.
    pub fn replace(&mut self, value: &str) -> bool {
        if self.value == value {
            return false;
        }
        self.value.clear();
        self.value.push_str(value);
        true
    }
}

pub struct QueryController {
    env: Rc<AppEnvironment>,
    buffer: RefCell<QueryBuffer>,
}

impl QueryController {
    pub fn new(env: Rc<AppEnvironment>) -> Self {
        Self {
            env,
            buffer: RefCell::new(QueryBuffer::new()),
        }
    }

    pub fn query(&self) -> String {
        self.buffer.borrow().as_str().to_string()
    }

    /// Apply an edit from a consumed key event. Publishes only on change.
    pub fn on_classified_event(&self, edit: QueryEdit) -> bool {
        let changed = self.buffer.borrow_mut().apply(edit);
        if changed {
            self.publish();
        }
        changed
    }

    /// Set the whole query. A no-op, without notification, when `value`
    /// equals the current query.
    pub fn set_query(&self, value: &str) -> bool {
        let changed = self.buffer.borrow_mut().replace(value);
        if changed {
            self.publish();
        }
        changed
    }

    fn publish(&self) {
        // Observers read the mirror, so no borrow may be held while posting
        let value = self.query();
        debug!(query_len = value.chars().count(), "Search query updated");
        self.env.set_search_query(&value);
        self.env.notifications().post(SEARCH_QUERY_UPDATED);
    }
}
