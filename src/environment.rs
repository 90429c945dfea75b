//! Shared environment for the history menu.
//!
//! Constructed once at startup and handed to every component that needs it,
//! instead of living in a global. Everything here is touched on the UI
//! thread only, hence `Rc`/`RefCell` rather than locks.
//!
//! Writers:
//! - `search_query`: the query controller (mirror of the query buffer)
//! - `history_menu`: the menu itself, while it is open

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::config::MenuConfig;
use crate::menu::HistoryMenu;
use crate::notifications::NotificationCenter;

pub struct AppEnvironment {
    config: MenuConfig,
    search_query: RefCell<String>,
    history_menu: RefCell<Weak<HistoryMenu>>,
    notifications: NotificationCenter,
}

impl AppEnvironment {
    pub fn new(config: MenuConfig) -> Rc<Self> {
        Rc::new(Self {
            config,
            search_query: RefCell::new(String::new()),
            history_menu: RefCell::new(Weak::new()),
            notifications: NotificationCenter::new(),
        })
    }

    pub fn config(&self) -> &MenuConfig {
        &self.config
    }

    pub fn notifications(&self) -> &NotificationCenter {
        &self.notifications
    }

    /// Current filter text. Empty means unfiltered.
    pub fn search_query(&self) -> String {
        self.search_query.borrow().clone()
    }

    pub(crate) fn set_search_query(&self, query: &str) {
        let mut current = self.search_query.borrow_mut();
        current.clear();
        current.push_str(query);
    }

    /// The menu that is currently open, if any.
    pub fn history_menu(&self) -> Option<Rc<HistoryMenu>> {
        self.history_menu.borrow().upgrade()
    }

    pub(crate) fn set_history_menu(&self, menu: Weak<HistoryMenu>) {
        *self.history_menu.borrow_mut() = menu;
    }

    /// Drop the back-reference, but only if it still points at `menu`.
    pub(crate) fn clear_history_menu(&self, menu: &HistoryMenu) {
        let mut slot = self.history_menu.borrow_mut();
        if std::ptr::eq(slot.as_ptr(), menu) {
            *slot = Weak::new();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_environment_is_unfiltered() {
        let env = AppEnvironment::new(MenuConfig::default());
        assert_eq!(env.search_query(), "");
        assert!(env.history_menu().is_none());
        assert!(env.config().enable_search_in_history_menu);
    }

    #[test]
    fn test_search_query_mirror_replaces_value() {
        let env = AppEnvironment::new(MenuConfig::default());
        env.set_search_query("abc");
        env.set_search_query("x");
        assert_eq!(env.search_query(), "x");
    }
}
