//! The search row embedded at the top of the history menu.
//!
//! The renderer draws it (label plus text field); this model carries the
//! layout hints, the enabled/focused flags the toolkit keeps up to date, and
//! the two callbacks the text field fires.

use std::cell::Cell;
use std::rc::Rc;

use tracing::debug;

use crate::config::MenuConfig;
use crate::interceptor::FocusSource;
use crate::query::QueryController;

/// Editing commands the text field forwards before acting on them itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldCommand {
    InsertNewline,
    InsertTab,
    Cancel,
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    DeleteBackward,
}

pub struct SearchAffordance {
    title: String,
    width: f64,
    height: f64,
    enabled: Cell<bool>,
    focused: Cell<bool>,
    controller: Rc<QueryController>,
}

impl SearchAffordance {
    pub fn new(config: &MenuConfig, controller: Rc<QueryController>) -> Self {
        Self {
            title: config.search_title.clone(),
            width: config.menu_minimum_width,
            height: config.search_field_height,
            enabled: Cell::new(config.search_field_starts_enabled),
            focused: Cell::new(false),
            controller,
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Text the field should display.
    pub fn text(&self) -> String {
        self.controller.query()
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.set(enabled);
        if !enabled {
            self.focused.set(false);
        }
    }

    pub fn is_focused(&self) -> bool {
        self.focused.get()
    }

    /// Called by the toolkit when the field gains or loses first responder.
    pub fn set_focused(&self, focused: bool) {
        self.focused.set(focused && self.enabled.get());
    }

    /// The user edited the field directly (it had focus).
    pub fn text_did_change(&self, value: &str) -> bool {
        self.controller.set_query(value)
    }

    /// Returns true when the command was handled here. Navigation and
    /// acceptance hand focus back to the menu window so native tracking
    /// (and the keyboard tap) take over again.
    pub fn do_command(&self, command: FieldCommand) -> bool {
        match command {
            FieldCommand::InsertNewline
            | FieldCommand::InsertTab
            | FieldCommand::Cancel
            | FieldCommand::MoveUp
            | FieldCommand::MoveDown => {
                debug!(?command, "Search field resigning focus to menu");
                self.focused.set(false);
                true
            }
            FieldCommand::MoveLeft | FieldCommand::MoveRight | FieldCommand::DeleteBackward => {
                false
            }
        }
    }
}

impl FocusSource for SearchAffordance {
    fn query_field_has_focus(&self) -> bool {
        self.enabled.get() && self.focused.get()
    }
}
