//! History menu overlay.
//!
//! A popup menu that behaves like a regular native menu but also filters its
//! items from typed text while open. The native side (rendering, tracking,
//! the highlight primitive) stays behind the collaborator traits below; this
//! module owns the open/close lifecycle around it:
//!
//! - **open**: ensure the search row is the first row (plus separator) and
//!   attach keyboard interception to the menu's window
//! - **display**: move the highlight to the configured default row
//! - **select**: accept the highlighted row and end tracking
//! - **close**: detach interception, then clear the query on the next
//!   UI-thread cycle
//!
//! Open/closed is derived from whether a window session exists; it is never
//! stored separately.

mod affordance;
mod highlight;

pub use affordance::{FieldCommand, SearchAffordance};
pub use highlight::{
    default_highlight_index, highlight_if_present, Highlighter, DEFAULT_HIGHLIGHT_BASE_OFFSET,
};

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use tracing::{debug, info, warn};

use crate::dispatch::MainThreadDispatcher;
use crate::environment::AppEnvironment;
use crate::error::ResultExt;
use crate::interceptor::{EventInterceptor, FocusSource, InterceptorHandle, KeyTap, WindowId};
use crate::logging;
use crate::query::QueryController;

/// Rows of the native menu. Owned by the item-source collaborator.
pub trait ItemSource {
    fn item_count(&self) -> usize;
    fn item_title(&self, index: usize) -> Option<String>;
    fn highlighted_index(&self) -> Option<usize>;
    /// Run the action of the row at `index`.
    fn perform_action(&self, index: usize);
}

/// The native menu object itself.
pub trait MenuSurface {
    /// Make the search row the first row, followed by a separator.
    /// Must be idempotent across sessions.
    fn insert_search_affordance(&self, affordance: &SearchAffordance);
    /// End the native tracking session (the menu closes).
    fn cancel_tracking(&self);
}

pub struct MenuCollaborators {
    pub items: Rc<dyn ItemSource>,
    pub highlighter: Rc<dyn Highlighter>,
    pub surface: Rc<dyn MenuSurface>,
    pub key_tap: Rc<dyn KeyTap>,
    pub dispatcher: Rc<dyn MainThreadDispatcher>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverlayState {
    Closed,
    Open,
}

struct Session {
    window: WindowId,
    interception: Option<InterceptorHandle>,
    /// User-facing reason when typing can't be captured this session.
    unavailable: Option<String>,
}

pub struct HistoryMenu {
    env: Rc<AppEnvironment>,
    controller: Rc<QueryController>,
    interceptor: EventInterceptor,
    affordance: Option<Rc<SearchAffordance>>,
    items: Rc<dyn ItemSource>,
    highlighter: Rc<dyn Highlighter>,
    surface: Rc<dyn MenuSurface>,
    dispatcher: Rc<dyn MainThreadDispatcher>,
    session: RefCell<Option<Session>>,
    clear_pending: Rc<Cell<bool>>,
    self_ref: Weak<HistoryMenu>,
}

impl HistoryMenu {
    pub fn new(env: Rc<AppEnvironment>, collaborators: MenuCollaborators) -> Rc<Self> {
        let config = env.config();
        let controller = Rc::new(QueryController::new(Rc::clone(&env)));
        let interceptor = EventInterceptor::new(
            collaborators.key_tap,
            Rc::clone(&controller),
            config.reserved_keys.clone(),
        );
        let affordance = config
            .enable_search_in_history_menu
            .then(|| Rc::new(SearchAffordance::new(config, Rc::clone(&controller))));

        Rc::new_cyclic(|self_ref| Self {
            env: Rc::clone(&env),
            controller,
            interceptor,
            affordance,
            items: collaborators.items,
            highlighter: collaborators.highlighter,
            surface: collaborators.surface,
            dispatcher: collaborators.dispatcher,
            session: RefCell::new(None),
            clear_pending: Rc::new(Cell::new(false)),
            self_ref: self_ref.clone(),
        })
    }

    pub fn state(&self) -> OverlayState {
        if self.session.borrow().is_some() {
            OverlayState::Open
        } else {
            OverlayState::Closed
        }
    }

    pub fn is_open(&self) -> bool {
        self.state() == OverlayState::Open
    }

    /// Window of the current session, if open.
    pub fn window(&self) -> Option<WindowId> {
        self.session.borrow().as_ref().map(|s| s.window)
    }

    /// Whether typing is currently being captured.
    pub fn is_intercepting(&self) -> bool {
        self.session
            .borrow()
            .as_ref()
            .is_some_and(|s| s.interception.is_some())
    }

    /// Why typing isn't filtered in the open session, for display in the
    /// search row. `None` while closed or when interception is working.
    pub fn search_unavailable_reason(&self) -> Option<String> {
        self.session
            .borrow()
            .as_ref()
            .and_then(|s| s.unavailable.clone())
    }

    pub fn query(&self) -> String {
        self.controller.query()
    }

    pub fn controller(&self) -> &Rc<QueryController> {
        &self.controller
    }

    pub fn interceptor(&self) -> &EventInterceptor {
        &self.interceptor
    }

    pub fn affordance(&self) -> Option<&Rc<SearchAffordance>> {
        self.affordance.as_ref()
    }

    pub fn minimum_width(&self) -> f64 {
        self.env.config().menu_minimum_width
    }

    /// The menu is about to start tracking inside `window`.
    pub fn menu_will_open(&self, window: WindowId) {
        // A reopen must never observe the previous session's query
        self.run_pending_clear();

        if let Some(current) = self.window() {
            warn!(window = %window, current = %current, "Menu already open, ignoring open");
            return;
        }

        let mut unavailable = None;
        let interception = match &self.affordance {
            Some(affordance) => {
                self.surface.insert_search_affordance(affordance);
                let focus: Rc<dyn FocusSource> = affordance.clone();
                self.interceptor
                    .attach(window, focus)
                    .inspect_err(|e| unavailable = Some(e.user_message()))
                    .warn_on_err()
            }
            None => None,
        };

        let intercepting = interception.is_some();
        *self.session.borrow_mut() = Some(Session {
            window,
            interception,
            unavailable,
        });
        self.env.set_history_menu(self.self_ref.clone());

        let details = format!("{} intercepting={}", window, intercepting);
        logging::log_menu_event("open", Some(&details));
    }

    /// The menu is about to (re)display its rows. Returns the highlighted
    /// row when the default highlight was applied.
    pub fn menu_will_display(&self) -> Option<usize> {
        if !self.is_open() {
            return None;
        }
        let config = self.env.config();
        if !config.auto_highlight_second_history_item {
            return None;
        }

        let target = default_highlight_index(
            self.affordance.is_some(),
            config.indicate_paste_as_plain_text_modifier,
        );
        highlight_if_present(self.items.as_ref(), self.highlighter.as_ref(), target)
            .then_some(target)
    }

    /// Accept the highlighted row, if any, and end tracking.
    pub fn select(&self) -> bool {
        if !self.is_open() {
            return false;
        }
        let Some(index) = self.items.highlighted_index() else {
            debug!("Select with nothing highlighted");
            return false;
        };
        if index >= self.items.item_count() {
            return false;
        }

        info!(index, "Accepting highlighted history item");
        self.items.perform_action(index);
        self.surface.cancel_tracking();
        true
    }

    /// The menu finished tracking (accept, escape, outside click...).
    pub fn menu_did_close(&self) {
        let Some(session) = self.session.borrow_mut().take() else {
            debug!("Close without an open session, nothing to do");
            return;
        };

        EventInterceptor::detach(session.interception);
        if let Some(affordance) = &self.affordance {
            affordance.set_focused(false);
        }
        self.env.clear_history_menu(self);

        // The field is being torn down right now; clear once the stack unwinds
        self.clear_pending.set(true);
        let pending = Rc::clone(&self.clear_pending);
        let controller = Rc::downgrade(&self.controller);
        self.dispatcher.dispatch_deferred(Box::new(move || {
            if let Some(controller) = controller.upgrade() {
                clear_if_pending(&pending, &controller);
            }
        }));

        logging::log_menu_event("close", Some(&session.window.to_string()));
    }

    fn run_pending_clear(&self) {
        clear_if_pending(&self.clear_pending, &self.controller);
    }
}

fn clear_if_pending(pending: &Cell<bool>, controller: &QueryController) {
    if pending.replace(false) {
        controller.set_query("");
    }
}

#[cfg(test)]
#[path = "menu_tests.rs"]
mod tests;
