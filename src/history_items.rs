//! In-memory history rows that follow the search query.
//!
//! Stands in for the native menu's item list wherever no window server is
//! around (the smoke binary, tests). Row layout, top to bottom:
//!
//! - the search row and its separator, once inserted
//! - fixed leading rows (headers, the plain-text indicator...)
//! - clipboard history titles matching the current query
//!
//! Filtering uses nucleo's fuzzy matcher: case-insensitive, best score first,
//! ties keep history order, and an empty query shows everything.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};

use nucleo_matcher::pattern::{CaseMatching, Normalization, Pattern};
use nucleo_matcher::{Matcher, Utf32Str};
use tracing::debug;

use crate::environment::AppEnvironment;
use crate::menu::{Highlighter, ItemSource, MenuSurface, SearchAffordance};
use crate::notifications::{ObserverId, SEARCH_QUERY_UPDATED};

/// Title reported for the separator under the search row.
pub const SEPARATOR_TITLE: &str = "-";

/// Indices of `entries` matching `query`, best match first.
pub fn filter_entries(entries: &[String], query: &str) -> Vec<usize> {
    if query.is_empty() {
        return (0..entries.len()).collect();
    }

    let pattern = Pattern::parse(query, CaseMatching::Ignore, Normalization::Smart);
    let mut matcher = Matcher::new(nucleo_matcher::Config::DEFAULT);
    let mut buf = Vec::new();

    let mut scored: Vec<(usize, u32)> = entries
        .iter()
        .enumerate()
        .filter_map(|(index, title)| {
            let haystack = Utf32Str::new(title, &mut buf);
            pattern
                .score(haystack, &mut matcher)
                .map(|score| (index, score))
        })
        .collect();

    // Stable sort keeps history order for equal scores
    scored.sort_by(|a, b| b.1.cmp(&a.1));
    scored.into_iter().map(|(index, _)| index).collect()
}

pub struct HistoryItems {
    leading: Vec<String>,
    entries: Vec<String>,
    visible: RefCell<Vec<usize>>,
    search_title: RefCell<Option<String>>,
    highlighted: Cell<Option<usize>>,
    accepted: RefCell<Vec<String>>,
    cancellations: Cell<usize>,
}

impl HistoryItems {
    pub fn new(leading: Vec<String>, entries: Vec<String>) -> Self {
        let visible = (0..entries.len()).collect();
        Self {
            leading,
            entries,
            visible: RefCell::new(visible),
            search_title: RefCell::new(None),
            highlighted: Cell::new(None),
            accepted: RefCell::new(Vec::new()),
            cancellations: Cell::new(0),
        }
    }

    /// Refilter whenever the environment posts a query change.
    ///
    /// Holds only weak references, so neither side keeps the other alive.
    pub fn subscribe(self: &Rc<Self>, env: &Rc<AppEnvironment>) -> ObserverId {
        let items: Weak<Self> = Rc::downgrade(self);
        let weak_env: Weak<AppEnvironment> = Rc::downgrade(env);
        env.notifications()
            .add_observer(SEARCH_QUERY_UPDATED, move || {
                if let (Some(items), Some(env)) = (items.upgrade(), weak_env.upgrade()) {
                    items.apply_query(&env.search_query());
                }
            })
    }

    pub fn apply_query(&self, query: &str) {
        let visible = filter_entries(&self.entries, query);
        debug!(
            visible = visible.len(),
            total = self.entries.len(),
            "History items refiltered"
        );
        *self.visible.borrow_mut() = visible;
        // Rows moved under the highlight; the menu re-applies its default on display
        self.highlighted.set(None);
    }

    pub fn has_search_row(&self) -> bool {
        self.search_title.borrow().is_some()
    }

    pub fn visible_titles(&self) -> Vec<String> {
        self.visible
            .borrow()
            .iter()
            .filter_map(|&i| self.entries.get(i).cloned())
            .collect()
    }

    pub fn highlighted_title(&self) -> Option<String> {
        self.highlighted.get().and_then(|i| self.item_title(i))
    }

    /// Titles whose action ran, in order.
    pub fn accepted(&self) -> Vec<String> {
        self.accepted.borrow().clone()
    }

    pub fn cancel_count(&self) -> usize {
        self.cancellations.get()
    }

    fn search_rows(&self) -> usize {
        if self.has_search_row() {
            2
        } else {
            0
        }
    }
}

impl ItemSource for HistoryItems {
    fn item_count(&self) -> usize {
        self.search_rows() + self.leading.len() + self.visible.borrow().len()
    }

    fn item_title(&self, index: usize) -> Option<String> {
        if let Some(title) = self.search_title.borrow().as_ref() {
            match index {
                0 => return Some(title.clone()),
                1 => return Some(SEPARATOR_TITLE.to_string()),
                _ => {}
            }
        }
        let index = index.checked_sub(self.search_rows())?;
        if let Some(title) = self.leading.get(index) {
            return Some(title.clone());
        }
        let entry = *self.visible.borrow().get(index - self.leading.len())?;
        self.entries.get(entry).cloned()
    }

    fn highlighted_index(&self) -> Option<usize> {
        self.highlighted.get()
    }

    fn perform_action(&self, index: usize) {
        if let Some(title) = self.item_title(index) {
            debug!(index, "History item action");
            self.accepted.borrow_mut().push(title);
        }
    }
}

impl Highlighter for HistoryItems {
    fn highlight_item(&self, index: usize) -> bool {
        if index >= self.item_count() {
            return false;
        }
        self.highlighted.set(Some(index));
        true
    }
}

impl MenuSurface for HistoryItems {
    fn insert_search_affordance(&self, affordance: &SearchAffordance) {
        let mut slot = self.search_title.borrow_mut();
        if slot.is_none() {
            *slot = Some(affordance.title().to_string());
        }
    }

    fn cancel_tracking(&self) {
        self.cancellations.set(self.cancellations.get() + 1);
        self.highlighted.set(None);
    }
}
