//! Default highlight placement.
//!
//! The native menu owns the actual highlight; this only decides which row
//! and asks for it through the [`Highlighter`] capability.

use tracing::debug;

use super::ItemSource;

/// Rows above the default target when neither the search row nor the
/// plain-text indicator row is present.
pub const DEFAULT_HIGHLIGHT_BASE_OFFSET: usize = 2;

/// Narrow wrapper around the toolkit's "highlight this item" primitive.
pub trait Highlighter {
    /// Highlight the row at `index`. Returns false if the toolkit refused.
    fn highlight_item(&self, index: usize) -> bool;
}

pub fn default_highlight_index(
    has_search_affordance: bool,
    has_plain_text_indicator: bool,
) -> usize {
    DEFAULT_HIGHLIGHT_BASE_OFFSET
        + usize::from(has_search_affordance)
        + usize::from(has_plain_text_indicator)
}

/// Highlight `index` if the menu has such a row. Out of range is a silent no-op.
pub fn highlight_if_present(
    items: &dyn ItemSource,
    highlighter: &dyn Highlighter,
    index: usize,
) -> bool {
    let count = items.item_count();
    if index >= count {
        debug!(index, count, "Default highlight target out of range, skipping");
        return false;
    }
    highlighter.highlight_item(index)
}
