//! Configuration type definitions

use serde::{Deserialize, Serialize};

use super::defaults::*;
use crate::keys::KeyCode;

/// Settings read by the history menu.
///
/// Built once at startup and then only read; the environment owns it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuConfig {
    /// Show the search field and capture typing while the menu is open (default: true)
    #[serde(default = "default_enable_search")]
    pub enable_search_in_history_menu: bool,
    /// Highlight a default row every time the menu displays (default: true)
    #[serde(default = "default_auto_highlight")]
    pub auto_highlight_second_history_item: bool,
    /// An extra "paste as plain text" indicator row sits above the history (default: false)
    #[serde(default = "default_indicate_plain_text")]
    pub indicate_paste_as_plain_text_modifier: bool,
    /// Whether the search field accepts input as soon as it is created (default: true)
    #[serde(default = "default_search_field_starts_enabled")]
    pub search_field_starts_enabled: bool,
    /// Minimum menu width in points (default: 300)
    #[serde(default = "default_menu_minimum_width")]
    pub menu_minimum_width: f64,
    /// Search row height in points (default: 29)
    #[serde(default = "default_search_field_height")]
    pub search_field_height: f64,
    /// Label shown next to the search field (default: "Search")
    #[serde(default = "default_search_title")]
    pub search_title: String,
    /// Extra keys that must always reach the native menu
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reserved_keys: Vec<KeyCode>,
}

fn default_enable_search() -> bool {
    DEFAULT_ENABLE_SEARCH_IN_HISTORY_MENU
}
fn default_auto_highlight() -> bool {
    DEFAULT_AUTO_HIGHLIGHT_SECOND_HISTORY_ITEM
}
fn default_indicate_plain_text() -> bool {
    DEFAULT_INDICATE_PASTE_AS_PLAIN_TEXT_MODIFIER
}
fn default_search_field_starts_enabled() -> bool {
    DEFAULT_SEARCH_FIELD_STARTS_ENABLED
}
fn default_menu_minimum_width() -> f64 {
    DEFAULT_MENU_MINIMUM_WIDTH
}
fn default_search_field_height() -> f64 {
    DEFAULT_SEARCH_FIELD_HEIGHT
}
fn default_search_title() -> String {
    DEFAULT_SEARCH_TITLE.to_string()
}

impl Default for MenuConfig {
    fn default() -> Self {
        MenuConfig {
            enable_search_in_history_menu: DEFAULT_ENABLE_SEARCH_IN_HISTORY_MENU,
            auto_highlight_second_history_item: DEFAULT_AUTO_HIGHLIGHT_SECOND_HISTORY_ITEM,
            indicate_paste_as_plain_text_modifier: DEFAULT_INDICATE_PASTE_AS_PLAIN_TEXT_MODIFIER,
            search_field_starts_enabled: DEFAULT_SEARCH_FIELD_STARTS_ENABLED,
            menu_minimum_width: DEFAULT_MENU_MINIMUM_WIDTH,
            search_field_height: DEFAULT_SEARCH_FIELD_HEIGHT,
            search_title: default_search_title(),
            reserved_keys: Vec::new(),
        }
    }
}
