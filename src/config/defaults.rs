//! Default configuration values
//!
//! All constants used throughout the config module are defined here.

/// Default feature flags
pub const DEFAULT_ENABLE_SEARCH_IN_HISTORY_MENU: bool = true;
pub const DEFAULT_AUTO_HIGHLIGHT_SECOND_HISTORY_ITEM: bool = true;
pub const DEFAULT_INDICATE_PASTE_AS_PLAIN_TEXT_MODIFIER: bool = false;

/// Whether the search field accepts input as soon as it is created
pub const DEFAULT_SEARCH_FIELD_STARTS_ENABLED: bool = true;

/// Layout hints handed to the menu renderer
pub const DEFAULT_MENU_MINIMUM_WIDTH: f64 = 300.0;
pub const DEFAULT_SEARCH_FIELD_HEIGHT: f64 = 29.0;
pub const DEFAULT_SEARCH_TITLE: &str = "Search";
