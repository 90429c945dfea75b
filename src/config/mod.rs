//! Configuration module - history menu settings
//!
//! This module provides functionality for:
//! - Loading configuration from ~/.clipmenu/config.json
//! - Default values for all settings
//! - Type definitions for config structures
//!
//! # Module Structure
//!
//! - `defaults` - All default constant values
//! - `types` - `MenuConfig`
//! - `loader` - File system loading and parsing

mod defaults;
mod loader;
mod types;

pub use defaults::{
    DEFAULT_AUTO_HIGHLIGHT_SECOND_HISTORY_ITEM, DEFAULT_ENABLE_SEARCH_IN_HISTORY_MENU,
    DEFAULT_INDICATE_PASTE_AS_PLAIN_TEXT_MODIFIER, DEFAULT_MENU_MINIMUM_WIDTH,
    DEFAULT_SEARCH_FIELD_HEIGHT, DEFAULT_SEARCH_FIELD_STARTS_ENABLED, DEFAULT_SEARCH_TITLE,
};

pub use types::MenuConfig;

pub use loader::{default_config_path, load_config, load_config_from};

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
