//! History Menu - a clipboard history popup menu you can type into
//!
//! While the menu is open, plain typing is captured ahead of native menu
//! tracking and turned into a search query; observers refilter the rows on
//! every change. Arrow keys, return and escape keep working natively.

pub mod config;
pub mod dispatch;
pub mod environment;
pub mod error;
pub mod history_items;
pub mod interceptor;
pub mod keys;
pub mod logging;
pub mod menu;
pub mod notifications;
pub mod platform;
pub mod query;

pub use config::MenuConfig;
pub use environment::AppEnvironment;
pub use error::{HistoryMenuError, Result};
pub use interceptor::{EventInterceptor, InterceptorHandle, KeyTap, WindowId};
pub use menu::{HistoryMenu, MenuCollaborators, OverlayState, SearchAffordance};
pub use notifications::SEARCH_QUERY_UPDATED;
pub use query::QueryController;
