use std::path::PathBuf;

use thiserror::Error;
use tracing::warn;

/// Error severity for UI display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Info,    // informational
    Warning, // recoverable, feature degrades
    Error,   // operation failed
}

/// Errors raised by the history menu subsystem.
///
/// None of these abort the menu: every caller degrades to reduced
/// functionality (no filtering, default config) instead.
#[derive(Error, Debug)]
pub enum HistoryMenuError {
    #[error("Keyboard hook install failed: {0}")]
    HookInstall(String),

    #[error("Failed to read config from '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl HistoryMenuError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::HookInstall(_) => ErrorSeverity::Warning,
            Self::ConfigRead { .. } => ErrorSeverity::Info,
            Self::ConfigParse(_) => ErrorSeverity::Warning,
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            Self::HookInstall(_) => "Search is unavailable for this menu".to_string(),
            Self::ConfigRead { path, .. } => {
                format!("Could not read settings from {}", path.display())
            }
            Self::ConfigParse(e) => format!("Settings file is invalid: {}", e),
        }
    }
}

pub type Result<T> = std::result::Result<T, HistoryMenuError>;

/// Extension trait for silent error logging with caller location tracking.
/// Use when the operation is recoverable and user doesn't need to know.
///
/// # Examples
///
/// ```ignore
/// use history_menu::error::ResultExt;
///
/// // Open the menu without interception if the hook can't be installed
/// let handle = interceptor.attach(window, focus).warn_on_err();
/// ```
pub trait ResultExt<T> {
    /// Log as warning with caller location and return None. Use for expected failures.
    fn warn_on_err(self) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for std::result::Result<T, E> {
    #[track_caller]
    fn warn_on_err(self) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(error) => {
                let caller = std::panic::Location::caller();
                warn!(
                    error = ?error,
                    file = caller.file(),
                    line = caller.line(),
                    "Operation had warning"
                );
                None
            }
        }
    }
}
