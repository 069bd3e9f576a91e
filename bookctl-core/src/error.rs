/// Structured error types for bookctl-core.
///
/// Library consumers get composable `thiserror` errors; the `bookctl`
/// binary wraps them with `anyhow` context.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::models::{InvalidPagesFormat, ValidationErrors};

/// Main error type for bookctl-core operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// I/O operation failed
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: io::Error,
    },

    /// Config file exists but is not valid TOML for [`crate::BookctlConfig`]
    #[error("Failed to parse config file {path:?}: {source}")]
    ConfigParse {
        path: PathBuf,
        source: toml::de::Error,
    },

    /// Config values are individually well-formed but inconsistent
    #[error("Configuration error: {reason}")]
    Config { reason: String },

    /// A `Pages` value was not in `"<n> pages"` form
    #[error(transparent)]
    InvalidFormat(#[from] InvalidPagesFormat),

    /// One or more fields failed validation
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
}

/// Result type alias for bookctl-core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Create a config error
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_error_display() {
        let err = CoreError::config("db.max_open_conns must be at least 1");
        assert_eq!(
            err.to_string(),
            "Configuration error: db.max_open_conns must be at least 1"
        );
    }

    #[test]
    fn io_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: CoreError = io_err.into();

        assert!(matches!(err, CoreError::Io { .. }));
    }

    #[test]
    fn pages_error_is_transparent() {
        let err: CoreError = "10pages".parse::<crate::Pages>().unwrap_err().into();
        assert_eq!(err.to_string(), "invalid pages format");
    }
}
