//! Error types for guard construction
//!
//! Evaluating a request never fails; these errors only come from loading
//! settings and opening audit sinks.

use thiserror::Error;

/// Errors raised while building a [`crate::Guard`] or its collaborators.
#[derive(Error, Debug)]
pub enum GuardError {
    /// IO error while reading configuration or opening an audit file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration could not be parsed or is inconsistent
    #[error("Invalid settings: {0}")]
    Settings(String),

    /// An audit sink could not be created
    #[error("Audit sink error: {0}")]
    Audit(String),
}

/// Result type for guard construction.
pub type Result<T> = std::result::Result<T, GuardError>;
