//! Error types for archive inspection

use thiserror::Error;

/// Errors that can occur while walking a container.
///
/// These never leave [`crate::ArchiveInspector`]: the inspector converts every
/// variant into a [`crate::ReadError`] on the returned [`crate::ScanResult`].
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error while reading the container or writing a scratch file
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid or corrupted ZIP structure
    #[error("Invalid ZIP archive: {0}")]
    InvalidZip(#[from] zip::result::ZipError),

    /// An entry that has to be decompressed is password-protected
    #[error("Entry '{name}' is password-protected")]
    PasswordProtected {
        /// Name of the entry inside its container
        name: String,
    },

    /// A scan limit was reached before the traversal finished
    #[error("Scan budget exceeded: {what}")]
    BudgetExceeded {
        /// Which limit was hit
        what: &'static str,
    },

    /// Scratch space could not be created or removed
    #[error("Scratch space error: {0}")]
    Scratch(String),
}

impl ArchiveError {
    /// Whether this error came from a scan limit rather than from the input.
    #[inline]
    #[must_use]
    pub const fn is_budget(&self) -> bool {
        matches!(self, Self::BudgetExceeded { .. })
    }
}
