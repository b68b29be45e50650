//! Archive inspection for attachment download policy
//!
//! This crate walks ZIP containers looking for content a download policy
//! forbids. It does not decide anything itself: it reports what it found in a
//! [`ScanResult`] and leaves the verdict to the caller.
//!
//! # Features
//!
//! - **Blocked entries**: Entries whose extension is on the block-list are
//!   reported with their depth and location
//! - **Bounded recursion**: Nested archives are opened up to a configurable
//!   depth; anything deeper is reported instead of extracted
//! - **Encryption detection**: Password-protected containers are flagged,
//!   never decrypted
//! - **Work limits**: Entry count, extracted bytes and wall-clock time are
//!   capped per inspection
//! - **Private scratch space**: Nested archives are extracted into a
//!   per-inspection temporary directory that is always removed
//!
//! # Usage
//!
//! ```no_run
//! use attachguard_archive::{ArchiveInspector, InspectOptions};
//! use std::path::Path;
//!
//! let options = InspectOptions::new(["exe", "js"], ["zip"], 1);
//! let result = ArchiveInspector::new().inspect_path(Path::new("upload.zip"), &options);
//! if let Some(err) = &result.read_error {
//!     println!("unreadable: {err}");
//! }
//! for finding in &result.findings {
//!     println!("{} ({})", finding.location(), finding.reason);
//! }
//! ```

pub mod budget;
pub mod container;
pub mod error;
pub mod extension;
pub mod inspect;
pub mod result;

#[cfg(test)]
mod fixtures;

pub use budget::ScanLimits;
pub use container::{Container, EntryInfo, ZipContainer};
pub use error::ArchiveError;
pub use extension::{extension_of, file_name, normalize_extension};
pub use inspect::{ArchiveInspector, ContentPolicy, InspectOptions};
pub use result::{ArchiveEntry, FindingReason, ReadError, ReadErrorKind, ScanResult};

// =============================================================================
// Nesting Constants
// =============================================================================

/// Default depth bound for nested archives.
///
/// Depth 1 opens archives found directly inside the requested archive but
/// nothing below them.
pub const DEFAULT_MAX_NESTING_DEPTH: u32 = 1;

/// Largest accepted depth bound. Configured values above this are clamped.
pub const MAX_NESTING_DEPTH_LIMIT: u32 = 10;
