//! Findings produced by an inspection

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why an entry was recorded
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingReason {
    /// The entry's extension is on the block-list
    BlockedExtension,
    /// A nested archive is password-protected and was not descended into
    EncryptedNested,
    /// A nested archive sits at the depth bound and was not extracted
    NestingLimitExceeded,
}

impl fmt::Display for FindingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::BlockedExtension => "blocked extension",
            Self::EncryptedNested => "encrypted",
            Self::NestingLimitExceeded => "nesting limit exceeded",
        };
        write!(f, "{s}")
    }
}

/// One finding inside a container
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// File name of the entry (last path segment)
    pub name: String,
    /// Entry path within its immediate container
    pub relative_path: String,
    /// Nesting depth of the container holding the entry (0 = requested file)
    pub depth: u32,
    /// Why the entry was recorded
    pub reason: FindingReason,
    /// Paths of the nested archives leading to the entry, outermost first
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub archive_chain: Vec<String>,
}

impl ArchiveEntry {
    /// Full location of the entry, e.g. `inner.zip!/bin/tool.exe`.
    #[must_use]
    pub fn location(&self) -> String {
        let mut location = String::new();
        for archive in &self.archive_chain {
            location.push_str(archive);
            location.push_str("!/");
        }
        location.push_str(&self.relative_path);
        location
    }

    /// Short label used in block messages: the name plus a qualifier for
    /// anything other than a plain blocked extension.
    #[must_use]
    pub fn label(&self) -> String {
        match self.reason {
            FindingReason::BlockedExtension => self.name.clone(),
            other => format!("{} ({other})", self.name),
        }
    }
}

/// Category of a failed inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadErrorKind {
    /// The container or one of its nested archives could not be read, or
    /// scratch space failed
    Unreadable,
    /// A scan limit was exhausted before the traversal finished
    BudgetExceeded,
}

/// Why an inspection could not complete
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReadError {
    /// Error category
    pub kind: ReadErrorKind,
    /// Human-readable description, free of scratch paths
    pub message: String,
}

impl ReadError {
    pub(crate) fn unreadable(message: impl Into<String>) -> Self {
        Self {
            kind: ReadErrorKind::Unreadable,
            message: message.into(),
        }
    }
}

impl fmt::Display for ReadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// Outcome of inspecting one archive
///
/// When `read_error` is set, `findings` holds whatever was collected before
/// the failure. Those partial findings are kept for audit trails only and
/// must not be read as a complete picture of the archive.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanResult {
    /// Findings in traversal order (depth-first, entry order)
    pub findings: Vec<ArchiveEntry>,
    /// The requested archive itself contains encrypted entries
    pub top_level_encrypted: bool,
    /// Highest depth at which a finding or a nested descent occurred
    pub max_depth_reached: u32,
    /// Set when the inspection could not complete
    pub read_error: Option<ReadError>,
}

impl ScanResult {
    /// True when the archive was fully read, is not encrypted and produced
    /// no findings.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.read_error.is_none() && !self.top_level_encrypted && self.findings.is_empty()
    }

    /// Comma-separated labels of all findings.
    #[must_use]
    pub fn finding_labels(&self) -> String {
        self.findings
            .iter()
            .map(ArchiveEntry::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}
