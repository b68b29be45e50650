//! Allow/block verdicts
//!
//! [`decide`] combines the blocking mode, the caller's identity, the
//! classification of the requested path and, for archives, the inspection
//! result into a single [`Decision`]. It is pure and total.
//!
//! # Precedence
//!
//! 1. `Disabled` mode allows everything.
//! 2. In `RegularUsersOnly` mode administrators are allowed.
//! 3. A blocked extension blocks.
//! 4. For archives: a budget hit blocks unconditionally, any other read
//!    failure follows the unreadable policy, encryption blocks, findings
//!    block, and a clean result allows. Partial findings next to a read
//!    error never affect the verdict.

use crate::classify::Classification;
use crate::policy::{BlockingMode, Policy, ScanTarget, UnreadablePolicy};
use attachguard_archive::{ArchiveEntry, ReadErrorKind, ScanResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP status suggested for a blocked download.
pub const STATUS_FORBIDDEN: u16 = 403;

/// HTTP status suggested for an allowed download.
pub const STATUS_OK: u16 = 200;

/// Why a download was refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// The requested file's own extension is blocked
    DirectExtension,
    /// The requested archive is password-protected
    EncryptedArchive,
    /// The requested archive contains blocked, encrypted or too-deep entries
    ArchiveContainsBlocked,
    /// The requested archive could not be inspected
    UnreadableArchive,
}

impl BlockReason {
    /// Every reason, in a stable order.
    pub const ALL: [Self; 4] = [
        Self::DirectExtension,
        Self::EncryptedArchive,
        Self::ArchiveContainsBlocked,
        Self::UnreadableArchive,
    ];

    /// Stable machine-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::DirectExtension => "direct_extension",
            Self::EncryptedArchive => "encrypted_archive",
            Self::ArchiveContainsBlocked => "archive_contains_blocked",
            Self::UnreadableArchive => "unreadable_archive",
        }
    }
}

impl fmt::Display for BlockReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Why a download was permitted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllowBasis {
    /// The extension is not on the block-list and no inspection applied
    NotBlocked,
    /// Blocking is switched off
    BlockingDisabled,
    /// The caller is an administrator and the mode exempts them
    AdminBypass,
    /// The archive was inspected and nothing was found
    CleanArchive,
    /// The archive could not be inspected and policy allows it anyway
    UnreadableArchiveAllowed,
}

impl AllowBasis {
    /// Stable machine-readable name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotBlocked => "not_blocked",
            Self::BlockingDisabled => "blocking_disabled",
            Self::AdminBypass => "admin_bypass",
            Self::CleanArchive => "clean_archive",
            Self::UnreadableArchiveAllowed => "unreadable_archive_allowed",
        }
    }

    /// Whether the allow happened without a successful inspection of content
    /// that needed one.
    #[must_use]
    pub const fn is_degraded(self) -> bool {
        matches!(self, Self::UnreadableArchiveAllowed)
    }
}

/// Findings that caused an archive block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockDetail {
    /// Offending entries in traversal order
    pub findings: Vec<ArchiveEntry>,
    /// Highest depth reached by the inspection
    pub depth_reached: u32,
}

impl BlockDetail {
    /// Comma-separated labels of the offending entries.
    #[must_use]
    pub fn blocked_files(&self) -> String {
        self.findings
            .iter()
            .map(ArchiveEntry::label)
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Verdict for one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verdict", rename_all = "snake_case")]
pub enum Decision {
    /// Serve the file
    Allow {
        /// Why serving is permitted
        basis: AllowBasis,
    },
    /// Refuse the file
    Block {
        /// Why it was refused
        reason: BlockReason,
        /// Offending archive entries, for archive blocks with findings
        #[serde(default, skip_serializing_if = "Option::is_none")]
        detail: Option<BlockDetail>,
    },
}

impl Decision {
    #[inline]
    #[must_use]
    pub const fn is_blocked(&self) -> bool {
        matches!(self, Self::Block { .. })
    }

    /// The block reason, if this is a block.
    #[inline]
    #[must_use]
    pub const fn block_reason(&self) -> Option<BlockReason> {
        match self {
            Self::Block { reason, .. } => Some(*reason),
            Self::Allow { .. } => None,
        }
    }

    /// Suggested HTTP status: 403 for blocks, 200 otherwise.
    #[inline]
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        if self.is_blocked() {
            STATUS_FORBIDDEN
        } else {
            STATUS_OK
        }
    }

    const fn allow(basis: AllowBasis) -> Self {
        Self::Allow { basis }
    }

    const fn block(reason: BlockReason) -> Self {
        Self::Block {
            reason,
            detail: None,
        }
    }
}

/// Decide whether `target` may be served.
///
/// `scan` is only consulted for [`Classification::Container`]; a missing
/// result for a container is handled like an unreadable archive.
#[must_use]
pub fn decide(
    target: &ScanTarget,
    classification: Classification,
    scan: Option<&ScanResult>,
    policy: &Policy,
) -> Decision {
    match policy.blocking_mode {
        BlockingMode::Disabled => return Decision::allow(AllowBasis::BlockingDisabled),
        BlockingMode::RegularUsersOnly if target.caller_is_admin => {
            return Decision::allow(AllowBasis::AdminBypass);
        }
        BlockingMode::RegularUsersOnly | BlockingMode::All => {}
    }

    match classification {
        Classification::NotBlocked => Decision::allow(AllowBasis::NotBlocked),
        Classification::DirectlyBlocked => Decision::block(BlockReason::DirectExtension),
        Classification::Container => decide_container(scan, policy),
    }
}

fn decide_container(scan: Option<&ScanResult>, policy: &Policy) -> Decision {
    let Some(scan) = scan else {
        return unreadable(policy);
    };

    if let Some(error) = &scan.read_error {
        return match error.kind {
            ReadErrorKind::BudgetExceeded => Decision::block(BlockReason::UnreadableArchive),
            ReadErrorKind::Unreadable => unreadable(policy),
        };
    }

    if scan.top_level_encrypted {
        return Decision::block(BlockReason::EncryptedArchive);
    }

    if !scan.findings.is_empty() {
        return Decision::Block {
            reason: BlockReason::ArchiveContainsBlocked,
            detail: Some(BlockDetail {
                findings: scan.findings.clone(),
                depth_reached: scan.max_depth_reached,
            }),
        };
    }

    Decision::allow(AllowBasis::CleanArchive)
}

const fn unreadable(policy: &Policy) -> Decision {
    match policy.unreadable_archive_policy {
        UnreadablePolicy::Block => Decision::block(BlockReason::UnreadableArchive),
        UnreadablePolicy::Allow => Decision::allow(AllowBasis::UnreadableArchiveAllowed),
    }
}
