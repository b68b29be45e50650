//! Work budget for a single inspection.
//!
//! Depth alone does not bound total work: a shallow archive can still hold
//! millions of entries or a nested member that inflates to gigabytes. The
//! budget is charged across the whole traversal (all nesting levels share
//! it) and every exhaustion aborts the inspection.
//!
//! # Invariants
//! - Counters are saturating; an overflow is a budget hit.
//! - The deadline is checked once per entry, never inside a copy loop.
//! - A container index is admitted only if all of its entries still fit,
//!   before anything walks it.

use crate::error::ArchiveError;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Default maximum number of index entries visited per inspection.
pub const DEFAULT_MAX_ENTRIES: u64 = 10_000;

/// Default maximum bytes written to scratch space per inspection (256 MiB).
pub const DEFAULT_MAX_EXTRACTED_BYTES: u64 = 256 * 1024 * 1024;

/// Default wall-clock budget per inspection.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_secs(30);

/// Hard limits for one inspection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanLimits {
    /// Maximum number of entries visited across all nesting levels
    pub max_entries: u64,
    /// Maximum decompressed bytes extracted for nested archives
    pub max_extracted_bytes: u64,
    /// Wall-clock budget, `None` for unbounded
    pub time_budget: Option<Duration>,
}

impl Default for ScanLimits {
    #[inline]
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            time_budget: Some(DEFAULT_TIME_BUDGET),
        }
    }
}

impl ScanLimits {
    /// Limits that never trigger. Intended for tests and offline tooling.
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_entries: u64::MAX,
            max_extracted_bytes: u64::MAX,
            time_budget: None,
        }
    }
}

/// Running counters charged against [`ScanLimits`]
#[derive(Debug)]
pub(crate) struct ScanBudget {
    limits: ScanLimits,
    deadline: Option<Instant>,
    entries: u64,
    extracted_bytes: u64,
}

impl ScanBudget {
    pub(crate) fn start(limits: ScanLimits) -> Self {
        let deadline = limits
            .time_budget
            .and_then(|budget| Instant::now().checked_add(budget));
        Self {
            limits,
            deadline,
            entries: 0,
            extracted_bytes: 0,
        }
    }

    /// Charge one visited entry and check the deadline.
    pub(crate) fn charge_entry(&mut self) -> Result<(), ArchiveError> {
        self.entries = self.entries.saturating_add(1);
        if self.entries > self.limits.max_entries {
            return Err(ArchiveError::BudgetExceeded {
                what: "entry count",
            });
        }
        self.check_deadline()
    }

    /// Check that an index of `count` entries fits in the remaining entry
    /// budget, without charging anything.
    pub(crate) fn admit_index(&self, count: usize) -> Result<(), ArchiveError> {
        let count = u64::try_from(count).unwrap_or(u64::MAX);
        if self.entries.saturating_add(count) > self.limits.max_entries {
            return Err(ArchiveError::BudgetExceeded {
                what: "entry count",
            });
        }
        self.check_deadline()
    }

    fn check_deadline(&self) -> Result<(), ArchiveError> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => {
                Err(ArchiveError::BudgetExceeded { what: "time" })
            }
            _ => Ok(()),
        }
    }

    /// Bytes that may still be extracted.
    #[inline]
    pub(crate) fn remaining_bytes(&self) -> u64 {
        self.limits
            .max_extracted_bytes
            .saturating_sub(self.extracted_bytes)
    }

    /// Record bytes written by an extraction that stayed within
    /// [`Self::remaining_bytes`].
    #[inline]
    pub(crate) fn charge_bytes(&mut self, bytes: u64) {
        self.extracted_bytes = self.extracted_bytes.saturating_add(bytes);
    }

    #[cfg(test)]
    pub(crate) const fn entries(&self) -> u64 {
        self.entries
    }
}
