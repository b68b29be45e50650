//! Operator-facing configuration
//!
//! [`Settings`] is the deserialized form of the configuration file. It is
//! lenient where operators commonly slip (extension lists may be a comma
//! string or an array, unknown modes fall back to the strict choice) and is
//! turned into a fresh [`Policy`] on every call to [`Settings::policy`].

use crate::audit::{AuditSink, JsonLinesAuditSink, LogAuditSink};
use crate::error::{GuardError, Result};
use crate::page::PageSettings;
use crate::policy::{
    normalize_all, BlockingMode, Policy, UnreadablePolicy, DEFAULT_ARCHIVE_EXTENSIONS,
    DEFAULT_BLOCKED_EXTENSIONS,
};
use crate::render::MessageTemplates;
use attachguard_archive::budget::{
    DEFAULT_MAX_ENTRIES, DEFAULT_MAX_EXTRACTED_BYTES, DEFAULT_TIME_BUDGET,
};
use attachguard_archive::{ScanLimits, DEFAULT_MAX_NESTING_DEPTH, MAX_NESTING_DEPTH_LIMIT};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A list of extensions, written either as `"exe, js"` or `["exe", "js"]`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ExtensionList {
    /// Comma-separated string
    Csv(String),
    /// Array of strings
    List(Vec<String>),
}

impl ExtensionList {
    fn from_defaults(defaults: &[&str]) -> Self {
        Self::Csv(defaults.join(","))
    }

    /// Raw entries before normalization.
    #[must_use]
    pub fn entries(&self) -> Vec<&str> {
        match self {
            Self::Csv(csv) => csv.split(',').collect(),
            Self::List(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

/// Work limits as written in configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LimitSettings {
    /// Maximum entries visited per inspection
    pub max_entries: u64,
    /// Maximum bytes extracted for nested archives per inspection
    pub max_extracted_bytes: u64,
    /// Wall-clock budget in seconds; 0 disables the deadline
    pub time_budget_secs: u64,
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            max_entries: DEFAULT_MAX_ENTRIES,
            max_extracted_bytes: DEFAULT_MAX_EXTRACTED_BYTES,
            time_budget_secs: DEFAULT_TIME_BUDGET.as_secs(),
        }
    }
}

impl From<LimitSettings> for ScanLimits {
    fn from(limits: LimitSettings) -> Self {
        Self {
            max_entries: limits.max_entries,
            max_extracted_bytes: limits.max_extracted_bytes,
            time_budget: (limits.time_budget_secs > 0)
                .then(|| Duration::from_secs(limits.time_budget_secs)),
        }
    }
}

/// Audit destinations
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuditSettings {
    /// JSON-lines file receiving every event, in addition to the log
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_file: Option<PathBuf>,
}

/// Complete operator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Extensions that are never served
    pub blocked_extensions: ExtensionList,
    /// `all`, `regular` or `disabled`
    pub blocking_mode: BlockingMode,
    /// Whether archives are inspected
    pub archive_scan_enabled: bool,
    /// Extensions treated as archives
    pub archive_extensions: ExtensionList,
    /// Deepest nesting level still extracted
    pub max_nesting_depth: u32,
    /// `block` or `allow`
    pub unreadable_archives_mode: UnreadablePolicy,
    /// Inspection work limits
    pub limits: LimitSettings,
    /// Message template overrides
    pub messages: MessageTemplates,
    /// Block page appearance
    pub page: PageSettings,
    /// Audit destinations
    pub audit: AuditSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            blocked_extensions: ExtensionList::from_defaults(DEFAULT_BLOCKED_EXTENSIONS),
            blocking_mode: BlockingMode::All,
            archive_scan_enabled: false,
            archive_extensions: ExtensionList::from_defaults(DEFAULT_ARCHIVE_EXTENSIONS),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            unreadable_archives_mode: UnreadablePolicy::Block,
            limits: LimitSettings::default(),
            messages: MessageTemplates::default(),
            page: PageSettings::default(),
            audit: AuditSettings::default(),
        }
    }
}

impl Settings {
    /// Build the decision policy described by these settings.
    ///
    /// A depth bound above [`MAX_NESTING_DEPTH_LIMIT`] is clamped.
    #[must_use]
    pub fn policy(&self) -> Policy {
        let max_nesting_depth = if self.max_nesting_depth > MAX_NESTING_DEPTH_LIMIT {
            warn!(
                "max_nesting_depth {} exceeds limit {MAX_NESTING_DEPTH_LIMIT}, clamping",
                self.max_nesting_depth
            );
            MAX_NESTING_DEPTH_LIMIT
        } else {
            self.max_nesting_depth
        };

        Policy {
            blocked_extensions: normalize_all(self.blocked_extensions.entries()),
            blocking_mode: self.blocking_mode,
            archive_scanning_enabled: self.archive_scan_enabled,
            archive_extensions: normalize_all(self.archive_extensions.entries()),
            max_nesting_depth,
            unreadable_archive_policy: self.unreadable_archives_mode,
            scan_limits: self.limits.into(),
        }
    }

    /// Audit sinks described by these settings: always the log sink, plus
    /// the JSON-lines file when configured.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Audit` if the audit file cannot be opened.
    pub fn audit_sinks(&self) -> Result<Vec<Arc<dyn AuditSink>>> {
        let mut sinks: Vec<Arc<dyn AuditSink>> = vec![Arc::new(LogAuditSink)];
        if let Some(path) = &self.audit.log_file {
            sinks.push(Arc::new(JsonLinesAuditSink::open(path)?));
        }
        Ok(sinks)
    }

    /// Check settings that deserialize fine but cannot work.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Settings` describing the first problem found.
    pub fn validate(&self) -> Result<()> {
        if self.archive_scan_enabled && self.policy().archive_extensions.is_empty() {
            return Err(GuardError::Settings(
                "archive_scan_enabled is set but archive_extensions is empty".to_string(),
            ));
        }
        if self.limits.max_entries == 0 {
            return Err(GuardError::Settings(
                "limits.max_entries must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}
