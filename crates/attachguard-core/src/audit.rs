//! Audit trail for blocked downloads and failed inspections
//!
//! Sinks never fail the request: a sink that cannot write logs the problem
//! and drops the event.

use crate::decision::BlockReason;
use crate::error::{GuardError, Result};
use attachguard_archive::{ArchiveEntry, ReadErrorKind};
use chrono::{DateTime, Utc};
use log::{error, warn};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// Something worth recording about one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AuditEvent {
    /// A download was refused
    Blocked {
        /// Why it was refused
        reason: BlockReason,
        /// Requested path
        target: String,
        /// Whether the caller was an administrator
        caller_is_admin: bool,
        /// Final segment of the requested path
        filename: String,
        /// Extension of the requested file, empty when it has none
        extension: String,
        /// Highest nesting depth reached, for archive blocks
        #[serde(default, skip_serializing_if = "Option::is_none")]
        depth_reached: Option<u32>,
        /// Offending entries, for archive blocks
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        findings: Vec<ArchiveEntry>,
    },
    /// An inspection could not complete
    ScanError {
        /// Requested path
        target: String,
        /// Failure category
        kind: ReadErrorKind,
        /// Failure description
        message: String,
        /// Findings collected before the failure
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        partial_findings: Vec<ArchiveEntry>,
        /// Whether the download was served despite the failure
        allowed: bool,
    },
}

impl AuditEvent {
    /// Short name of the event type.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Blocked { .. } => "blocked",
            Self::ScanError { .. } => "scan_error",
        }
    }

    /// Requested path the event refers to.
    #[must_use]
    pub fn target(&self) -> &str {
        match self {
            Self::Blocked { target, .. } | Self::ScanError { target, .. } => target,
        }
    }
}

/// Destination for audit events
pub trait AuditSink: Send + Sync {
    /// Record one event. Must not panic and must not block indefinitely.
    fn record(&self, event: &AuditEvent);
}

/// Writes events to the `log` facade at `warn` level
#[derive(Debug, Clone, Copy, Default)]
pub struct LogAuditSink;

impl AuditSink for LogAuditSink {
    fn record(&self, event: &AuditEvent) {
        match event {
            AuditEvent::Blocked {
                reason,
                target,
                caller_is_admin,
                findings,
                ..
            } => {
                warn!(
                    "Download blocked: reason={reason} target={target} admin={caller_is_admin} findings={}",
                    findings.len()
                );
            }
            AuditEvent::ScanError {
                target,
                kind,
                message,
                allowed,
                ..
            } => {
                warn!(
                    "Archive scan failed: target={target} kind={kind:?} allowed={allowed}: {message}"
                );
            }
        }
    }
}

/// One line of a JSON-lines audit file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditRecord {
    /// When the event was recorded
    pub timestamp: DateTime<Utc>,
    /// The event itself
    #[serde(flatten)]
    pub event: AuditEvent,
}

/// Appends events as JSON lines to a file
#[derive(Debug)]
pub struct JsonLinesAuditSink {
    path: PathBuf,
    file: Mutex<File>,
}

impl JsonLinesAuditSink {
    /// Open `path` for appending, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `GuardError::Audit` if the file cannot be opened.
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| GuardError::Audit(format!("cannot open {}: {e}", path.display())))?;
        Ok(Self {
            path: path.to_path_buf(),
            file: Mutex::new(file),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, event: &AuditEvent) -> std::io::Result<()> {
        let record = AuditRecord {
            timestamp: Utc::now(),
            event: event.clone(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');
        let mut file = self.file.lock().unwrap_or_else(PoisonError::into_inner);
        file.write_all(line.as_bytes())?;
        file.flush()
    }
}

impl AuditSink for JsonLinesAuditSink {
    fn record(&self, event: &AuditEvent) {
        if let Err(e) = self.write(event) {
            error!(
                "Failed to write audit event to {}: {e}",
                self.path.display()
            );
        }
    }
}

/// Keeps events in memory; useful for tests and embedding
#[derive(Debug, Default)]
pub struct MemoryAuditSink {
    events: Mutex<Vec<AuditEvent>>,
}

impl MemoryAuditSink {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all recorded events, oldest first.
    #[must_use]
    pub fn events(&self) -> Vec<AuditEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, event: &AuditEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event.clone());
    }
}
