//! Bounded recursive inspection of ZIP containers
//!
//! The inspector walks an archive depth-first, records entries whose
//! extension is blocked, and descends into nested archives until the
//! configured depth bound. Nested archives are extracted into a scratch
//! directory that is private to one inspection; each extraction is deleted
//! as soon as its subtree has been walked, and the directory itself is
//! removed before the inspector returns.
//!
//! [`ArchiveInspector::inspect_path`] and friends are total: every failure,
//! including a panic inside the ZIP parser, comes back as
//! [`ScanResult::read_error`].

use crate::budget::{ScanBudget, ScanLimits};
use crate::container::{Container, EntryInfo, ZipContainer};
use crate::error::ArchiveError;
use crate::extension::{extension_of, file_name, normalize_extension};
use crate::result::{ArchiveEntry, FindingReason, ReadError, ReadErrorKind, ScanResult};
use crate::MAX_NESTING_DEPTH_LIMIT;
use log::{debug, warn};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of the per-inspection scratch directory.
pub const SCRATCH_PREFIX: &str = "attachguard-";

/// The parts of a download policy the inspector needs.
pub trait ContentPolicy {
    /// Whether an entry with this (lowercase) extension is blocked.
    fn is_blocked_extension(&self, extension: &str) -> bool;

    /// Whether an entry with this (lowercase) extension is a nested archive.
    fn is_archive_extension(&self, extension: &str) -> bool;

    /// Deepest nesting level that is still opened; 0 scans only the
    /// requested archive. The inspector never goes deeper than
    /// [`MAX_NESTING_DEPTH_LIMIT`].
    fn max_nesting_depth(&self) -> u32;

    /// Work limits for one inspection.
    fn scan_limits(&self) -> ScanLimits {
        ScanLimits::default()
    }
}

/// Standalone [`ContentPolicy`] for callers that only need the inspector
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InspectOptions {
    /// Blocked extensions, lowercase without leading dot
    pub blocked_extensions: BTreeSet<String>,
    /// Extensions treated as nested archives
    pub archive_extensions: BTreeSet<String>,
    /// Depth bound for nested archives
    pub max_nesting_depth: u32,
    /// Work limits
    pub limits: ScanLimits,
}

impl InspectOptions {
    /// Build options from raw extension lists, normalizing each entry.
    /// The depth bound is clamped to [`MAX_NESTING_DEPTH_LIMIT`].
    #[must_use]
    pub fn new<I, J, S, T>(blocked: I, archives: J, max_nesting_depth: u32) -> Self
    where
        I: IntoIterator<Item = S>,
        J: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Self {
            blocked_extensions: blocked
                .into_iter()
                .filter_map(|e| normalize_extension(e.as_ref()))
                .collect(),
            archive_extensions: archives
                .into_iter()
                .filter_map(|e| normalize_extension(e.as_ref()))
                .collect(),
            max_nesting_depth: max_nesting_depth.min(MAX_NESTING_DEPTH_LIMIT),
            limits: ScanLimits::default(),
        }
    }

    /// Replace the work limits.
    #[must_use]
    pub const fn with_limits(mut self, limits: ScanLimits) -> Self {
        self.limits = limits;
        self
    }
}

impl ContentPolicy for InspectOptions {
    fn is_blocked_extension(&self, extension: &str) -> bool {
        self.blocked_extensions.contains(extension)
    }

    fn is_archive_extension(&self, extension: &str) -> bool {
        self.archive_extensions.contains(extension)
    }

    fn max_nesting_depth(&self) -> u32 {
        self.max_nesting_depth
    }

    fn scan_limits(&self) -> ScanLimits {
        self.limits
    }
}

/// Inspects ZIP containers for blocked content
///
/// The inspector holds no per-scan state and can be shared between threads;
/// every call gets its own uniquely named scratch directory.
#[derive(Debug, Clone, Default)]
pub struct ArchiveInspector {
    scratch_root: Option<PathBuf>,
}

impl ArchiveInspector {
    /// Inspector that extracts nested archives under the system temp dir.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { scratch_root: None }
    }

    /// Inspector that extracts nested archives under `root`.
    #[must_use]
    pub fn with_scratch_root(root: impl Into<PathBuf>) -> Self {
        Self {
            scratch_root: Some(root.into()),
        }
    }

    /// Directory under which scratch directories are created, if overridden.
    #[inline]
    #[must_use]
    pub fn scratch_root(&self) -> Option<&Path> {
        self.scratch_root.as_deref()
    }

    /// Inspect the archive stored at `path`.
    pub fn inspect_path<P: ContentPolicy + ?Sized>(&self, path: &Path, policy: &P) -> ScanResult {
        match File::open(path) {
            Ok(file) => self.inspect_reader(BufReader::new(file), policy),
            Err(err) => failed(ReadError::unreadable(format!("cannot open archive: {err}"))),
        }
    }

    /// Inspect an archive held in memory.
    pub fn inspect_bytes<P: ContentPolicy + ?Sized>(&self, bytes: &[u8], policy: &P) -> ScanResult {
        self.inspect_reader(Cursor::new(bytes), policy)
    }

    /// Inspect an archive read from any seekable stream.
    pub fn inspect_reader<R, P>(&self, reader: R, policy: &P) -> ScanResult
    where
        R: Read + Seek,
        P: ContentPolicy + ?Sized,
    {
        let outcome = catch_unwind(AssertUnwindSafe(|| match ZipContainer::new(reader) {
            Ok(mut container) => self.inspect_container(&mut container, policy),
            Err(err) => failed(ReadError::unreadable(format!("cannot open archive: {err}"))),
        }));
        outcome.unwrap_or_else(|_| {
            warn!("Archive parser panicked; treating archive as unreadable");
            failed(ReadError::unreadable("internal error while reading archive"))
        })
    }

    /// Inspect an already opened container.
    pub fn inspect_container<C, P>(&self, container: &mut C, policy: &P) -> ScanResult
    where
        C: Container,
        P: ContentPolicy + ?Sized,
    {
        let budget = ScanBudget::start(policy.scan_limits());
        if let Err(err) = budget.admit_index(container.entry_count()) {
            return failed(read_error(&err));
        }
        match container.any_encrypted() {
            Ok(true) => {
                return ScanResult {
                    top_level_encrypted: true,
                    ..ScanResult::default()
                };
            }
            Ok(false) => {}
            Err(err) => return failed(read_error(&err)),
        }

        let mut walk = Traversal {
            policy,
            max_depth: policy.max_nesting_depth().min(MAX_NESTING_DEPTH_LIMIT),
            scratch_root: self.scratch_root.as_deref(),
            workspace: None,
            budget,
            chain: Vec::new(),
            findings: Vec::new(),
            max_depth_reached: 0,
        };
        let outcome = walk.scan_level(container, 0);
        let cleanup = walk.release_workspace();

        let read_error = match (outcome, cleanup) {
            (Err(err), _) | (Ok(()), Err(err)) => Some(read_error(&err)),
            (Ok(()), Ok(())) => None,
        };
        if let Some(err) = &read_error {
            debug!(
                "Inspection aborted after {} finding(s): {}",
                walk.findings.len(),
                err.message
            );
        }

        ScanResult {
            findings: walk.findings,
            top_level_encrypted: false,
            max_depth_reached: walk.max_depth_reached,
            read_error,
        }
    }
}

fn failed(error: ReadError) -> ScanResult {
    ScanResult {
        read_error: Some(error),
        ..ScanResult::default()
    }
}

fn read_error(err: &ArchiveError) -> ReadError {
    let kind = if err.is_budget() {
        ReadErrorKind::BudgetExceeded
    } else {
        ReadErrorKind::Unreadable
    };
    let message = match err {
        // Keep OS paths out of the message so results stay comparable.
        ArchiveError::Io(io) => format!("IO error: {}", io.kind()),
        other => other.to_string(),
    };
    ReadError { kind, message }
}

fn scratch_error(action: &str, err: &std::io::Error) -> ArchiveError {
    ArchiveError::Scratch(format!("cannot {action}: {}", err.kind()))
}

/// State of one depth-first walk
struct Traversal<'a, P: ?Sized> {
    policy: &'a P,
    max_depth: u32,
    scratch_root: Option<&'a Path>,
    workspace: Option<TempDir>,
    budget: ScanBudget,
    chain: Vec<String>,
    findings: Vec<ArchiveEntry>,
    max_depth_reached: u32,
}

impl<P: ContentPolicy + ?Sized> Traversal<'_, P> {
    fn scan_level<C: Container>(
        &mut self,
        container: &mut C,
        depth: u32,
    ) -> Result<(), ArchiveError> {
        for index in 0..container.entry_count() {
            self.budget.charge_entry()?;
            let entry = container.entry(index)?;
            if entry.is_dir {
                continue;
            }
            let Some(extension) = extension_of(&entry.name) else {
                continue;
            };

            if self.policy.is_blocked_extension(&extension) {
                self.record(&entry, depth, FindingReason::BlockedExtension);
            }

            if self.policy.is_archive_extension(&extension) {
                if depth >= self.max_depth {
                    self.record(&entry, depth, FindingReason::NestingLimitExceeded);
                } else {
                    self.descend(container, index, &entry, depth)?;
                }
            }
        }
        Ok(())
    }

    /// Extract a nested archive to scratch space, walk it, delete it.
    fn descend<C: Container>(
        &mut self,
        container: &mut C,
        index: usize,
        entry: &EntryInfo,
        depth: u32,
    ) -> Result<(), ArchiveError> {
        // The declared size may lie; extraction still enforces the limit.
        if entry.size > self.budget.remaining_bytes() {
            return Err(ArchiveError::BudgetExceeded {
                what: "extracted bytes",
            });
        }
        let dir = self.workspace_dir()?;
        let mut scratch = tempfile::Builder::new()
            .prefix("nested-")
            .suffix(".zip")
            .tempfile_in(&dir)
            .map_err(|e| scratch_error("create scratch file", &e))?;

        let outcome = self.scan_extracted(container, index, entry, depth, scratch.as_file_mut());
        let cleanup = scratch
            .close()
            .map_err(|e| scratch_error("remove scratch file", &e));
        outcome?;
        cleanup
    }

    fn scan_extracted<C: Container>(
        &mut self,
        container: &mut C,
        index: usize,
        entry: &EntryInfo,
        depth: u32,
        file: &mut File,
    ) -> Result<(), ArchiveError> {
        let written = container.extract(index, file, self.budget.remaining_bytes())?;
        self.budget.charge_bytes(written);
        debug!(
            "Extracted nested archive {} ({written} bytes) at depth {depth}",
            entry.name
        );

        file.rewind()?;
        let mut nested = ZipContainer::new(BufReader::new(file))?;
        self.budget.admit_index(nested.entry_count())?;
        if nested.any_encrypted()? {
            self.record(entry, depth, FindingReason::EncryptedNested);
            return Ok(());
        }

        let next = depth + 1;
        self.max_depth_reached = self.max_depth_reached.max(next);
        self.chain.push(entry.name.clone());
        let outcome = self.scan_level(&mut nested, next);
        self.chain.pop();
        outcome
    }

    fn record(&mut self, entry: &EntryInfo, depth: u32, reason: FindingReason) {
        self.max_depth_reached = self.max_depth_reached.max(depth);
        self.findings.push(ArchiveEntry {
            name: file_name(&entry.name).to_string(),
            relative_path: entry.name.clone(),
            depth,
            reason,
            archive_chain: self.chain.clone(),
        });
    }

    /// Scratch directory for this inspection, created on first use.
    fn workspace_dir(&mut self) -> Result<PathBuf, ArchiveError> {
        if let Some(workspace) = &self.workspace {
            return Ok(workspace.path().to_path_buf());
        }
        let mut builder = tempfile::Builder::new();
        builder.prefix(SCRATCH_PREFIX);
        let created = match self.scratch_root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        };
        let workspace = created.map_err(|e| scratch_error("create scratch directory", &e))?;
        let path = workspace.path().to_path_buf();
        self.workspace = Some(workspace);
        Ok(path)
    }

    fn release_workspace(&mut self) -> Result<(), ArchiveError> {
        match self.workspace.take() {
            Some(workspace) => workspace
                .close()
                .map_err(|e| scratch_error("remove scratch directory", &e)),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::{encrypt_flags, nested_chain, ZipBuilder};
    use std::fs;
    use std::io::Write;
    use std::thread;

    fn options(depth: u32) -> InspectOptions {
        InspectOptions::new(["exe", "php", "js"], ["zip"], depth)
            .with_limits(ScanLimits::unlimited())
    }

    /// Index-only container that counts how it is accessed
    #[derive(Default)]
    struct IndexOnly {
        entries: Vec<EntryInfo>,
        reads: usize,
        extracts: usize,
    }

    impl Container for IndexOnly {
        fn entry_count(&self) -> usize {
            self.entries.len()
        }

        fn entry(&mut self, index: usize) -> Result<EntryInfo, ArchiveError> {
            self.reads += 1;
            Ok(self.entries[index].clone())
        }

        fn extract(
            &mut self,
            _index: usize,
            _sink: &mut dyn Write,
            _limit: u64,
        ) -> Result<u64, ArchiveError> {
            self.extracts += 1;
            Ok(0)
        }
    }

    fn scratch_entries(root: &Path) -> Vec<PathBuf> {
        let mut entries: Vec<PathBuf> = fs::read_dir(root)
            .expect("read scratch root")
            .map(|e| e.expect("dir entry").path())
            .collect();
        entries.sort();
        entries
    }

    #[test]
    fn test_clean_archive() {
        let bytes = ZipBuilder::new()
            .dir("docs/")
            .file("docs/report.pdf", b"%PDF")
            .file("notes.txt", b"hello")
            .build();
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(1));
        assert!(result.is_clean(), "unexpected result: {result:?}");
        assert_eq!(result.max_depth_reached, 0);
    }

    #[test]
    fn test_blocked_entries_at_top_level() {
        let bytes = ZipBuilder::new()
            .file("readme.txt", b"hi")
            .file("bin/Setup.EXE", b"MZ")
            .file("web/index.php", b"<?php")
            .build();
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(1));

        assert!(result.read_error.is_none());
        assert_eq!(result.findings.len(), 2);
        assert_eq!(result.findings[0].name, "Setup.EXE");
        assert_eq!(result.findings[0].relative_path, "bin/Setup.EXE");
        assert_eq!(result.findings[0].depth, 0);
        assert_eq!(result.findings[0].reason, FindingReason::BlockedExtension);
        assert_eq!(result.findings[1].name, "index.php");
    }

    #[test]
    fn test_blocked_file_at_level_one() {
        let bytes = nested_chain(1, ("evil.exe", b"MZ"));
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(1));

        assert!(result.read_error.is_none());
        assert_eq!(result.findings.len(), 1);
        let finding = &result.findings[0];
        assert_eq!(finding.reason, FindingReason::BlockedExtension);
        assert_eq!(finding.depth, 1);
        assert_eq!(finding.archive_chain, vec!["level1.zip".to_string()]);
        assert_eq!(finding.location(), "level1.zip!/evil.exe");
        assert_eq!(result.max_depth_reached, 1);
    }

    #[test]
    fn test_depth_bound_stops_before_deep_content() {
        let bytes = nested_chain(3, ("evil.exe", b"MZ"));
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(1));

        assert!(result.read_error.is_none());
        assert_eq!(result.findings.len(), 1);
        let finding = &result.findings[0];
        assert_eq!(finding.reason, FindingReason::NestingLimitExceeded);
        assert_eq!(finding.depth, 1);
        assert_eq!(finding.name, "level2.zip");
        assert!(!result
            .findings
            .iter()
            .any(|f| f.reason == FindingReason::BlockedExtension));
    }

    #[test]
    fn test_depth_zero_never_extracts() {
        let root = tempfile::tempdir().expect("scratch root");
        let inspector = ArchiveInspector::with_scratch_root(root.path());
        let bytes = nested_chain(1, ("evil.exe", b"MZ"));
        let result = inspector.inspect_bytes(&bytes, &options(0));

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].reason, FindingReason::NestingLimitExceeded);
        assert_eq!(result.findings[0].depth, 0);
        assert!(scratch_entries(root.path()).is_empty());
    }

    #[test]
    fn test_deep_chain_stops_at_depth_limit() {
        let bytes = nested_chain(400, ("evil.exe", b"MZ"));
        let policy = InspectOptions {
            max_nesting_depth: 5000,
            limits: ScanLimits::default(),
            ..options(1)
        };
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &policy);

        assert!(result.read_error.is_none(), "{result:?}");
        assert_eq!(result.findings.len(), 1);
        let finding = &result.findings[0];
        assert_eq!(finding.reason, FindingReason::NestingLimitExceeded);
        assert_eq!(finding.depth, MAX_NESTING_DEPTH_LIMIT);
        assert_eq!(finding.name, "level11.zip");
        assert_eq!(result.max_depth_reached, MAX_NESTING_DEPTH_LIMIT);
    }

    #[test]
    fn test_declared_size_over_budget_is_not_extracted() {
        let root = tempfile::tempdir().expect("scratch root");
        let mut container = IndexOnly {
            entries: vec![EntryInfo {
                name: "huge.zip".to_string(),
                size: 1 << 40,
                ..EntryInfo::default()
            }],
            ..IndexOnly::default()
        };
        let policy = options(1).with_limits(ScanLimits {
            max_extracted_bytes: 1024,
            ..ScanLimits::unlimited()
        });
        let result = ArchiveInspector::with_scratch_root(root.path())
            .inspect_container(&mut container, &policy);

        assert_eq!(
            result.read_error.map(|e| e.kind),
            Some(ReadErrorKind::BudgetExceeded)
        );
        assert_eq!(container.extracts, 0);
        assert!(scratch_entries(root.path()).is_empty());
    }

    #[test]
    fn test_oversized_index_rejected_before_walk() {
        let mut container = IndexOnly {
            entries: (0..50)
                .map(|i| EntryInfo {
                    name: format!("f{i}.txt"),
                    ..EntryInfo::default()
                })
                .collect(),
            ..IndexOnly::default()
        };
        let policy = options(1).with_limits(ScanLimits {
            max_entries: 10,
            ..ScanLimits::unlimited()
        });
        let result = ArchiveInspector::new().inspect_container(&mut container, &policy);

        assert_eq!(
            result.read_error.map(|e| e.kind),
            Some(ReadErrorKind::BudgetExceeded)
        );
        assert_eq!(container.reads, 0);
    }

    #[test]
    fn test_top_level_encrypted() {
        let bytes = encrypt_flags(
            ZipBuilder::new()
                .stored()
                .file("payload.exe", b"MZ")
                .build(),
        );
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(1));

        assert!(result.top_level_encrypted);
        assert!(result.findings.is_empty());
        assert!(result.read_error.is_none());
    }

    #[test]
    fn test_encrypted_nested_not_descended() {
        let inner = encrypt_flags(
            ZipBuilder::new()
                .stored()
                .file("payload.exe", b"MZ")
                .build(),
        );
        let bytes = ZipBuilder::new()
            .file("notes.txt", b"hello")
            .file("secret.zip", &inner)
            .build();
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &options(2));

        assert!(!result.top_level_encrypted);
        assert!(result.read_error.is_none());
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].reason, FindingReason::EncryptedNested);
        assert_eq!(result.findings[0].name, "secret.zip");
        assert_eq!(result.findings[0].depth, 0);
        assert_eq!(result.findings[0].label(), "secret.zip (encrypted)");
    }

    #[test]
    fn test_unreadable_top_level() {
        let result =
            ArchiveInspector::new().inspect_bytes(b"PK\x03\x04 truncated garbage", &options(1));
        let err = result.read_error.expect("read error");
        assert_eq!(err.kind, ReadErrorKind::Unreadable);
        assert!(err.message.starts_with("cannot open archive"));
        assert!(result.findings.is_empty());
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let result =
            ArchiveInspector::new().inspect_path(Path::new("no/such/file.zip"), &options(1));
        assert_eq!(
            result.read_error.map(|e| e.kind),
            Some(ReadErrorKind::Unreadable)
        );
    }

    #[test]
    fn test_corrupted_nested_aborts_whole_scan() {
        let bytes = ZipBuilder::new()
            .file("first.exe", b"MZ")
            .file("broken.zip", b"this is not a zip archive")
            .file("later.exe", b"MZ")
            .build();
        let root = tempfile::tempdir().expect("scratch root");
        let result =
            ArchiveInspector::with_scratch_root(root.path()).inspect_bytes(&bytes, &options(1));

        let err = result.read_error.as_ref().expect("read error");
        assert_eq!(err.kind, ReadErrorKind::Unreadable);
        // Partial findings stop at the failure point.
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].name, "first.exe");
        assert!(scratch_entries(root.path()).is_empty());
    }

    #[test]
    fn test_entry_budget() {
        let bytes = ZipBuilder::new()
            .file("a.txt", b"1")
            .file("b.txt", b"2")
            .file("c.txt", b"3")
            .build();
        let policy = options(1).with_limits(ScanLimits {
            max_entries: 2,
            ..ScanLimits::unlimited()
        });
        let result = ArchiveInspector::new().inspect_bytes(&bytes, &policy);
        assert_eq!(
            result.read_error.map(|e| e.kind),
            Some(ReadErrorKind::BudgetExceeded)
        );
    }

    #[test]
    fn test_extracted_bytes_budget() {
        let bytes = nested_chain(1, ("big.txt", &[b'a'; 4096]));
        let root = tempfile::tempdir().expect("scratch root");
        let policy = options(2).with_limits(ScanLimits {
            max_extracted_bytes: 64,
            ..ScanLimits::unlimited()
        });
        let result =
            ArchiveInspector::with_scratch_root(root.path()).inspect_bytes(&bytes, &policy);

        assert_eq!(
            result.read_error.map(|e| e.kind),
            Some(ReadErrorKind::BudgetExceeded)
        );
        assert!(scratch_entries(root.path()).is_empty());
    }

    #[test]
    fn test_scratch_cleaned_after_success() {
        let root = tempfile::tempdir().expect("scratch root");
        let inspector = ArchiveInspector::with_scratch_root(root.path());
        let before = scratch_entries(root.path());

        let bytes = nested_chain(2, ("evil.exe", b"MZ"));
        let result = inspector.inspect_bytes(&bytes, &options(2));

        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].depth, 2);
        assert_eq!(scratch_entries(root.path()), before);
    }

    #[test]
    fn test_inspection_is_deterministic() {
        let inner = ZipBuilder::new()
            .file("x.js", b"alert(1)")
            .file("deeper.zip", &nested_chain(1, ("y.php", b"<?php")))
            .build();
        let bytes = ZipBuilder::new()
            .file("a.exe", b"MZ")
            .file("inner.zip", &inner)
            .build();
        let inspector = ArchiveInspector::new();
        let policy = options(1);

        let first = inspector.inspect_bytes(&bytes, &policy);
        let second = inspector.inspect_bytes(&bytes, &policy);
        assert_eq!(first, second);
        assert_eq!(first.findings.len(), 3);
    }

    #[test]
    fn test_concurrent_inspections_do_not_collide() {
        let root = tempfile::tempdir().expect("scratch root");
        let inspector = ArchiveInspector::with_scratch_root(root.path());
        let bytes = nested_chain(2, ("evil.exe", b"MZ"));
        let policy = options(2);

        thread::scope(|scope| {
            let handles: Vec<_> = (0..8)
                .map(|_| scope.spawn(|| inspector.inspect_bytes(&bytes, &policy)))
                .collect();
            for handle in handles {
                let result = handle.join().expect("worker thread");
                assert!(result.read_error.is_none(), "{result:?}");
                assert_eq!(result.findings.len(), 1);
            }
        });
        assert!(scratch_entries(root.path()).is_empty());
    }

    #[test]
    fn test_inspect_path() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("upload.zip");
        fs::write(&path, nested_chain(1, ("run.js", b"1"))).expect("write archive");

        let result = ArchiveInspector::new().inspect_path(&path, &options(1));
        assert_eq!(result.findings.len(), 1);
        assert_eq!(result.findings[0].name, "run.js");
    }

    #[test]
    fn test_options_normalize_extensions() {
        let options = InspectOptions::new([" .EXE", "", "Js"], ["ZIP"], 1);
        assert!(options.is_blocked_extension("exe"));
        assert!(options.is_blocked_extension("js"));
        assert_eq!(options.blocked_extensions.len(), 2);
        assert!(options.is_archive_extension("zip"));
    }

    #[test]
    fn test_options_clamp_depth() {
        let options = InspectOptions::new(["exe"], ["zip"], 5000);
        assert_eq!(options.max_nesting_depth, MAX_NESTING_DEPTH_LIMIT);
    }
}
