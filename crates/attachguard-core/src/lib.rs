//! Download policy decisions for attachments
//!
//! This crate decides whether a requested file may be served. The decision
//! combines an extension block-list, a site-wide blocking mode, the caller's
//! identity and, for archives, a bounded inspection of their contents done
//! by [`attachguard_archive`].
//!
//! # Pipeline
//!
//! 1. [`classify`] looks at the requested path's extension
//! 2. Archives are inspected with [`ArchiveInspector`] when scanning is on
//! 3. [`decide`] turns everything into a [`Decision`]
//! 4. [`MessageRenderer`] produces the escaped message for blocks
//! 5. [`AuditSink`]s receive an event for every block and scan failure
//!
//! [`Guard`] runs all of these for one request.
//!
//! # Usage
//!
//! ```
//! use attachguard_core::{Guard, Policy, ScanTarget};
//!
//! let guard = Guard::new(Policy::default());
//! let evaluation = guard.evaluate_bytes(&ScanTarget::new("downloads/setup.exe"), b"MZ");
//! assert_eq!(evaluation.status_code, 403);
//! println!("{}", evaluation.message.unwrap_or_default());
//! ```

pub mod audit;
pub mod classify;
pub mod decision;
pub mod error;
pub mod guard;
pub mod page;
pub mod policy;
pub mod render;
pub mod settings;

pub use attachguard_archive::{
    ArchiveEntry, ArchiveInspector, FindingReason, ReadError, ReadErrorKind, ScanLimits,
    ScanResult,
};
pub use audit::{
    AuditEvent, AuditRecord, AuditSink, JsonLinesAuditSink, LogAuditSink, MemoryAuditSink,
};
pub use classify::{classify, Classification};
pub use decision::{decide, AllowBasis, BlockDetail, BlockReason, Decision};
pub use error::{GuardError, Result};
pub use guard::{Evaluation, Guard};
pub use page::PageSettings;
pub use policy::{BlockingMode, Policy, ScanTarget, UnreadablePolicy};
pub use render::{
    escape_html, render_template, MessageRenderer, MessageTemplates, RenderContext, RenderStyle,
};
pub use settings::{ExtensionList, Settings};
