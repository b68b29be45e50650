//! Per-request pipeline: classify, inspect, decide, render, audit

use crate::audit::{AuditEvent, AuditSink};
use crate::classify::{classify, Classification};
use crate::decision::{decide, Decision};
use crate::error::Result;
use crate::page::PageSettings;
use crate::policy::{Policy, ScanTarget};
use crate::render::{MessageRenderer, MessageTemplates, RenderContext, RenderStyle};
use crate::settings::Settings;
use attachguard_archive::{ArchiveInspector, ScanResult};
use log::debug;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;

/// Outcome of evaluating one request
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    /// The verdict
    pub decision: Decision,
    /// Escaped plain-text message for blocks
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Suggested HTTP status
    pub status_code: u16,
    /// Template values used for the message
    #[serde(skip)]
    pub context: RenderContext,
    /// Inspection result, when the file was inspected
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scan: Option<ScanResult>,
}

/// Evaluates download requests against one policy
///
/// A guard is immutable and can be shared between threads. Reload settings
/// by building a new guard.
pub struct Guard {
    policy: Policy,
    inspector: ArchiveInspector,
    renderer: MessageRenderer,
    page: PageSettings,
    sinks: Vec<Arc<dyn AuditSink>>,
}

impl std::fmt::Debug for Guard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Guard")
            .field("policy", &self.policy)
            .field("inspector", &self.inspector)
            .field("sinks", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl Guard {
    /// Guard with default messages, default page and no audit sinks.
    #[must_use]
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            inspector: ArchiveInspector::new(),
            renderer: MessageRenderer::default(),
            page: PageSettings::default(),
            sinks: Vec::new(),
        }
    }

    /// Build a guard from operator settings, including its audit sinks.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings are inconsistent or an audit sink
    /// cannot be opened.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        settings.validate()?;
        let mut guard = Self::new(settings.policy())
            .with_templates(settings.messages.clone())
            .with_page(settings.page.clone());
        guard.sinks = settings.audit_sinks()?;
        Ok(guard)
    }

    #[must_use]
    pub fn with_inspector(mut self, inspector: ArchiveInspector) -> Self {
        self.inspector = inspector;
        self
    }

    #[must_use]
    pub fn with_templates(mut self, templates: MessageTemplates) -> Self {
        self.renderer = MessageRenderer::new(templates);
        self
    }

    #[must_use]
    pub fn with_page(mut self, page: PageSettings) -> Self {
        self.page = page;
        self
    }

    /// Add an audit sink.
    #[must_use]
    pub fn with_sink(mut self, sink: Arc<dyn AuditSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> &Policy {
        &self.policy
    }

    /// Evaluate a request for `target`, whose content is stored at `file`.
    ///
    /// The requested path decides the extension; `file` is only opened when
    /// the target is an archive that has to be inspected.
    pub fn evaluate(&self, target: &ScanTarget, file: &Path) -> Evaluation {
        let classification = classify(&target.path, &self.policy);
        let scan = (classification == Classification::Container && !self.policy.bypasses(target))
            .then(|| self.inspector.inspect_path(file, &self.policy));
        self.conclude(target, classification, scan)
    }

    /// Evaluate a request whose content is held in memory.
    pub fn evaluate_bytes(&self, target: &ScanTarget, bytes: &[u8]) -> Evaluation {
        let classification = classify(&target.path, &self.policy);
        let scan = (classification == Classification::Container && !self.policy.bypasses(target))
            .then(|| self.inspector.inspect_bytes(bytes, &self.policy));
        self.conclude(target, classification, scan)
    }

    /// Full HTML block page for a blocked evaluation.
    #[must_use]
    pub fn block_page(&self, evaluation: &Evaluation) -> Option<String> {
        let message =
            self.renderer
                .render(&evaluation.decision, &evaluation.context, RenderStyle::Emphasized)?;
        Some(self.page.render(&message))
    }

    fn conclude(
        &self,
        target: &ScanTarget,
        classification: Classification,
        scan: Option<ScanResult>,
    ) -> Evaluation {
        let decision = decide(target, classification, scan.as_ref(), &self.policy);
        debug!(
            "Evaluated {}: {classification:?} -> {decision:?}",
            target.path
        );

        let context = RenderContext::for_request(&target.path, &decision);
        self.audit(target, &decision, &context, scan.as_ref());
        let message = self.renderer.render(&decision, &context, RenderStyle::Plain);

        Evaluation {
            status_code: decision.status_code(),
            decision,
            message,
            context,
            scan,
        }
    }

    fn audit(
        &self,
        target: &ScanTarget,
        decision: &Decision,
        context: &RenderContext,
        scan: Option<&ScanResult>,
    ) {
        if self.sinks.is_empty() {
            return;
        }

        if let Some(error) = scan.and_then(|s| s.read_error.as_ref()) {
            let event = AuditEvent::ScanError {
                target: target.path.clone(),
                kind: error.kind,
                message: error.message.clone(),
                partial_findings: scan.map(|s| s.findings.clone()).unwrap_or_default(),
                allowed: !decision.is_blocked(),
            };
            self.emit(&event);
        }

        if let Decision::Block { reason, detail } = decision {
            let event = AuditEvent::Blocked {
                reason: *reason,
                target: target.path.clone(),
                caller_is_admin: target.caller_is_admin,
                filename: context.filename.clone(),
                extension: context.extension.clone(),
                depth_reached: detail.as_ref().map(|d| d.depth_reached),
                findings: detail.as_ref().map(|d| d.findings.clone()).unwrap_or_default(),
            };
            self.emit(&event);
        }
    }

    fn emit(&self, event: &AuditEvent) {
        for sink in &self.sinks {
            sink.record(event);
        }
    }
}
