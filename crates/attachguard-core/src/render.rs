//! User-facing block messages
//!
//! Templates come from operators and are untrusted in the same way as file
//! names: both are HTML-escaped before they reach a page. Substitution is a
//! single left-to-right pass, so a value that itself looks like a placeholder
//! is never expanded again.

use crate::decision::{BlockReason, Decision};
use attachguard_archive::{extension_of, file_name};
use serde::{Deserialize, Serialize};

/// Default message for a blocked extension.
pub const DEFAULT_BLOCK_MESSAGE: &str = "For security reasons the file {filename} cannot be downloaded. If you need access to this content, please contact support.";

/// Default message for an archive with blocked content.
pub const DEFAULT_ARCHIVE_BLOCK_MESSAGE: &str =
    "The file {filename} contains blocked files: {blocked_files}";

/// Default message for a password-protected archive.
pub const DEFAULT_ENCRYPTED_MESSAGE: &str =
    "The file {filename} is password-protected and cannot be scanned for security reasons.";

/// Default message for an archive that could not be read.
pub const DEFAULT_UNREADABLE_MESSAGE: &str = "The file {filename} cannot be scanned because it appears to be corrupted or has an invalid format. For security reasons, the download has been blocked.";

/// Escape HTML special characters, quotes included.
#[must_use]
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

/// How substituted values are presented
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum RenderStyle {
    /// Values are inserted as escaped text
    #[default]
    Plain,
    /// Values are wrapped in `<span class="blocked-value">` for the block page
    Emphasized,
}

/// Values available to message templates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderContext {
    /// `{filename}`: final segment of the requested path
    pub filename: String,
    /// `{extension}`: lowercase extension of the requested file
    pub extension: String,
    /// `{blocked_files}`: labels of offending archive entries
    pub blocked_files: String,
}

impl RenderContext {
    /// Build the context for a request path and its decision.
    #[must_use]
    pub fn for_request(path: &str, decision: &Decision) -> Self {
        let blocked_files = match decision {
            Decision::Block {
                detail: Some(detail),
                ..
            } => detail.blocked_files(),
            _ => String::new(),
        };
        Self {
            filename: file_name(path).to_string(),
            extension: extension_of(path).unwrap_or_default(),
            blocked_files,
        }
    }

    fn value(&self, placeholder: &str) -> Option<&str> {
        match placeholder {
            "filename" => Some(&self.filename),
            "extension" => Some(&self.extension),
            "blocked_files" => Some(&self.blocked_files),
            _ => None,
        }
    }
}

/// Operator overrides for block messages
///
/// A missing entry falls back to the built-in message for that reason.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MessageTemplates {
    /// Template for [`BlockReason::DirectExtension`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub block_message: Option<String>,
    /// Template for [`BlockReason::ArchiveContainsBlocked`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_block_message: Option<String>,
    /// Template for [`BlockReason::EncryptedArchive`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub encrypted_message: Option<String>,
    /// Template for [`BlockReason::UnreadableArchive`]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unreadable_message: Option<String>,
}

impl MessageTemplates {
    /// Template used for `reason`. Blank overrides count as unset.
    #[must_use]
    pub fn template_for(&self, reason: BlockReason) -> &str {
        let (custom, default) = match reason {
            BlockReason::DirectExtension => (&self.block_message, DEFAULT_BLOCK_MESSAGE),
            BlockReason::ArchiveContainsBlocked => {
                (&self.archive_block_message, DEFAULT_ARCHIVE_BLOCK_MESSAGE)
            }
            BlockReason::EncryptedArchive => (&self.encrypted_message, DEFAULT_ENCRYPTED_MESSAGE),
            BlockReason::UnreadableArchive => {
                (&self.unreadable_message, DEFAULT_UNREADABLE_MESSAGE)
            }
        };
        custom
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(default)
    }
}

/// Render `template` with `context`.
///
/// Known placeholders are replaced by their escaped values; unknown ones are
/// kept as escaped literal text.
#[must_use]
pub fn render_template(template: &str, context: &RenderContext, style: RenderStyle) -> String {
    let mut out = String::with_capacity(template.len() + 64);
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&escape_html(&rest[..open]));
        let after = &rest[open + 1..];
        let placeholder = after
            .find('}')
            .map(|close| (&after[..close], &after[close + 1..]))
            .and_then(|(name, tail)| context.value(name).map(|value| (value, tail)));

        match placeholder {
            Some((value, tail)) => {
                push_value(&mut out, value, style);
                rest = tail;
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(&escape_html(rest));
    out
}

fn push_value(out: &mut String, value: &str, style: RenderStyle) {
    match style {
        RenderStyle::Plain => out.push_str(&escape_html(value)),
        RenderStyle::Emphasized => {
            out.push_str("<span class=\"blocked-value\">");
            out.push_str(&escape_html(value));
            out.push_str("</span>");
        }
    }
}

/// Renders the message for a decision
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageRenderer {
    templates: MessageTemplates,
}

impl MessageRenderer {
    #[must_use]
    pub const fn new(templates: MessageTemplates) -> Self {
        Self { templates }
    }

    #[must_use]
    pub const fn templates(&self) -> &MessageTemplates {
        &self.templates
    }

    /// Message for a blocked decision; `None` when the decision allows.
    #[must_use]
    pub fn render(
        &self,
        decision: &Decision,
        context: &RenderContext,
        style: RenderStyle,
    ) -> Option<String> {
        let reason = decision.block_reason()?;
        Some(render_template(
            self.templates.template_for(reason),
            context,
            style,
        ))
    }
}
