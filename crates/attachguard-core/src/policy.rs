//! Download policy and request identity

use attachguard_archive::{
    normalize_extension, ContentPolicy, ScanLimits, DEFAULT_MAX_NESTING_DEPTH,
    MAX_NESTING_DEPTH_LIMIT,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Extensions blocked when the operator has not configured a list.
pub const DEFAULT_BLOCKED_EXTENSIONS: &[&str] = &[
    "exe", "php", "bat", "cmd", "htm", "html", "js", "vbs", "ps1", "sh", "phar",
];

/// Extensions treated as inspectable archives by default.
pub const DEFAULT_ARCHIVE_EXTENSIONS: &[&str] = &["zip"];

/// Who the block-list applies to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum BlockingMode {
    /// Block for every caller
    #[default]
    All,
    /// Block for everyone except administrators
    RegularUsersOnly,
    /// Never block
    Disabled,
}

impl BlockingMode {
    /// Configuration keyword for this mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::RegularUsersOnly => "regular",
            Self::Disabled => "disabled",
        }
    }

    /// Parse a configuration keyword. Unknown values fall back to
    /// [`BlockingMode::All`], the strictest mode.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.trim().to_lowercase().as_str() {
            "regular" | "regular_users_only" => Self::RegularUsersOnly,
            "disabled" | "off" => Self::Disabled,
            _ => Self::All,
        }
    }
}

impl From<String> for BlockingMode {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<BlockingMode> for String {
    fn from(mode: BlockingMode) -> Self {
        mode.as_str().to_string()
    }
}

impl fmt::Display for BlockingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What to do with archives that cannot be fully inspected
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UnreadablePolicy {
    /// Refuse the download
    #[default]
    Block,
    /// Serve the file anyway (the event is still audited)
    Allow,
}

impl UnreadablePolicy {
    /// Configuration keyword for this policy.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Block => "block",
            Self::Allow => "allow",
        }
    }

    /// Parse a configuration keyword. Anything but `allow` blocks.
    #[must_use]
    pub fn parse(value: &str) -> Self {
        if value.trim().eq_ignore_ascii_case("allow") {
            Self::Allow
        } else {
            Self::Block
        }
    }
}

impl From<String> for UnreadablePolicy {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<UnreadablePolicy> for String {
    fn from(policy: UnreadablePolicy) -> Self {
        policy.as_str().to_string()
    }
}

impl fmt::Display for UnreadablePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Immutable policy for one decision
///
/// Extension sets hold lowercase values without a leading dot. Build a new
/// policy when configuration changes; nothing in this crate mutates one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Policy {
    /// Extensions that are never served
    pub blocked_extensions: BTreeSet<String>,
    /// Who the block-list applies to
    pub blocking_mode: BlockingMode,
    /// Whether archives are opened and inspected
    pub archive_scanning_enabled: bool,
    /// Extensions treated as inspectable archives
    pub archive_extensions: BTreeSet<String>,
    /// Deepest nesting level still extracted
    pub max_nesting_depth: u32,
    /// Verdict for archives that cannot be inspected
    pub unreadable_archive_policy: UnreadablePolicy,
    /// Work limits for one inspection
    pub scan_limits: ScanLimits,
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            blocked_extensions: normalize_all(DEFAULT_BLOCKED_EXTENSIONS),
            blocking_mode: BlockingMode::All,
            archive_scanning_enabled: false,
            archive_extensions: normalize_all(DEFAULT_ARCHIVE_EXTENSIONS),
            max_nesting_depth: DEFAULT_MAX_NESTING_DEPTH,
            unreadable_archive_policy: UnreadablePolicy::Block,
            scan_limits: ScanLimits::default(),
        }
    }
}

impl Policy {
    /// Replace the blocked extensions, normalizing each entry.
    #[must_use]
    pub fn with_blocked_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.blocked_extensions = normalize_all(extensions);
        self
    }

    /// Replace the archive extensions, normalizing each entry.
    #[must_use]
    pub fn with_archive_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.archive_extensions = normalize_all(extensions);
        self
    }

    #[must_use]
    pub const fn with_blocking_mode(mut self, mode: BlockingMode) -> Self {
        self.blocking_mode = mode;
        self
    }

    /// Enable archive scanning with the given depth bound, clamped to
    /// [`MAX_NESTING_DEPTH_LIMIT`].
    #[must_use]
    pub const fn with_archive_scanning(mut self, max_nesting_depth: u32) -> Self {
        self.archive_scanning_enabled = true;
        self.max_nesting_depth = if max_nesting_depth > MAX_NESTING_DEPTH_LIMIT {
            MAX_NESTING_DEPTH_LIMIT
        } else {
            max_nesting_depth
        };
        self
    }

    #[must_use]
    pub const fn with_unreadable_policy(mut self, policy: UnreadablePolicy) -> Self {
        self.unreadable_archive_policy = policy;
        self
    }

    #[must_use]
    pub const fn with_scan_limits(mut self, limits: ScanLimits) -> Self {
        self.scan_limits = limits;
        self
    }

    /// Whether the caller skips every check under this policy.
    #[must_use]
    pub fn bypasses(&self, target: &ScanTarget) -> bool {
        match self.blocking_mode {
            BlockingMode::Disabled => true,
            BlockingMode::RegularUsersOnly => target.caller_is_admin,
            BlockingMode::All => false,
        }
    }
}

impl ContentPolicy for Policy {
    fn is_blocked_extension(&self, extension: &str) -> bool {
        self.blocked_extensions.contains(extension)
    }

    fn is_archive_extension(&self, extension: &str) -> bool {
        self.archive_extensions.contains(extension)
    }

    fn max_nesting_depth(&self) -> u32 {
        self.max_nesting_depth.min(MAX_NESTING_DEPTH_LIMIT)
    }

    fn scan_limits(&self) -> ScanLimits {
        self.scan_limits
    }
}

pub(crate) fn normalize_all<I, S>(extensions: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    extensions
        .into_iter()
        .filter_map(|e| normalize_extension(e.as_ref()))
        .collect()
}

/// The file being requested and who is asking
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScanTarget {
    /// Requested path as the client sees it
    pub path: String,
    /// Whether the caller has administrative rights
    pub caller_is_admin: bool,
}

impl ScanTarget {
    /// Request from a regular user.
    #[must_use]
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caller_is_admin: false,
        }
    }

    /// Request from an administrator.
    #[must_use]
    pub fn admin(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            caller_is_admin: true,
        }
    }
}
