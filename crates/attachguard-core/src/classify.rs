//! Extension classification of requested paths

use crate::policy::Policy;
use attachguard_archive::extension_of;
use serde::{Deserialize, Serialize};

/// How a requested path relates to the policy, judged by extension alone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Classification {
    /// No extension, or one the policy does not care about
    NotBlocked,
    /// The extension is on the block-list
    DirectlyBlocked,
    /// An archive that has to be inspected before serving
    Container,
}

/// Classify `path` against `policy`.
///
/// The block-list wins over the archive list, so an extension configured in
/// both is blocked outright. Archives are only reported as
/// [`Classification::Container`] while archive scanning is enabled.
///
/// # Examples
///
/// ```
/// use attachguard_core::{classify, Classification, Policy};
///
/// let policy = Policy::default();
/// assert_eq!(classify("tools/Setup.EXE", &policy), Classification::DirectlyBlocked);
/// assert_eq!(classify("README", &policy), Classification::NotBlocked);
/// ```
#[must_use]
pub fn classify(path: &str, policy: &Policy) -> Classification {
    let Some(extension) = extension_of(path) else {
        return Classification::NotBlocked;
    };
    if policy.blocked_extensions.contains(&extension) {
        Classification::DirectlyBlocked
    } else if policy.archive_scanning_enabled && policy.archive_extensions.contains(&extension) {
        Classification::Container
    } else {
        Classification::NotBlocked
    }
}
