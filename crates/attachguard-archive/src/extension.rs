//! File extension normalization shared by the classifier and the inspector.

/// Return the final path segment of `path`.
///
/// Both `/` and `\` are treated as separators, since archive entry names and
/// request paths come from untrusted sources that may use either.
#[inline]
#[must_use]
pub fn file_name(path: &str) -> &str {
    path.rsplit(['/', '\\']).next().unwrap_or(path)
}

/// Extract the lowercase extension of the last segment of `path`.
///
/// The extension is the text after the last `.` of the file name. Returns
/// `None` when there is no dot or nothing follows it, so `"README"` and
/// `"archive."` both have no extension. A dotfile such as `".bashrc"` has the
/// extension `"bashrc"`.
///
/// # Examples
///
/// ```
/// use attachguard_archive::extension::extension_of;
///
/// assert_eq!(extension_of("Invoice.PDF.EXE").as_deref(), Some("exe"));
/// assert_eq!(extension_of("docs.v2/README"), None);
/// ```
#[must_use]
pub fn extension_of(path: &str) -> Option<String> {
    let name = file_name(path);
    let (_, ext) = name.rsplit_once('.')?;
    if ext.is_empty() {
        None
    } else {
        Some(ext.to_lowercase())
    }
}

/// Normalize an operator-supplied extension: trim, drop leading dots, lowercase.
///
/// Returns `None` for entries that are empty after normalization.
#[must_use]
pub fn normalize_extension(raw: &str) -> Option<String> {
    let trimmed = raw.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_lowercase())
    }
}
