//! Configuration file discovery for .attachguard.toml
//!
//! Configuration files can be placed in:
//! - User home directory: ~/.attachguard.toml (user defaults)
//! - Project directory: ./.attachguard.toml (project defaults)
//! - Custom location via --config flag (replaces both)
//!
//! Precedence order (highest to lowest):
//! 1. Project config (./.attachguard.toml)
//! 2. User config (~/.attachguard.toml)
//! 3. Built-in defaults
//!
//! Files are merged key by key, so a project file only needs the keys it
//! changes. A file that exists but cannot be parsed is an error; silently
//! falling back to defaults would change what gets blocked.

use anyhow::{Context, Result};
use attachguard_core::Settings;
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use toml::{Table, Value};

/// File name looked up in the home and current directories.
pub const CONFIG_FILE_NAME: &str = ".attachguard.toml";

/// Commented default configuration written by `config init`
pub const DEFAULT_CONFIG: &str = r##"# attachguard configuration
#
# Lists accept either a comma-separated string or an array of strings.

# Extensions that are never served
blocked_extensions = "exe,php,bat,cmd,htm,html,js,vbs,ps1,sh,phar"

# Who the block-list applies to: all, regular (admins exempt) or disabled
blocking_mode = "all"

# Open archives and inspect their contents
archive_scan_enabled = false

# Extensions treated as archives
archive_extensions = "zip"

# Nested archives are opened up to this depth (0 = only the requested file)
max_nesting_depth = 1

# Archives that cannot be read: block or allow
unreadable_archives_mode = "block"

[limits]
# Entries visited per inspection, across all nesting levels
max_entries = 10000

# Bytes extracted for nested archives per inspection (256 MiB)
max_extracted_bytes = 268435456

# Wall-clock budget in seconds (0 = unlimited)
time_budget_secs = 30

[messages]
# Placeholders: {filename}, {extension}, {blocked_files}
# block_message = "For security reasons the file {filename} cannot be downloaded."
# archive_block_message = "The file {filename} contains blocked files: {blocked_files}"
# encrypted_message = "The file {filename} is password-protected."
# unreadable_message = "The file {filename} cannot be scanned."

[page]
# title = "🚫 Download Blocked"
# background_color = "#4A90E2, #5C6AC4"

[audit]
# JSON-lines file receiving every audit event
# log_file = "/var/log/attachguard/audit.jsonl"
"##;

/// Where the effective settings came from
#[derive(Debug, Default)]
pub struct LoadedConfig {
    /// Effective settings
    pub settings: Settings,
    /// Files that contributed, lowest precedence first
    pub sources: Vec<PathBuf>,
}

/// Load settings from `explicit` if given, otherwise discover and merge the
/// user and project files.
///
/// # Errors
///
/// Returns an error if a config file exists but cannot be read or parsed.
pub fn load(explicit: Option<&Path>) -> Result<LoadedConfig> {
    if let Some(path) = explicit {
        let table = load_table(path)?;
        return Ok(LoadedConfig {
            settings: settings_from_table(table, path)?,
            sources: vec![path.to_path_buf()],
        });
    }

    let mut merged = Table::new();
    let mut sources = Vec::new();
    let mut seen = Vec::new();
    for path in [user_config_path(), Some(project_config_path())]
        .into_iter()
        .flatten()
    {
        if !path.exists() {
            continue;
        }
        // Running from the home directory makes both candidates the same file.
        let canonical = fs::canonicalize(&path).unwrap_or_else(|_| path.clone());
        if seen.contains(&canonical) {
            continue;
        }
        debug!("Loading config from {}", path.display());
        merge(&mut merged, load_table(&path)?);
        seen.push(canonical);
        sources.push(path);
    }

    let origin = sources
        .last()
        .cloned()
        .unwrap_or_else(|| PathBuf::from("<defaults>"));
    Ok(LoadedConfig {
        settings: settings_from_table(merged, &origin)?,
        sources,
    })
}

/// ~/.attachguard.toml, if a home directory is known.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// ./.attachguard.toml
pub fn project_config_path() -> PathBuf {
    PathBuf::from(CONFIG_FILE_NAME)
}

fn load_table(path: &Path) -> Result<Table> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    content
        .parse::<Table>()
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

fn settings_from_table(table: Table, origin: &Path) -> Result<Settings> {
    Value::Table(table)
        .try_into::<Settings>()
        .with_context(|| format!("Invalid settings in {}", origin.display()))
}

/// Merge `overlay` into `base`; nested tables merge, other values replace.
fn merge(base: &mut Table, overlay: Table) {
    for (key, value) in overlay {
        match value {
            Value::Table(incoming) => {
                if let Some(Value::Table(existing)) = base.get_mut(&key) {
                    merge(existing, incoming);
                } else {
                    base.insert(key, Value::Table(incoming));
                }
            }
            other => {
                base.insert(key, other);
            }
        }
    }
}
