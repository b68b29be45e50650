// CLI handlers take owned clap values and print directly.
#![allow(
    clippy::needless_pass_by_value,    // clap requires owned strings
    clippy::fn_params_excessive_bools, // CLI commands have several boolean flags
    clippy::unnecessary_wraps,         // consistent Result return for CLI handlers
)]

//! attachguard CLI - download policy checks for files and archives
//!
//! Plays the part of the interception point: given a file and the path it
//! was requested under, prints the verdict the guard would enforce.

mod config;

use anyhow::{Context, Result};
use attachguard_archive::{ArchiveInspector, ScanResult, MAX_NESTING_DEPTH_LIMIT};
use attachguard_core::{Decision, Evaluation, Guard, Policy, ScanTarget};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use colored::Colorize;
use config::LoadedConfig;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

/// Exit status when a check blocks or a scan is not clean.
const EXIT_BLOCKED: u8 = 3;

#[derive(Parser, Debug)]
#[command(
    name = "attachguard",
    about = "Check whether files and archives may be downloaded",
    long_about = "Check whether files and archives may be downloaded.\n\
                  \n\
                  Applies an extension block-list and, for archives, a bounded\n\
                  recursive inspection of their contents.\n\
                  \n\
                  Defaults can be set via .attachguard.toml configuration file.",
    version
)]
struct Args {
    /// Use this configuration file instead of ~/.attachguard.toml and ./.attachguard.toml
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Only log errors
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Log inspection details
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Decide whether a file may be downloaded
    #[command(long_about = "Decide whether a file may be downloaded.\n\
                      \n\
                      Exits with status 0 when the download is allowed and 3 when it is blocked.")]
    Check {
        /// File to check
        #[arg(value_name = "PATH")]
        path: PathBuf,

        /// Treat the caller as an administrator
        #[arg(long)]
        admin: bool,

        /// Path the file was requested under (defaults to PATH)
        #[arg(long, value_name = "PATH")]
        request_path: Option<String>,

        /// Print the HTML block page instead of the message
        #[arg(long, conflicts_with = "json")]
        html: bool,

        /// Print the evaluation as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect an archive and list what the policy would object to
    #[command(long_about = "Inspect an archive and list what the policy would object to.\n\
                      \n\
                      Runs the inspection even when archive scanning is disabled in the\n\
                      configuration. Exits with status 3 when the archive is not clean.")]
    Scan {
        /// Archive to inspect
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,

        /// Override the configured nesting depth bound
        #[arg(long, value_name = "N")]
        max_depth: Option<u32>,

        /// Print the scan result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Manage configuration files
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completion scripts
    Completion {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Write a configuration file with the default settings
    Init {
        /// Where to write (defaults to ./.attachguard.toml)
        #[arg(value_name = "PATH")]
        path: Option<PathBuf>,

        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Display the effective configuration
    Show {
        /// Output as JSON instead of TOML
        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.quiet, args.verbose);

    match args.command {
        Commands::Check {
            path,
            admin,
            request_path,
            html,
            json,
        } => {
            let loaded = config::load(args.config.as_deref())?;
            check_command(&loaded, &path, admin, request_path, html, json)
        }
        Commands::Scan {
            archive,
            max_depth,
            json,
        } => {
            let loaded = config::load(args.config.as_deref())?;
            scan_command(&loaded, &archive, max_depth, json)
        }
        Commands::Config { action } => config_command(action, args.config.as_deref()),
        Commands::Completion { shell } => {
            completion_command(shell);
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn init_logging(quiet: bool, verbose: bool) {
    let default_filter = if verbose {
        "debug"
    } else if quiet {
        "error"
    } else {
        "warn"
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .target(env_logger::Target::Stderr)
        .init();
}

fn ensure_exists(path: &Path) -> Result<()> {
    if !path.exists() {
        eprintln!(
            "{} Input file not found: {}",
            "Error:".red().bold(),
            path.display()
        );
        anyhow::bail!("Input file not found: {}", path.display());
    }
    Ok(())
}

fn check_command(
    loaded: &LoadedConfig,
    path: &Path,
    admin: bool,
    request_path: Option<String>,
    html: bool,
    json: bool,
) -> Result<ExitCode> {
    ensure_exists(path)?;

    let guard = Guard::from_settings(&loaded.settings).context("Failed to set up guard")?;
    let requested = request_path.unwrap_or_else(|| path.to_string_lossy().into_owned());
    let target = ScanTarget {
        path: requested,
        caller_is_admin: admin,
    };

    let evaluation = guard.evaluate(&target, path);

    if json {
        println!("{}", serde_json::to_string_pretty(&evaluation)?);
    } else if html {
        if let Some(page) = guard.block_page(&evaluation) {
            print!("{page}");
        }
    } else {
        print_evaluation(&target, &evaluation);
    }

    Ok(if evaluation.decision.is_blocked() {
        ExitCode::from(EXIT_BLOCKED)
    } else {
        ExitCode::SUCCESS
    })
}

fn print_evaluation(target: &ScanTarget, evaluation: &Evaluation) {
    match &evaluation.decision {
        Decision::Allow { basis } => {
            println!(
                "{} {} ({})",
                "ALLOWED".green().bold(),
                target.path,
                basis.as_str()
            );
            if basis.is_degraded() {
                println!(
                    "{} Archive could not be inspected; allowed by unreadable_archives_mode",
                    "Warning:".yellow().bold()
                );
            }
        }
        Decision::Block { reason, .. } => {
            println!(
                "{} {} ({})",
                "BLOCKED".red().bold(),
                target.path,
                reason.as_str()
            );
            if let Some(message) = &evaluation.message {
                println!("{message}");
            }
        }
    }
}

fn scan_command(
    loaded: &LoadedConfig,
    archive: &Path,
    max_depth: Option<u32>,
    json: bool,
) -> Result<ExitCode> {
    ensure_exists(archive)?;

    let mut policy = loaded.settings.policy();
    if let Some(depth) = max_depth {
        if depth > MAX_NESTING_DEPTH_LIMIT {
            anyhow::bail!("--max-depth must be at most {MAX_NESTING_DEPTH_LIMIT}");
        }
        policy.max_nesting_depth = depth;
    }

    let result = ArchiveInspector::new().inspect_path(archive, &policy);

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        print_scan(archive, &policy, &result);
    }

    Ok(if result.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::from(EXIT_BLOCKED)
    })
}

fn print_scan(archive: &Path, policy: &Policy, result: &ScanResult) {
    println!(
        "{} {} (max depth {}, reached {})",
        "Scanned".bold(),
        archive.display(),
        policy.max_nesting_depth,
        result.max_depth_reached
    );

    if let Some(error) = &result.read_error {
        println!("{} {error}", "Unreadable:".red().bold());
    }
    if result.top_level_encrypted {
        println!("{} archive is password-protected", "Encrypted:".red().bold());
    }
    for finding in &result.findings {
        println!(
            "  {} {} [depth {}, {}]",
            "-".red(),
            finding.location(),
            finding.depth,
            finding.reason
        );
    }
    if result.is_clean() {
        println!("{}", "No blocked content found".green());
    } else if !result.findings.is_empty() {
        println!("{} finding(s)", result.findings.len());
    }
}

fn config_command(action: ConfigAction, explicit: Option<&Path>) -> Result<ExitCode> {
    match action {
        ConfigAction::Init { path, force } => config_init(path, force),
        ConfigAction::Show { json } => config_show(explicit, json),
    }
}

/// Create a new configuration file with the default settings
fn config_init(path: Option<PathBuf>, force: bool) -> Result<ExitCode> {
    let config_path = path.unwrap_or_else(config::project_config_path);

    if config_path.exists() && !force {
        eprintln!(
            "{} Configuration file already exists: {}",
            "Error:".red().bold(),
            config_path.display()
        );
        eprintln!("{} Use --force to overwrite", "Hint:".cyan().bold());
        return Ok(ExitCode::FAILURE);
    }

    fs::write(&config_path, config::DEFAULT_CONFIG)
        .with_context(|| format!("Failed to write config file: {}", config_path.display()))?;
    println!(
        "{} Created configuration file: {}",
        "✓".green().bold(),
        config_path.display()
    );
    Ok(ExitCode::SUCCESS)
}

/// Display the effective configuration
fn config_show(explicit: Option<&Path>, json: bool) -> Result<ExitCode> {
    let loaded = config::load(explicit)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&loaded.settings)?);
    } else {
        if loaded.sources.is_empty() {
            println!("# No configuration files found; showing defaults");
        }
        for source in &loaded.sources {
            println!("# Loaded from {}", source.display());
        }
        let text = toml::to_string_pretty(&loaded.settings)
            .context("Failed to serialize settings")?;
        print!("{text}");
    }
    Ok(ExitCode::SUCCESS)
}

fn completion_command(shell: Shell) {
    let mut cmd = Args::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}
