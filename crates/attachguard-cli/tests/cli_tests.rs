//! Integration tests for all CLI commands
//!
//! Every test runs in its own temporary directory with HOME pointed at it,
//! so no real configuration file is picked up.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Helper to create a CLI command isolated in `dir`
fn cli(dir: &TempDir) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_attachguard"));
    cmd.current_dir(dir.path())
        .env("HOME", dir.path())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

fn zip_bytes(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in entries {
        zip.start_file(*name, SimpleFileOptions::default()).unwrap();
        zip.write_all(contents).unwrap();
    }
    zip.finish().unwrap().into_inner()
}

fn write_file(dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn write_config(dir: &TempDir, contents: &str) {
    write_file(dir.path(), ".attachguard.toml", contents.as_bytes());
}

const SCANNING: &str = "archive_scan_enabled = true\n";

// ============ CHECK COMMAND TESTS ============

#[test]
fn test_check_help() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .arg("check")
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Decide whether a file may be downloaded"));
}

#[test]
fn test_check_blocked_extension() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "setup.exe", b"MZ");

    cli(&dir)
        .args(["check", "setup.exe"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("BLOCKED"))
        .stdout(predicate::str::contains("direct_extension"))
        .stdout(predicate::str::contains(
            "For security reasons the file setup.exe cannot be downloaded",
        ));
}

#[test]
fn test_check_allowed_file() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "notes.txt", b"hello");

    cli(&dir)
        .args(["check", "notes.txt"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ALLOWED"))
        .stdout(predicate::str::contains("not_blocked"));
}

#[test]
fn test_check_uses_request_path() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "upload.bin", b"data");

    cli(&dir)
        .args(["check", "upload.bin", "--request-path", "/files/Run.PS1"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("Run.PS1"));
}

#[test]
fn test_check_archive_with_blocked_entry() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, SCANNING);
    write_file(
        dir.path(),
        "bundle.zip",
        &zip_bytes(&[("readme.txt", b"hi"), ("bin/tool.bat", b"@echo")]),
    );

    cli(&dir)
        .args(["check", "bundle.zip"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("archive_contains_blocked"))
        .stdout(predicate::str::contains("contains blocked files: tool.bat"));
}

#[test]
fn test_check_archive_ignored_when_scanning_disabled() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "bundle.zip", &zip_bytes(&[("bin/tool.bat", b"@echo")]));

    cli(&dir).args(["check", "bundle.zip"]).assert().success();
}

#[test]
fn test_check_json_output() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, SCANNING);
    write_file(dir.path(), "clean.zip", &zip_bytes(&[("doc.pdf", b"%PDF")]));

    let output = cli(&dir)
        .args(["check", "clean.zip", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["decision"]["verdict"], "allow");
    assert_eq!(json["decision"]["basis"], "clean_archive");
    assert_eq!(json["status_code"], 200);
    assert_eq!(json["scan"]["findings"].as_array().unwrap().len(), 0);
}

#[test]
fn test_check_html_block_page() {
    let dir = TempDir::new().unwrap();
    write_config(
        &dir,
        "[page]\ntitle = \"Nope\"\nbackground_color = \"#000, #fff\"\n",
    );
    write_file(dir.path(), "run.js", b"alert(1)");

    cli(&dir)
        .args(["check", "run.js", "--html"])
        .assert()
        .code(3)
        .stdout(predicate::str::starts_with("<!DOCTYPE html>"))
        .stdout(predicate::str::contains("<h1>Nope</h1>"))
        .stdout(predicate::str::contains("#000 0%, #fff 100%"))
        .stdout(predicate::str::contains("<span class=\"blocked-value\">run.js</span>"));
}

#[test]
fn test_check_admin_bypass() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "blocking_mode = \"regular\"\n");
    write_file(dir.path(), "setup.exe", b"MZ");

    cli(&dir)
        .args(["check", "setup.exe", "--admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("admin_bypass"));

    cli(&dir).args(["check", "setup.exe"]).assert().code(3);
}

#[test]
fn test_check_unreadable_archive_modes() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "broken.zip", b"this is not a zip file");

    write_config(&dir, SCANNING);
    cli(&dir)
        .args(["check", "broken.zip"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("unreadable_archive"))
        .stderr(predicate::str::contains("Archive scan failed"));

    write_config(&dir, "archive_scan_enabled = true\nunreadable_archives_mode = \"allow\"\n");
    cli(&dir)
        .args(["check", "broken.zip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unreadable_archive_allowed"));
}

#[test]
fn test_check_writes_audit_file() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "[audit]\nlog_file = \"audit.jsonl\"\n");
    write_file(dir.path(), "page.html", b"<html>");

    cli(&dir).args(["check", "page.html"]).assert().code(3);

    let audit = fs::read_to_string(dir.path().join("audit.jsonl")).unwrap();
    let record: serde_json::Value = serde_json::from_str(audit.lines().next().unwrap()).unwrap();
    assert_eq!(record["event"], "blocked");
    assert_eq!(record["extension"], "html");
}

#[test]
fn test_check_missing_file() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["check", "missing.exe"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Input file not found"));
}

#[test]
fn test_explicit_config_overrides_discovered() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "blocked_extensions = \"txt\"\n");
    let custom = write_file(dir.path(), "custom.toml", b"blocked_extensions = \"exe\"\n");
    write_file(dir.path(), "notes.txt", b"hello");

    cli(&dir).args(["check", "notes.txt"]).assert().code(3);
    cli(&dir)
        .arg("--config")
        .arg(&custom)
        .args(["check", "notes.txt"])
        .assert()
        .success();
}

#[test]
fn test_invalid_config_fails() {
    let dir = TempDir::new().unwrap();
    write_config(&dir, "max_nesting_depth = [1, 2]\n");
    write_file(dir.path(), "notes.txt", b"hello");

    cli(&dir)
        .args(["check", "notes.txt"])
        .assert()
        .failure()
        .stderr(predicate::str::contains(".attachguard.toml"));
}

// ============ SCAN COMMAND TESTS ============

#[test]
fn test_scan_json_lists_nested_findings() {
    let dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("payload.vbs", b"x")]);
    write_file(
        dir.path(),
        "outer.zip",
        &zip_bytes(&[("docs/readme.txt", b"hi"), ("inner.zip", &inner)]),
    );

    let output = cli(&dir)
        .args(["scan", "outer.zip", "--json"])
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(3));

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let findings = json["findings"].as_array().unwrap();
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0]["name"], "payload.vbs");
    assert_eq!(findings[0]["depth"], 1);
    assert_eq!(findings[0]["archive_chain"][0], "inner.zip");
    assert_eq!(json["max_depth_reached"], 1);
}

#[test]
fn test_scan_max_depth_zero() {
    let dir = TempDir::new().unwrap();
    let inner = zip_bytes(&[("payload.vbs", b"x")]);
    write_file(dir.path(), "outer.zip", &zip_bytes(&[("inner.zip", &inner)]));

    cli(&dir)
        .args(["scan", "outer.zip", "--max-depth", "0"])
        .assert()
        .code(3)
        .stdout(predicate::str::contains("inner.zip"))
        .stdout(predicate::str::contains("nesting limit exceeded"));
}

#[test]
fn test_scan_clean_archive() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "clean.zip", &zip_bytes(&[("a.txt", b"a")]));

    cli(&dir)
        .args(["scan", "clean.zip"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No blocked content found"));
}

#[test]
fn test_scan_rejects_excessive_depth() {
    let dir = TempDir::new().unwrap();
    write_file(dir.path(), "clean.zip", &zip_bytes(&[("a.txt", b"a")]));

    cli(&dir)
        .args(["scan", "clean.zip", "--max-depth", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--max-depth"));
}

// ============ CONFIG COMMAND TESTS ============

#[test]
fn test_config_init_and_force() {
    let dir = TempDir::new().unwrap();

    cli(&dir)
        .args(["config", "init"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Created configuration file"));
    let written = fs::read_to_string(dir.path().join(".attachguard.toml")).unwrap();
    assert!(written.contains("blocked_extensions"));

    cli(&dir)
        .args(["config", "init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already exists"));

    cli(&dir).args(["config", "init", "--force"]).assert().success();
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No configuration files found"))
        .stdout(predicate::str::contains("blocking_mode = \"all\""));
}

#[test]
fn test_config_show_merges_user_and_project() {
    let dir = TempDir::new().unwrap();
    let project = dir.path().join("project");
    fs::create_dir(&project).unwrap();
    write_file(
        dir.path(),
        ".attachguard.toml",
        b"max_nesting_depth = 4\nblocking_mode = \"regular\"\n",
    );
    write_file(&project, ".attachguard.toml", b"blocking_mode = \"disabled\"\n");

    let output = cli(&dir)
        .current_dir(&project)
        .args(["config", "show", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["max_nesting_depth"], 4);
    assert_eq!(json["blocking_mode"], "disabled");
}

// ============ COMPLETION COMMAND TESTS ============

#[test]
fn test_completion_bash() {
    let dir = TempDir::new().unwrap();
    cli(&dir)
        .args(["completion", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("attachguard"));
}
