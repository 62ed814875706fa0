//! CLI integration tests
//!
//! These run the built binary and check exit codes, output files and
//! the messages printed for configuration problems.

use serde_json::{json, Value};
use std::fs;
use std::path::Path;
use std::process::{Command, Output};
use tempfile::TempDir;

const DB_VARS: [&str; 5] = ["DB_NAME", "DB_USER", "DB_PASSWORD", "DB_HOST", "DB_PORT"];

/// Runs lexai in `dir` with a scrubbed environment
fn lexai(dir: &Path, args: &[&str], env: &[(&str, &str)]) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lexai"));
    cmd.current_dir(dir).args(args).env("LEXAI_DATA_DIR", dir);
    for var in DB_VARS {
        cmd.env_remove(var);
    }
    for var in ["LEXAI_BIND", "LEXAI_LOG_LEVEL", "LEXAI_LOG_JSON", "LEXAI_MAX_RETRIES"] {
        cmd.env_remove(var);
    }
    for (key, value) in env {
        cmd.env(key, value);
    }
    cmd.output().expect("Failed to run lexai")
}

#[test]
fn test_cli_help() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["--help"], &[]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for command in ["init-db", "scrape", "clean", "chunk", "embed", "ingest", "search", "serve"] {
        assert!(stdout.contains(command), "help should list {}", command);
    }
}

#[test]
fn test_cli_version() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["--version"], &[]);

    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn test_unknown_command_fails() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["frobnicate"], &[]);

    assert!(!output.status.success());
}

#[test]
fn test_clean_rewrites_jsonl() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("raw.jsonl");
    let output_path = tmp.path().join("out").join("clean.jsonl");
    let record = json!({
        "year": "2012",
        "month": "Feb",
        "title": "G.R. No. 1",
        "url": "https://elibrary.test/showdocs/1/1",
        "text": "Home | Search\nRepublic of the Philippines\nTHIRD DIVISION\nG.R. No. 1\nThe petition is denied.",
    });
    fs::write(&input, format!("{}\nnot json\n", record)).unwrap();

    let output = lexai(
        tmp.path(),
        &[
            "clean",
            "-i",
            input.to_str().unwrap(),
            "-o",
            output_path.to_str().unwrap(),
        ],
        &[],
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Cleaned 1 records (1 trimmed, 1 malformed)"));

    let written = fs::read_to_string(&output_path).unwrap();
    let lines: Vec<Value> = written.lines().map(|l| serde_json::from_str(l).unwrap()).collect();
    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0]["text"], "THIRD DIVISION\nG.R. No. 1\nThe petition is denied.");
    assert_eq!(lines[0]["url"], "https://elibrary.test/showdocs/1/1");
}

#[test]
fn test_clean_quiet_prints_nothing() {
    let tmp = TempDir::new().unwrap();
    let input = tmp.path().join("raw.jsonl");
    fs::write(&input, "{\"text\": \"EN BANC\\nbody\"}\n").unwrap();

    let output = lexai(
        tmp.path(),
        &["-q", "clean", "-i", input.to_str().unwrap(), "-o", "cleaned.jsonl"],
        &[],
    );

    assert!(output.status.success());
    assert!(output.stdout.is_empty());
    assert!(tmp.path().join("cleaned.jsonl").exists());
}

#[test]
fn test_clean_missing_input_fails() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["clean", "-i", "absent.jsonl"], &[]);

    assert_eq!(output.status.code(), Some(1));
}

#[test]
fn test_invalid_bind_is_a_configuration_error() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["clean"], &[("LEXAI_BIND", "nowhere")]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("LEXAI_"));
}

#[test]
fn test_search_without_database_settings_fails() {
    let tmp = TempDir::new().unwrap();
    let output = lexai(tmp.path(), &["search", "illegal dismissal"], &[]);

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("DB_"));
}
