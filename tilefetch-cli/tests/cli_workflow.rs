//! Integration tests for the tilefetch binary.
//!
//! These tests run the compiled CLI against temporary directories. None of
//! them reach the network: every request is either rejected up front or
//! already satisfied by a fresh local copy.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use tempfile::TempDir;

/// Write a config file that keeps the log inside `dir`.
fn write_config(dir: &Path, download_section: &str) -> PathBuf {
    let path = dir.join("config.ini");
    let contents = format!(
        "[download]\n{}\n\n[logging]\nfile = {}\n",
        download_section,
        dir.join("logs").join("tilefetch.log").display()
    );
    fs::write(&path, contents).expect("Failed to write config");
    path
}

/// Run a CLI command and capture output.
fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_tilefetch"))
        .args(args)
        .output()
        .expect("Failed to execute CLI command")
}

/// Assert a command succeeded.
fn assert_success(output: &Output, context: &str) {
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        let stdout = String::from_utf8_lossy(&output.stdout);
        panic!("{} failed:\nstdout: {}\nstderr: {}", context, stdout, stderr);
    }
}

#[test]
fn test_help_lists_commands() {
    let output = run_cli(&["--help"]);
    assert_success(&output, "--help");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("tile"));
    assert!(stdout.contains("file"));
}

#[test]
fn test_reversed_tile_range_is_rejected() {
    let temp = TempDir::new().unwrap();
    let dir = temp.path().join("tiles");

    let output = run_cli(&[
        "tile",
        "--server",
        "https://tiles.example",
        "--zoom",
        "5",
        "--x",
        "10",
        "--x-end",
        "9",
        "--y",
        "20",
        "--dir",
        dir.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid argument"), "stderr: {}", stderr);
}

#[test]
fn test_fresh_tile_needs_no_download() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "max_transfers = 2");
    let dir = temp.path().join("tiles");
    fs::create_dir_all(dir.join("5/10")).unwrap();
    fs::write(dir.join("5/10/20.png"), b"cached").unwrap();

    let output = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "tile",
        "--server",
        "https://tiles.example",
        "--zoom",
        "5",
        "--x",
        "10",
        "--y",
        "20",
        "--dir",
        dir.to_str().unwrap(),
    ]);
    assert_success(&output, "tile with fresh cache");

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Nothing to download"), "stdout: {}", stdout);
    assert_eq!(fs::read(dir.join("5/10/20.png")).unwrap(), b"cached");
    assert!(temp.path().join("logs/tilefetch.log").exists());
}

#[test]
fn test_never_expiring_file_is_kept() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "");
    let output_path = temp.path().join("index.json");
    fs::write(&output_path, b"{}").unwrap();

    let output = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "--foreground",
        "file",
        "--url",
        "https://files.example/index.json",
        "--output",
        output_path.to_str().unwrap(),
        "--expiry",
        "-1",
    ]);
    assert_success(&output, "file with never-expiring copy");
}

#[test]
fn test_invalid_config_value_fails() {
    let temp = TempDir::new().unwrap();
    let config = write_config(temp.path(), "timeout = 0");
    let output_path = temp.path().join("out.bin");

    let output = run_cli(&[
        "--config",
        config.to_str().unwrap(),
        "file",
        "--url",
        "https://files.example/out.bin",
        "--output",
        output_path.to_str().unwrap(),
    ]);

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Configuration error"), "stderr: {}", stderr);
    assert!(!output_path.exists());
}
