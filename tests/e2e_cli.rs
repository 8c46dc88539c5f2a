//! CLI end-to-end tests
//!
//! Tests for the mediafx command-line interface. None of these need ffmpeg
//! to be installed.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

/// Get a command for the mediafx binary
#[allow(deprecated)]
fn mediafx_cmd() -> Command {
    Command::cargo_bin("mediafx").unwrap()
}

/// Write a config pointing fonts and temp files into `root`.
fn write_config(root: &Path) -> std::path::PathBuf {
    let fonts = root.join("fonts");
    fs::create_dir_all(&fonts).unwrap();
    fs::write(fonts.join("NotoSansKR-Regular.ttf"), b"font").unwrap();
    let config = root.join("mediafx.toml");
    fs::write(
        &config,
        format!(
            "[fonts]\ndir = {:?}\n\n[temp]\nbase_dir = {:?}\nsweep_probability = 0.0\n",
            fonts,
            root.join("tmp")
        ),
    )
    .unwrap();
    config
}

#[test]
fn test_cli_no_args_shows_help() {
    let mut cmd = mediafx_cmd();
    cmd.assert()
        .failure()
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_help_flag() {
    let mut cmd = mediafx_cmd();
    cmd.arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediafx"))
        .stdout(predicate::str::contains("Usage"));
}

#[test]
fn test_cli_version_flag() {
    let mut cmd = mediafx_cmd();
    cmd.arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("mediafx"));
}

#[test]
fn test_cli_check_tools_command() {
    let mut cmd = mediafx_cmd();
    cmd.arg("check-tools").assert().success().stdout(
        predicate::str::contains("ffmpeg").and(predicate::str::contains("ffprobe")),
    );
}

#[test]
fn test_cli_run_help() {
    let mut cmd = mediafx_cmd();
    cmd.args(["run", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Run a batch of work items"))
        .stdout(predicate::str::contains("--continue-on-fail"));
}

#[test]
fn test_cli_run_missing_batch_file() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let mut cmd = mediafx_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(dir.path().join("missing.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("Failed to read batch file"));
}

#[test]
fn test_cli_run_rejects_unknown_operation() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let batch = dir.path().join("batch.json");
    fs::write(&batch, r#"[{"operation": "explode"}]"#).unwrap();

    let mut cmd = mediafx_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&batch)
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid operation"));
}

#[test]
fn test_cli_run_font_items() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"[
            {"operation": "listFonts", "filter": "system"},
            {"operation": "validateFontKey", "fontKey": "noto-sans-kr"}
        ]"#,
    )
    .unwrap();

    let mut cmd = mediafx_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&batch)
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""key":"noto-sans-kr""#))
        .stdout(predicate::str::contains("Font key already exists"));
}

#[test]
fn test_cli_run_continue_on_fail_prints_error_record() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"[
            {"operation": "addText",
             "source": {"sourceType": "binary", "binaryProperty": "data"},
             "text": "Hello", "fontKey": "no-such-font"},
            {"operation": "fontInfo", "fontKey": "noto-sans-kr"}
        ]"#,
    )
    .unwrap();

    let mut cmd = mediafx_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&batch)
        .arg("--continue-on-fail")
        .arg("--output-dir")
        .arg(dir.path().join("out"))
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""kind":"ValidationError""#))
        .stdout(predicate::str::contains(r#""operation":"addText""#))
        .stdout(predicate::str::contains(r#""origin":"system""#));
}

#[test]
fn test_cli_run_aborts_on_first_failure() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let batch = dir.path().join("batch.json");
    fs::write(
        &batch,
        r#"[
            {"operation": "fontInfo", "fontKey": "noto-sans-kr"},
            {"operation": "deleteFont", "fontKey": "never-uploaded"},
            {"operation": "listFonts"}
        ]"#,
    )
    .unwrap();

    let mut cmd = mediafx_cmd();
    cmd.arg("--config")
        .arg(&config)
        .arg("run")
        .arg(&batch)
        .assert()
        .failure()
        .stdout(predicate::str::contains(r#""index":0"#))
        .stdout(predicate::str::contains(r#""index":2"#).not())
        .stderr(predicate::str::contains("item 1 (deleteFont) failed"));
}

#[test]
fn test_cli_fonts_upload_list_delete() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let font = dir.path().join("Brand.ttf");
    fs::write(&font, b"ttf").unwrap();

    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["fonts", "upload"])
        .arg(&font)
        .args(["--key", "brand"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Uploaded 'brand'"));
    assert!(dir.path().join("fonts/user/brand.ttf").exists());

    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["fonts", "list", "--filter", "user", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"brand\""));

    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["fonts", "delete", "brand"])
        .assert()
        .success();
    assert!(!dir.path().join("fonts/user/brand.ttf").exists());
}

#[test]
fn test_cli_fonts_validate_bad_key() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["fonts", "validate", "a!"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""valid":false"#));
}

#[test]
fn test_cli_fonts_info_unknown_key_fails() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["fonts", "info", "nope"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("nope"));
}

#[test]
fn test_cli_sweep_removes_old_files() {
    let dir = tempdir().unwrap();
    let config = write_config(dir.path());
    let tmp = dir.path().join("tmp");
    fs::create_dir_all(&tmp).unwrap();
    fs::write(tmp.join("mediafx-stale.mp4"), b"x").unwrap();

    mediafx_cmd()
        .arg("--config")
        .arg(&config)
        .args(["sweep", "--max-age-hours", "0"])
        .assert()
        .success()
        .stdout(predicate::str::contains("removed 1 of 1"));
    assert!(!tmp.join("mediafx-stale.mp4").exists());
}

#[test]
fn test_cli_probe_nonexistent_file() {
    let mut cmd = mediafx_cmd();
    cmd.args(["probe", "/nonexistent/clip.mp4"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not exist"));
}
