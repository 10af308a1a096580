//! Integration tests for the `flatcms` CLI binary.
//!
//! These tests run the CLI as a subprocess against temporary credentials
//! files, checking exit codes and output.

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::fs;
use std::path::Path;
use std::process::Command;

/// Helper: locate the `flatcms` binary built by `cargo test`.
fn flatcms_bin() -> String {
    let path = env!("CARGO_BIN_EXE_flatcms");
    assert!(
        Path::new(path).exists(),
        "flatcms binary not found at {path}"
    );
    path.to_owned()
}

/// Helper: run flatcms with args and return (`exit_code`, stdout, stderr).
fn run(args: &[&str]) -> (i32, String, String) {
    let output = Command::new(flatcms_bin())
        .arg("--no-color")
        .args(args)
        .env_remove("FLATCMS_CREDENTIALS")
        .output()
        .expect("failed to execute flatcms");

    let code = output.status.code().unwrap_or(-1);
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    (code, stdout, stderr)
}

/// Helper: hash a password at the cheapest cost through the CLI itself.
fn hash(password: &str) -> String {
    let (code, stdout, stderr) = run(&["hash-password", password, "--cost", "4"]);
    assert_eq!(code, 0, "hash-password failed: {stderr}");
    stdout.trim().to_owned()
}

/// Helper: write a credentials file with one `admin` user.
fn admin_credentials(dir: &Path, password: &str) -> String {
    let path = dir.join("users.toml");
    fs::write(&path, format!("admin = \"{}\"\n", hash(password))).expect("write failed");
    path.to_str().unwrap().to_owned()
}

// ── Version & help ───────────────────────────────────────────────────

#[test]
fn test_version_flag() {
    let (code, stdout, _) = run(&["--version"]);
    assert_eq!(code, 0, "flatcms --version should exit 0");
    assert!(
        stdout.contains("flatcms"),
        "version output should contain 'flatcms': {stdout}"
    );
}

#[test]
fn test_help_lists_commands() {
    let (code, stdout, _) = run(&["--help"]);
    assert_eq!(code, 0, "flatcms --help should exit 0");
    for sub in ["hash-password", "check-credentials", "verify"] {
        assert!(stdout.contains(sub), "help should list '{sub}'");
    }
}

// ── hash-password ────────────────────────────────────────────────────

#[test]
fn test_hash_password_prints_bcrypt_hash() {
    let hashed = hash("secret");
    assert!(hashed.starts_with("$2"), "not a bcrypt hash: {hashed}");
    assert!(!hashed.contains("secret"));
}

#[test]
fn test_hash_password_rejects_empty() {
    let (code, stdout, stderr) = run(&["hash-password", ""]);
    assert_ne!(code, 0);
    assert!(stdout.is_empty());
    assert!(stderr.contains("must not be empty"), "stderr: {stderr}");
}

#[test]
fn test_hash_password_rejects_bad_cost() {
    let (code, _, stderr) = run(&["hash-password", "secret", "--cost", "99"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("Error"), "stderr: {stderr}");
}

// ── check-credentials ────────────────────────────────────────────────

#[test]
fn test_check_credentials_lists_users() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("users.toml");
    fs::write(
        &path,
        format!("zed = \"{}\"\nadmin = \"{}\"\n", hash("a"), hash("b")),
    )
    .unwrap();

    let (code, stdout, _) = run(&["check-credentials", "--credentials", path.to_str().unwrap()]);
    assert_eq!(code, 0);
    assert_eq!(stdout, "admin\nzed\n");
}

#[test]
fn test_check_credentials_missing_file() {
    let (code, _, stderr) = run(&[
        "check-credentials",
        "--credentials",
        "/tmp/flatcms-test-nonexistent/users.toml",
    ]);
    assert_ne!(code, 0, "missing credentials file should fail");
    assert!(stderr.contains("Error"), "stderr: {stderr}");
}

#[test]
fn test_check_credentials_malformed_file() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = dir.path().join("users.toml");
    fs::write(&path, "admin = [not toml").unwrap();

    let (code, _, _) = run(&["check-credentials", "--credentials", path.to_str().unwrap()]);
    assert_ne!(code, 0, "malformed credentials file should fail");
}

#[test]
fn test_check_credentials_reads_env() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = admin_credentials(dir.path(), "secret");

    let output = Command::new(flatcms_bin())
        .args(["--no-color", "check-credentials"])
        .env("FLATCMS_CREDENTIALS", &path)
        .output()
        .expect("failed to execute flatcms");

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "admin\n");
}

// ── verify ───────────────────────────────────────────────────────────

#[test]
fn test_verify_accepts_matching_password() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = admin_credentials(dir.path(), "secret");

    let (code, stdout, _) = run(&["verify", "admin", "secret", "--credentials", &path]);
    assert_eq!(code, 0);
    assert!(stdout.contains("valid for admin"));
}

#[test]
fn test_verify_rejects_wrong_password() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = admin_credentials(dir.path(), "secret");

    let (code, _, stderr) = run(&["verify", "admin", "nope", "--credentials", &path]);
    assert_eq!(code, 1);
    assert!(stderr.contains("invalid credentials"), "stderr: {stderr}");
}

#[test]
fn test_verify_rejects_unknown_user() {
    let dir = tempfile::tempdir().expect("failed to create temp dir");
    let path = admin_credentials(dir.path(), "secret");

    let (code, _, _) = run(&["verify", "mallory", "secret", "--credentials", &path]);
    assert_eq!(code, 1);
}
