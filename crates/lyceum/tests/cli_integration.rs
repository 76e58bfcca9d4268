//! CLI integration tests for the Lyceum command-line interface.
//!
//! These tests verify:
//! - Help text is displayed correctly
//! - Argument parsing works as expected
//! - Commands that never reach the backend (config, payment returns)
//!
//! Note: These tests do not require a running backend. Each test that runs
//! a command points the config and data directories at a temp dir.

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

/// Get a command for the lyceum binary.
fn lyceum() -> Command {
    Command::cargo_bin("lyceum").unwrap()
}

/// A command isolated from the user's config and data.
fn isolated(dir: &TempDir) -> Command {
    let mut cmd = lyceum();
    cmd.env("LYCEUM_CONFIG_DIR", dir.path().join("config"))
        .env("LYCEUM_DATA_DIR", dir.path().join("data"))
        .env_remove("LYCEUM_SERVER_URL")
        .env_remove("LYCEUM_CONTEXT");
    cmd
}

// ─────────────────────────────────────────────────────────────────────────────
// Help and Version Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_help_displays() {
    lyceum()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Lyceum"));
}

#[test]
fn test_version_displays() {
    lyceum()
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("lyceum"));
}

#[test]
fn test_help_lists_subcommands() {
    lyceum()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("auth"))
        .stdout(predicate::str::contains("courses"))
        .stdout(predicate::str::contains("enroll"))
        .stdout(predicate::str::contains("review"))
        .stdout(predicate::str::contains("payment"))
        .stdout(predicate::str::contains("profile"))
        .stdout(predicate::str::contains("live-classes"))
        .stdout(predicate::str::contains("instructors"))
        .stdout(predicate::str::contains("admin"))
        .stdout(predicate::str::contains("config"))
        .stdout(predicate::str::contains("status"));
}

#[test]
fn test_no_subcommand_fails() {
    lyceum().assert().failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Global Flag Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_verbose_flag_accepted() {
    lyceum().args(["--verbose", "--help"]).assert().success();
}

#[test]
fn test_json_flag_accepted() {
    lyceum().args(["--json", "--help"]).assert().success();
}

#[test]
fn test_server_flag_accepted() {
    lyceum()
        .args(["--server", "http://localhost:9999", "--help"])
        .assert()
        .success();
}

#[test]
fn test_context_flag_accepted() {
    lyceum()
        .args(["--context", "staging", "--help"])
        .assert()
        .success();
}

// ─────────────────────────────────────────────────────────────────────────────
// Subcommand Help Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_auth_help() {
    lyceum()
        .args(["auth", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_courses_list_help() {
    lyceum()
        .args(["courses", "list", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--search"))
        .stdout(predicate::str::contains("--price"));
}

#[test]
fn test_payment_help() {
    lyceum()
        .args(["payment", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("return"));
}

#[test]
fn test_admin_help() {
    lyceum()
        .args(["admin", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("verify-key"))
        .stdout(predicate::str::contains("create-course"));
}

// ─────────────────────────────────────────────────────────────────────────────
// Argument Validation Tests
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_enroll_requires_course() {
    lyceum().arg("enroll").assert().failure();
}

#[test]
fn test_review_rating_out_of_range() {
    lyceum()
        .args(["review", "course-1", "--rating", "6", "--comment", "great"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("rating"));
}

#[test]
fn test_courses_list_rejects_unknown_price() {
    lyceum()
        .args(["courses", "list", "--price", "cheap"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown price filter"));
}

#[test]
fn test_schedule_rejects_bad_start() {
    lyceum()
        .args([
            "admin",
            "schedule",
            "--admin-key",
            "k",
            "--course",
            "c",
            "--title",
            "t",
            "--instructor",
            "i",
            "--start",
            "tomorrow",
        ])
        .assert()
        .failure();
}

#[test]
fn test_create_course_price_conflicts_with_free() {
    lyceum()
        .args([
            "admin",
            "create-course",
            "--admin-key",
            "k",
            "--title",
            "t",
            "--category",
            "c",
            "--instructor",
            "i",
            "--price",
            "100",
            "--free",
        ])
        .assert()
        .failure();
}

// ─────────────────────────────────────────────────────────────────────────────
// Offline Commands
// ─────────────────────────────────────────────────────────────────────────────

#[test]
fn test_payment_cancel_return() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["payment", "return", "http://localhost:4943/payment-failure"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Payment cancelled"));
}

#[test]
fn test_payment_return_without_session_id_is_a_no_op() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args([
            "payment",
            "return",
            "http://localhost:4943/payment-success?courseId=c1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("nothing to confirm"));

    // Nothing was confirmed, so nothing was written.
    assert!(!dir.path().join("data").join("payments.json").exists());
}

#[test]
fn test_payment_return_without_session_id_json() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args([
            "--json",
            "payment",
            "return",
            "http://localhost:4943/payment-success?courseId=c1&sessionId=",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"ignored\""));
}

#[test]
fn test_payment_return_already_confirmed_stays_offline() {
    let dir = TempDir::new().unwrap();
    let data = dir.path().join("data");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::write(
        data.join("payments.json"),
        r#"{"cs_1":{"course_id":"c1","state":"confirmed","updated_at":"2026-01-01T00:00:00Z"}}"#,
    )
    .unwrap();

    // Nothing listens on this port; a confirmation call would fail.
    isolated(&dir)
        .args([
            "--server",
            "http://127.0.0.1:9",
            "payment",
            "return",
            "http://localhost:4943/payment-success?courseId=c1&sessionId=cs_1",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("already confirmed"));
}

#[test]
fn test_config_show_defaults() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["--json", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://localhost:4943"))
        .stdout(predicate::str::contains("\"currency\": \"USD\""));
}

#[test]
fn test_server_flag_overrides_config() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["--server", "http://example.test:8000", "config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("http://example.test:8000"));
}

#[test]
fn test_context_lifecycle() {
    let dir = TempDir::new().unwrap();

    isolated(&dir)
        .args(["config", "set-context", "local", "--server", "http://localhost:4943"])
        .assert()
        .success()
        .stdout(predicate::str::contains("created"))
        .stdout(predicate::str::contains("set as current"));

    isolated(&dir)
        .args(["config", "current-context"])
        .assert()
        .success()
        .stdout(predicate::str::contains("local"));

    isolated(&dir)
        .args(["config", "set-context", "staging", "--server", "https://staging.test"])
        .assert()
        .success();

    isolated(&dir)
        .args(["config", "use-context", "staging"])
        .assert()
        .success();

    isolated(&dir)
        .args(["config", "get-contexts"])
        .assert()
        .success()
        .stdout(predicate::str::contains("* "))
        .stdout(predicate::str::contains("staging"))
        .stdout(predicate::str::contains("local"));

    isolated(&dir)
        .args(["config", "delete-context", "staging"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No current context"));
}

#[test]
fn test_new_context_requires_server() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["config", "set-context", "nowhere"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--server is required"));
}

#[test]
fn test_unknown_context_is_an_error() {
    let dir = TempDir::new().unwrap();
    isolated(&dir)
        .args(["--context", "missing", "config", "show"])
        .assert()
        .failure();
}
