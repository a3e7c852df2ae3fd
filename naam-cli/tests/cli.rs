//! Integration tests for the naam CLI
//!
//! None of these reach a server: each command either runs offline or
//! fails before its first request.

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

/// Isolated config with an in-memory session and an unroutable backend
struct TestEnv {
    temp_dir: TempDir,
    config_path: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        Self::with_config(
            r#"
[api]
base_url = "http://127.0.0.1:9"
timeout_secs = 2

[session]
storage = "memory"
"#,
        )
    }

    fn with_config(content: &str) -> Self {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, content).unwrap();
        Self {
            temp_dir,
            config_path,
        }
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("naam").unwrap();
        cmd.env("NAAM_CONFIG", &self.config_path);
        cmd.env_remove("NAAM_API_BASE_URL");
        cmd.env_remove("RUST_LOG");
        cmd.env_remove("NAAM_LOG_FORMAT");
        cmd.env_remove("NAAM_LOG_LEVEL");
        cmd
    }
}

#[test]
fn test_help_lists_commands() {
    let env = TestEnv::new();
    env.cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("payment-mode"))
        .stdout(predicate::str::contains("EXIT CODES"));
}

#[test]
fn test_payment_mode_at_threshold_is_neft() {
    let env = TestEnv::new();
    env.cmd()
        .args(["payment-mode", "200000"])
        .assert()
        .success()
        .stdout("NEFT\n");
}

#[test]
fn test_payment_mode_above_threshold_is_rtgs() {
    let env = TestEnv::new();
    env.cmd()
        .args(["payment-mode", "200000.01"])
        .assert()
        .success()
        .stdout("RTGS\n");
}

#[test]
fn test_payment_mode_json() {
    let env = TestEnv::new();
    let output = env
        .cmd()
        .args(["--format", "json", "payment-mode", "150000"])
        .output()
        .unwrap();
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["mode"], "NEFT");
    assert_eq!(value["rtgsThreshold"], 200000.0);
}

#[test]
fn test_payment_mode_uses_configured_threshold() {
    let env = TestEnv::with_config(
        r#"
[api]
base_url = "http://127.0.0.1:9"

[session]
storage = "memory"

[payments]
rtgs_threshold = 100000
"#,
    );
    env.cmd()
        .args(["payment-mode", "150000"])
        .assert()
        .success()
        .stdout("RTGS\n");
}

#[test]
fn test_zero_amount_is_invalid_input() {
    let env = TestEnv::new();
    env.cmd()
        .args(["payment-mode", "0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("greater than zero"));
}

#[test]
fn test_short_mobile_is_rejected_before_sending() {
    let env = TestEnv::new();
    env.cmd()
        .args(["login", "--mobile", "98765", "--otp", "123456"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("exactly 10 digits"));
}

#[test]
fn test_unknown_role_is_invalid_input() {
    let env = TestEnv::new();
    env.cmd()
        .args(["login", "--mobile", "9876543210", "--role", "trader"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Unknown role"));
}

#[test]
fn test_whoami_without_session_is_auth_failure() {
    let env = TestEnv::new();
    env.cmd()
        .arg("whoami")
        .assert()
        .code(2)
        .stderr(predicate::str::contains("Not logged in"));
}

#[test]
fn test_land_form_missing_tree_count_fails_validation() {
    let env = TestEnv::new();
    let form = env.temp_dir.path().join("parcel.toml");
    fs::write(
        &form,
        r#"
ownershipType = "owned"
irrigationType = "drip"
soilType = "laterite"
landArea = 2.5
surveyNumber = "112/4"
stateId = "32"
districtId = "7"
talukId = "41"
villageId = "903"
coconutFarming = "yes"
treeAgeYears = 12
coconutVariety = "West Coast Tall"
harvestFrequency = "45 days"
"#,
    )
    .unwrap();

    env.cmd()
        .args(["land", "submit"])
        .arg(&form)
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Validation failed"));
}

#[test]
fn test_missing_land_form_file() {
    let env = TestEnv::new();
    env.cmd()
        .args(["land", "submit", "does-not-exist.toml"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("Cannot read"));
}

#[test]
fn test_explicit_missing_config_fails() {
    let env = TestEnv::new();
    env.cmd()
        .args(["--config", "/nonexistent/naam.toml", "payment-mode", "10"])
        .assert()
        .code(1);
}

#[test]
fn test_district_requires_state() {
    let env = TestEnv::new();
    env.cmd()
        .args(["locations", "--district", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--state"));
}

#[test]
fn test_reads_without_session_are_auth_failures() {
    let env = TestEnv::new();
    for args in [
        &["news"][..],
        &["polls", "list"][..],
        &["collections", "list"][..],
        &["payments", "list"][..],
        &["land", "list"][..],
        &["bank", "show"][..],
    ] {
        env.cmd()
            .args(args)
            .assert()
            .code(2)
            .stderr(predicate::str::contains("Not logged in"));
    }
}

#[test]
fn test_vote_without_session_is_auth_failure() {
    let env = TestEnv::new();
    env.cmd()
        .args(["polls", "vote", "p1", "o2"])
        .assert()
        .code(2);
}

#[test]
fn test_log_format_and_level_from_environment() {
    let env = TestEnv::new();
    env.cmd()
        .env("NAAM_LOG_FORMAT", "json")
        .env("NAAM_LOG_LEVEL", "debug")
        .args(["payment-mode", "10"])
        .assert()
        .success()
        .stdout("NEFT\n")
        .stderr(predicate::str::contains(r#""level":"DEBUG""#))
        .stderr(predicate::str::contains("Using API at"));
}

#[test]
fn test_default_log_level_is_quiet() {
    let env = TestEnv::new();
    env.cmd()
        .args(["payment-mode", "10"])
        .assert()
        .success()
        .stderr(predicate::str::is_empty());
}
