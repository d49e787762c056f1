//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against a throwaway home directory so the
//! config file it reads and writes never touches the real one.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};

fn cli(home: &Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hydrate-cli"));
    cmd.env("HOME", home)
        .env("HYDRATE_ENV", "dev")
        .env("RUST_LOG", "off");
    cmd
}

/// Run a CLI command and return (exit code, stdout, stderr).
fn run_cli(home: &Path, args: &[&str]) -> (i32, String, String) {
    let output = cli(home)
        .args(args)
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (code, stdout, stderr)
}

#[test]
fn test_plan_overnight_sleep() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(
        home.path(),
        &[
            "plan",
            "--sleep-start",
            "10:00 PM",
            "--sleep-end",
            "06:00 AM",
            "--goal",
            "2000",
            "--interval",
            "60",
            "--date",
            "2026-10-16",
        ],
    );
    assert_eq!(code, 0, "plan failed");

    let plan: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(plan["interval_count"], 17);
    assert_eq!(plan["dose_ml"], 118);
    assert_eq!(plan["awake_minutes"], 960);
    assert_eq!(plan["timestamps"][0], "2026-10-16T06:00:00");
    assert_eq!(plan["timestamps"][16], "2026-10-16T22:00:00");
}

#[test]
fn test_plan_uses_config_defaults() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["plan", "--date", "2026-10-16"]);
    assert_eq!(code, 0, "plan failed");

    let plan: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(plan["date"], "2026-10-16");
    assert_eq!(plan["interval_count"], 17);
}

#[test]
fn test_plan_rejects_zero_interval() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["plan", "--interval", "0"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("interval"), "stderr: {stderr}");
}

#[test]
fn test_config_set_get_reset() {
    let home = tempfile::tempdir().unwrap();

    let (code, stdout, _) = run_cli(home.path(), &["config", "set", "hydration.interval_min", "30"]);
    assert_eq!(code, 0, "config set failed");
    assert_eq!(stdout.trim(), "ok");

    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "hydration.interval_min"]);
    assert_eq!(stdout.trim(), "30");

    let (code, _, _) = run_cli(home.path(), &["config", "set", "hydration.daily_goal_ml", "0"]);
    assert_eq!(code, 1, "zero goal must be rejected");
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "hydration.daily_goal_ml"]);
    assert_eq!(stdout.trim(), "2000");

    let (code, _, _) = run_cli(home.path(), &["config", "reset"]);
    assert_eq!(code, 0);
    let (_, stdout, _) = run_cli(home.path(), &["config", "get", "hydration.interval_min"]);
    assert_eq!(stdout.trim(), "60");
}

#[test]
fn test_config_get_unknown_key() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, stderr) = run_cli(home.path(), &["config", "get", "hydration.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));
}

#[test]
fn test_config_list_is_json() {
    let home = tempfile::tempdir().unwrap();
    let (code, stdout, _) = run_cli(home.path(), &["config", "list"]);
    assert_eq!(code, 0);

    let config: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(config["hydration"]["sleep_start"], "10:00 PM");
    assert_eq!(config["notifications"]["enabled"], true);
}

/// Feed `input` to a `run` session and return (success, stdout, stderr).
fn run_session(home: &Path, input: &str) -> (bool, String, String) {
    let mut child = cli(home)
        .args(["run"])
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn session");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(input.as_bytes())
        .unwrap();
    let output = child.wait_with_output().unwrap();

    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).to_string(),
        String::from_utf8_lossy(&output.stderr).to_string(),
    )
}

#[test]
fn test_run_session_reads_commands_until_quit() {
    let home = tempfile::tempdir().unwrap();
    let (ok, stdout, _) = run_session(home.path(), "notify off\nset interval 30\nshow\nquit\n");
    assert!(ok);
    assert!(stdout.contains("\"type\":\"NotificationsDisabled\""), "stdout: {stdout}");
    assert!(stdout.contains("\"type\":\"ConfigApplied\""), "stdout: {stdout}");
    assert!(stdout.contains("\"interval_count\": 33"), "stdout: {stdout}");
}

#[test]
fn test_run_session_honours_disabled_notifications() {
    let home = tempfile::tempdir().unwrap();
    let (code, _, _) = run_cli(home.path(), &["config", "set", "notifications.enabled", "false"]);
    assert_eq!(code, 0);

    let (ok, stdout, stderr) = run_session(home.path(), "notify on\nquit\n");
    assert!(ok);
    assert!(stdout.contains("\"armed\": false"), "stdout: {stdout}");
    assert!(stdout.contains("\"type\":\"PermissionFailed\""), "stdout: {stdout}");
    assert!(!stdout.contains("\"type\":\"RemindersArmed\""), "stdout: {stdout}");
    assert!(stderr.contains("permission was denied"), "stderr: {stderr}");
}
