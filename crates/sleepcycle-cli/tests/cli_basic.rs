//! Basic CLI E2E tests.
//!
//! Tests invoke CLI commands via cargo run against a throwaway HOME and
//! verify outputs.

use std::path::Path;
use std::process::Command;

/// Run a CLI command with `home` as HOME and return (stdout, stderr, code).
fn run_cli(home: &Path, args: &[&str]) -> (String, String, i32) {
    run_cli_with_log(home, "off", args)
}

/// [`run_cli`] with `RUST_LOG` set to `filter`.
fn run_cli_with_log(home: &Path, filter: &str, args: &[&str]) -> (String, String, i32) {
    let output = Command::new("cargo")
        .args(["run", "-q", "-p", "sleepcycle-cli", "--"])
        .args(args)
        .env("HOME", home)
        .env("RUST_LOG", filter)
        .env_remove("SLEEPCYCLE_ENV")
        .env("LANG", "en_US.UTF-8")
        .env_remove("LC_ALL")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn home() -> tempfile::TempDir {
    tempfile::TempDir::new().expect("temp home")
}

#[test]
fn test_cycle_wake_json_lists_six_candidates() {
    let home = home();
    let (stdout, stderr, code) = run_cli(home.path(), &["cycle", "wake", "--at", "23:00", "--json"]);
    assert_eq!(code, 0, "cycle wake failed: {stderr}");
    let parsed: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let rows = parsed.as_array().unwrap();
    assert_eq!(rows.len(), 6);
    assert_eq!(rows[0]["cycles"], 6);
    assert_eq!(rows[5]["cycles"], 1);
}

#[test]
fn test_cycle_bed_prints_header() {
    let home = home();
    let (stdout, _, code) = run_cli(home.path(), &["cycle", "bed", "--at", "07:00"]);
    assert_eq!(code, 0);
    assert!(stdout.starts_with("Go to bed at"));
}

#[test]
fn test_cycle_rejects_bad_time() {
    let home = home();
    let (_, stderr, code) = run_cli(home.path(), &["cycle", "bed", "--at", "seven"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("invalid time"));
}

#[test]
fn test_pick_records_sleep() {
    let home = home();
    let (stdout, _, code) =
        run_cli(home.path(), &["cycle", "wake", "--at", "23:00", "--pick", "5"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("Alarm set for"));

    let (stdout, _, code) = run_cli(home.path(), &["sleeps", "list", "--json"]);
    assert_eq!(code, 0);
    let sleeps: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let sleeps = sleeps.as_array().unwrap();
    assert_eq!(sleeps.len(), 1);
    assert_eq!(sleeps[0]["type"], "sleep");
    assert_eq!(sleeps[0]["cycle"], 5);
}

#[test]
fn test_nap_then_delete() {
    let home = home();
    assert_eq!(run_cli(home.path(), &["cycle", "nap"]).2, 0);

    let (stdout, _, _) = run_cli(home.path(), &["sleeps", "list", "--kind", "nap", "--json"]);
    let naps: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    let id = naps[0]["id"].as_i64().unwrap();

    let (stdout, _, code) = run_cli(home.path(), &["sleeps", "delete", &id.to_string()]);
    assert_eq!(code, 0);
    assert!(stdout.contains("deleted 1"));
}

#[test]
fn test_report_json_on_empty_history() {
    let home = home();
    let (stdout, _, code) = run_cli(home.path(), &["sleeps", "report", "--json"]);
    assert_eq!(code, 0);
    let report: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(report["series"], serde_json::json!([0.0]));
}

#[test]
fn test_latency_steps_and_floor() {
    let home = home();
    let (stdout, _, _) = run_cli(home.path(), &["settings", "latency", "--up"]);
    assert_eq!(stdout.trim(), "5 min");
    let (stdout, _, _) = run_cli(home.path(), &["settings", "latency", "--down"]);
    assert_eq!(stdout.trim(), "0 min");
    let (stdout, _, _) = run_cli(home.path(), &["settings", "latency", "--down"]);
    assert_eq!(stdout.trim(), "0 min");
}

#[test]
fn test_language_rejects_unsupported_code() {
    let home = home();
    let (_, stderr, code) = run_cli(home.path(), &["settings", "language", "xx"]);
    assert_ne!(code, 0);
    assert!(stderr.contains("unsupported language"));

    let (stdout, _, code) = run_cli(home.path(), &["settings", "language", "de"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "Deutsch");
}

#[test]
fn test_config_set_and_get() {
    let home = home();
    assert_eq!(run_cli(home.path(), &["config", "set", "clock.use_24_hour", "true"]).2, 0);
    let (stdout, _, code) = run_cli(home.path(), &["config", "get", "clock.use_24_hour"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "true");

    let (_, _, code) = run_cli(home.path(), &["config", "get", "clock.nope"]);
    assert_ne!(code, 0);
}

#[test]
fn test_unreadable_config_warns_after_logging_starts() {
    let home = home();
    let dir = home.path().join(".config").join("sleepcycle");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("config.toml"), "clock = [[[").unwrap();

    let (stdout, stderr, code) = run_cli_with_log(home.path(), "warn", &["settings", "latency"]);
    assert_eq!(code, 0, "settings latency failed: {stderr}");
    assert_eq!(stdout.trim(), "0 min");
    assert!(stderr.contains("config unreadable"), "missing warning: {stderr}");
}

#[test]
fn test_list_window_narrows_history() {
    let home = home();
    assert_eq!(run_cli(home.path(), &["cycle", "nap"]).2, 0);

    let (stdout, stderr, code) =
        run_cli(home.path(), &["sleeps", "list", "--window", "all", "--json"]);
    assert_eq!(code, 0, "sleeps list failed: {stderr}");
    let all: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(all.as_array().unwrap().len(), 1);

    let (stdout, _, code) =
        run_cli(home.path(), &["sleeps", "list", "--window", "previous", "--json"]);
    assert_eq!(code, 0);
    let previous: serde_json::Value = serde_json::from_str(&stdout).unwrap();
    assert!(previous.as_array().unwrap().is_empty());
}
