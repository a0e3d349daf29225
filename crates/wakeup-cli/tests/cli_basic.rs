//! Basic CLI E2E tests.
//!
//! Each test gets its own data directory and pins the clock with `--now`.

use std::process::Command;

use serde_json::Value;
use tempfile::TempDir;

/// Run a CLI command against `dir` and return (stdout, stderr, code).
fn run_cli(dir: &TempDir, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_wakeup"))
        .args(args)
        .env("WAKEUP_DATA_DIR", dir.path())
        .env_remove("WAKEUP_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_json(dir: &TempDir, args: &[&str]) -> Value {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "{args:?} failed: {stderr}");
    serde_json::from_str(&stdout).expect("Failed to parse JSON output")
}

#[test]
fn test_alarm_set_and_status() {
    let dir = TempDir::new().unwrap();
    let set = run_json(
        &dir,
        &["alarm", "set", "07:30", "--difficulty", "hard", "--now", "2024-05-10T22:00"],
    );
    assert_eq!(set["state"], "armed");

    let status = run_json(&dir, &["alarm", "status", "--now", "2024-05-10T23:00"]);
    assert_eq!(status["has_alarm"], true);
    assert_eq!(status["next_alarm_time"], "07:30");
    assert_eq!(status["alarm"]["difficulty"], "hard");
    assert_eq!(status["time_until_alarm_ms"], 8 * 3_600_000 + 30 * 60_000);
}

#[test]
fn test_alarm_set_rejects_bad_time() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(&dir, &["alarm", "set", "25:00"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Invalid alarm time"));

    let status = run_json(&dir, &["alarm", "status"]);
    assert_eq!(status["has_alarm"], false);
}

#[test]
fn test_morning_snooze_then_complete() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["alarm", "set", "07:00", "--now", "2024-05-10T06:00"]);

    let (_, stderr, code) = run_cli(&dir, &["alarm", "snooze", "--now", "2024-05-10T06:30"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Cannot snooze"));

    let snooze = run_json(&dir, &["alarm", "snooze", "--now", "2024-05-10T07:00:30"]);
    assert_eq!(snooze["snooze_count"], 1);
    assert_eq!(snooze["penalty_amount"], 7.5);
    assert_eq!(snooze["next_alarm_time"], "2024-05-10T07:05:30");

    let waiting = run_json(&dir, &["alarm", "status", "--now", "2024-05-10T07:02"]);
    assert_eq!(waiting["state"], "snoozed");

    let done = run_json(&dir, &["alarm", "complete", "--now", "2024-05-10T07:06"]);
    assert_eq!(done["state"], "completed");
    assert_eq!(done["alarm"]["snooze_count"], 0);

    let today = run_json(&dir, &["stats", "today", "--now", "2024-05-10T08:00"]);
    assert_eq!(today["wake_up_success"], true);
    assert_eq!(today["snooze_count"], 1);
    assert_eq!(today["penalty_amount"], 7.5);

    let total = run_json(&dir, &["stats", "total", "--now", "2024-05-10T08:00"]);
    assert_eq!(total["total_days"], 1);
    assert_eq!(total["success_rate"], 100.0);
}

#[test]
fn test_run_exits_when_alarm_rings() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["alarm", "set", "07:00", "--now", "2024-05-10T06:00"]);

    let (stdout, _, code) = run_cli(&dir, &["alarm", "run", "--now", "2024-05-10T07:00"]);
    assert_eq!(code, 0);
    let types: Vec<String> = stdout
        .lines()
        .map(|line| serde_json::from_str::<Value>(line).unwrap()["type"].to_string())
        .collect();
    assert!(types.iter().any(|t| t.contains("AlarmTriggered")));
    assert!(types.iter().any(|t| t.contains("SoundRequested")));
}

#[test]
fn test_cancel_disable_enable() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["alarm", "set", "07:00", "--now", "2024-05-10T06:00"]);

    let cancelled = run_json(&dir, &["alarm", "cancel", "--now", "2024-05-10T06:10"]);
    assert_eq!(cancelled["state"], "idle");
    assert_eq!(cancelled["is_active"], false);

    let enabled = run_json(&dir, &["alarm", "enable", "--now", "2024-05-10T06:20"]);
    assert_eq!(enabled["state"], "armed");
    assert_eq!(enabled["is_active"], true);

    let disabled = run_json(&dir, &["alarm", "disable", "--now", "2024-05-10T06:30"]);
    assert_eq!(disabled["is_active"], false);
}

#[test]
fn test_penalty_commands() {
    let dir = TempDir::new().unwrap();
    let calc = run_json(&dir, &["penalty", "calc", "2"]);
    assert_eq!(calc["penalty_amount"], 15.0);
    assert_eq!(calc["total_penalty"], 22.5);

    let huge = run_json(&dir, &["penalty", "calc", "4294967295"]);
    assert_eq!(huge["penalty_amount"], 50.0);

    let schedule = run_json(&dir, &["penalty", "schedule"]);
    assert_eq!(schedule.as_array().unwrap().len(), 3);

    let set = run_json(&dir, &["penalty", "set", "--type", "fixed", "--base-amount", "3"]);
    assert_eq!(set["penalty_type"], "fixed");
    let calc = run_json(&dir, &["penalty", "calc", "4"]);
    assert_eq!(calc["penalty_amount"], 3.0);

    let adjusted = run_json(&dir, &["penalty", "adjust", "max_snoozes", "20"]);
    assert_eq!(adjusted["max_snoozes"], 10);

    let (_, _, code) = run_cli(&dir, &["penalty", "set", "--base-amount", "0"]);
    assert_eq!(code, 1);
}

#[test]
fn test_config_get_set() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["config", "get", "alarm.max_snooze_count"]);
    assert_eq!(code, 0);
    assert_eq!(stdout.trim(), "3");

    let (_, _, code) = run_cli(&dir, &["config", "set", "alarm.max_snooze_count", "4"]);
    assert_eq!(code, 0);
    let (stdout, _, _) = run_cli(&dir, &["config", "get", "alarm.max_snooze_count"]);
    assert_eq!(stdout.trim(), "4");

    let (_, _, code) = run_cli(&dir, &["config", "set", "alarm.no_such_key", "1"]);
    assert_eq!(code, 1);

    let list = run_json(&dir, &["config", "list"]);
    assert_eq!(list["shake"]["shake_interval_ms"], 500);
}

#[test]
fn test_shake_simulate() {
    let dir = TempDir::new().unwrap();
    let sim = run_json(
        &dir,
        &["shake", "simulate", "--difficulty", "easy", "--jolts", "12"],
    );
    assert_eq!(sim["required_shakes"], 10);
    assert_eq!(sim["shake_count"], 12);
    assert_eq!(sim["completed"], true);
    assert_eq!(sim["threshold"], 12.0);

    let weak = run_json(
        &dir,
        &["shake", "simulate", "--difficulty", "hard", "--magnitude", "5"],
    );
    assert_eq!(weak["shake_count"], 0);
    assert_eq!(weak["completed"], false);
}

#[test]
fn test_data_clear_requires_confirmation() {
    let dir = TempDir::new().unwrap();
    run_json(&dir, &["alarm", "set", "07:00"]);

    let (_, _, code) = run_cli(&dir, &["data", "clear"]);
    assert_eq!(code, 1);

    let (_, _, code) = run_cli(&dir, &["data", "clear", "--yes"]);
    assert_eq!(code, 0);
    let status = run_json(&dir, &["alarm", "status"]);
    assert_eq!(status["has_alarm"], false);
}

#[test]
fn test_completions() {
    let dir = TempDir::new().unwrap();
    let (stdout, _, code) = run_cli(&dir, &["completions", "bash"]);
    assert_eq!(code, 0);
    assert!(stdout.contains("wakeup"));
}
