//! Basic CLI E2E tests.
//!
//! Each test runs the built binary against its own data directory.

use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use std::sync::Arc;

use chrono::Utc;
use focusroom_core::{ActiveSessionSnapshot, Database, PomodoroSession, SessionStore};
use tempfile::TempDir;

/// Run a CLI command and return (stdout, stderr, exit code).
fn run_cli(dir: &Path, args: &[&str]) -> (String, String, i32) {
    let output = Command::new(env!("CARGO_BIN_EXE_focusroom"))
        .args(args)
        .env("FOCUSROOM_DATA_DIR", dir)
        .env_remove("FOCUSROOM_LOG")
        .output()
        .expect("Failed to execute CLI command");

    let stdout = String::from_utf8_lossy(&output.stdout).to_string();
    let stderr = String::from_utf8_lossy(&output.stderr).to_string();
    let code = output.status.code().unwrap_or(-1);

    (stdout, stderr, code)
}

fn run_ok(dir: &Path, args: &[&str]) -> String {
    let (stdout, stderr, code) = run_cli(dir, args);
    assert_eq!(code, 0, "CLI command failed: {args:?}\n{stderr}");
    stdout
}

/// Parse JSON-lines output.
fn events(stdout: &str) -> Vec<serde_json::Value> {
    stdout
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| serde_json::from_str(l).expect("Failed to parse JSON line"))
        .collect()
}

fn types(stdout: &str) -> Vec<String> {
    events(stdout)
        .iter()
        .map(|e| e["type"].as_str().unwrap_or_default().to_string())
        .collect()
}

fn seed_store(dir: &Path) -> SessionStore {
    let db = Database::open_at(&dir.join("focusroom.db")).unwrap();
    SessionStore::new(Arc::new(db))
}

fn session(id: &str, days_ago: i64, actual: f64, distractions: u32, completed: bool) -> PomodoroSession {
    PomodoroSession {
        id: id.into(),
        date: Utc::now() - chrono::Duration::days(days_ago),
        focus_duration_sec: 1500,
        actual_duration_sec: actual,
        break_duration_sec: 300,
        distractions,
        completed,
    }
}

#[test]
fn test_timer_status_on_fresh_install() {
    let dir = TempDir::new().unwrap();
    let out = events(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["type"], "StateSnapshot");
    assert_eq!(out[0]["phase"], "focus");
    assert_eq!(out[0]["running"], false);
    assert_eq!(out[0]["remaining_ms"], 1_500_000);
}

#[test]
fn test_timer_start_survives_process_exit() {
    let dir = TempDir::new().unwrap();
    assert_eq!(types(&run_ok(dir.path(), &["timer", "start"])), vec!["TimerStarted"]);

    let status = events(&run_ok(dir.path(), &["timer", "status"]));
    let last = status.last().unwrap();
    assert_eq!(last["running"], true);
    assert!(last["remaining_ms"].as_i64().unwrap() <= 1_500_000);

    let paused = events(&run_ok(dir.path(), &["timer", "pause"]));
    assert_eq!(paused[0]["type"], "TimerPaused");

    let status = events(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["running"], false);
}

#[test]
fn test_timer_reset_flips_to_break() {
    let dir = TempDir::new().unwrap();
    let out = events(&run_ok(dir.path(), &["timer", "reset"]));
    let reset = out.last().unwrap();
    assert_eq!(reset["type"], "TimerReset");
    assert_eq!(reset["from"], "focus");
    assert_eq!(reset["to"], "break");
    assert_eq!(reset["remaining_ms"], 300_000);

    let status = events(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["phase"], "break");
}

#[test]
fn test_timer_distract_counts_up() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "start"]);
    run_ok(dir.path(), &["timer", "distract"]);
    let out = events(&run_ok(dir.path(), &["timer", "distract"]));
    assert_eq!(out[0]["type"], "DistractionRecorded");
    assert_eq!(out[0]["count"], 2);
}

#[test]
fn test_expired_focus_is_completed_on_next_command() {
    let dir = TempDir::new().unwrap();
    let store = seed_store(dir.path());
    store
        .save_snapshot(&ActiveSessionSnapshot {
            running: true,
            is_break: false,
            remaining_ms: 60_000,
            start_anchor_ms: Utc::now().timestamp_millis() - 3_600_000,
            distractions: 1,
            focus_ms: 1_500_000,
            break_ms: 300_000,
        })
        .unwrap();
    drop(store);

    let out = run_ok(dir.path(), &["timer", "status"]);
    assert_eq!(
        types(&out),
        vec!["SessionRecorded", "PhaseCompleted", "StateSnapshot"]
    );
    let parsed = events(&out);
    assert_eq!(parsed[0]["session"]["completed"], true);
    assert_eq!(parsed[0]["session"]["distractions"], 1);
    assert_eq!(parsed[2]["phase"], "break");

    let history: Vec<serde_json::Value> =
        serde_json::from_str(&run_ok(dir.path(), &["history", "list"])).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0]["focusDurationSec"], 1500);
}

#[test]
fn test_settings_show_set_reset() {
    let dir = TempDir::new().unwrap();
    let shown: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["settings", "show"])).unwrap();
    assert_eq!(shown["focusSeconds"], 1500);
    assert_eq!(shown["breakSeconds"], 300);

    let set: serde_json::Value = serde_json::from_str(&run_ok(
        dir.path(),
        &["settings", "set", "--focus", "50", "--break", "10"],
    ))
    .unwrap();
    assert_eq!(set["focusSeconds"], 3000);
    assert_eq!(set["breakSeconds"], 600);

    let status = events(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["remaining_ms"], 3_000_000);

    let reset: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["settings", "reset"])).unwrap();
    assert_eq!(reset["focusSeconds"], 1500);
}

#[test]
fn test_settings_change_applies_to_paused_timer() {
    let dir = TempDir::new().unwrap();
    run_ok(dir.path(), &["timer", "start"]);
    run_ok(dir.path(), &["timer", "pause"]);
    run_ok(dir.path(), &["settings", "set", "--focus", "10", "--break", "2"]);

    let status = events(&run_ok(dir.path(), &["timer", "status"]));
    assert_eq!(status[0]["phase"], "focus");
    assert_eq!(status[0]["running"], false);
    assert_eq!(status[0]["total_ms"], 600_000);
    assert_eq!(status[0]["remaining_ms"], 600_000);
}

#[test]
fn test_settings_reject_zero_minutes() {
    let dir = TempDir::new().unwrap();
    let (_, stderr, code) = run_cli(dir.path(), &["settings", "set", "--focus", "0", "--break", "5"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("error:"), "stderr: {stderr}");
}

#[test]
fn test_history_order_and_limit() {
    let dir = TempDir::new().unwrap();
    let store = seed_store(dir.path());
    store.append_session(&session("old", 3, 1500.0, 0, true)).unwrap();
    store.append_session(&session("new", 1, 1500.0, 0, true)).unwrap();
    store.append_session(&session("mid", 2, 300.0, 4, false)).unwrap();
    drop(store);

    let asc: Vec<serde_json::Value> = serde_json::from_str(&run_ok(
        dir.path(),
        &["history", "list", "--order", "asc"],
    ))
    .unwrap();
    let ids: Vec<_> = asc.iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["old", "mid", "new"]);

    let desc: Vec<serde_json::Value> = serde_json::from_str(&run_ok(
        dir.path(),
        &["history", "list", "--limit", "2"],
    ))
    .unwrap();
    let ids: Vec<_> = desc.iter().map(|s| s["id"].as_str().unwrap()).collect();
    assert_eq!(ids, vec!["new", "mid"]);

    let (_, _, code) = run_cli(dir.path(), &["history", "list", "--order", "sideways"]);
    assert_ne!(code, 0);
}

#[test]
fn test_stats_summary() {
    let dir = TempDir::new().unwrap();
    let empty: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["stats", "summary"])).unwrap();
    assert!(empty["summary"].is_null());
    assert_eq!(empty["recent"].as_array().unwrap().len(), 0);

    let store = seed_store(dir.path());
    store.append_session(&session("a", 2, 1500.0, 2, true)).unwrap();
    store.append_session(&session("b", 1, 300.0, 1, false)).unwrap();
    drop(store);

    let out: serde_json::Value = serde_json::from_str(&run_ok(
        dir.path(),
        &["stats", "summary", "--recent", "1"],
    ))
    .unwrap();
    assert_eq!(out["summary"]["total_sessions"], 2);
    assert_eq!(out["summary"]["completed_sessions"], 1);
    assert_eq!(out["summary"]["completion_rate_pct"], 50.0);
    assert_eq!(out["summary"]["total_focus_sec"], 1800.0);
    assert_eq!(out["summary"]["avg_distractions"], 2);
    assert_eq!(out["recent"][0]["id"], "b");
    assert_eq!(out["recent"].as_array().unwrap().len(), 1);
}

#[test]
fn test_config_get_set_list() {
    let dir = TempDir::new().unwrap();
    assert_eq!(run_ok(dir.path(), &["config", "get", "engine.tick_interval_ms"]).trim(), "10");
    assert_eq!(
        run_ok(dir.path(), &["config", "set", "engine.incomplete_threshold_ms", "5000"]).trim(),
        "ok"
    );
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "engine.incomplete_threshold_ms"]).trim(),
        "5000"
    );

    let listed: serde_json::Value =
        serde_json::from_str(&run_ok(dir.path(), &["config", "list"])).unwrap();
    assert_eq!(listed["storage"]["background_writes"], true);

    let (_, stderr, code) = run_cli(dir.path(), &["config", "get", "engine.nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("unknown key"));

    run_ok(dir.path(), &["config", "reset"]);
    assert_eq!(
        run_ok(dir.path(), &["config", "get", "engine.incomplete_threshold_ms"]).trim(),
        "1000"
    );
}

#[test]
fn test_run_reads_commands_from_stdin() {
    let dir = TempDir::new().unwrap();
    let mut child = Command::new(env!("CARGO_BIN_EXE_focusroom"))
        .arg("run")
        .env("FOCUSROOM_DATA_DIR", dir.path())
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"start\nsuspend\nresume\nbogus\nstatus\nquit\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let seen = types(&stdout);
    assert_eq!(seen.first().map(String::as_str), Some("StateSnapshot"));
    for expected in ["TimerStarted", "Suspended", "TimerResumed"] {
        assert!(seen.iter().any(|t| t == expected), "missing {expected} in {seen:?}");
    }
    assert!(seen.iter().filter(|t| *t == "StateSnapshot").count() >= 2);
    assert!(String::from_utf8_lossy(&output.stderr).contains("unknown command"));
}
