mod common;

use std::io::Write;

use common::run_cli;

// ============================================================================
// version command
// ============================================================================

#[test]
fn version_human() {
    let output = run_cli(&["version"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.starts_with("attackline "), "got: {stdout}");
    assert!(stdout.contains('.'), "should carry a version: {stdout}");
}

#[test]
fn version_json() {
    let output = run_cli(&["version", "--format", "json"]);
    assert!(output.status.success());

    let parsed: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("version JSON should be valid");
    assert_eq!(parsed["name"], "attackline");
    assert!(parsed.get("version").is_some());
}

// ============================================================================
// options command
// ============================================================================

#[test]
fn options_lists_every_phase() {
    let output = run_cli(&["options"]);
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Phase 1: Initiation"));
    assert!(stdout.contains("Phase 4: Final Strike"));
    assert!(stdout.contains("[POINTER RANGE]"));
}

#[test]
fn options_json_for_one_phase() {
    let output = run_cli(&["options", "--phase", "3", "--format", "json"]);
    assert!(output.status.success());

    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let options = parsed[0]["options"].as_array().unwrap();
    assert_eq!(parsed[0]["phase"], 3);
    assert_eq!(options.len(), 2);
    assert_eq!(options[1]["kind"], "shoot");
    assert_eq!(options[1]["timeLimit"], 20);
    assert_eq!(options[1]["isSpecial"], true);
}

#[test]
fn options_rejects_phase_out_of_range() {
    let output = run_cli(&["options", "--phase", "5"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn options_honours_config_budgets() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "time_budgets: {{ easy: 45, medium: 25, hard: 15 }}").unwrap();

    let output = run_cli(&[
        "options",
        "--phase",
        "4",
        "--format",
        "json",
        "--config",
        file.path().to_str().unwrap(),
    ]);
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(parsed[0]["options"][0]["timeLimit"], 45);
}

#[test]
fn invalid_config_exits_with_config_code() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "match_duration_secs: 0").unwrap();

    let output = run_cli(&["options", "--config", file.path().to_str().unwrap()]);
    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("match_duration_secs"), "got: {stderr}");
}

// ============================================================================
// play command
// ============================================================================

#[test]
fn solo_offline_match_ends_when_input_closes() {
    let output = run_cli(&[
        "--quiet",
        "play",
        "--name",
        "Ann",
        "--solo",
        "--offline",
        "--match-duration",
        "30s",
    ]);
    assert!(
        output.status.success(),
        "play should exit 0: {}",
        String::from_utf8_lossy(&output.stderr)
    );

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Welcome to Banana Football"));
    assert!(stdout.contains("FULL TIME"));
    assert!(stdout.contains("Ann"));
}

#[test]
fn play_writes_event_stream() {
    let dir = tempfile::tempdir().unwrap();
    let events = dir.path().join("events.jsonl");

    let output = run_cli(&[
        "--quiet",
        "play",
        "--name",
        "Ann",
        "--offline",
        "--events",
        events.to_str().unwrap(),
    ]);
    assert!(output.status.success());

    let log = std::fs::read_to_string(&events).unwrap();
    let first: serde_json::Value = serde_json::from_str(log.lines().next().unwrap()).unwrap();
    assert_eq!(first["type"], "MatchStarted");
    assert_eq!(first["seconds_remaining"], 180);
    assert_eq!(first["players"], 1);
}

#[test]
fn play_requires_a_name() {
    let output = run_cli(&["play", "--offline"]);
    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn peer_without_bind_is_rejected() {
    let output = run_cli(&["play", "--name", "Ann", "--peer", "127.0.0.1:9000"]);
    assert_eq!(output.status.code(), Some(2));
}
