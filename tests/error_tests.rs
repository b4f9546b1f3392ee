//! Error scenario integration tests

use std::process::Command;

fn clip_recorder_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_clip-recorder"))
}

#[test]
fn config_get_unknown_key() {
    let output = clip_recorder_bin()
        .args(["config", "get", "unknown_key"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown") || stderr.contains("Valid"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_unknown_key() {
    let output = clip_recorder_bin()
        .args(["config", "set", "unknown_key", "value"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Unknown") || stderr.contains("Valid"),
        "Expected error about unknown key, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_timeslice() {
    let output = clip_recorder_bin()
        .args(["config", "set", "timeslice", "invalid"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid") || stderr.contains("timeslice"),
        "Expected error about invalid timeslice, got: {}",
        stderr
    );
}

#[test]
fn config_set_invalid_log_level() {
    let output = clip_recorder_bin()
        .args(["config", "set", "log_level", "loud"])
        .output()
        .expect("Failed to execute command");

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("log_level"),
        "Expected error about log level, got: {}",
        stderr
    );
}

#[test]
fn invalid_timeslice_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = clip_recorder_bin()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--timeslice", "soon"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid timeslice"),
        "Expected error about invalid timeslice, got: {}",
        stderr
    );
}

#[test]
fn zero_channels_is_usage_error() {
    let home = tempfile::tempdir().unwrap();
    let output = clip_recorder_bin()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path())
        .args(["--channels", "0"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}

#[test]
fn non_numeric_sample_rate_is_rejected() {
    let output = clip_recorder_bin()
        .args(["--sample-rate", "fast"])
        .output()
        .expect("Failed to execute command");

    assert_eq!(output.status.code(), Some(2));
}
