#![cfg(feature = "cli")]

use std::process::Command;

fn missing_port(tag: &str) -> String {
    if cfg!(windows) {
        format!("COM{}", 200 + tag.len())
    } else {
        format!("/dev/avionlink-{tag}-{}", std::process::id())
    }
}

fn avionlink() -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_avionlink"));
    cmd.arg("--log-level").arg("error");
    cmd
}

#[test]
fn version_prints_package_version() {
    let output = avionlink().arg("version").output().expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert_eq!(
        stdout.trim(),
        format!("avionlink {}", env!("CARGO_PKG_VERSION"))
    );
}

#[test]
fn extended_version_lists_defaults() {
    let output = avionlink()
        .arg("version")
        .arg("--extended")
        .output()
        .expect("version should run");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("baud=115200"));
    assert!(stdout.contains("cycle_period_ms=10"));
}

#[test]
fn send_to_missing_port_returns_3() {
    let output = avionlink()
        .arg("send")
        .arg(missing_port("send"))
        .arg("--index")
        .arg("0")
        .arg("--value")
        .arg("1")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("could not open port"), "stderr: {stderr}");
}

#[test]
fn run_with_missing_port_returns_3() {
    let output = avionlink()
        .arg("run")
        .arg(missing_port("run"))
        .arg("--max-cycles")
        .arg("1")
        .output()
        .expect("run should run");

    assert_eq!(output.status.code(), Some(3));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("open failed"), "stderr: {stderr}");
}

#[test]
fn send_rejects_wide_index_before_opening() {
    let output = avionlink()
        .arg("send")
        .arg(missing_port("index"))
        .arg("--index")
        .arg("16")
        .arg("--value")
        .arg("1")
        .output()
        .expect("send should run");

    assert_eq!(output.status.code(), Some(2));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(!stderr.contains("could not open port"));
}
