//! Tests for the scenario listing and shell completions.
// Test module - relaxed lint rules
#![allow(clippy::expect_used)]
#![allow(clippy::indexing_slicing)]

use std::process::Command;

fn execprobe_bin() -> Command {
    Command::new(env!("CARGO_BIN_EXE_execprobe"))
}

#[test]
fn list_prints_every_scenario_id() {
    let output = execprobe_bin()
        .arg("list")
        .output()
        .expect("failed to execute");

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    for id in [
        "notty-basic",
        "notty-streaming",
        "notty-stty-check",
        "notty-stdin-passing",
        "notty-children-processes",
    ] {
        assert!(stdout.contains(id), "missing {id} in:\n{stdout}");
    }
}

#[test]
fn list_json_carries_argv_and_expectations() {
    let output = execprobe_bin()
        .args(["list", "--json"])
        .output()
        .expect("failed to execute");

    assert!(output.status.success());
    let entries: serde_json::Value =
        serde_json::from_slice(&output.stdout).expect("list --json should emit JSON");
    let basic = &entries[0];
    assert_eq!(basic["id"], "notty-basic");
    assert_eq!(basic["argv"][0], "/bin/sh");
    assert_eq!(basic["argv"][1], "-c");
    assert_eq!(basic["expected_exit_code"], 43);
    assert_eq!(entries.as_array().map(Vec::len), Some(5));
}

#[test]
fn completions_generates_bash_output() {
    let output = execprobe_bin()
        .args(["completions", "bash"])
        .output()
        .expect("failed to execute");

    assert!(
        output.status.success(),
        "completions bash should succeed: {}",
        String::from_utf8_lossy(&output.stderr)
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("_execprobe"));
}

#[test]
fn color_flag_rejects_invalid() {
    let output = execprobe_bin()
        .args(["--color=invalid", "list"])
        .output()
        .expect("failed to execute");

    assert!(!output.status.success());
}
