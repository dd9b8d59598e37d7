// Test module - relaxed lint rules
#![allow(clippy::indexing_slicing)]
#![allow(clippy::panic)]
#![allow(clippy::manual_assert)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]
#![allow(missing_docs)]

//! Full conformance suite against the host driver.
//!
//! Every test here spawns real shells; the streaming and background-child
//! scenarios take several seconds each.

use execprobe::runner::render_failures;
use execprobe::scenario::SCENARIOS;
use execprobe::{
    assert_conformance, platform_support, run_conformance_with_options, PlatformSupport,
    RunnerOptions, ScenarioStatus, SuiteReport, SuiteStatus,
};
use execprobe_fixtures::helpers::{fixture_root, leftover_fixtures};
use execprobe_fixtures::host::{
    host_stty_matches_table, host_stty_message, is_stty_wording_mismatch, STTY_SCENARIO_ID,
};
use execprobe_fixtures::LocalDriver;
use std::panic;
use std::path::Path;
use std::time::Instant;

fn supported() -> bool {
    platform_support() == PlatformSupport::Supported
}

fn run(root: &Path, scenarios: &[&str]) -> SuiteReport {
    let options = RunnerOptions {
        scenarios: scenarios.iter().map(|s| (*s).to_string()).collect(),
        fixture_root: Some(root.to_path_buf()),
        ..RunnerOptions::default()
    };
    run_conformance_with_options(&LocalDriver, "local", options).unwrap()
}

/// On hosts whose `stty` quotes the file name, the stty scenario must fail on
/// that stderr wording and nothing else.
fn assert_passed_up_to_stty_wording(report: &SuiteReport) {
    if host_stty_matches_table() {
        assert_eq!(
            report.status,
            SuiteStatus::Passed,
            "{}",
            render_failures(report)
        );
        return;
    }
    let host_message = host_stty_message().unwrap();
    for result in &report.scenarios {
        if result.scenario_id == STTY_SCENARIO_ID {
            assert!(
                is_stty_wording_mismatch(result, &host_message),
                "{}",
                render_failures(report)
            );
        } else {
            assert_eq!(
                result.status,
                ScenarioStatus::Passed,
                "{}",
                render_failures(report)
            );
        }
    }
}

#[test]
fn local_driver_passes_the_whole_table() {
    if !supported() {
        return;
    }
    let root = fixture_root();
    let report = run(root.path(), &[]);
    assert_eq!(report.scenarios.len(), SCENARIOS.len());
    assert_passed_up_to_stty_wording(&report);
    assert!(leftover_fixtures(root.path()).is_empty());
}

#[test]
fn stty_check_differs_only_in_host_wording() {
    if !supported() {
        return;
    }
    let root = fixture_root();
    let report = run(root.path(), &[STTY_SCENARIO_ID]);
    let result = &report.scenarios[0];
    let captured = result.captured.as_ref().unwrap();
    assert_eq!(result.exit_code, Some(1));
    assert_eq!(captured.stdout, "");
    assert_eq!(Some(captured.stderr.clone()), host_stty_message());
    if host_stty_matches_table() {
        assert_eq!(result.status, ScenarioStatus::Passed, "{:?}", result.error);
    } else {
        assert_eq!(result.status, ScenarioStatus::Failed);
        let error = result.error.as_ref().unwrap();
        assert_eq!(error.message, "stderr differs from expectation");
        let context = error.context.as_ref().unwrap();
        assert_eq!(context["mismatches"].as_array().map(Vec::len), Some(1));
        assert_eq!(context["mismatches"][0]["field"], "stderr");
    }
}

#[test]
fn assert_conformance_accepts_the_local_driver() {
    let outcome = panic::catch_unwind(|| assert_conformance(&LocalDriver, "local"));
    if !supported() || host_stty_matches_table() {
        assert!(outcome.is_ok());
        return;
    }
    let payload = outcome.unwrap_err();
    let message = payload
        .downcast_ref::<String>()
        .cloned()
        .unwrap_or_default();
    assert!(
        message.starts_with(&format!(
            "1 of {} exec scenarios did not pass",
            SCENARIOS.len()
        )),
        "{message}"
    );
    assert!(message.contains("notty: stty check (Failed)"), "{message}");
}

#[test]
fn repeated_runs_capture_identical_bytes() {
    if !supported() {
        return;
    }
    let root = fixture_root();
    let ids = ["notty-basic", "notty-stty-check", "notty-stdin-passing"];
    let first = run(root.path(), &ids);
    let second = run(root.path(), &ids);
    for (a, b) in first.scenarios.iter().zip(&second.scenarios) {
        assert_eq!(a.scenario_id, b.scenario_id);
        assert!(a.captured.is_some());
        assert_eq!(a.captured, b.captured);
        assert_eq!(a.exit_code, b.exit_code);
    }
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn stdin_bytes_follow_the_command_prefix() {
    if !supported() {
        return;
    }
    let root = fixture_root();
    let report = run(root.path(), &["notty-stdin-passing"]);
    let captured = report.scenarios[0].captured.as_ref().unwrap();
    let rest = captured.stdout.strip_prefix("hello from command\n");
    assert_eq!(rest, Some("hello from stdin\n"));
}

#[test]
fn background_children_hold_the_call_open() {
    if !supported() {
        return;
    }
    let root = fixture_root();
    let started = Instant::now();
    let report = run(root.path(), &["notty-children-processes"]);
    assert!(started.elapsed().as_secs() >= 3);
    let result = &report.scenarios[0];
    assert_eq!(result.status, ScenarioStatus::Passed, "{:?}", result.error);
    assert_eq!(
        result.captured.as_ref().map(|c| c.stdout.as_str()),
        Some("from main\nfrom background\n")
    );
}
