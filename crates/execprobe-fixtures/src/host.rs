//! Host `stty` wording.
//!
//! `notty-stty-check` expects `stty: standard input: ...` byte-for-byte.
//! GNU coreutils 8.25 and later quote the file name
//! (`stty: 'standard input': ...`), so a correct host driver fails that
//! scenario on stderr alone.

use execprobe::scenario::find_scenario;
use execprobe::{ScenarioResult, ScenarioStatus, SHELL};
use std::process::{Command, Stdio};
use tracing::debug;

/// Id of the scenario whose expectation depends on `stty`'s wording.
pub const STTY_SCENARIO_ID: &str = "notty-stty-check";

/// What `stty size` prints to stderr on this host when stdin is not a
/// terminal. `None` when the shell cannot be run.
#[must_use]
pub fn host_stty_message() -> Option<String> {
    let output = Command::new(SHELL)
        .args(["-c", "stty size"])
        .stdin(Stdio::null())
        .output()
        .ok()?;
    let message = String::from_utf8_lossy(&output.stderr).into_owned();
    debug!(%message, "host stty wording");
    Some(message)
}

/// Whether the host's `stty` prints exactly what the scenario table expects.
#[must_use]
pub fn host_stty_matches_table() -> bool {
    match (host_stty_message(), find_scenario(STTY_SCENARIO_ID)) {
        (Some(message), Some(scenario)) => message == scenario.expected_stderr,
        _ => false,
    }
}

/// True when `result` is the stty scenario failing only because stderr
/// carried `host_message` instead of the table's wording: exit code and
/// stdout matched.
#[must_use]
pub fn is_stty_wording_mismatch(result: &ScenarioResult, host_message: &str) -> bool {
    let Some(scenario) = find_scenario(STTY_SCENARIO_ID) else {
        return false;
    };
    if result.scenario_id != STTY_SCENARIO_ID || result.status != ScenarioStatus::Failed {
        return false;
    }
    if host_message == scenario.expected_stderr
        || result.exit_code != Some(scenario.expected_exit_code)
    {
        return false;
    }
    let Some(captured) = &result.captured else {
        return false;
    };
    if captured.stdout != scenario.expected_stdout || captured.stderr != host_message {
        return false;
    }
    let fields: Vec<&str> = result
        .error
        .as_ref()
        .and_then(|e| e.context.as_ref())
        .and_then(|c| c.get("mismatches"))
        .and_then(|m| m.as_array())
        .map(|mismatches| {
            mismatches
                .iter()
                .filter_map(|m| m.get("field").and_then(|f| f.as_str()))
                .collect()
        })
        .unwrap_or_default();
    fields == ["stderr"]
}

#[cfg(test)]
mod tests {
    use super::*;
    use execprobe::{CapturedOutput, ErrorInfo, ScenarioPhase};
    use serde_json::json;

    const QUOTED: &str = "stty: 'standard input': Inappropriate ioctl for device\n";

    fn stty_failure(stdout: &str, stderr: &str, fields: &[&str]) -> ScenarioResult {
        let mismatches: Vec<_> = fields.iter().map(|f| json!({ "field": f })).collect();
        ScenarioResult {
            scenario_id: STTY_SCENARIO_ID.to_string(),
            name: "notty: stty check".to_string(),
            status: ScenarioStatus::Failed,
            phase: ScenarioPhase::Verified,
            started_at_ms: 0,
            ended_at_ms: 1,
            exit_code: Some(1),
            captured: Some(CapturedOutput {
                stdout: stdout.to_string(),
                stderr: stderr.to_string(),
            }),
            error: Some(ErrorInfo {
                code: "E_EXPECTATION_MISMATCH".to_string(),
                message: "stderr differs from expectation".to_string(),
                context: Some(json!({ "mismatches": mismatches })),
            }),
        }
    }

    #[test]
    fn quoted_wording_alone_is_recognised() {
        let result = stty_failure("", QUOTED, &["stderr"]);
        assert!(is_stty_wording_mismatch(&result, QUOTED));
    }

    #[test]
    fn other_differences_are_real_failures() {
        assert!(!is_stty_wording_mismatch(
            &stty_failure("24 80\n", QUOTED, &["stdout", "stderr"]),
            QUOTED
        ));
        assert!(!is_stty_wording_mismatch(
            &stty_failure("", "", &["stderr"]),
            QUOTED
        ));

        let mut wrong_exit = stty_failure("", QUOTED, &["stderr"]);
        wrong_exit.exit_code = Some(0);
        assert!(!is_stty_wording_mismatch(&wrong_exit, QUOTED));

        let mut other_scenario = stty_failure("", QUOTED, &["stderr"]);
        other_scenario.scenario_id = "notty-basic".to_string();
        assert!(!is_stty_wording_mismatch(&other_scenario, QUOTED));
    }

    #[test]
    fn table_wording_is_never_a_wording_mismatch() {
        let table = find_scenario(STTY_SCENARIO_ID).unwrap().expected_stderr;
        let result = stty_failure("", table, &["stderr"]);
        assert!(!is_stty_wording_mismatch(&result, table));
    }

    #[test]
    fn host_message_comes_from_stty() {
        if !cfg!(unix) {
            return;
        }
        let message = host_stty_message().unwrap();
        assert!(message.starts_with("stty: "), "{message}");
        let table = find_scenario(STTY_SCENARIO_ID).unwrap().expected_stderr;
        assert_eq!(host_stty_matches_table(), message == table);
    }
}
