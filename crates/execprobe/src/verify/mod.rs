//! Judging a driver call against a scenario.
//!
//! The checks always run in the same order: transport error, exit code,
//! flush, read back, exact stream comparison. Comparison is byte-for-byte on
//! the decoded text with no trimming, because streaming drivers are easy to
//! get almost right with a missing or extra newline.

use crate::driver::DriverError;
use crate::fixture::IoFixture;
use crate::model::{CapturedOutput, ExecResult, Scenario, ScenarioPhase};
use crate::runner::HarnessError;
use serde_json::{json, Value};
use similar::TextDiff;
use std::error::Error as _;

/// What a driver call returned.
pub type ExecOutcome = Result<ExecResult, DriverError>;

/// Result of verifying one driver call.
#[derive(Debug)]
pub struct Verdict {
    /// Last phase reached: `Invoked`, `Flushed` or `Verified`.
    pub phase: ScenarioPhase,
    pub exit_code: Option<i32>,
    pub captured: Option<CapturedOutput>,
    /// `None` when every check passed.
    pub error: Option<HarnessError>,
}

impl Verdict {
    #[must_use]
    pub fn passed(&self) -> bool {
        self.error.is_none()
    }

    /// Collapse into the captured output, or the first failed check.
    pub fn into_result(self) -> Result<CapturedOutput, HarnessError> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.captured.unwrap_or_default()),
        }
    }
}

/// Check `outcome` and the fixture's captured output against `scenario`.
///
/// Closes the fixture's sinks as part of the protocol. The fixture itself is
/// left for the caller to clean up.
pub fn verify(outcome: ExecOutcome, fixture: &mut IoFixture, scenario: &Scenario) -> Verdict {
    let result = match outcome {
        Ok(result) => result,
        Err(err) => {
            return Verdict {
                phase: ScenarioPhase::Invoked,
                exit_code: None,
                captured: None,
                error: Some(transport_error(&err)),
            }
        }
    };

    if result.exit_code != scenario.expected_exit_code {
        // Still read what the command wrote; it usually explains the exit code.
        let captured = fixture
            .close_sinks()
            .and_then(|()| fixture.read_back())
            .ok();
        let phase = if captured.is_some() {
            ScenarioPhase::Flushed
        } else {
            ScenarioPhase::Invoked
        };
        let error = HarnessError::mismatch(
            format!(
                "exit code {} does not match expected {}",
                result.exit_code, scenario.expected_exit_code
            ),
            json!({
                "mismatches": [{
                    "field": "exit_code",
                    "expected": scenario.expected_exit_code,
                    "actual": result.exit_code,
                }],
                "captured": captured,
            }),
        );
        return Verdict {
            phase,
            exit_code: Some(result.exit_code),
            captured,
            error: Some(error),
        };
    }

    if let Err(err) = fixture.close_sinks() {
        return Verdict {
            phase: ScenarioPhase::Invoked,
            exit_code: Some(result.exit_code),
            captured: None,
            error: Some(err),
        };
    }

    let captured = match fixture.read_back() {
        Ok(captured) => captured,
        Err(err) => {
            return Verdict {
                phase: ScenarioPhase::Flushed,
                exit_code: Some(result.exit_code),
                captured: None,
                error: Some(err),
            }
        }
    };

    let error = compare_streams(&captured, scenario);
    Verdict {
        phase: ScenarioPhase::Verified,
        exit_code: Some(result.exit_code),
        captured: Some(captured),
        error,
    }
}

fn transport_error(err: &DriverError) -> HarnessError {
    let mut chain = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push(cause.to_string());
        source = cause.source();
    }
    HarnessError::transport(
        format!("driver call failed: {err}"),
        Some(json!({ "source": err.to_string(), "causes": chain })),
    )
}

fn compare_streams(captured: &CapturedOutput, scenario: &Scenario) -> Option<HarnessError> {
    let checks = [
        ("stdout", scenario.expected_stdout, captured.stdout.as_str()),
        ("stderr", scenario.expected_stderr, captured.stderr.as_str()),
    ];
    let mismatched: Vec<_> = checks
        .iter()
        .filter(|(_, expected, actual)| expected != actual)
        .collect();
    if mismatched.is_empty() {
        return None;
    }

    let fields: Vec<&str> = mismatched.iter().map(|(field, _, _)| *field).collect();
    let diff: String = mismatched
        .iter()
        .map(|(field, expected, actual)| render_diff(field, expected, actual))
        .collect();
    let mismatches: Vec<Value> = mismatched
        .iter()
        .map(|(field, expected, actual)| {
            json!({ "field": field, "expected": expected, "actual": actual })
        })
        .collect();

    Some(HarnessError::mismatch(
        format!(
            "{} {} from expectation",
            fields.join(" and "),
            if fields.len() == 1 { "differs" } else { "differ" }
        ),
        json!({ "mismatches": mismatches, "diff": diff }),
    ))
}

fn render_diff(field: &str, expected: &str, actual: &str) -> String {
    let diff = TextDiff::from_lines(expected, actual);
    diff.unified_diff()
        .header(&format!("expected {field}"), &format!("actual {field}"))
        .to_string()
}
