use crate::model::RunId;
use serde::{Deserialize, Serialize};

/// Version of the suite report format.
pub const REPORT_VERSION: u32 = 1;

/// Outcome of one conformance suite run against a driver.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SuiteReport {
    pub report_version: u32,
    pub run_id: RunId,
    /// Task the driver executed commands in.
    pub task_id: String,
    pub status: SuiteStatus,
    /// Why the suite was skipped, when it was.
    pub skip_reason: Option<String>,
    /// Timestamps are milliseconds since the suite started, so this is 0.
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    pub scenarios: Vec<ScenarioResult>,
}

impl SuiteReport {
    /// Whether every scenario passed. A skipped suite counts as passing.
    #[must_use]
    pub fn passed(&self) -> bool {
        self.status != SuiteStatus::Failed
    }

    /// Number of scenarios with the given status.
    #[must_use]
    pub fn count(&self, status: ScenarioStatus) -> usize {
        self.scenarios.iter().filter(|s| s.status == status).count()
    }

    /// Scenarios that did not pass.
    pub fn failures(&self) -> impl Iterator<Item = &ScenarioResult> {
        self.scenarios
            .iter()
            .filter(|s| matches!(s.status, ScenarioStatus::Failed | ScenarioStatus::Errored))
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SuiteStatus {
    Passed,
    Failed,
    Skipped,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioResult {
    pub scenario_id: String,
    pub name: String,
    pub status: ScenarioStatus,
    /// Last lifecycle phase reached before the scenario ended.
    pub phase: ScenarioPhase,
    pub started_at_ms: u64,
    pub ended_at_ms: u64,
    /// Exit code reported by the driver, if the call returned one.
    pub exit_code: Option<i32>,
    /// Output read back from the sinks, if the scenario got that far.
    pub captured: Option<CapturedOutput>,
    pub error: Option<ErrorInfo>,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    /// The driver ran the command but its behavior did not match.
    Failed,
    /// The scenario could not be evaluated: setup, transport or capability error.
    Errored,
    Skipped,
}

/// Per-scenario lifecycle. Cleanup follows every phase.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioPhase {
    Pending,
    FixtureBuilt,
    Invoked,
    Flushed,
    Verified,
}

/// Standard output and error read back from a closed fixture.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CapturedOutput {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
    pub context: Option<serde_json::Value>,
}
