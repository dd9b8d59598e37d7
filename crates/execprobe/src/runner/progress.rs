//! Progress callback for reporting suite progress.

use crate::model::{RunId, ScenarioStatus, SuiteStatus};

/// Event emitted while a conformance suite runs.
#[derive(Debug, Clone)]
pub enum ProgressEvent {
    SuiteStarted {
        run_id: RunId,
        /// Number of scenarios selected for this run.
        total_scenarios: usize,
    },
    ScenarioStarted {
        scenario_id: &'static str,
        /// 1-based position in the selection.
        index: usize,
        name: &'static str,
    },
    ScenarioCompleted {
        scenario_id: &'static str,
        name: &'static str,
        status: ScenarioStatus,
        duration_ms: u64,
        /// Error message when the scenario did not pass.
        message: Option<String>,
    },
    /// The suite was not run on this platform.
    SuiteSkipped { run_id: RunId, reason: String },
    SuiteCompleted {
        run_id: RunId,
        status: SuiteStatus,
        duration_ms: u64,
    },
}

/// Receiver of progress events.
///
/// Implementors can use this to display progress or collect events.
pub trait ProgressCallback: Send + Sync {
    fn on_progress(&self, event: &ProgressEvent);
}

/// Discards all events.
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {
    fn on_progress(&self, _event: &ProgressEvent) {}
}

/// Collects events for assertions in tests.
#[cfg(test)]
#[derive(Default)]
pub struct CollectingProgress {
    events: std::sync::Mutex<Vec<ProgressEvent>>,
}

#[cfg(test)]
impl CollectingProgress {
    #[allow(clippy::expect_used)]
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().expect("progress mutex poisoned").clone()
    }
}

#[cfg(test)]
impl ProgressCallback for CollectingProgress {
    #[allow(clippy::expect_used)]
    fn on_progress(&self, event: &ProgressEvent) {
        self.events
            .lock()
            .expect("progress mutex poisoned")
            .push(event.clone());
    }
}
