//! Conformance runner: platform gating, scenario iteration and per-scenario
//! orchestration of fixture, driver call, verification and cleanup.

mod error;
pub mod progress;

pub use error::*;
pub use progress::{NoopProgress, ProgressCallback, ProgressEvent};

use crate::artifacts::{ArtifactsWriter, ArtifactsWriterConfig};
use crate::driver::StreamingDriver;
use crate::fixture::{resize_channel, IoFixture};
use crate::model::{
    ExecContext, ExecOptions, ResizeEvent, RunId, Scenario, ScenarioPhase, ScenarioResult,
    ScenarioStatus, SuiteReport, SuiteStatus, REPORT_VERSION, SHELL,
};
use crate::scenario::select_scenarios;
use crate::verify::{verify, Verdict};
use std::any::Any;
use std::fmt;
use std::fmt::Write as _;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Knobs for a suite run. `Default` runs the whole table quietly.
#[derive(Clone, Default)]
pub struct RunnerOptions {
    /// Scenario ids to run. Empty means all.
    pub scenarios: Vec<String>,
    pub progress: Option<Arc<dyn ProgressCallback>>,
    pub artifacts: Option<ArtifactsWriterConfig>,
    /// Directory that receives per-scenario fixture directories. Defaults to
    /// the system temp dir.
    pub fixture_root: Option<PathBuf>,
}

impl fmt::Debug for RunnerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RunnerOptions")
            .field("scenarios", &self.scenarios)
            .field("progress", &self.progress.is_some())
            .field("artifacts", &self.artifacts)
            .field("fixture_root", &self.fixture_root)
            .finish()
    }
}

/// Whether this host can run the scenario table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PlatformSupport {
    Supported,
    Unsupported { reason: String },
}

/// Check the host for POSIX shell semantics.
#[must_use]
pub fn platform_support() -> PlatformSupport {
    if !cfg!(unix) {
        return PlatformSupport::Unsupported {
            reason: format!(
                "exec conformance needs a POSIX shell, not available on {}",
                std::env::consts::OS
            ),
        };
    }
    if !Path::new(SHELL).exists() {
        return PlatformSupport::Unsupported {
            reason: format!("{SHELL} not found"),
        };
    }
    PlatformSupport::Supported
}

/// Run every scenario against `driver` in the task `task_id`.
///
/// Scenario failures are reported in the returned [`SuiteReport`], never as
/// an `Err`. On a host without a POSIX shell the suite is skipped.
pub fn run_conformance<D>(driver: &D, task_id: &str) -> HarnessResult<SuiteReport>
where
    D: StreamingDriver + ?Sized,
{
    run_conformance_with_options(driver, task_id, RunnerOptions::default())
}

/// [`run_conformance`] with a scenario filter, progress and artifacts.
///
/// # Errors
/// - `E_CLI_INVALID_ARG` for an unknown scenario id.
/// - `E_IO` when the artifacts directory cannot be prepared or written.
pub fn run_conformance_with_options<D>(
    driver: &D,
    task_id: &str,
    options: RunnerOptions,
) -> HarnessResult<SuiteReport>
where
    D: StreamingDriver + ?Sized,
{
    run_with_support(driver, task_id, options, platform_support())
}

fn run_with_support<D>(
    driver: &D,
    task_id: &str,
    options: RunnerOptions,
    support: PlatformSupport,
) -> HarnessResult<SuiteReport>
where
    D: StreamingDriver + ?Sized,
{
    let run_id = RunId::new();
    let clock = Instant::now();
    let progress = options
        .progress
        .unwrap_or_else(|| Arc::new(NoopProgress));
    let selected = select_scenarios(&options.scenarios)?;
    let mut artifacts = options.artifacts.map(ArtifactsWriter::new).transpose()?;
    let fixture_root = options.fixture_root.unwrap_or_else(std::env::temp_dir);

    if let PlatformSupport::Unsupported { reason } = support {
        info!(%run_id, task_id, %reason, "skipping exec conformance suite");
        progress.on_progress(&ProgressEvent::SuiteSkipped {
            run_id,
            reason: reason.clone(),
        });
        let now = elapsed_ms(&clock);
        let report = SuiteReport {
            report_version: REPORT_VERSION,
            run_id,
            task_id: task_id.to_string(),
            status: SuiteStatus::Skipped,
            skip_reason: Some(reason),
            started_at_ms: 0,
            ended_at_ms: now,
            scenarios: selected.iter().map(|s| skipped(s, now)).collect(),
        };
        if let Some(writer) = artifacts.as_mut() {
            writer.write_report(&report)?;
        }
        return Ok(report);
    }

    info!(
        %run_id,
        task_id,
        scenarios = selected.len(),
        "starting exec conformance suite"
    );
    progress.on_progress(&ProgressEvent::SuiteStarted {
        run_id,
        total_scenarios: selected.len(),
    });

    let ctx = ExecContext::background(run_id);
    let mut results = Vec::with_capacity(selected.len());
    for (index, scenario) in selected.iter().copied().enumerate() {
        progress.on_progress(&ProgressEvent::ScenarioStarted {
            scenario_id: scenario.id,
            index: index + 1,
            name: scenario.name,
        });
        let result = run_scenario(driver, &ctx, task_id, scenario, &fixture_root, &clock);
        if let Some(writer) = artifacts.as_mut() {
            writer.write_captured(&result)?;
        }
        progress.on_progress(&ProgressEvent::ScenarioCompleted {
            scenario_id: scenario.id,
            name: scenario.name,
            status: result.status,
            duration_ms: result.ended_at_ms.saturating_sub(result.started_at_ms),
            message: result.error.as_ref().map(|e| e.message.clone()),
        });
        results.push(result);
    }

    let status = if results.iter().all(|r| r.status == ScenarioStatus::Passed) {
        SuiteStatus::Passed
    } else {
        SuiteStatus::Failed
    };
    let report = SuiteReport {
        report_version: REPORT_VERSION,
        run_id,
        task_id: task_id.to_string(),
        status,
        skip_reason: None,
        started_at_ms: 0,
        ended_at_ms: elapsed_ms(&clock),
        scenarios: results,
    };
    if let Some(writer) = artifacts.as_mut() {
        writer.write_report(&report)?;
    }

    info!(
        %run_id,
        task_id,
        passed = report.count(ScenarioStatus::Passed),
        failed = report.count(ScenarioStatus::Failed),
        errored = report.count(ScenarioStatus::Errored),
        "exec conformance suite finished"
    );
    progress.on_progress(&ProgressEvent::SuiteCompleted {
        run_id,
        status,
        duration_ms: report.ended_at_ms,
    });
    Ok(report)
}

/// Run the suite and panic with a per-scenario summary unless it passed.
///
/// Meant to be called from a driver crate's own test. A skipped suite
/// returns normally.
///
/// # Panics
/// When any scenario failed or errored, or the suite could not start.
#[allow(clippy::panic)]
pub fn assert_conformance<D>(driver: &D, task_id: &str)
where
    D: StreamingDriver + ?Sized,
{
    check_conformance(run_conformance(driver, task_id));
}

#[allow(clippy::panic)]
fn check_conformance(result: HarnessResult<SuiteReport>) {
    let report = match result {
        Ok(report) => report,
        Err(err) => panic!("exec conformance suite could not run: {err}"),
    };
    if !report.passed() {
        panic!("{}", render_failures(&report));
    }
}

/// Human-readable summary of every scenario that did not pass.
#[must_use]
pub fn render_failures(report: &SuiteReport) -> String {
    let failures: Vec<_> = report.failures().collect();
    let mut out = format!(
        "{} of {} exec scenarios did not pass",
        failures.len(),
        report.scenarios.len()
    );
    for result in failures {
        let _ = write!(out, "\n  {} ({:?})", result.name, result.status);
        if let Some(error) = &result.error {
            let _ = write!(out, ": {}: {}", error.code, error.message);
            let diff = error
                .context
                .as_ref()
                .and_then(|c| c.get("diff"))
                .and_then(|d| d.as_str());
            if let Some(diff) = diff {
                for line in diff.lines() {
                    let _ = write!(out, "\n    {line}");
                }
            }
        }
    }
    out
}

fn run_scenario<D>(
    driver: &D,
    ctx: &ExecContext,
    task_id: &str,
    scenario: &'static Scenario,
    fixture_root: &Path,
    clock: &Instant,
) -> ScenarioResult
where
    D: StreamingDriver + ?Sized,
{
    let started_at_ms = elapsed_ms(clock);
    let finish = |verdict: Verdict| {
        let status = match &verdict.error {
            None => ScenarioStatus::Passed,
            Some(err) if err.code == ErrorCode::ExpectationMismatch => ScenarioStatus::Failed,
            Some(_) => ScenarioStatus::Errored,
        };
        match (&verdict.error, status) {
            (Some(err), ScenarioStatus::Failed) => {
                warn!(scenario = scenario.id, %err, "scenario failed");
            }
            (Some(err), _) => warn!(scenario = scenario.id, %err, "scenario errored"),
            (None, _) => debug!(scenario = scenario.id, "scenario passed"),
        }
        ScenarioResult {
            scenario_id: scenario.id.to_string(),
            name: scenario.name.to_string(),
            status,
            phase: verdict.phase,
            started_at_ms,
            ended_at_ms: elapsed_ms(clock),
            exit_code: verdict.exit_code,
            captured: verdict.captured,
            error: verdict.error.as_ref().map(HarnessError::to_error_info),
        }
    };

    let mut fixture = match IoFixture::new_in(fixture_root, scenario.tty, scenario.stdin) {
        Ok(fixture) => fixture,
        Err(err) => return finish(not_invoked(ScenarioPhase::Pending, err)),
    };
    debug!(
        scenario = scenario.id,
        phase = ?ScenarioPhase::FixtureBuilt,
        dir = %fixture.dir().display(),
        "fixture built"
    );

    let verdict = invoke_and_verify(driver, ctx, task_id, scenario, &mut fixture);

    if let Err(err) = fixture.cleanup() {
        warn!(scenario = scenario.id, %err, "fixture cleanup failed");
    }
    finish(verdict)
}

fn invoke_and_verify<D>(
    driver: &D,
    ctx: &ExecContext,
    task_id: &str,
    scenario: &Scenario,
    fixture: &mut IoFixture,
) -> Verdict
where
    D: StreamingDriver + ?Sized,
{
    let resize = match resize_channel(ResizeEvent::default()) {
        Ok(rx) => rx,
        Err(err) => return not_invoked(ScenarioPhase::FixtureBuilt, err),
    };
    let outcome = {
        let endpoints = match fixture.endpoints() {
            Ok(endpoints) => endpoints,
            Err(err) => return not_invoked(ScenarioPhase::FixtureBuilt, err),
        };
        let options = ExecOptions {
            command: scenario.argv(),
            tty: scenario.tty,
            stdin: endpoints.stdin,
            stdout: endpoints.stdout,
            stderr: endpoints.stderr,
            resize,
        };
        debug!(scenario = scenario.id, command = ?options.command, "invoking driver");
        panic::catch_unwind(AssertUnwindSafe(|| {
            driver.exec_task_streaming(ctx, task_id, options)
        }))
    };
    debug!(scenario = scenario.id, phase = ?ScenarioPhase::Invoked, "driver returned");

    let verdict = match outcome {
        Ok(outcome) => verify(outcome, fixture, scenario),
        Err(payload) => Verdict {
            phase: ScenarioPhase::Invoked,
            exit_code: None,
            captured: None,
            error: Some(HarnessError::driver_panic(format!(
                "driver panicked: {}",
                panic_message(payload.as_ref())
            ))),
        },
    };
    debug!(scenario = scenario.id, phase = ?verdict.phase, "verification finished");
    verdict
}

fn not_invoked(phase: ScenarioPhase, err: HarnessError) -> Verdict {
    Verdict {
        phase,
        exit_code: None,
        captured: None,
        error: Some(err),
    }
}

fn skipped(scenario: &Scenario, now: u64) -> ScenarioResult {
    ScenarioResult {
        scenario_id: scenario.id.to_string(),
        name: scenario.name.to_string(),
        status: ScenarioStatus::Skipped,
        phase: ScenarioPhase::Pending,
        started_at_ms: now,
        ended_at_ms: now,
        exit_code: None,
        captured: None,
        error: None,
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message
    } else {
        "non-string panic payload"
    }
}

fn elapsed_ms(started_at: &Instant) -> u64 {
    u64::try_from(started_at.elapsed().as_millis()).unwrap_or(u64::MAX)
}
