//! Verbose progress output using indicatif.

use execprobe::runner::{ProgressCallback, ProgressEvent};
use execprobe::{ScenarioStatus, SuiteStatus};
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;

/// Writes scenario-by-scenario progress to stderr.
pub struct VerboseProgress {
    spinner: Mutex<Option<ProgressBar>>,
    total: Mutex<usize>,
    color: bool,
}

impl VerboseProgress {
    pub fn new(color: bool) -> Self {
        Self {
            spinner: Mutex::new(None),
            total: Mutex::new(0),
            color,
        }
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock() {
            if let Some(pb) = spinner.take() {
                pb.finish_and_clear();
            }
        }
    }
}

impl ProgressCallback for VerboseProgress {
    fn on_progress(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::SuiteStarted {
                run_id,
                total_scenarios,
            } => {
                if let Ok(mut total) = self.total.lock() {
                    *total = *total_scenarios;
                }
                let _ = writeln!(
                    std::io::stderr(),
                    "suite started: {run_id} ({total_scenarios} scenarios)"
                );
            }
            ProgressEvent::ScenarioStarted { index, name, .. } => {
                let total = self.total.lock().map(|g| *g).unwrap_or(0);
                let pb = ProgressBar::new_spinner();
                pb.set_style(
                    ProgressStyle::default_spinner()
                        .template("{spinner:.cyan} [{elapsed_precise}] {msg}")
                        .unwrap_or_else(|_| ProgressStyle::default_spinner()),
                );
                pb.set_message(format!("[{index}/{total}] {name}"));
                pb.enable_steady_tick(Duration::from_millis(100));
                if let Ok(mut spinner) = self.spinner.lock() {
                    *spinner = Some(pb);
                }
            }
            ProgressEvent::ScenarioCompleted {
                name,
                status,
                duration_ms,
                message,
                ..
            } => {
                self.clear_spinner();
                let icon = match status {
                    ScenarioStatus::Passed => self.paint("32", "✓"),
                    ScenarioStatus::Failed => self.paint("31", "✗"),
                    ScenarioStatus::Errored => self.paint("31", "!"),
                    ScenarioStatus::Skipped => self.paint("33", "-"),
                };
                let _ = writeln!(std::io::stderr(), "  {icon} {name} ({duration_ms}ms)");
                if let Some(message) = message {
                    let _ = writeln!(std::io::stderr(), "      {message}");
                }
            }
            ProgressEvent::SuiteSkipped { reason, .. } => {
                let _ = writeln!(
                    std::io::stderr(),
                    "suite {}: {reason}",
                    self.paint("33", "skipped")
                );
            }
            ProgressEvent::SuiteCompleted {
                status,
                duration_ms,
                ..
            } => {
                let label = match status {
                    SuiteStatus::Passed => self.paint("32", "passed"),
                    SuiteStatus::Failed => self.paint("31", "failed"),
                    SuiteStatus::Skipped => self.paint("33", "skipped"),
                };
                let _ = writeln!(std::io::stderr(), "suite {label}: {duration_ms}ms total");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VerboseProgress;

    #[test]
    fn paint_respects_color_setting() {
        assert_eq!(VerboseProgress::new(false).paint("32", "ok"), "ok");
        assert_eq!(
            VerboseProgress::new(true).paint("32", "ok"),
            "\x1b[32mok\x1b[0m"
        );
    }
}
