//! execprobe CLI: run the streamed exec conformance suite against the host.

// CLI-specific lint allowances (CLI binary, not library)
#![allow(missing_docs)]
#![allow(clippy::print_stdout)] // CLI must print to stdout
#![allow(clippy::print_stderr)] // CLI must print to stderr
#![allow(clippy::exit)] // CLI uses exit codes

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use execprobe::artifacts::ArtifactsWriterConfig;
use execprobe::runner::render_failures;
use execprobe::scenario::scenarios;
use execprobe::{
    run_conformance_with_options, HarnessError, RunnerOptions, ScenarioStatus, SuiteReport,
    SuiteStatus,
};
use execprobe_fixtures::host::{host_stty_message, is_stty_wording_mismatch};
use execprobe_fixtures::LocalDriver;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod progress;

/// Color output mode
#[derive(Copy, Clone, Debug, Default, ValueEnum)]
enum ColorMode {
    /// Auto-detect based on terminal and `NO_COLOR` env
    #[default]
    Auto,
    /// Always use colors
    Always,
    /// Never use colors
    Never,
}

#[derive(Debug, Parser)]
#[command(
    name = "execprobe",
    version,
    about = "Conformance harness for streamed exec drivers"
)]
struct Cli {
    /// Control color output
    #[arg(long, value_enum, default_value = "auto", global = true)]
    color: ColorMode,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// List the scenario table
    List {
        #[arg(long, help = "Output as JSON")]
        json: bool,
    },
    /// Run the suite against the host driver
    Run(RunArgs),
    /// Generate shell completions for bash, zsh, or fish
    Completions {
        #[arg(value_enum, help = "Shell to generate completions for")]
        shell: Shell,
    },
}

#[derive(Debug, Args)]
struct RunArgs {
    #[arg(long, help = "Print the suite report as JSON")]
    json: bool,
    #[arg(long = "scenario", value_name = "ID", help = "Run only this scenario (repeatable)")]
    scenarios: Vec<String>,
    #[arg(long, default_value = "local", help = "Task id passed to the driver")]
    task_id: String,
    #[arg(long, short = 'v', help = "Show per-scenario progress and debug logs on stderr")]
    verbose: bool,
    #[arg(long, help = "Write report and captured output to this directory")]
    artifacts: Option<PathBuf>,
    #[arg(long, help = "Overwrite existing artifacts directory")]
    overwrite: bool,
}

#[derive(Serialize)]
struct ListEntry<'a> {
    id: &'a str,
    name: &'a str,
    argv: Vec<String>,
    stdin: &'a str,
    expected_stdout: &'a str,
    expected_stderr: &'a str,
    expected_exit_code: i32,
}

/// Configure color output based on CLI flag and environment
fn configure_colors(mode: ColorMode) -> bool {
    let use_color = match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => {
            if std::env::var_os("NO_COLOR").is_some() {
                false
            } else {
                supports_color::on(supports_color::Stream::Stderr).is_some()
            }
        }
    };

    miette::set_hook(Box::new(move |_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .color(use_color)
                .unicode(use_color)
                .build(),
        )
    }))
    .ok(); // Ignore error if hook already set
    use_color
}

/// Logs go to stderr so stdout stays machine-readable. `RUST_LOG` wins over
/// the defaults.
fn init_tracing(verbose: bool, use_color: bool) {
    let default = if verbose {
        "warn,execprobe=debug,execprobe_fixtures=debug"
    } else {
        "warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(use_color)
        .with_target(false)
        .try_init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let use_color = configure_colors(cli.color);
    match cli.command {
        Commands::List { json } => cmd_list(json),
        Commands::Run(args) => {
            init_tracing(args.verbose, use_color);
            cmd_run(args, use_color)
        }
        Commands::Completions { shell } => cmd_completions(shell),
    }
}

// =============================================================================
// Command Handlers
// =============================================================================

fn cmd_list(json: bool) -> Result<()> {
    if json {
        let entries: Vec<_> = scenarios()
            .iter()
            .map(|s| ListEntry {
                id: s.id,
                name: s.name,
                argv: s.argv(),
                stdin: s.stdin,
                expected_stdout: s.expected_stdout,
                expected_stderr: s.expected_stderr,
                expected_exit_code: s.expected_exit_code,
            })
            .collect();
        let payload = serde_json::to_string_pretty(&entries).into_diagnostic()?;
        println!("{payload}");
        return Ok(());
    }
    for scenario in scenarios() {
        println!("{:<26} {}", scenario.id, scenario.name);
        println!("{:<26} $ {}", "", scenario.command);
    }
    Ok(())
}

fn cmd_run(args: RunArgs, use_color: bool) -> Result<()> {
    let progress: Option<Arc<dyn execprobe::runner::ProgressCallback>> = if args.verbose {
        Some(Arc::new(progress::VerboseProgress::new(use_color)))
    } else {
        None
    };
    let options = RunnerOptions {
        scenarios: args.scenarios,
        progress,
        artifacts: args.artifacts.map(|dir| ArtifactsWriterConfig {
            dir,
            overwrite: args.overwrite,
        }),
        fixture_root: None,
    };
    debug!(
        task_id = %args.task_id,
        scenarios = ?options.scenarios,
        artifacts = ?options.artifacts.as_ref().map(|a| &a.dir),
        "running suite against the local driver"
    );
    let result = run_conformance_with_options(&LocalDriver, &args.task_id, options);
    emit_result(args.json, result)
}

fn cmd_completions(shell: Shell) -> Result<()> {
    let mut cmd = Cli::command();
    let name = cmd.get_name().to_string();
    generate(shell, &mut cmd, name, &mut io::stdout());
    Ok(())
}

// =============================================================================
// Output
// =============================================================================

fn emit_result(json: bool, result: Result<SuiteReport, HarnessError>) -> Result<()> {
    match result {
        Ok(report) => {
            if json {
                let payload = serde_json::to_string(&report).into_diagnostic()?;
                println!("{payload}");
            } else {
                print_summary(&report);
            }
            if report.status == SuiteStatus::Failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Err(err) => {
            if json {
                let payload = serde_json::to_string(&err.to_error_info()).into_diagnostic()?;
                println!("{payload}");
            } else {
                eprintln!("error: {err}");
            }
            std::process::exit(err.exit_code());
        }
    }
}

fn print_summary(report: &SuiteReport) {
    match report.status {
        SuiteStatus::Skipped => {
            let reason = report.skip_reason.as_deref().unwrap_or("unsupported platform");
            eprintln!("suite skipped: {reason}");
        }
        SuiteStatus::Passed => eprintln!(
            "suite passed: {} scenarios in {}ms",
            report.count(ScenarioStatus::Passed),
            report.ended_at_ms
        ),
        SuiteStatus::Failed => {
            eprintln!("suite failed: {}", render_failures(report));
            if let Some(note) = stty_wording_note(report, host_stty_message().as_deref()) {
                eprintln!("note: {note}");
            }
        }
    }
}

/// Explains a stty failure caused only by the host quoting the file name.
fn stty_wording_note(report: &SuiteReport, host_message: Option<&str>) -> Option<String> {
    let host_message = host_message?;
    report
        .scenarios
        .iter()
        .find(|r| is_stty_wording_mismatch(r, host_message))
        .map(|r| {
            format!(
                "{} failed only because this host's stty prints {:?}; \
                 exit code and stdout matched",
                r.name,
                host_message.trim_end()
            )
        })
}
