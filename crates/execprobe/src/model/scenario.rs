use serde::Serialize;

/// Shell used to run every scenario command.
pub const SHELL: &str = "/bin/sh";

/// One command and the exact observable behavior a conforming driver must produce.
///
/// Scenarios are static data: they are never built or mutated at runtime and
/// share no state with each other.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Scenario {
    /// Stable slug used for filtering and artifact paths.
    pub id: &'static str,
    /// Human-readable name.
    pub name: &'static str,
    /// Shell one-liner passed to `/bin/sh -c`.
    pub command: &'static str,
    /// Whether the scenario asks for a pseudo-terminal.
    pub tty: bool,
    /// Bytes written to the command's standard input.
    pub stdin: &'static str,
    /// Exact expected standard output.
    pub expected_stdout: &'static str,
    /// Exact expected standard error.
    pub expected_stderr: &'static str,
    /// Exact expected exit code.
    pub expected_exit_code: i32,
}

impl Scenario {
    /// Argument vector handed to the driver.
    #[must_use]
    pub fn argv(&self) -> Vec<String> {
        vec![
            SHELL.to_string(),
            "-c".to_string(),
            self.command.to_string(),
        ]
    }
}
