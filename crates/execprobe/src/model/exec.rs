use crate::model::RunId;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{Read, Write};
use std::sync::mpsc::Receiver;

/// Terminal dimensions offered to the driver through the resize channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResizeEvent {
    /// Number of rows.
    pub height: u16,
    /// Number of columns.
    pub width: u16,
}

impl Default for ResizeEvent {
    fn default() -> Self {
        Self {
            height: 100,
            width: 100,
        }
    }
}

/// Ambient context of one driver invocation.
///
/// The harness only ever issues the background context: there is no deadline
/// and nothing cancels the call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExecContext {
    /// Run that issued the invocation, for log correlation.
    pub run_id: RunId,
}

impl ExecContext {
    /// Unbounded context tied to the given run.
    #[must_use]
    pub fn background(run_id: RunId) -> Self {
        Self { run_id }
    }
}

/// Everything a driver needs to execute one command with attached streams.
///
/// Streams are borrowed: the caller owns them and closes the write ends once
/// [`StreamingDriver::exec_task_streaming`](crate::driver::StreamingDriver::exec_task_streaming)
/// returns.
pub struct ExecOptions<'a> {
    /// Argument vector; element 0 is the program.
    pub command: Vec<String>,
    /// Whether a pseudo-terminal was requested.
    pub tty: bool,
    /// Bytes to feed to the process' standard input.
    pub stdin: &'a mut (dyn Read + Send),
    /// Sink for the process' standard output.
    pub stdout: &'a mut (dyn Write + Send),
    /// Sink for the process' standard error.
    pub stderr: &'a mut (dyn Write + Send),
    /// Single-slot channel carrying at most one resize event.
    pub resize: Receiver<ResizeEvent>,
}

impl fmt::Debug for ExecOptions<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExecOptions")
            .field("command", &self.command)
            .field("tty", &self.tty)
            .finish_non_exhaustive()
    }
}

/// Result reported by a driver once the command and its output streams are done.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecResult {
    /// Exit code of the command.
    pub exit_code: i32,
}
