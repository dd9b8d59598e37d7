//! Reference driver that runs commands on the host.

use execprobe::{DriverError, ExecContext, ExecOptions, ExecResult, StreamingDriver};
use std::io::{self, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use tracing::debug;

/// Runs the argv directly on the host with piped stdin, stdout and stderr.
///
/// The task id is only logged: every task is the host. Returns once the
/// command has exited and both output pipes reached EOF, which happens only
/// after every process holding them has exited.
#[derive(Clone, Copy, Debug, Default)]
pub struct LocalDriver;

impl StreamingDriver for LocalDriver {
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        if options.tty {
            return Err(DriverError::new(
                "local driver does not allocate a pseudo-terminal",
            ));
        }
        if let Ok(event) = options.resize.try_recv() {
            debug!(?event, "ignoring resize without a tty");
        }
        debug!(run_id = %ctx.run_id, task_id, command = ?options.command, "spawning");

        let mut child = spawn(&options.command)?;
        let child_stdin = child.stdin.take();
        let child_stdout = child.stdout.take();
        let child_stderr = child.stderr.take();
        let ExecOptions {
            stdin,
            stdout,
            stderr,
            ..
        } = options;

        thread::scope(|scope| {
            let feeder = scope.spawn(move || feed_stdin(stdin, child_stdin));
            let out = scope.spawn(move || pump(child_stdout, stdout));
            let err = scope.spawn(move || pump(child_stderr, stderr));
            for (name, handle) in [("stdin", feeder), ("stdout", out), ("stderr", err)] {
                handle
                    .join()
                    .map_err(|_| DriverError::new(format!("{name} pump panicked")))?
                    .map_err(|e| DriverError::with_source(format!("failed to pump {name}"), e))?;
            }
            Ok::<_, DriverError>(())
        })?;

        let status = child
            .wait()
            .map_err(|err| DriverError::with_source("failed to wait for command", err))?;
        let exit_code = exit_code(status);
        debug!(task_id, exit_code, "command finished");
        Ok(ExecResult { exit_code })
    }
}

pub(crate) fn spawn(argv: &[String]) -> Result<Child, DriverError> {
    let (program, args) = argv
        .split_first()
        .ok_or_else(|| DriverError::new("empty command"))?;
    Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|err| DriverError::with_source(format!("failed to spawn {program}"), err))
}

/// Copy all of `source` into the child, then close the pipe so it sees EOF.
///
/// A command that exits without reading its stdin closes the pipe early;
/// that is not an error.
pub(crate) fn feed_stdin(
    source: &mut (dyn Read + Send),
    sink: Option<impl Write>,
) -> io::Result<()> {
    let Some(mut sink) = sink else {
        return Ok(());
    };
    match io::copy(source, &mut sink) {
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => Ok(()),
        other => other.map(drop),
    }
}

fn pump(source: Option<impl Read>, sink: &mut (dyn Write + Send)) -> io::Result<()> {
    if let Some(mut source) = source {
        io::copy(&mut source, sink)?;
    }
    sink.flush()
}

/// The command's own exit code, or 128 plus the signal that killed it.
pub(crate) fn exit_code(status: ExitStatus) -> i32 {
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        if let Some(signal) = status.signal() {
            return 128 + signal;
        }
    }
    status.code().unwrap_or(-1)
}
