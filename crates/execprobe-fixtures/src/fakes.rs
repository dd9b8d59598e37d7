//! Drivers with known defects, for checking that the harness catches them.

use crate::local::{exit_code, feed_stdin, spawn, LocalDriver};
use execprobe::{DriverError, ExecContext, ExecOptions, ExecResult, StreamingDriver};
use std::io::{self, Read, Write};
use std::sync::{Arc, Mutex};
use std::thread;

/// Ignores the command and answers with canned output.
#[derive(Clone, Debug, Default)]
pub struct ScriptedDriver {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: i32,
}

impl StreamingDriver for ScriptedDriver {
    fn exec_task_streaming(
        &self,
        _ctx: &ExecContext,
        _task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        options
            .stdout
            .write_all(self.stdout.as_bytes())
            .map_err(|err| DriverError::with_source("failed to write stdout", err))?;
        options
            .stderr
            .write_all(self.stderr.as_bytes())
            .map_err(|err| DriverError::with_source("failed to write stderr", err))?;
        Ok(ExecResult {
            exit_code: self.exit_code,
        })
    }
}

/// Fails every call before running anything, like a driver whose task is gone.
#[derive(Clone, Debug)]
pub struct FailingDriver {
    pub message: String,
}

impl StreamingDriver for FailingDriver {
    fn exec_task_streaming(
        &self,
        _ctx: &ExecContext,
        task_id: &str,
        _options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        Err(DriverError::with_source(
            format!("task {task_id} unavailable"),
            io::Error::new(io::ErrorKind::NotConnected, self.message.clone()),
        ))
    }
}

/// Panics inside every call.
#[derive(Clone, Copy, Debug, Default)]
pub struct PanickingDriver;

impl StreamingDriver for PanickingDriver {
    #[allow(clippy::panic)]
    fn exec_task_streaming(
        &self,
        _ctx: &ExecContext,
        task_id: &str,
        _options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        panic!("driver lost track of task {task_id}");
    }
}

/// Sends stderr into the stdout sink, like a driver that attaches one pipe
/// to both descriptors.
#[derive(Clone, Copy, Debug, Default)]
pub struct MergedStreamsDriver;

impl StreamingDriver for MergedStreamsDriver {
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        mut options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        let mut argv = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "\"$@\" 2>&1".to_string(),
            "sh".to_string(),
        ];
        argv.append(&mut options.command);
        options.command = argv;
        LocalDriver.exec_task_streaming(ctx, task_id, options)
    }
}

/// Collapses every non-zero exit code to 1.
#[derive(Clone, Copy, Debug, Default)]
pub struct BooleanExitDriver;

impl StreamingDriver for BooleanExitDriver {
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        let result = LocalDriver.exec_task_streaming(ctx, task_id, options)?;
        Ok(ExecResult {
            exit_code: i32::from(result.exit_code != 0),
        })
    }
}

/// Returns as soon as the direct child exits, dropping output that
/// backgrounded descendants write afterwards.
#[derive(Clone, Copy, Debug, Default)]
pub struct EagerDriver;

impl StreamingDriver for EagerDriver {
    fn exec_task_streaming(
        &self,
        _ctx: &ExecContext,
        _task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        let mut child = spawn(&options.command)?;
        feed_stdin(options.stdin, child.stdin.take())
            .map_err(|err| DriverError::with_source("failed to feed stdin", err))?;

        let out = Arc::new(Mutex::new(Vec::new()));
        let err = Arc::new(Mutex::new(Vec::new()));
        let out_pump = child.stdout.take().map(|s| collect_detached(s, Arc::clone(&out)));
        let err_pump = child.stderr.take().map(|s| collect_detached(s, Arc::clone(&err)));

        let status = child
            .wait()
            .map_err(|e| DriverError::with_source("failed to wait for command", e))?;
        // Let the pumps drain what the child wrote before exiting; anything
        // a descendant writes later is lost.
        drop(out_pump);
        drop(err_pump);
        thread::sleep(std::time::Duration::from_millis(50));

        write_snapshot(&out, options.stdout)?;
        write_snapshot(&err, options.stderr)?;
        Ok(ExecResult {
            exit_code: exit_code(status),
        })
    }
}

fn collect_detached(
    mut source: impl Read + Send + 'static,
    buffer: Arc<Mutex<Vec<u8>>>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut chunk = [0_u8; 4096];
        while let Ok(n) = source.read(&mut chunk) {
            if n == 0 {
                break;
            }
            let Ok(mut buffer) = buffer.lock() else {
                break;
            };
            buffer.extend_from_slice(chunk.get(..n).unwrap_or_default());
        }
    })
}

fn write_snapshot(
    buffer: &Mutex<Vec<u8>>,
    sink: &mut (dyn Write + Send),
) -> Result<(), DriverError> {
    let snapshot = buffer
        .lock()
        .map(|bytes| bytes.clone())
        .map_err(|_| DriverError::new("output buffer poisoned"))?;
    sink.write_all(&snapshot)
        .map_err(|err| DriverError::with_source("failed to write output", err))
}
