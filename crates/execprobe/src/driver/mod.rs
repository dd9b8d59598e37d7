//! Contract a task-execution driver implements to be checked by this harness.
//!
//! The harness never implements execution itself. It calls
//! [`StreamingDriver::exec_task_streaming`] with borrowed streams and a resize
//! channel, then judges what came out of the streams and the reported exit
//! code.
//!
//! # Expectations on implementors
//!
//! - The call blocks until the command has exited **and** every process that
//!   inherited its stdout/stderr has closed them. Returning as soon as the
//!   direct child exits loses output written by backgrounded descendants.
//! - Standard output and standard error are delivered to their own sinks,
//!   never merged.
//! - All bytes read from `stdin` reach the process unmodified; EOF on `stdin`
//!   is forwarded as EOF.
//! - The exit code is the command's own, including values other than 0 and 1.
//! - At most one [`ResizeEvent`](crate::model::ResizeEvent) arrives on the
//!   channel, possibly after the command started. Drivers without tty support
//!   may ignore it.
//! - The driver does not close the sinks; the caller does after the call.

use crate::model::{ExecContext, ExecOptions, ExecResult};
use std::error::Error as StdError;

/// Error returned by a driver when it could not run the command at all.
///
/// A command that runs and exits non-zero is not an error: its exit code goes
/// into [`ExecResult`].
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Streaming execution of a command inside a task.
pub trait StreamingDriver {
    /// Run `options.command` in the task identified by `task_id`.
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError>;
}

impl<T: StreamingDriver + ?Sized> StreamingDriver for &T {
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        (**self).exec_task_streaming(ctx, task_id, options)
    }
}

impl<T: StreamingDriver + ?Sized> StreamingDriver for Box<T> {
    fn exec_task_streaming(
        &self,
        ctx: &ExecContext,
        task_id: &str,
        options: ExecOptions<'_>,
    ) -> Result<ExecResult, DriverError> {
        (**self).exec_task_streaming(ctx, task_id, options)
    }
}
