//! Per-scenario stream endpoints.
//!
//! An [`IoFixture`] gives the driver a stdin source and two file-backed sinks
//! living in a private temporary directory. Captured output is read back by
//! re-opening the files after the sinks are closed, so "the driver finished
//! writing" and "the harness may read" never race the way an in-memory pipe
//! would.
//!
//! # Lifecycle
//!
//! 1. [`IoFixture::new`] creates the directory and both files.
//! 2. [`IoFixture::endpoints`] lends the streams to one driver call.
//! 3. [`IoFixture::close_sinks`] flushes buffered bytes and syncs the files.
//! 4. [`IoFixture::read_back`] returns what was written.
//! 5. [`IoFixture::cleanup`], or dropping the fixture, removes the directory.
//!
//! Reading back before step 3 is refused with `E_FIXTURE_STATE`.

mod resize;

pub use resize::resize_channel;

use crate::model::CapturedOutput;
use crate::runner::{HarnessError, HarnessResult};
use std::fs::{self, File};
use std::io::{self, BufWriter, Cursor, Read, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Prefix of every fixture directory under the system temp dir.
pub const FIXTURE_DIR_PREFIX: &str = "execprobe-exec-";

/// Buffered, file-backed sink that must be closed before its content is read.
pub struct CaptureSink {
    writer: BufWriter<File>,
}

impl CaptureSink {
    fn create(path: &Path) -> io::Result<Self> {
        Ok(Self {
            writer: BufWriter::new(File::create(path)?),
        })
    }

    /// Flush buffered bytes and sync the file to durable storage.
    pub fn close(self) -> io::Result<()> {
        let file = self.writer.into_inner().map_err(io::IntoInnerError::into_error)?;
        file.sync_all()
    }
}

impl Write for CaptureSink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.writer.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }
}

/// Streams lent to a single driver call.
pub struct Endpoints<'a> {
    pub stdin: &'a mut (dyn Read + Send),
    pub stdout: &'a mut (dyn Write + Send),
    pub stderr: &'a mut (dyn Write + Send),
}

pub struct IoFixture {
    dir: TempDir,
    stdin: Cursor<Vec<u8>>,
    stdout: Option<CaptureSink>,
    stderr: Option<CaptureSink>,
    stdout_path: PathBuf,
    stderr_path: PathBuf,
}

impl IoFixture {
    /// Build the endpoints for one scenario.
    ///
    /// # Errors
    /// - `E_UNSUPPORTED_CAPABILITY` when `tty` is requested.
    /// - `E_SETUP` when the temporary directory or files cannot be created.
    pub fn new(tty: bool, stdin: &str) -> HarnessResult<Self> {
        Self::new_in(&std::env::temp_dir(), tty, stdin)
    }

    /// Like [`IoFixture::new`], placing the fixture directory under `root`.
    pub fn new_in(root: &Path, tty: bool, stdin: &str) -> HarnessResult<Self> {
        if tty {
            return Err(HarnessError::unsupported("tty"));
        }

        let dir = tempfile::Builder::new()
            .prefix(FIXTURE_DIR_PREFIX)
            .tempdir_in(root)
            .map_err(|err| HarnessError::setup("failed to create fixture directory", err))?;
        let stdout_path = dir.path().join("stdout");
        let stderr_path = dir.path().join("stderr");
        let stdout = CaptureSink::create(&stdout_path)
            .map_err(|err| HarnessError::setup("failed to create stdout capture file", err))?;
        let stderr = CaptureSink::create(&stderr_path)
            .map_err(|err| HarnessError::setup("failed to create stderr capture file", err))?;

        tracing::trace!(dir = %dir.path().display(), "fixture created");
        Ok(Self {
            dir,
            stdin: Cursor::new(stdin.as_bytes().to_vec()),
            stdout: Some(stdout),
            stderr: Some(stderr),
            stdout_path,
            stderr_path,
        })
    }

    /// Directory holding the capture files.
    #[must_use]
    pub fn dir(&self) -> &Path {
        self.dir.path()
    }

    #[must_use]
    pub fn sinks_closed(&self) -> bool {
        self.stdout.is_none() && self.stderr.is_none()
    }

    /// Lend stdin and both sinks to a driver call.
    ///
    /// # Errors
    /// `E_FIXTURE_STATE` once the sinks have been closed.
    pub fn endpoints(&mut self) -> HarnessResult<Endpoints<'_>> {
        match (self.stdout.as_mut(), self.stderr.as_mut()) {
            (Some(stdout), Some(stderr)) => Ok(Endpoints {
                stdin: &mut self.stdin,
                stdout,
                stderr,
            }),
            _ => Err(HarnessError::fixture_state(
                "fixture sinks are already closed",
            )),
        }
    }

    /// Close both sinks. Calling it again is a no-op.
    ///
    /// # Errors
    /// `E_IO` if flushing or syncing a sink fails. Both sinks are closed
    /// regardless; the first failure is reported.
    pub fn close_sinks(&mut self) -> HarnessResult<()> {
        let stdout = self.stdout.take().map(CaptureSink::close).transpose();
        let stderr = self.stderr.take().map(CaptureSink::close).transpose();
        stdout.map_err(|err| HarnessError::io("failed to close stdout capture", err))?;
        stderr.map_err(|err| HarnessError::io("failed to close stderr capture", err))?;
        Ok(())
    }

    /// Read captured stdout and stderr.
    ///
    /// Invalid UTF-8 is replaced rather than rejected so mismatches stay
    /// printable.
    ///
    /// # Errors
    /// - `E_FIXTURE_STATE` if a sink is still open.
    /// - `E_IO` if a capture file cannot be read.
    pub fn read_back(&self) -> HarnessResult<CapturedOutput> {
        if !self.sinks_closed() {
            return Err(HarnessError::fixture_state(
                "read_back called before the sinks were closed",
            ));
        }
        let stdout = fs::read(&self.stdout_path)
            .map_err(|err| HarnessError::io("failed to read stdout capture", err))?;
        let stderr = fs::read(&self.stderr_path)
            .map_err(|err| HarnessError::io("failed to read stderr capture", err))?;
        Ok(CapturedOutput {
            stdout: String::from_utf8_lossy(&stdout).into_owned(),
            stderr: String::from_utf8_lossy(&stderr).into_owned(),
        })
    }

    /// Remove the fixture directory, reporting failures.
    ///
    /// Dropping the fixture also removes the directory but swallows errors.
    pub fn cleanup(self) -> HarnessResult<()> {
        let Self {
            dir, stdout, stderr, ..
        } = self;
        drop(stdout);
        drop(stderr);
        let path = dir.path().to_path_buf();
        dir.close().map_err(|err| {
            HarnessError::io(
                format!("failed to remove fixture directory {}", path.display()),
                err,
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::ErrorCode;

    fn fixture(stdin: &str) -> IoFixture {
        match IoFixture::new(false, stdin) {
            Ok(fixture) => fixture,
            Err(err) => panic!("fixture setup failed: {err}"),
        }
    }

    #[test]
    fn tty_fixtures_are_an_explicit_capability_gap() {
        let err = IoFixture::new(true, "").err().map(|e| e.code);
        assert_eq!(err, Some(ErrorCode::UnsupportedCapability));
    }

    #[test]
    fn stdin_yields_seeded_content_once() {
        let mut fixture = fixture("hello from stdin\n");
        let endpoints = fixture.endpoints().unwrap();
        let mut first = String::new();
        endpoints.stdin.read_to_string(&mut first).unwrap();
        let mut second = String::new();
        endpoints.stdin.read_to_string(&mut second).unwrap();
        assert_eq!(first, "hello from stdin\n");
        assert_eq!(second, "");
    }

    #[test]
    fn read_back_returns_exact_bytes_after_close() {
        let mut fixture = fixture("");
        {
            let endpoints = fixture.endpoints().unwrap();
            endpoints.stdout.write_all(b"out\n").unwrap();
            endpoints.stderr.write_all(b"err").unwrap();
        }
        fixture.close_sinks().unwrap();
        let captured = fixture.read_back().unwrap();
        assert_eq!(captured.stdout, "out\n");
        assert_eq!(captured.stderr, "err");
    }

    #[test]
    fn read_back_before_close_is_refused() {
        let mut fixture = fixture("");
        fixture.endpoints().unwrap().stdout.write_all(b"x").unwrap();
        let err = fixture.read_back().err().map(|e| e.code);
        assert_eq!(err, Some(ErrorCode::FixtureState));
    }

    #[test]
    fn endpoints_after_close_are_refused_and_close_is_idempotent() {
        let mut fixture = fixture("");
        fixture.close_sinks().unwrap();
        fixture.close_sinks().unwrap();
        assert!(fixture.sinks_closed());
        let err = fixture.endpoints().err().map(|e| e.code);
        assert_eq!(err, Some(ErrorCode::FixtureState));
    }

    #[test]
    fn each_fixture_gets_its_own_directory() {
        let first = fixture("");
        let second = fixture("");
        assert_ne!(first.dir(), second.dir());
        let name = first
            .dir()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        assert!(name.starts_with(FIXTURE_DIR_PREFIX));
    }

    #[test]
    fn new_in_places_the_directory_under_the_given_root() {
        let root = tempfile::tempdir().unwrap();
        let fixture = IoFixture::new_in(root.path(), false, "").unwrap();
        assert_eq!(fixture.dir().parent(), Some(root.path()));
        drop(fixture);
        assert_eq!(std::fs::read_dir(root.path()).unwrap().count(), 0);
    }

    #[test]
    fn missing_root_is_a_setup_error() {
        let root = tempfile::tempdir().unwrap();
        let missing = root.path().join("missing");
        let err = IoFixture::new_in(&missing, false, "").err().map(|e| e.code);
        assert_eq!(err, Some(ErrorCode::Setup));
    }

    #[test]
    fn cleanup_removes_directory() {
        let fixture = fixture("");
        let dir = fixture.dir().to_path_buf();
        assert!(dir.exists());
        fixture.cleanup().unwrap();
        assert!(!dir.exists());
    }

    #[test]
    fn drop_removes_directory_even_with_open_sinks() {
        let mut fixture = fixture("");
        fixture.endpoints().unwrap().stdout.write_all(b"x").unwrap();
        let dir = fixture.dir().to_path_buf();
        drop(fixture);
        assert!(!dir.exists());
    }
}
