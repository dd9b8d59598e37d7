//! execprobe: a conformance harness for drivers that run commands inside a
//! task with streamed stdin, stdout and stderr.
//!
//! A driver implements [`StreamingDriver`]; the harness runs a fixed table of
//! shell scenarios through it and checks captured output and exit codes
//! byte-for-byte. Driver crates typically call [`assert_conformance`] from a
//! test:
//!
//! ```no_run
//! # fn driver() -> Box<dyn execprobe::StreamingDriver> { unimplemented!() }
//! execprobe::assert_conformance(&driver(), "task-1");
//! ```

#![forbid(unsafe_code)]
// Report and event fields are documented on their types.
#![allow(missing_docs)]

pub mod artifacts;
pub mod driver;
pub mod fixture;
pub mod model;
pub mod runner;
pub mod scenario;
pub mod verify;

pub use crate::model::*;

pub use crate::driver::{DriverError, StreamingDriver};
pub use crate::runner::{
    assert_conformance, platform_support, run_conformance, run_conformance_with_options,
    HarnessError, HarnessResult, PlatformSupport, RunnerOptions,
};
