//! Drivers and helpers for testing execprobe itself.
//!
//! [`LocalDriver`] is a conforming driver that runs commands on the host. The
//! drivers in [`fakes`] each reproduce one defect a real driver might have.

#![allow(missing_docs)]

pub mod fakes;
pub mod helpers;
pub mod host;
mod local;

pub use local::LocalDriver;
