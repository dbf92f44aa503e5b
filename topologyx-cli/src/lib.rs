//! Support library for the `topologyx` binary.
//!
//! Exposes argument parsing, command execution and rendering so tests and
//! doctests can drive the pipeline without spawning a process.

pub mod cli;
pub mod logging;
