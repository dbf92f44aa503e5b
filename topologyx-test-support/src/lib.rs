//! Shared test utilities used across topologyx crates.

pub mod proptest_profile;
pub mod tracing;
