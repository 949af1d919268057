#![forbid(unsafe_code)]
//! Functional-test harness for the jSMTLIB `peticodiac` output dialect
//!
//! The harness treats the build system, the SMT wrapper under test and the
//! comparison utility as opaque external commands. It owns only the test
//! protocol: discovery, per-case invocation, golden-file comparison and the
//! final report.
//!
//! ## Panic Policy
//!
//! - **Production code**: Use `Result` or `Option` with `?` / `ok_or` / `map_err`. The `cli` module enforces
//!   `#![deny(clippy::unwrap_used)]`.
//!
//! - **Test code**: `.unwrap()` and `.expect()` are acceptable in tests.
//!
//! - **Test failures are data**: a crashing or hanging system under test is recorded as a failed case, never
//!   propagated as an error.

pub mod cli;
pub mod harness;
pub mod version;

pub use harness::{Harness, HarnessConfig, Report, TestCase, TestRunResult};
