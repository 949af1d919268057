//! Functional-test harness
//!
//! Rebuilds the system under test, runs it on every `.smt2` input found under
//! the tests directory, diffs each produced `.peticodiac` file against its
//! `.peticodiac.expected` golden file and reports the pass/fail counts.
//!
//! ## Modules
//!
//! - `config` - every external path and selector, with defaults
//! - `case` - test cases and their discovery
//! - `exec` - the `CommandRunner` boundary around external processes
//! - `report` - the run report accumulator
//! - `reporter` - console and JSON rendering
//! - `runner` - the sequential run loop

pub mod case;
pub mod config;
pub mod error;
pub mod exec;
pub mod report;
pub mod reporter;
pub mod runner;

pub use case::{TestCase, TestRunResult, discover};
pub use config::{CommandSpec, HarnessConfig};
pub use error::{ExecError, HarnessError, HarnessResult};
pub use exec::{CommandRunner, ExecResult, Invocation, OutputMode, ProcessRunner};
pub use report::Report;
pub use reporter::{ConsoleReporter, JsonReporter, TestReporter};
pub use runner::Harness;
