//! Harness error types
//!
//! Failures of an individual test case never surface here: they are folded into
//! a `Failed` result. These errors are reserved for problems that stop the
//! harness itself from producing a report.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Errors that abort a harness run.
#[derive(Debug, Error)]
pub enum HarnessError {
    #[error("tests directory '{}' does not exist or is not a directory", .0.display())]
    TestsDirNotFound(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from invoking an external command.
#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed while waiting for '{program}': {source}")]
    Wait {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("'{program}' timed out after {:.1}s", .timeout.as_secs_f64())]
    Timeout { program: String, timeout: Duration },
}

pub type HarnessResult<T> = Result<T, HarnessError>;
