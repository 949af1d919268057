//! Test run reporting
//!
//! The run loop in `runner.rs` only talks to the [`TestReporter`] trait, which
//! keeps rendering separate from execution. Two implementations ship here:
//!
//! - [`ConsoleReporter`] - the classic banner-style console transcript
//! - [`JsonReporter`] - a single JSON document written when the run completes

use std::io::{self, Write};
use std::time::Duration;

use serde::Serialize;

use super::case::{TestCase, TestRunResult};
use super::error::ExecError;
use super::exec::{ExecResult, Invocation};
use super::report::Report;

/// Trait for reporting harness progress and results.
///
/// Implement this trait to customize the output format (TAP, JUnit, etc.)
pub trait TestReporter {
    /// Called before the build step runs
    fn on_build_start(&mut self, _build: &Invocation) -> io::Result<()> {
        Ok(())
    }

    /// Called after the build step, whatever its outcome
    fn on_build_complete(&mut self, _outcome: &Result<ExecResult, ExecError>) -> io::Result<()> {
        Ok(())
    }

    /// Called once discovery has produced the case list
    fn on_run_start(&mut self, test_count: usize) -> io::Result<()>;

    /// Called before the system under test is invoked for `case`
    fn on_test_start(&mut self, case: &TestCase) -> io::Result<()>;

    /// Called once `case` has been compared
    fn on_test_complete(&mut self, case: &TestCase, result: TestRunResult, elapsed: Duration) -> io::Result<()>;

    /// Called after every case has run
    fn on_run_complete(&mut self, report: &Report) -> io::Result<()>;
}

const GREEN: &str = "\x1b[32m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Default console reporter
pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
    verbose: bool,
}

impl ConsoleReporter<io::Stdout> {
    pub fn stdout(color: bool) -> Self {
        Self::new(io::stdout(), color)
    }
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> Self {
        Self {
            out,
            color,
            verbose: false,
        }
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn banner(&mut self, title: &str) -> io::Result<()> {
        let line = self.paint(BOLD, &format!("############ {title} ############"));
        writeln!(self.out, "{line}")
    }
}

impl<W: Write> TestReporter for ConsoleReporter<W> {
    fn on_build_start(&mut self, _build: &Invocation) -> io::Result<()> {
        self.banner("Start building")?;
        self.out.flush()
    }

    fn on_build_complete(&mut self, outcome: &Result<ExecResult, ExecError>) -> io::Result<()> {
        if let Err(e) = outcome {
            let line = self.paint(RED, &format!("Build could not run: {e}"));
            writeln!(self.out, "{line}")?;
        }
        Ok(())
    }

    fn on_run_start(&mut self, _test_count: usize) -> io::Result<()> {
        write!(self.out, "\n\n")?;
        self.banner("Running Functional Tests")
    }

    fn on_test_start(&mut self, case: &TestCase) -> io::Result<()> {
        writeln!(self.out, "\n#### Running test {}", case.id())?;
        // Child output is interleaved with ours when inherited
        self.out.flush()
    }

    fn on_test_complete(&mut self, case: &TestCase, result: TestRunResult, elapsed: Duration) -> io::Result<()> {
        let status = match result {
            TestRunResult::Passed => self.paint(GREEN, "completed successfully"),
            TestRunResult::Failed => self.paint(RED, "failed"),
        };
        if self.verbose {
            writeln!(self.out, "# Test {} {} ({}ms)", case.id(), status, elapsed.as_millis())
        } else {
            writeln!(self.out, "# Test {} {}", case.id(), status)
        }
    }

    fn on_run_complete(&mut self, report: &Report) -> io::Result<()> {
        write!(self.out, "\n\n")?;
        self.banner("Test Result")?;

        let summary = format!("Total {} tests. {} tests failed", report.total(), report.failed());
        let summary = if report.all_passed() {
            self.paint(GREEN, &summary)
        } else {
            self.paint(RED, &summary)
        };
        writeln!(self.out, "{summary}")?;

        if !report.failed_tests().is_empty() {
            writeln!(self.out, "\nThe following test failed:")?;
            for id in report.failed_tests() {
                writeln!(self.out, "\t{id}")?;
            }
        }
        self.out.flush()
    }
}

#[derive(Serialize)]
struct CaseRecord {
    test: String,
    result: TestRunResult,
    duration_ms: u64,
}

#[derive(Serialize)]
struct JsonDocument<'a> {
    #[serde(flatten)]
    report: &'a Report,
    results: &'a [CaseRecord],
}

/// Writes the whole run as one pretty-printed JSON document at the end.
pub struct JsonReporter<W: Write> {
    out: W,
    results: Vec<CaseRecord>,
}

impl JsonReporter<io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> JsonReporter<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            results: Vec::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl<W: Write> TestReporter for JsonReporter<W> {
    fn on_run_start(&mut self, test_count: usize) -> io::Result<()> {
        self.results = Vec::with_capacity(test_count);
        Ok(())
    }

    fn on_test_start(&mut self, _case: &TestCase) -> io::Result<()> {
        Ok(())
    }

    fn on_test_complete(&mut self, case: &TestCase, result: TestRunResult, elapsed: Duration) -> io::Result<()> {
        self.results.push(CaseRecord {
            test: case.id().to_string(),
            result,
            duration_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
        });
        Ok(())
    }

    fn on_run_complete(&mut self, report: &Report) -> io::Result<()> {
        let doc = JsonDocument {
            report,
            results: &self.results,
        };
        serde_json::to_writer_pretty(&mut self.out, &doc)?;
        writeln!(self.out)?;
        self.out.flush()
    }
}
