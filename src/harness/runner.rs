//! Harness run loop
//!
//! Build → Discover → (Invoke → Compare)* → Report, strictly sequential.
//!
//! Individual test failures never abort the run: a system under test that
//! crashes, hangs past the timeout or writes nothing simply leaves no matching
//! output, and the comparison step records the case as failed. Only problems
//! with the harness itself (missing tests directory, a broken report writer)
//! surface as [`HarnessError`](super::error::HarnessError).

use std::time::Instant;

use super::case::{self, TestCase, TestRunResult};
use super::config::HarnessConfig;
use super::error::HarnessResult;
use super::exec::{CommandRunner, Invocation, OutputMode, ProcessRunner};
use super::report::Report;
use super::reporter::TestReporter;

/// Functional-test harness bound to a configuration and a command runner.
pub struct Harness<R: CommandRunner> {
    config: HarnessConfig,
    runner: R,
    output: OutputMode,
}

impl Harness<ProcessRunner> {
    /// Harness that spawns real processes, honoring the configured timeout.
    pub fn local(config: HarnessConfig) -> Self {
        let runner = ProcessRunner::new(config.timeout);
        Self::new(config, runner)
    }
}

impl<R: CommandRunner> Harness<R> {
    pub fn new(config: HarnessConfig, runner: R) -> Self {
        Self {
            config,
            runner,
            output: OutputMode::Inherit,
        }
    }

    /// Choose whether child output goes to the console or is captured.
    pub fn with_output_mode(mut self, output: OutputMode) -> Self {
        self.output = output;
        self
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    /// Build, then run every discovered case.
    pub fn execute(&self, reporter: &mut dyn TestReporter) -> HarnessResult<Report> {
        self.build(reporter)?;
        self.run(reporter)
    }

    /// Run the configured build step, if any.
    ///
    /// The outcome is logged and handed to the reporter but never stops the
    /// run: a stale or missing build shows up as failing test cases.
    pub fn build(&self, reporter: &mut dyn TestReporter) -> HarnessResult<()> {
        let Some(build) = &self.config.build else {
            tracing::info!("build step skipped");
            return Ok(());
        };

        let invocation = Invocation::from_spec(build).output(self.output);
        reporter.on_build_start(&invocation)?;
        let outcome = self.runner.run(&invocation);
        match &outcome {
            Ok(result) if result.success() => {
                tracing::info!(ms = result.duration.as_millis(), "build finished")
            }
            Ok(result) => tracing::warn!(code = ?result.exit_code, "build exited unsuccessfully; continuing"),
            Err(e) => tracing::warn!("build could not run: {}; continuing", e),
        }
        reporter.on_build_complete(&outcome)?;
        Ok(())
    }

    /// Discover test cases under the configured tests directory.
    pub fn discover(&self) -> HarnessResult<Vec<TestCase>> {
        case::discover(&self.config.tests_dir)
    }

    /// Run the system under test on one case and compare its output.
    pub fn run_one(&self, case: &TestCase) -> TestRunResult {
        let sut = Invocation::new(self.config.system_under_test.program.clone())
            .args(self.config.sut_args(case.input_path()))
            .output(self.output);

        // Exit status of the system under test is deliberately not consulted
        match self.runner.run(&sut) {
            Ok(result) => {
                tracing::debug!(test = case.id(), code = ?result.exit_code, "system under test finished");
                log_captured(case, "system under test", &result.stdout, &result.stderr);
            }
            Err(e) => tracing::warn!(test = case.id(), "system under test: {}", e),
        }

        let compare = Invocation::from_spec(&self.config.comparator)
            .arg(case.actual_output_path())
            .arg(case.expected_output_path())
            .output(self.output);

        match self.runner.run(&compare) {
            Ok(result) => {
                log_captured(case, "comparison", &result.stdout, &result.stderr);
                if result.success() {
                    TestRunResult::Passed
                } else {
                    TestRunResult::Failed
                }
            }
            Err(e) => {
                tracing::warn!(test = case.id(), "comparison: {}", e);
                TestRunResult::Failed
            }
        }
    }

    /// Run every discovered case in order and return the aggregate report.
    #[tracing::instrument(skip_all, fields(tests_dir = %self.config.tests_dir.display()))]
    pub fn run(&self, reporter: &mut dyn TestReporter) -> HarnessResult<Report> {
        let cases = self.discover()?;
        reporter.on_run_start(cases.len())?;

        let mut report = Report::new();
        for case in &cases {
            reporter.on_test_start(case)?;
            let start = Instant::now();
            let result = self.run_one(case);
            reporter.on_test_complete(case, result, start.elapsed())?;
            report.record(case, result);
        }

        tracing::info!(total = report.total(), failed = report.failed(), "run complete");
        reporter.on_run_complete(&report)?;
        Ok(report)
    }
}

fn log_captured(case: &TestCase, what: &str, stdout: &str, stderr: &str) {
    if !stdout.is_empty() {
        tracing::debug!(test = case.id(), "{} stdout:\n{}", what, stdout);
    }
    if !stderr.is_empty() {
        tracing::debug!(test = case.id(), "{} stderr:\n{}", what, stderr);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::harness::config::CommandSpec;
    use crate::harness::error::ExecError;
    use crate::harness::exec::ExecResult;
    use crate::harness::reporter::JsonReporter;
    use std::cell::RefCell;
    use std::collections::HashMap;
    use std::fs;
    use std::io;
    use std::path::{Path, PathBuf};

    /// What the fake system under test does for a given input file name.
    #[derive(Clone)]
    enum Behavior {
        Write(&'static str),
        Crash,
    }

    /// In-process stand-in for the build, the system under test and `diff`.
    #[derive(Default)]
    struct FakeRunner {
        behaviors: HashMap<String, Behavior>,
        build_fails_to_spawn: bool,
        calls: RefCell<Vec<Invocation>>,
    }

    impl FakeRunner {
        fn with(mut self, name: &str, behavior: Behavior) -> Self {
            self.behaviors.insert(name.to_string(), behavior);
            self
        }

        fn programs(&self) -> Vec<String> {
            self.calls.borrow().iter().map(Invocation::program_name).collect()
        }
    }

    fn exit(code: i32) -> ExecResult {
        ExecResult {
            exit_code: Some(code),
            ..ExecResult::default()
        }
    }

    impl CommandRunner for FakeRunner {
        fn run(&self, invocation: &Invocation) -> Result<ExecResult, ExecError> {
            self.calls.borrow_mut().push(invocation.clone());
            match invocation.program_name().as_str() {
                "build" if self.build_fails_to_spawn => Err(ExecError::Spawn {
                    program: "build".to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "missing"),
                }),
                "build" => Ok(exit(0)),
                "sut" => {
                    let input = PathBuf::from(&invocation.args[0]);
                    let name = input.file_name().unwrap().to_string_lossy().into_owned();
                    match self.behaviors.get(&name) {
                        Some(Behavior::Write(text)) => {
                            let mut out = input.into_os_string();
                            out.push(".peticodiac");
                            fs::write(out, text).unwrap();
                            Ok(exit(0))
                        }
                        Some(Behavior::Crash) | None => Ok(exit(134)),
                    }
                }
                "cmp" => {
                    let actual = fs::read(&invocation.args[0]);
                    let expected = fs::read(&invocation.args[1]);
                    match (actual, expected) {
                        (Ok(a), Ok(e)) if a == e => Ok(exit(0)),
                        (Ok(_), Ok(_)) => Ok(exit(1)),
                        _ => Ok(exit(2)),
                    }
                }
                other => Err(ExecError::Spawn {
                    program: other.to_string(),
                    source: io::Error::new(io::ErrorKind::NotFound, "unknown program"),
                }),
            }
        }
    }

    /// Reporter that drops everything.
    struct Silent;

    impl TestReporter for Silent {
        fn on_run_start(&mut self, _: usize) -> io::Result<()> {
            Ok(())
        }
        fn on_test_start(&mut self, _: &TestCase) -> io::Result<()> {
            Ok(())
        }
        fn on_test_complete(&mut self, _: &TestCase, _: TestRunResult, _: std::time::Duration) -> io::Result<()> {
            Ok(())
        }
        fn on_run_complete(&mut self, _: &Report) -> io::Result<()> {
            Ok(())
        }
    }

    fn config(root: &Path) -> HarnessConfig {
        HarnessConfig::new()
            .with_tests_dir(root)
            .with_build(Some(CommandSpec::new("build")))
            .with_system_under_test(CommandSpec::new("sut"))
            .with_solver("peticodiac", "/usr/bin/yices")
            .with_output("peticodiac", root)
            .with_comparator(CommandSpec::new("cmp"))
    }

    fn golden(root: &Path, name: &str, text: &str) {
        fs::write(root.join(format!("{name}.peticodiac.expected")), text).unwrap();
    }

    fn input(root: &Path, name: &str) {
        fs::write(root.join(name), "(check-sat)\n").unwrap();
    }

    #[test]
    fn test_one_pass_one_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "a.smt2");
        input(dir.path(), "b.smt2");
        golden(dir.path(), "a.smt2", "sat\n");
        golden(dir.path(), "b.smt2", "unsat\n");

        let runner = FakeRunner::default()
            .with("a.smt2", Behavior::Write("sat\n"))
            .with("b.smt2", Behavior::Write("sat\n"));
        let harness = Harness::new(config(dir.path()), runner);
        let report = harness.execute(&mut Silent).unwrap();

        assert_eq!(report.total(), 2);
        assert_eq!(report.failed(), 1);
        assert_eq!(report.failed_tests(), ["b.smt2"]);
    }

    #[test]
    fn test_crash_without_output_is_failed() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "c.smt2");
        golden(dir.path(), "c.smt2", "sat\n");

        let runner = FakeRunner::default().with("c.smt2", Behavior::Crash);
        let harness = Harness::new(config(dir.path()), runner);
        let cases = harness.discover().unwrap();

        assert_eq!(harness.run_one(&cases[0]), TestRunResult::Failed);
        assert!(!cases[0].actual_output_path().exists());
    }

    #[test]
    fn test_single_byte_difference_fails() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "a.smt2");
        golden(dir.path(), "a.smt2", "sat\n");

        let runner = FakeRunner::default().with("a.smt2", Behavior::Write("sat \n"));
        let harness = Harness::new(config(dir.path()), runner);
        let cases = harness.discover().unwrap();
        assert_eq!(harness.run_one(&cases[0]), TestRunResult::Failed);
    }

    #[test]
    fn test_empty_tests_dir() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(config(dir.path()), FakeRunner::default());
        let report = harness.execute(&mut Silent).unwrap();
        assert_eq!(report, Report::new());
        assert_eq!(harness.runner().programs(), ["build"]);
    }

    #[test]
    fn test_invocation_order_and_arguments() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "b.smt2");
        input(dir.path(), "a.smt2");
        golden(dir.path(), "a.smt2", "sat\n");
        golden(dir.path(), "b.smt2", "sat\n");

        let runner = FakeRunner::default()
            .with("a.smt2", Behavior::Write("sat\n"))
            .with("b.smt2", Behavior::Write("sat\n"));
        let harness = Harness::new(config(dir.path()), runner);
        harness.execute(&mut Silent).unwrap();

        assert_eq!(harness.runner().programs(), ["build", "sut", "cmp", "sut", "cmp"]);

        let calls = harness.runner().calls.borrow();
        let a = dir.path().join("a.smt2");
        let expected_sut = Invocation::new("sut")
            .arg(&a)
            .args(["--solver", "peticodiac", "--exec", "/usr/bin/yices", "--peticodiacout"])
            .arg(dir.path());
        assert_eq!(calls[1], expected_sut);

        let expected_cmp = Invocation::new("cmp")
            .arg(dir.path().join("a.smt2.peticodiac"))
            .arg(dir.path().join("a.smt2.peticodiac.expected"));
        assert_eq!(calls[2], expected_cmp);
    }

    #[test]
    fn test_skipped_build_is_not_invoked() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(config(dir.path()).with_build(None), FakeRunner::default());
        harness.execute(&mut Silent).unwrap();
        assert!(harness.runner().programs().is_empty());
    }

    #[test]
    fn test_build_failure_does_not_abort_run() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "a.smt2");
        golden(dir.path(), "a.smt2", "sat\n");

        let runner = FakeRunner {
            build_fails_to_spawn: true,
            ..FakeRunner::default()
        }
        .with("a.smt2", Behavior::Write("sat\n"));
        let harness = Harness::new(config(dir.path()), runner);
        let report = harness.execute(&mut Silent).unwrap();
        assert_eq!(report.total(), 1);
        assert!(report.all_passed());
    }

    #[test]
    fn test_missing_comparator_fails_case() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "a.smt2");
        golden(dir.path(), "a.smt2", "sat\n");

        let runner = FakeRunner::default().with("a.smt2", Behavior::Write("sat\n"));
        let config = config(dir.path()).with_comparator(CommandSpec::new("no-such-diff"));
        let harness = Harness::new(config, runner);
        let report = harness.execute(&mut Silent).unwrap();
        assert_eq!(report.failed_tests(), ["a.smt2"]);
    }

    #[test]
    fn test_rerun_gives_identical_report() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["a.smt2", "b.smt2", "c.smt2"] {
            input(dir.path(), name);
            golden(dir.path(), name, "sat\n");
        }
        let runner = FakeRunner::default()
            .with("a.smt2", Behavior::Write("sat\n"))
            .with("b.smt2", Behavior::Write("unknown\n"))
            .with("c.smt2", Behavior::Crash);
        let harness = Harness::new(config(dir.path()), runner);

        let first = harness.run(&mut Silent).unwrap();
        let second = harness.run(&mut Silent).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.failed(), first.failed_tests().len());
        assert!(first.failed() <= first.total());
    }

    #[test]
    fn test_missing_tests_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(config(&dir.path().join("absent")), FakeRunner::default());
        assert!(harness.run(&mut Silent).is_err());
    }

    #[test]
    fn test_json_reporter_sees_every_case() {
        let dir = tempfile::tempdir().unwrap();
        input(dir.path(), "a.smt2");
        input(dir.path(), "b.smt2");
        golden(dir.path(), "a.smt2", "sat\n");

        let runner = FakeRunner::default()
            .with("a.smt2", Behavior::Write("sat\n"))
            .with("b.smt2", Behavior::Write("sat\n"));
        let harness = Harness::new(config(dir.path()), runner).with_output_mode(OutputMode::Capture);
        let mut reporter = JsonReporter::new(Vec::new());
        harness.run(&mut reporter).unwrap();

        let doc: serde_json::Value = serde_json::from_slice(&reporter.into_inner()).unwrap();
        assert_eq!(doc["total"], 2);
        assert_eq!(doc["failed_tests"], serde_json::json!(["b.smt2"]));
        assert_eq!(doc["results"][0]["result"], "passed");
        assert_eq!(doc["results"][1]["result"], "failed");
    }
}
