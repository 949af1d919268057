//! Harness configuration
//!
//! Every path and selector the harness hands to its external collaborators
//! lives here. The defaults reproduce the classic jSMTLIB functional-test
//! setup: rebuild with `./buildRelease`, run `java -jar jSMTLIB.jar` with the
//! `peticodiac` backend, diff with `diff`.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Suffix selecting test inputs.
pub const INPUT_SUFFIX: &str = ".smt2";
/// Suffix appended to an input path to name the produced output.
pub const ACTUAL_SUFFIX: &str = ".peticodiac";
/// Suffix appended to the actual output path to name the golden file.
pub const EXPECTED_SUFFIX: &str = ".expected";

/// An external command: program plus leading arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: OsString,
    pub args: Vec<OsString>,
}

impl CommandSpec {
    pub fn new(program: impl Into<OsString>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }
}

/// Harness configuration
#[derive(Debug, Clone)]
pub struct HarnessConfig {
    /// Root of the test tree, walked recursively
    pub tests_dir: PathBuf,
    /// Build step run once before any test; `None` skips it
    pub build: Option<CommandSpec>,
    /// System under test; per-case arguments are appended after `args`
    pub system_under_test: CommandSpec,
    /// Backend passed as `--solver`
    pub solver_backend: String,
    /// Underlying solver binary passed as `--exec`
    pub solver_executable: PathBuf,
    /// Output dialect; selects the `--<kind>out` flag
    pub output_kind: String,
    /// Directory passed with the `--<kind>out` flag
    pub output_dir: PathBuf,
    /// Two-argument comparison utility; exit status 0 means identical
    pub comparator: CommandSpec,
    /// Upper bound for any single external invocation
    pub timeout: Option<Duration>,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            tests_dir: PathBuf::from("tests"),
            build: Some(CommandSpec::new("./buildRelease")),
            system_under_test: CommandSpec::new("java").with_args(["-jar", "jSMTLIB.jar"]),
            solver_backend: "peticodiac".to_string(),
            solver_executable: PathBuf::from("yices"),
            output_kind: "peticodiac".to_string(),
            output_dir: PathBuf::from("./tests"),
            comparator: CommandSpec::new("diff"),
            timeout: None,
        }
    }
}

impl HarnessConfig {
    /// Create a new config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tests_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.tests_dir = dir.into();
        self
    }

    pub fn with_build(mut self, build: Option<CommandSpec>) -> Self {
        self.build = build;
        self
    }

    pub fn with_system_under_test(mut self, sut: CommandSpec) -> Self {
        self.system_under_test = sut;
        self
    }

    pub fn with_solver(mut self, backend: impl Into<String>, executable: impl Into<PathBuf>) -> Self {
        self.solver_backend = backend.into();
        self.solver_executable = executable.into();
        self
    }

    pub fn with_output(mut self, kind: impl Into<String>, dir: impl Into<PathBuf>) -> Self {
        self.output_kind = kind.into();
        self.output_dir = dir.into();
        self
    }

    pub fn with_comparator(mut self, comparator: CommandSpec) -> Self {
        self.comparator = comparator;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// The flag naming the output directory, e.g. `--peticodiacout`.
    pub fn output_flag(&self) -> String {
        format!("--{}out", self.output_kind)
    }

    /// Full argument list for one invocation of the system under test.
    pub fn sut_args(&self, input: &Path) -> Vec<OsString> {
        let mut args = self.system_under_test.args.clone();
        args.push(input.as_os_str().to_os_string());
        args.push("--solver".into());
        args.push(self.solver_backend.clone().into());
        args.push("--exec".into());
        args.push(self.solver_executable.as_os_str().to_os_string());
        args.push(self.output_flag().into());
        args.push(self.output_dir.as_os_str().to_os_string());
        args
    }
}
