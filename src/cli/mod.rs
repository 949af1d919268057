//! CLI module for the functest harness
//!
//! Invoked with no arguments the harness reproduces the classic workflow:
//! run `./buildRelease`, then test every `.smt2` file under `./tests` with
//! `java -jar jSMTLIB.jar --solver peticodiac`. Every literal in that workflow
//! can be overridden by a flag or its `FUNCTEST_*` environment variable.
//!
//! ## Exit status
//!
//! - `0` - every test passed (or `--exit-zero` was given)
//! - `1` - at least one test failed, or the harness itself could not run
//! - `2` - invalid command line (reported by clap)
//!
//! ## Design
//!
//! The CLI uses clap for argument parsing with derive macros.
//! Command functions return `CliResult<T>` instead of calling `process::exit`.
//! Only the top-level `run()` function handles errors and exits.

// Enforce explicit error handling - no panicking in production code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]

use std::env;
use std::fmt;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;
use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::harness::{
    CommandSpec, ConsoleReporter, Harness, HarnessConfig, JsonReporter, OutputMode, Report, TestReporter,
};
use crate::version::FUNCTEST_VERSION;

// ============================================================================
// CLI Error handling
// ============================================================================

/// Exit code for CLI operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitCode(pub i32);

impl ExitCode {
    pub const SUCCESS: ExitCode = ExitCode(0);
    pub const FAILURE: ExitCode = ExitCode(1);
}

/// Error type for CLI operations.
///
/// Contains a user-facing message and an exit code. The CLI entry point
/// catches these errors, prints the message, and exits with the code.
#[derive(Debug)]
pub struct CliError {
    /// User-facing error message (already formatted for display)
    pub message: String,
    /// Exit code to return to the shell
    pub exit_code: ExitCode,
}

impl CliError {
    /// Create a new CLI error with a message and exit code.
    pub fn new(message: impl Into<String>, exit_code: ExitCode) -> Self {
        Self {
            message: message.into(),
            exit_code,
        }
    }

    /// Create a failure error (exit code 1).
    pub fn failure(message: impl Into<String>) -> Self {
        Self::new(message, ExitCode::FAILURE)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for CLI operations.
pub type CliResult<T> = Result<T, CliError>;

// ============================================================================
// Clap CLI definition
// ============================================================================

/// Output format for the run transcript
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Banner-style console transcript
    Console,
    /// One JSON document on stdout; child output is captured
    Json,
}

/// Functional tests for the jSMTLIB peticodiac output dialect
#[derive(Parser, Debug)]
#[command(name = "functest")]
#[command(version = FUNCTEST_VERSION)]
#[command(about = "Build the SMT wrapper, run it on every .smt2 test and diff against golden files", long_about = None)]
pub struct Cli {
    /// Directory searched recursively for .smt2 inputs
    #[arg(long, value_name = "DIR", env = "FUNCTEST_TESTS_DIR", default_value = "tests")]
    pub tests_dir: PathBuf,

    /// Build command run before testing (whitespace-separated)
    #[arg(long, value_name = "CMD", env = "FUNCTEST_BUILD_COMMAND", default_value = "./buildRelease")]
    pub build_command: String,

    /// Do not run the build command
    #[arg(
        long,
        env = "FUNCTEST_SKIP_BUILD",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub skip_build: bool,

    /// Program that runs the system under test
    #[arg(long, value_name = "PROGRAM", env = "FUNCTEST_SUT_PROGRAM", default_value = "java")]
    pub sut_program: String,

    /// Leading argument for the system under test (repeatable)
    #[arg(
        long = "sut-arg",
        value_name = "ARG",
        allow_hyphen_values = true,
        default_values = ["-jar", "jSMTLIB.jar"]
    )]
    pub sut_args: Vec<String>,

    /// Solver backend passed as --solver
    #[arg(long, value_name = "NAME", env = "FUNCTEST_SOLVER", default_value = "peticodiac")]
    pub solver: String,

    /// Underlying solver executable passed as --exec
    #[arg(long, value_name = "PATH", env = "FUNCTEST_SOLVER_EXEC", default_value = "yices")]
    pub solver_exec: PathBuf,

    /// Output dialect; the system under test receives --<KIND>out
    #[arg(long, value_name = "KIND", env = "FUNCTEST_OUTPUT_KIND", default_value = "peticodiac")]
    pub output_kind: String,

    /// Directory passed alongside --<KIND>out [default: the tests directory]
    #[arg(long, value_name = "DIR", env = "FUNCTEST_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Comparison utility (whitespace-separated); exit status 0 means identical
    #[arg(long, value_name = "CMD", env = "FUNCTEST_DIFF", default_value = "diff")]
    pub diff_program: String,

    /// Kill any external command running longer than this many seconds
    #[arg(long, value_name = "SECS", env = "FUNCTEST_TIMEOUT", value_parser = clap::value_parser!(u64).range(1..))]
    pub timeout: Option<u64>,

    /// Report format
    #[arg(long, value_enum, env = "FUNCTEST_FORMAT", default_value_t = ReportFormat::Console)]
    pub format: ReportFormat,

    /// Exit with status 0 even when tests fail
    #[arg(
        long,
        env = "FUNCTEST_EXIT_ZERO",
        action = clap::ArgAction::SetTrue,
        value_parser = clap::builder::BoolishValueParser::new()
    )]
    pub exit_zero: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output (per-test timings, debug logging)
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Translate the parsed flags into a harness configuration.
    pub fn to_config(&self) -> CliResult<HarnessConfig> {
        let build = if self.skip_build {
            None
        } else {
            Some(parse_command("--build-command", &self.build_command)?)
        };
        let comparator = parse_command("--diff-program", &self.diff_program)?;
        if self.sut_program.trim().is_empty() {
            return Err(CliError::failure("Error: --sut-program must not be empty"));
        }
        let output_dir = self.output_dir.as_ref().unwrap_or(&self.tests_dir);

        Ok(HarnessConfig::new()
            .with_tests_dir(&self.tests_dir)
            .with_build(build)
            .with_system_under_test(CommandSpec::new(&self.sut_program).with_args(&self.sut_args))
            .with_solver(&self.solver, &self.solver_exec)
            .with_output(&self.output_kind, output_dir)
            .with_comparator(comparator)
            .with_timeout(self.timeout.map(Duration::from_secs)))
    }
}

/// Split a whitespace-separated command line into program and arguments.
fn parse_command(flag: &str, raw: &str) -> CliResult<CommandSpec> {
    let mut words = raw.split_whitespace();
    let Some(program) = words.next() else {
        return Err(CliError::failure(format!("Error: {flag} must not be empty")));
    };
    Ok(CommandSpec::new(program).with_args(words))
}

// ============================================================================
// CLI entry point
// ============================================================================

/// Main CLI entry point.
///
/// This is the only place where `process::exit` is called. All command
/// implementations return `CliResult` and errors are handled here.
pub fn run() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match execute(cli) {
        Ok(exit_code) => {
            if exit_code.0 != 0 {
                process::exit(exit_code.0);
            }
        }
        Err(e) => {
            if !e.message.is_empty() {
                eprintln!("{}", e.message);
            }
            process::exit(e.exit_code.0);
        }
    }
}

/// Structured logging to stderr, filtered by `RUST_LOG`.
///
/// The console transcript is the primary output, so the default level is
/// `warn`; `--verbose` lowers it to `debug`.
fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default)),
        )
        .try_init();
}

/// Execute the harness and map the report onto an exit code.
fn execute(cli: Cli) -> CliResult<ExitCode> {
    let config = cli.to_config()?;
    tracing::debug!(?config, "resolved configuration");

    let (mut reporter, output): (Box<dyn TestReporter>, OutputMode) = match cli.format {
        ReportFormat::Console => {
            let color = !cli.no_color && env::var_os("NO_COLOR").is_none() && std::io::stdout().is_terminal();
            let reporter = ConsoleReporter::stdout(color).with_verbose(cli.verbose);
            (Box::new(reporter), OutputMode::Inherit)
        }
        ReportFormat::Json => (Box::new(JsonReporter::stdout()), OutputMode::Capture),
    };

    let harness = Harness::local(config).with_output_mode(output);
    let report = harness
        .execute(reporter.as_mut())
        .map_err(|e| CliError::failure(format!("Error: {e}")))?;

    exit_status(&report, cli.exit_zero)
}

/// Exit code for a finished run.
fn exit_status(report: &Report, exit_zero: bool) -> CliResult<ExitCode> {
    if report.all_passed() || exit_zero {
        Ok(ExitCode::SUCCESS)
    } else {
        // Summary already printed
        Err(CliError::new("", ExitCode::FAILURE))
    }
}

// ============================================================================
// Tests
// ============================================================================
