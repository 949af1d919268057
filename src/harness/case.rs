//! Test cases and their discovery
//!
//! A test case is a single `.smt2` input. The produced and golden outputs live
//! next to it and are named by appending fixed suffixes to the input path:
//!
//! ```text
//! tests/a.smt2                        input
//! tests/a.smt2.peticodiac             written by the system under test
//! tests/a.smt2.peticodiac.expected    golden file, checked in
//! ```

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};

use serde::Serialize;
use walkdir::WalkDir;

use super::config::{ACTUAL_SUFFIX, EXPECTED_SUFFIX, INPUT_SUFFIX};
use super::error::{HarnessError, HarnessResult};

/// A discovered test input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    path: PathBuf,
    id: String,
}

impl TestCase {
    /// Build a case for `path`, identified relative to the discovery `root`.
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let id = path
            .strip_prefix(root)
            .unwrap_or(path.as_path())
            .to_string_lossy()
            .into_owned();
        Self { path, id }
    }

    pub fn input_path(&self) -> &Path {
        &self.path
    }

    /// Identifier used in console lines and the failed-test list.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn actual_output_path(&self) -> PathBuf {
        append_suffix(&self.path, ACTUAL_SUFFIX)
    }

    pub fn expected_output_path(&self) -> PathBuf {
        append_suffix(&self.actual_output_path(), EXPECTED_SUFFIX)
    }
}

fn append_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = path.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Outcome of running a single test case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TestRunResult {
    Passed,
    Failed,
}

impl TestRunResult {
    pub fn is_failed(self) -> bool {
        matches!(self, TestRunResult::Failed)
    }
}

/// Matches on the raw file name, so inputs whose names are not valid UTF-8
/// are still selected.
fn is_test_input(name: &OsStr) -> bool {
    name.as_encoded_bytes().ends_with(INPUT_SUFFIX.as_bytes())
}

/// Discover test inputs below `root`.
///
/// Entries are sorted by file name at every directory level, so the returned
/// order is the lexicographic path order and stable across runs. Each call
/// walks the filesystem again.
#[tracing::instrument(skip_all, fields(root = %root.display()))]
pub fn discover(root: &Path) -> HarnessResult<Vec<TestCase>> {
    if !root.is_dir() {
        return Err(HarnessError::TestsDirNotFound(root.to_path_buf()));
    }

    let mut cases = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!("skipping unreadable entry: {}", e);
                continue;
            }
        };

        if !entry.path().is_file() {
            continue;
        }
        if is_test_input(entry.file_name()) {
            cases.push(TestCase::new(root, entry.into_path()));
        }
    }

    tracing::debug!(count = cases.len(), "discovered test cases");
    Ok(cases)
}
