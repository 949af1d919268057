//! Run report accumulator

use serde::Serialize;

use super::case::{TestCase, TestRunResult};

/// Aggregate outcome of one harness run.
///
/// Owned by the run loop and fed one result per discovered case, so
/// `failed == failed_tests.len()` and `failed <= total` always hold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    total: usize,
    failed: usize,
    failed_tests: Vec<String>,
}

impl Report {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, case: &TestCase, result: TestRunResult) {
        self.total += 1;
        if result.is_failed() {
            self.failed += 1;
            self.failed_tests.push(case.id().to_string());
        }
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn passed(&self) -> usize {
        self.total - self.failed
    }

    /// Identifiers of failed cases, in discovery order.
    pub fn failed_tests(&self) -> &[String] {
        &self.failed_tests
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
