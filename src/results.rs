//! The immutable test-results tree and its accumulator.
//!
//! A [`TestResults`] value is either a leaf (one test's classified outcome)
//! or an aggregate whose counts are the sums over its sub-results. Values
//! never change after construction; batches are accumulated through
//! [`TestResultsBuilder`], whose `build` takes a defensive snapshot so a
//! returned tree is immune to later builder mutation.

use std::fmt;
use std::time::Duration;

/// Outcome of one test, or the aggregate over a batch of tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResults {
    name: String,
    pending: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    duration: Duration,
    sub_results: Vec<TestResults>,
}

impl TestResults {
    /// A leaf result, as produced by classification.
    pub(crate) fn leaf(
        name: impl Into<String>,
        pending: usize,
        passed: usize,
        failed: usize,
        errors: usize,
        duration: Duration,
    ) -> Self {
        Self {
            name: name.into(),
            pending,
            passed,
            failed,
            errors,
            duration,
            sub_results: Vec::new(),
        }
    }

    /// Test name, or the batch identifier for an aggregate (empty by default).
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn passed(&self) -> usize {
        self.passed
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    /// Execution-level errors (compilation or run failures), never
    /// assertion failures.
    pub fn errors(&self) -> usize {
        self.errors
    }

    /// Elapsed wall-clock time; for aggregates, the sum over sub-results.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Per-test results in execution order. Empty for a leaf.
    pub fn sub_results(&self) -> &[TestResults] {
        &self.sub_results
    }

    /// Total number of leaf outcomes.
    pub fn total(&self) -> usize {
        self.pending + self.passed + self.failed + self.errors
    }

    pub fn has_failures(&self) -> bool {
        self.failed > 0 || self.errors > 0
    }
}

impl fmt::Display for TestResults {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tests run: {}, Failures: {}, Errors: {}, Pending: {}, Time elapsed: {:.3} s",
            self.total(),
            self.failed,
            self.errors,
            self.pending,
            self.duration.as_secs_f64()
        )
    }
}

/// Mutable accumulator for building a [`TestResults`] tree.
#[derive(Debug)]
pub struct TestResultsBuilder {
    name: String,
    pending: usize,
    passed: usize,
    failed: usize,
    errors: usize,
    duration: Duration,
    sub_results: Vec<TestResults>,
}

impl TestResultsBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            pending: 0,
            passed: 0,
            failed: 0,
            errors: 0,
            duration: Duration::ZERO,
            sub_results: Vec::new(),
        }
    }

    /// Append `child` and fold its counts into the running totals.
    /// Insertion order is report order.
    pub fn add_sub_results(&mut self, child: TestResults) {
        self.pending += child.pending;
        self.passed += child.passed;
        self.failed += child.failed;
        self.errors += child.errors;
        self.duration += child.duration;
        self.sub_results.push(child);
    }

    /// Snapshot everything accumulated so far.
    pub fn build(&self) -> TestResults {
        TestResults {
            name: self.name.clone(),
            pending: self.pending,
            passed: self.passed,
            failed: self.failed,
            errors: self.errors,
            duration: self.duration,
            sub_results: self.sub_results.clone(),
        }
    }
}
