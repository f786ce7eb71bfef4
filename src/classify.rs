//! Folds a finished execution into a leaf result.

use std::time::Duration;

use crate::engine::{Document, EngineError, OutcomeClass, TransformEngine};
use crate::results::TestResults;

/// Classify a successfully produced result document.
///
/// Counts come from the engine's declarative outcome queries. A document
/// with zero recognizable outcome elements yields an all-zero leaf; the
/// execution itself succeeded, so `errors` stays zero. A failing query is
/// returned to the caller, which treats it like any other execution error.
pub fn from_report(
    name: &str,
    doc: &dyn Document,
    engine: &dyn TransformEngine,
    duration: Duration,
) -> Result<TestResults, EngineError> {
    let pending = engine.count(doc, OutcomeClass::Pending)?;
    let passed = engine.count(doc, OutcomeClass::Successful)?;
    let failed = engine.count(doc, OutcomeClass::Failed)?;
    Ok(TestResults::leaf(name, pending, passed, failed, 0, duration))
}

/// Classify a failed execution. The error text itself belongs in the
/// per-test log, not in the result.
pub fn from_error(name: &str, duration: Duration) -> TestResults {
    TestResults::leaf(name, 0, 0, 0, 1, duration)
}
