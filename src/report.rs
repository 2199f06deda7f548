//! Test runner reports
//!
//! The test harness writes a pytest-json-report style document. Only the
//! per-test outcome and failure message are kept, as [`TestResult`]s.

use serde::Deserialize;
use thiserror::Error;

/// Errors that can occur when reading a test report
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to read test report: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse test report JSON: {0}")]
    ParseError(#[from] serde_json::Error),
}

/// Outcome of a single test
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Result of a single test
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestResult {
    pub name: String,
    pub outcome: TestOutcome,
    pub message: Option<String>,
}

#[derive(Deserialize)]
struct JsonReport {
    #[serde(default)]
    tests: Vec<JsonTest>,
}

#[derive(Deserialize)]
struct JsonTest {
    nodeid: String,
    outcome: String,
    setup: Option<JsonStage>,
    call: Option<JsonStage>,
}

#[derive(Deserialize)]
struct JsonStage {
    crash: Option<JsonCrash>,
    longrepr: Option<String>,
}

#[derive(Deserialize)]
struct JsonCrash {
    message: String,
}

impl JsonStage {
    fn message(&self) -> Option<String> {
        self.crash
            .as_ref()
            .map(|c| c.message.clone())
            .or_else(|| self.longrepr.clone())
    }
}

/// Parse a JSON test report
pub fn parse_report(content: &str) -> Result<Vec<TestResult>, ReportError> {
    let report: JsonReport = serde_json::from_str(content)?;
    Ok(report.tests.into_iter().map(TestResult::from).collect())
}

/// Read and parse a JSON test report file
pub fn load_report(path: &std::path::Path) -> Result<Vec<TestResult>, ReportError> {
    let content = std::fs::read_to_string(path)?;
    parse_report(&content)
}

impl From<JsonTest> for TestResult {
    fn from(test: JsonTest) -> Self {
        let name = test
            .nodeid
            .rsplit("::")
            .next()
            .unwrap_or(&test.nodeid)
            .to_string();

        let outcome = match test.outcome.as_str() {
            "passed" | "xpassed" => TestOutcome::Passed,
            _ => TestOutcome::Failed,
        };

        let message = match outcome {
            TestOutcome::Passed => None,
            TestOutcome::Failed => test
                .call
                .as_ref()
                .and_then(JsonStage::message)
                .or_else(|| test.setup.as_ref().and_then(JsonStage::message))
                .or(Some(test.outcome)),
        };

        TestResult {
            name,
            outcome,
            message,
        }
    }
}

/// Render results as prompt text, one line per test
pub fn format_test_results(results: &[TestResult]) -> String {
    results
        .iter()
        .map(|r| match (&r.outcome, &r.message) {
            (TestOutcome::Passed, _) => format!("{}: passed", r.name),
            (TestOutcome::Failed, Some(msg)) => format!("{}: failed - {}", r.name, msg.trim()),
            (TestOutcome::Failed, None) => format!("{}: failed", r.name),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const REPORT: &str = r#"{
        "created": 1700000000.0,
        "summary": {"passed": 1, "failed": 2, "total": 3},
        "tests": [
            {"nodeid": "test_sol.py::test_empty", "outcome": "passed",
             "call": {"outcome": "passed"}},
            {"nodeid": "test_sol.py::test_sum", "outcome": "failed",
             "call": {"outcome": "failed", "crash": {"path": "x", "lineno": 3, "message": "AssertionError: 3 != 4"},
                      "longrepr": "long text"}},
            {"nodeid": "test_sol.py::test_import", "outcome": "error",
             "setup": {"outcome": "failed", "longrepr": "ModuleNotFoundError"}}
        ]
    }"#;

    #[test]
    fn test_parse_report() {
        let results = parse_report(REPORT).unwrap();
        assert_eq!(
            results,
            vec![
                TestResult {
                    name: "test_empty".to_string(),
                    outcome: TestOutcome::Passed,
                    message: None,
                },
                TestResult {
                    name: "test_sum".to_string(),
                    outcome: TestOutcome::Failed,
                    message: Some("AssertionError: 3 != 4".to_string()),
                },
                TestResult {
                    name: "test_import".to_string(),
                    outcome: TestOutcome::Failed,
                    message: Some("ModuleNotFoundError".to_string()),
                },
            ]
        );
    }

    #[test]
    fn test_format_results() {
        let results = parse_report(REPORT).unwrap();
        assert_eq!(
            format_test_results(&results),
            "test_empty: passed\ntest_sum: failed - AssertionError: 3 != 4\ntest_import: failed - ModuleNotFoundError"
        );
    }

    #[test]
    fn test_failure_without_details_uses_outcome() {
        let results =
            parse_report(r#"{"tests": [{"nodeid": "t::x", "outcome": "skipped"}]}"#).unwrap();
        assert_eq!(results[0].message.as_deref(), Some("skipped"));
    }

    #[test]
    fn test_empty_report() {
        assert!(parse_report("{}").unwrap().is_empty());
    }
}
