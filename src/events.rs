//! Event model: runner-boundary input types and the canonical structured
//! events persisted to metadata files.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A source position reported by the test runner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number.
    pub column: u32,
}

/// An error attached to a runner step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepError {
    /// Raw error message, possibly containing terminal escape codes.
    pub message: String,
}

/// One atomic action or assertion reported by the test runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestStep {
    /// Step title; runners may omit it.
    #[serde(default)]
    pub title: String,
    /// Runner-native category tag (e.g. `expect`, `step`, `hook`, `pw:api`).
    pub category: String,
    /// Where the step occurred in the test source, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<SourceLocation>,
    /// Error attached to the step, if it failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<StepError>,
    /// Nested title path at the point the step occurred.
    #[serde(default)]
    pub title_path: Vec<String>,
}

/// One execution attempt of a test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestAttempt {
    /// Wall-clock duration of the attempt in milliseconds.
    pub duration_ms: u64,
}

/// Overall test outcome, in the runner's vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TestStatus {
    /// The test passed.
    Passed,
    /// The test failed.
    Failed,
    /// The test exceeded its time budget.
    TimedOut,
    /// The run was interrupted before the test finished.
    Interrupted,
    /// The test was skipped; skipped tests produce no records.
    Skipped,
}

/// A test case as reported by the runner at `testEnd`.
///
/// `title_path` follows the runner's convention: root, project, spec
/// file, enclosing suites, and finally the test title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestCase {
    /// Test title.
    pub title: String,
    /// Full nested title path, including the title itself.
    pub title_path: Vec<String>,
    /// Absolute path of the test's source file.
    pub file: PathBuf,
    /// All execution attempts, retries included.
    pub results: Vec<TestAttempt>,
    /// Overall outcome.
    pub status: TestStatus,
}

impl TestCase {
    /// The `{title, scope}` source descriptor for result records.
    ///
    /// Scope is the nested title path with the root, project, and file
    /// segments stripped from the front and the title from the back.
    #[must_use]
    pub fn source(&self) -> TestSource {
        let scope = if self.title_path.len() > 4 {
            self.title_path[3..self.title_path.len() - 1].to_vec()
        } else {
            Vec::new()
        };
        TestSource { title: self.title.clone(), scope }
    }

    /// The spec-file path relative to the test root, used to key
    /// embedded sources and the `specFile` field.
    #[must_use]
    pub fn spec_relative_path(&self) -> String {
        self.title_path
            .get(2)
            .cloned()
            .unwrap_or_else(|| self.file.to_string_lossy().into_owned())
    }
}

/// Category of a canonical user action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionCategory {
    /// An expectation/assertion.
    Assertion,
    /// A user-visible command or API call.
    Command,
    /// Anything else the runner reported.
    Other,
}

/// The command a canonical action performed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionCommand {
    /// Command name; empty when the runner step carried no title.
    pub name: String,
    /// Command arguments. Always empty: argument values are not
    /// serialized at this level.
    pub arguments: Vec<Value>,
}

/// A structured error carried by a canonical action or result record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionError {
    /// Error class name.
    pub name: String,
    /// Truncated, escape-free message.
    pub message: String,
    /// Source line, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<u32>,
    /// Source column, when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub column: Option<u32>,
}

/// Payload of a canonical user action event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionEventData {
    /// Position of the step within its test, rendered as a string.
    /// Stable only within one test's step list.
    pub id: String,
    /// Enclosing step id; a relation only, never an ownership edge.
    pub parent_id: Option<String>,
    /// The action taken.
    pub command: ActionCommand,
    /// Nested title path at the point the step occurred.
    pub scope: Vec<String>,
    /// Error attached to the step, if any.
    pub error: Option<ActionError>,
    /// Canonical category.
    pub category: ActionCategory,
}

/// A canonical user action event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserActionEvent {
    /// Event payload.
    pub data: ActionEventData,
}

/// Ordered event buckets for one test.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestEvents {
    /// Suite-level before hooks (unused by the current mapper).
    pub before_all: Vec<UserActionEvent>,
    /// Suite-level after hooks (unused by the current mapper).
    pub after_all: Vec<UserActionEvent>,
    /// Per-test before hooks.
    pub before_each: Vec<UserActionEvent>,
    /// Per-test after hooks.
    pub after_each: Vec<UserActionEvent>,
    /// Test-body steps in emission order.
    pub main: Vec<UserActionEvent>,
}

/// Identifies a test by title and enclosing suite titles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TestSource {
    /// Test title.
    pub title: String,
    /// Enclosing suite titles, outermost first.
    pub scope: Vec<String>,
}

/// The canonical record produced for one non-skipped test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResultRecord {
    /// Index of the test within the reported batch.
    pub id: u32,
    /// 1-based retry count.
    pub attempt: u32,
    /// Sum of all attempt durations in milliseconds.
    pub approximate_duration: u64,
    /// Title and scope of the test.
    pub source: TestSource,
    /// Overall outcome. Never `Skipped`: skipped tests are not recorded.
    pub result: TestStatus,
    /// First step error found, if any.
    pub error: Option<ActionError>,
    /// Structured events bucketed by phase.
    pub events: TestEvents,
}

/// One durable record appended to a worker's metadata file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestRunRecord {
    /// Result records for the tests in this append (currently one).
    pub tests: Vec<TestResultRecord>,
    /// Spec-file path relative to the test root.
    pub spec_file: String,
    /// Display title for the recording.
    pub replay_title: String,
    /// Extra metadata (embedded sources, session metadata), if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra_metadata: Option<Map<String, Value>>,
}
