//! Maps runner-native steps into canonical structured events.

use crate::events::{
    ActionCategory, ActionCommand, ActionError, ActionEventData, TestCase, TestEvents,
    TestResultRecord, TestStatus, TestStep, UserActionEvent,
};

/// Marker line that introduces the runner's call log inside an error
/// message; everything from this line on is noise for replay purposes.
const CALL_LOG_MARKER: &str = "Call log:";

/// Maximum number of error-message lines kept when no marker is found
/// (or the marker sits beyond this many lines).
const MAX_ERROR_LINES: usize = 10;

/// Maps one test's steps and outcome into a canonical result record.
///
/// Returns `None` for skipped tests: they produce no record at all.
#[must_use]
pub fn map_test(test: &TestCase, steps: &[TestStep]) -> Option<TestResultRecord> {
    if test.status == TestStatus::Skipped {
        return None;
    }

    let mut events = TestEvents::default();
    for (index, step) in steps.iter().enumerate() {
        let error = extract_error_message(step).map(|message| ActionError {
            name: "AssertionError".to_string(),
            message,
            line: step.location.map(|l| l.line),
            column: step.location.map(|l| l.column),
        });
        let event = UserActionEvent {
            data: ActionEventData {
                id: index.to_string(),
                parent_id: None,
                command: ActionCommand { name: step.title.clone(), arguments: Vec::new() },
                scope: step.title_path.clone(),
                error,
                category: map_category(&step.category),
            },
        };
        match hook_bucket(step) {
            Some(Hook::BeforeEach) => events.before_each.push(event),
            Some(Hook::AfterEach) => events.after_each.push(event),
            None => events.main.push(event),
        }
    }

    // The record's top-level error comes from the first step carrying one.
    let error_step = steps.iter().find(|step| step.error.is_some());
    let error = error_step.and_then(|step| {
        extract_error_message(step).map(|message| ActionError {
            name: "Error".to_string(),
            message,
            line: step.location.map(|l| l.line),
            column: step.location.map(|l| l.column),
        })
    });

    Some(TestResultRecord {
        id: 0,
        attempt: 1,
        approximate_duration: test.results.iter().map(|r| r.duration_ms).sum(),
        source: test.source(),
        result: test.status,
        error,
        events,
    })
}

/// The per-test hook bucket a step belongs to, if any.
enum Hook {
    BeforeEach,
    AfterEach,
}

fn hook_bucket(step: &TestStep) -> Option<Hook> {
    if step.category != "hook" {
        return None;
    }
    match step.title.as_str() {
        "Before Hooks" => Some(Hook::BeforeEach),
        "After Hooks" => Some(Hook::AfterEach),
        _ => None,
    }
}

fn map_category(category: &str) -> ActionCategory {
    match category {
        "expect" => ActionCategory::Assertion,
        "step" => ActionCategory::Command,
        c if c.ends_with(":api") => ActionCategory::Command,
        _ => ActionCategory::Other,
    }
}

/// Extracts and truncates a step's error message.
///
/// The message is stripped of terminal escape codes and cut at the
/// `Call log:` marker; without a marker (or with one beyond line 10)
/// at most 10 lines are kept.
#[must_use]
pub fn extract_error_message(step: &TestStep) -> Option<String> {
    let message = strip_ansi_codes(&step.error.as_ref()?.message);
    let lines: Vec<&str> = message.split('\n').collect();
    let cut = lines
        .iter()
        .position(|line| line.starts_with(CALL_LOG_MARKER))
        .map_or(MAX_ERROR_LINES, |marker| marker.min(MAX_ERROR_LINES));
    Some(lines[..cut.min(lines.len())].join("\n"))
}

/// Removes ANSI CSI escape sequences (colors, styles) from a string.
#[must_use]
pub fn strip_ansi_codes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\u{1b}' && chars.peek() == Some(&'[') {
            chars.next();
            // Skip parameter bytes up to and including the final byte.
            while let Some(&next) = chars.peek() {
                chars.next();
                if next.is_ascii_alphabetic() {
                    break;
                }
            }
        } else {
            out.push(c);
        }
    }
    out
}
