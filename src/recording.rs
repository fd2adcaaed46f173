//! Recording entries and the status state machine.

use std::fmt;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Lifecycle status of a recording.
///
/// A recording is created by the runtime (`Unknown` until its first
/// write event arrives), moves through the write states as the runtime
/// flushes it to disk, and through the upload states as the pipeline
/// transmits it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum RecordingStatus {
    /// Written to disk and eligible for upload.
    OnDisk,
    /// Created but no write event observed yet.
    Unknown,
    /// Successfully transmitted to the remote service.
    Uploaded,
    /// The runtime crashed while producing the recording.
    Crashed,
    /// The runtime is writing the recording to disk.
    StartedWrite,
    /// An upload is in flight.
    StartedUpload,
    /// Crash diagnostics were transmitted to the remote service.
    CrashUploaded,
    /// The recording can never be uploaded; see `unusable_reason`.
    Unusable,
}

impl RecordingStatus {
    /// The wire/journal representation of this status.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            RecordingStatus::OnDisk => "onDisk",
            RecordingStatus::Unknown => "unknown",
            RecordingStatus::Uploaded => "uploaded",
            RecordingStatus::Crashed => "crashed",
            RecordingStatus::StartedWrite => "startedWrite",
            RecordingStatus::StartedUpload => "startedUpload",
            RecordingStatus::CrashUploaded => "crashUploaded",
            RecordingStatus::Unusable => "unusable",
        }
    }

    /// Whether a write or upload is currently in flight.
    #[must_use]
    pub fn is_in_progress(self) -> bool {
        matches!(self, RecordingStatus::StartedWrite | RecordingStatus::StartedUpload)
    }

    /// Whether the status change `self -> to` is permitted.
    ///
    /// `Uploaded`, `CrashUploaded`, and `Unusable` are terminal for the
    /// upload dimension; entries holding them can still be removed.
    #[must_use]
    pub fn can_transition_to(self, to: RecordingStatus) -> bool {
        use RecordingStatus::{
            CrashUploaded, Crashed, OnDisk, StartedUpload, StartedWrite, Unknown, Unusable,
            Uploaded,
        };
        matches!(
            (self, to),
            (OnDisk, StartedUpload)
                | (Unknown, StartedWrite | StartedUpload)
                | (StartedWrite, OnDisk | Crashed)
                | (StartedUpload, Uploaded | CrashUploaded | Unusable | OnDisk)
                | (Crashed, StartedUpload)
        )
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A reference from a sourcemap back to one of its original sources.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OriginalSourceEntry {
    /// Path of the original source file.
    pub path: String,
    /// Byte offset of this source within its parent sourcemap.
    pub parent_offset: u64,
}

/// A sourcemap attached to a recording.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMapEntry {
    /// Opaque sourcemap identifier.
    pub id: String,
    /// On-disk path of the sourcemap file.
    pub path: String,
    /// Base URL the generated code was served from.
    #[serde(rename = "baseURL")]
    pub base_url: String,
    /// Hash of the generated file's content, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_content_hash: Option<String>,
    /// Hash of the generated file's URL, when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(rename = "targetURLHash")]
    pub target_url_hash: Option<String>,
    /// Hash of the sourcemap URL.
    #[serde(rename = "targetMapURLHash")]
    pub target_map_url_hash: String,
    /// Original sources referenced by this sourcemap, in order.
    #[serde(default)]
    pub original_sources: Vec<OriginalSourceEntry>,
}

/// One recording known to the registry.
///
/// Invariants maintained by the registry:
/// - `recording_id` is set iff `status` is `Uploaded` or `CrashUploaded`;
/// - `unusable_reason` is set iff `status` is `Unusable`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingEntry {
    /// Opaque identifier assigned by the recording runtime.
    pub id: String,
    /// When the runtime created the recording.
    pub create_time: DateTime<Utc>,
    /// Tag identifying the producing runtime/browser.
    pub runtime: String,
    /// Open key/value metadata merged from reporter, CLI, and runners.
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Sourcemaps attached to the recording, in order of registration.
    #[serde(default)]
    pub sourcemaps: Vec<SourceMapEntry>,
    /// Current lifecycle status.
    pub status: RecordingStatus,
    /// On-disk path of the recording artifact, once the write started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
    /// Server the entry was (or is being) uploaded to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
    /// Remote-assigned id, present once uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
    /// Build identifier of the producing runtime.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub build_id: Option<String>,
    /// Crash diagnostic payloads, present for crashed recordings.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub crash_data: Vec<Value>,
    /// Why the recording can never be uploaded, when `Unusable`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unusable_reason: Option<String>,
}

impl RecordingEntry {
    /// Creates a fresh entry as the runtime's `createRecording` event would.
    #[must_use]
    pub fn new(id: impl Into<String>, create_time: DateTime<Utc>, runtime: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            create_time,
            runtime: runtime.into(),
            metadata: Map::new(),
            sourcemaps: Vec::new(),
            status: RecordingStatus::Unknown,
            path: None,
            server: None,
            recording_id: None,
            build_id: None,
            crash_data: Vec::new(),
            unusable_reason: None,
        }
    }

    /// The external view of this entry, as emitted by `ls --json`.
    ///
    /// Build id and crash diagnostics are internal and withheld.
    #[must_use]
    pub fn to_external_json(&self) -> Value {
        let mut value = serde_json::to_value(self).unwrap_or(Value::Null);
        if let Value::Object(map) = &mut value {
            map.remove("buildId");
            map.remove("crashData");
        }
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_journal_strings() {
        for status in [
            RecordingStatus::OnDisk,
            RecordingStatus::Unknown,
            RecordingStatus::Uploaded,
            RecordingStatus::Crashed,
            RecordingStatus::StartedWrite,
            RecordingStatus::StartedUpload,
            RecordingStatus::CrashUploaded,
            RecordingStatus::Unusable,
        ] {
            let json = serde_json::to_string(&status).unwrap();
            assert_eq!(json, format!("\"{}\"", status.as_str()));
            let back: RecordingStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(back, status);
        }
    }

    #[test]
    fn transition_table_allows_the_documented_edges() {
        use RecordingStatus::{
            CrashUploaded, Crashed, OnDisk, StartedUpload, StartedWrite, Unknown, Unusable,
            Uploaded,
        };
        assert!(OnDisk.can_transition_to(StartedUpload));
        assert!(Unknown.can_transition_to(StartedWrite));
        assert!(Unknown.can_transition_to(StartedUpload));
        assert!(StartedWrite.can_transition_to(OnDisk));
        assert!(StartedWrite.can_transition_to(Crashed));
        assert!(StartedUpload.can_transition_to(Uploaded));
        assert!(StartedUpload.can_transition_to(CrashUploaded));
        assert!(StartedUpload.can_transition_to(Unusable));
        assert!(StartedUpload.can_transition_to(OnDisk));
        assert!(Crashed.can_transition_to(StartedUpload));
    }

    #[test]
    fn transition_table_rejects_everything_else() {
        use RecordingStatus::{CrashUploaded, Crashed, OnDisk, Unusable, Uploaded};
        assert!(!Uploaded.can_transition_to(OnDisk));
        assert!(!CrashUploaded.can_transition_to(Crashed));
        assert!(!Unusable.can_transition_to(OnDisk));
        assert!(!OnDisk.can_transition_to(Uploaded));
        assert!(!OnDisk.can_transition_to(OnDisk));
        assert!(!Crashed.can_transition_to(CrashUploaded));
    }

    #[test]
    fn external_json_withholds_internal_fields() {
        let mut entry = RecordingEntry::new("r1", Utc::now(), "chromium");
        entry.build_id = Some("build-1".into());
        entry.crash_data.push(serde_json::json!({"signal": 11}));
        let external = entry.to_external_json();
        assert!(external.get("buildId").is_none());
        assert!(external.get("crashData").is_none());
        assert_eq!(external["id"], "r1");
        assert_eq!(external["status"], "unknown");
    }
}
