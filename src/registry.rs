//! Recording registry: folds the on-disk journal into entries and
//! enforces the status state machine.
//!
//! The recording runtime appends lifecycle events to
//! `<directory>/recordings.log`, one JSON object per line. This crate
//! appends its own upload-side events to the same journal, so a
//! process interrupted mid-upload leaves the affected entry in its
//! last-written status and a later attempt can safely resume.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::metadata::{append_json_line, write_atomic};
use crate::recording::{OriginalSourceEntry, RecordingEntry, RecordingStatus, SourceMapEntry};

/// File name of the lifecycle journal inside the recording directory.
pub const JOURNAL_FILE: &str = "recordings.log";

/// One line of the lifecycle journal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
enum JournalEvent {
    CreateRecording {
        id: String,
        timestamp: DateTime<Utc>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        build_id: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        runtime: Option<String>,
    },
    AddMetadata {
        id: String,
        metadata: Map<String, Value>,
    },
    AddSourcemap {
        id: String,
        sourcemap: SourceMapEntry,
    },
    AddOriginalSource {
        id: String,
        sourcemap_id: String,
        path: String,
        parent_offset: u64,
    },
    WriteStarted {
        id: String,
        path: PathBuf,
    },
    WriteFinished {
        id: String,
    },
    Crashed {
        id: String,
    },
    CrashData {
        id: String,
        data: Value,
    },
    UploadStarted {
        id: String,
        server: String,
    },
    UploadFinished {
        id: String,
        recording_id: String,
    },
    CrashUploaded {
        id: String,
        recording_id: String,
    },
    Unusable {
        id: String,
        reason: String,
    },
    UploadFailed {
        id: String,
    },
}

impl JournalEvent {
    fn id(&self) -> &str {
        match self {
            JournalEvent::CreateRecording { id, .. }
            | JournalEvent::AddMetadata { id, .. }
            | JournalEvent::AddSourcemap { id, .. }
            | JournalEvent::AddOriginalSource { id, .. }
            | JournalEvent::WriteStarted { id, .. }
            | JournalEvent::WriteFinished { id }
            | JournalEvent::Crashed { id }
            | JournalEvent::CrashData { id, .. }
            | JournalEvent::UploadStarted { id, .. }
            | JournalEvent::UploadFinished { id, .. }
            | JournalEvent::CrashUploaded { id, .. }
            | JournalEvent::Unusable { id, .. }
            | JournalEvent::UploadFailed { id } => id,
        }
    }
}

/// Data accompanying a status transition.
#[derive(Debug, Clone, Default)]
pub struct StatusExtra {
    /// Remote-assigned id; required for `Uploaded`/`CrashUploaded`.
    pub recording_id: Option<String>,
    /// Upload target; used for `StartedUpload`.
    pub server: Option<String>,
    /// Explanation; required for `Unusable`.
    pub reason: Option<String>,
    /// Artifact path; used for `StartedWrite`.
    pub path: Option<PathBuf>,
}

impl StatusExtra {
    /// Extra carrying only a remote recording id.
    #[must_use]
    pub fn recording_id(id: impl Into<String>) -> Self {
        Self { recording_id: Some(id.into()), ..Self::default() }
    }

    /// Extra carrying only an upload server.
    #[must_use]
    pub fn server(server: impl Into<String>) -> Self {
        Self { server: Some(server.into()), ..Self::default() }
    }
}

/// In-memory model of every recording under one directory.
#[derive(Debug)]
pub struct RecordingRegistry {
    directory: PathBuf,
    entries: Vec<RecordingEntry>,
}

impl RecordingRegistry {
    /// Opens the registry for the configured recording directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryIo`] when the directory or journal
    /// exists but cannot be read. A missing journal yields an empty
    /// registry; malformed journal lines are skipped with a warning
    /// (the journal is written by an external runtime).
    pub fn open(config: &Config) -> Result<Self> {
        Self::open_directory(&config.directory)
    }

    /// Opens the registry rooted at an explicit directory.
    ///
    /// # Errors
    ///
    /// See [`RecordingRegistry::open`].
    pub fn open_directory(directory: &Path) -> Result<Self> {
        let mut registry =
            Self { directory: directory.to_path_buf(), entries: Vec::new() };
        let journal = registry.journal_path();
        let contents = match fs::read_to_string(&journal) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %journal.display(), "no journal; registry is empty");
                return Ok(registry);
            }
            Err(e) => return Err(Error::registry_io(journal, e)),
        };
        for (number, line) in contents.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<JournalEvent>(line) {
                Ok(event) => registry.apply(&event),
                Err(e) => {
                    warn!(line = number + 1, error = %e, "skipping malformed journal line");
                }
            }
        }
        Ok(registry)
    }

    fn journal_path(&self) -> PathBuf {
        self.directory.join(JOURNAL_FILE)
    }

    /// Folds one journal event into the in-memory entries.
    ///
    /// Status changes arriving from the journal are applied as
    /// observations, not validated transitions: the journal is the
    /// runtime's account of what actually happened.
    fn apply(&mut self, event: &JournalEvent) {
        if let JournalEvent::CreateRecording { id, timestamp, build_id, runtime } = event {
            let mut entry =
                RecordingEntry::new(id.clone(), *timestamp, runtime.clone().unwrap_or_default());
            entry.build_id = build_id.clone();
            self.entries.push(entry);
            return;
        }

        let Some(entry) = self.entries.iter_mut().find(|e| e.id == event.id()) else {
            warn!(id = event.id(), "journal event for unknown recording");
            return;
        };
        match event {
            JournalEvent::CreateRecording { .. } => unreachable!("handled above"),
            JournalEvent::AddMetadata { metadata, .. } => {
                deep_merge(&mut entry.metadata, metadata);
            }
            JournalEvent::AddSourcemap { sourcemap, .. } => {
                entry.sourcemaps.push(sourcemap.clone());
            }
            JournalEvent::AddOriginalSource { sourcemap_id, path, parent_offset, .. } => {
                if let Some(map) = entry.sourcemaps.iter_mut().find(|m| m.id == *sourcemap_id) {
                    map.original_sources.push(OriginalSourceEntry {
                        path: path.clone(),
                        parent_offset: *parent_offset,
                    });
                } else {
                    warn!(sourcemap = %sourcemap_id, "original source for unknown sourcemap");
                }
            }
            JournalEvent::WriteStarted { path, .. } => {
                entry.status = RecordingStatus::StartedWrite;
                entry.path = Some(path.clone());
            }
            JournalEvent::WriteFinished { .. } => entry.status = RecordingStatus::OnDisk,
            JournalEvent::Crashed { .. } => entry.status = RecordingStatus::Crashed,
            JournalEvent::CrashData { data, .. } => entry.crash_data.push(data.clone()),
            JournalEvent::UploadStarted { server, .. } => {
                entry.status = RecordingStatus::StartedUpload;
                entry.server = Some(server.clone());
            }
            JournalEvent::UploadFinished { recording_id, .. } => {
                entry.status = RecordingStatus::Uploaded;
                entry.recording_id = Some(recording_id.clone());
            }
            JournalEvent::CrashUploaded { recording_id, .. } => {
                entry.status = RecordingStatus::CrashUploaded;
                entry.recording_id = Some(recording_id.clone());
            }
            JournalEvent::Unusable { reason, .. } => {
                entry.status = RecordingStatus::Unusable;
                entry.unusable_reason = Some(reason.clone());
            }
            JournalEvent::UploadFailed { .. } => {
                entry.status = RecordingStatus::OnDisk;
                entry.recording_id = None;
            }
        }
    }

    /// Appends an event to the journal and folds it into memory.
    fn commit(&mut self, event: JournalEvent) -> Result<()> {
        append_json_line(&self.journal_path(), &serde_json::to_value(&event)?)?;
        self.apply(&event);
        Ok(())
    }

    /// Looks up one entry by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&RecordingEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// The most recently created entry, if any.
    #[must_use]
    pub fn latest(&self) -> Option<&RecordingEntry> {
        self.entries.iter().max_by_key(|e| e.create_time)
    }

    /// Lists entries ordered by creation time.
    ///
    /// `filter` is a case-insensitive substring match against the entry
    /// id, status, and metadata. Entries with a write or upload in
    /// flight are excluded unless `include_in_progress` is set.
    #[must_use]
    pub fn list(&self, filter: Option<&str>, include_in_progress: bool) -> Vec<&RecordingEntry> {
        let needle = filter.map(str::to_lowercase);
        let mut selected: Vec<&RecordingEntry> = self
            .entries
            .iter()
            .filter(|entry| include_in_progress || !entry.status.is_in_progress())
            .filter(|entry| needle.as_deref().is_none_or(|needle| matches_filter(entry, needle)))
            .collect();
        selected.sort_by_key(|entry| entry.create_time);
        selected
    }

    /// Applies a validated status transition and journals it.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownRecording`] if no entry has the given id.
    /// - [`Error::InvalidTransition`] for a transition outside the
    ///   state machine; registry state is unchanged.
    /// - [`Error::InvalidArgument`] when `extra` lacks data the target
    ///   status requires (remote id, unusable reason).
    /// - [`Error::RegistryIo`] if the journal append fails; the
    ///   in-memory entry is not updated in that case.
    pub fn update_status(
        &mut self,
        id: &str,
        to: RecordingStatus,
        extra: &StatusExtra,
    ) -> Result<()> {
        let entry = self
            .get(id)
            .ok_or_else(|| Error::UnknownRecording { id: id.to_string() })?;
        let from = entry.status;
        if !from.can_transition_to(to) {
            return Err(Error::InvalidTransition { id: id.to_string(), from, to });
        }

        let event = match to {
            RecordingStatus::StartedWrite => JournalEvent::WriteStarted {
                id: id.to_string(),
                path: extra
                    .path
                    .clone()
                    .unwrap_or_else(|| self.directory.join(format!("{id}.rec"))),
            },
            RecordingStatus::OnDisk => {
                if from == RecordingStatus::StartedUpload {
                    JournalEvent::UploadFailed { id: id.to_string() }
                } else {
                    JournalEvent::WriteFinished { id: id.to_string() }
                }
            }
            RecordingStatus::Crashed => JournalEvent::Crashed { id: id.to_string() },
            RecordingStatus::StartedUpload => JournalEvent::UploadStarted {
                id: id.to_string(),
                server: extra.server.clone().unwrap_or_default(),
            },
            RecordingStatus::Uploaded => JournalEvent::UploadFinished {
                id: id.to_string(),
                recording_id: require_extra(id, to, extra.recording_id.as_deref())?,
            },
            RecordingStatus::CrashUploaded => JournalEvent::CrashUploaded {
                id: id.to_string(),
                recording_id: require_extra(id, to, extra.recording_id.as_deref())?,
            },
            RecordingStatus::Unusable => JournalEvent::Unusable {
                id: id.to_string(),
                reason: require_extra(id, to, extra.reason.as_deref())?,
            },
            RecordingStatus::Unknown => {
                // No journal event produces Unknown; the table has no
                // edge into it either, so this is unreachable.
                return Err(Error::InvalidTransition { id: id.to_string(), from, to });
            }
        };
        self.commit(event)
    }

    /// Deep-merges a metadata patch into an entry, last writer wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRecording`] for an unknown id, or
    /// [`Error::RegistryIo`] when the journal append fails.
    pub fn merge_metadata(&mut self, id: &str, patch: &Map<String, Value>) -> Result<()> {
        if self.get(id).is_none() {
            return Err(Error::UnknownRecording { id: id.to_string() });
        }
        self.commit(JournalEvent::AddMetadata { id: id.to_string(), metadata: patch.clone() })
    }

    /// Removes one recording: its artifact file and journal history.
    ///
    /// Idempotent — removing an id the registry does not know succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryIo`] when the artifact or journal
    /// cannot be rewritten.
    pub fn remove(&mut self, id: &str) -> Result<()> {
        let Some(position) = self.entries.iter().position(|e| e.id == id) else {
            return Ok(());
        };
        if let Some(path) = self.entries[position].path.clone() {
            remove_artifact(&path)?;
        }
        self.entries.remove(position);
        self.rewrite_journal(|line_id| line_id != id)
    }

    /// Removes every recording and truncates the journal.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryIo`] on filesystem failure.
    pub fn remove_all(&mut self) -> Result<()> {
        for entry in &self.entries {
            if let Some(path) = &entry.path {
                remove_artifact(path)?;
            }
        }
        self.entries.clear();
        match fs::remove_file(self.journal_path()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::registry_io(self.journal_path(), e)),
        }
    }

    /// Rewrites the journal keeping only lines whose id passes `keep`.
    ///
    /// Unparseable lines are preserved verbatim; they belong to the
    /// external runtime and are not ours to drop.
    fn rewrite_journal(&self, keep: impl Fn(&str) -> bool) -> Result<()> {
        let journal = self.journal_path();
        let contents = match fs::read_to_string(&journal) {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(Error::registry_io(journal, e)),
        };
        let mut kept = String::with_capacity(contents.len());
        for line in contents.lines() {
            let drop = serde_json::from_str::<Value>(line)
                .ok()
                .and_then(|v| v.get("id").and_then(Value::as_str).map(|id| !keep(id)))
                .unwrap_or(false);
            if !drop {
                kept.push_str(line);
                kept.push('\n');
            }
        }
        write_atomic(&journal, kept.as_bytes())
    }
}

fn require_extra(id: &str, to: RecordingStatus, value: Option<&str>) -> Result<String> {
    value.map(str::to_string).ok_or_else(|| Error::InvalidArgument {
        message: format!("transition of {id} to {to} requires accompanying data"),
    })
}

fn remove_artifact(path: &Path) -> Result<()> {
    match fs::remove_file(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(Error::registry_io(path, e)),
    }
}

fn matches_filter(entry: &RecordingEntry, needle: &str) -> bool {
    if entry.id.to_lowercase().contains(needle)
        || entry.status.as_str().to_lowercase().contains(needle)
    {
        return true;
    }
    serde_json::to_string(&entry.metadata)
        .map(|metadata| metadata.to_lowercase().contains(needle))
        .unwrap_or(false)
}

/// Recursively merges `patch` into `target`; non-object values replace.
pub(crate) fn deep_merge(target: &mut Map<String, Value>, patch: &Map<String, Value>) {
    for (key, value) in patch {
        match (target.get_mut(key), value) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                deep_merge(existing, incoming);
            }
            _ => {
                target.insert(key.clone(), value.clone());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    /// Writes a journal describing `count` on-disk recordings.
    fn seed_journal(dir: &Path, count: usize) -> Vec<String> {
        let journal = dir.join(JOURNAL_FILE);
        let mut lines = String::new();
        let mut ids = Vec::new();
        for index in 0..count {
            let id = format!("rec-{index:02}");
            let artifact = dir.join(format!("{id}.rec"));
            fs::write(&artifact, b"artifact-bytes").unwrap();
            lines.push_str(&format!(
                "{}\n{}\n{}\n",
                json!({"kind": "createRecording", "id": id, "timestamp":
                    format!("2024-05-01T10:{index:02}:00Z"), "buildId": "linux-1", "runtime": "chromium"}),
                json!({"kind": "writeStarted", "id": id, "path": artifact}),
                json!({"kind": "writeFinished", "id": id}),
            ));
            ids.push(id);
        }
        fs::write(journal, lines).unwrap();
        ids
    }

    #[test]
    fn missing_journal_yields_empty_registry() {
        let dir = tempfile::tempdir().unwrap();
        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        assert!(registry.list(None, true).is_empty());
    }

    #[test]
    fn journal_folds_into_on_disk_entries() {
        let dir = tempfile::tempdir().unwrap();
        let ids = seed_journal(dir.path(), 2);
        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        let entries = registry.list(None, false);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].id, ids[0]);
        assert_eq!(entries[0].status, RecordingStatus::OnDisk);
        assert_eq!(entries[0].build_id.as_deref(), Some("linux-1"));
        assert_eq!(entries[0].runtime, "chromium");
        assert!(entries[0].path.is_some());
    }

    #[test]
    fn malformed_journal_lines_are_skipped() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let journal = dir.path().join(JOURNAL_FILE);
        let mut contents = fs::read_to_string(&journal).unwrap();
        contents.push_str("this is not json\n");
        contents.push_str("{\"kind\": \"mystery\", \"id\": \"rec-00\"}\n");
        fs::write(&journal, contents).unwrap();

        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        assert_eq!(registry.list(None, false).len(), 1);
    }

    #[test]
    fn list_excludes_in_progress_by_default() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 2);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .update_status("rec-00", RecordingStatus::StartedUpload, &StatusExtra::server("s"))
            .unwrap();
        assert_eq!(registry.list(None, false).len(), 1);
        assert_eq!(registry.list(None, true).len(), 2);
    }

    #[test]
    fn list_filters_by_substring_over_id_status_and_metadata() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 2);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .merge_metadata("rec-01", &object(json!({"test": {"title": "checkout flow"}})))
            .unwrap();

        assert_eq!(registry.list(Some("rec-00"), false).len(), 1);
        assert_eq!(registry.list(Some("CHECKOUT"), false).len(), 1);
        assert_eq!(registry.list(Some("onDisk"), false).len(), 2);
        assert!(registry.list(Some("no-such-thing"), false).is_empty());
    }

    #[test]
    fn latest_returns_most_recent_entry() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 3);
        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        assert_eq!(registry.latest().unwrap().id, "rec-02");
    }

    #[test]
    fn valid_transitions_are_journaled_and_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .update_status("rec-00", RecordingStatus::StartedUpload, &StatusExtra::server("srv"))
            .unwrap();
        registry
            .update_status("rec-00", RecordingStatus::Uploaded, &StatusExtra::recording_id("remote-1"))
            .unwrap();

        let reopened = RecordingRegistry::open_directory(dir.path()).unwrap();
        let entry = reopened.get("rec-00").unwrap();
        assert_eq!(entry.status, RecordingStatus::Uploaded);
        assert_eq!(entry.recording_id.as_deref(), Some("remote-1"));
        assert_eq!(entry.server.as_deref(), Some("srv"));
    }

    #[test]
    fn invalid_transitions_are_rejected_and_leave_state_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();

        let err = registry
            .update_status("rec-00", RecordingStatus::Uploaded, &StatusExtra::recording_id("r"))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidTransition { .. }));
        assert_eq!(registry.get("rec-00").unwrap().status, RecordingStatus::OnDisk);

        // Nothing was journaled either.
        let reopened = RecordingRegistry::open_directory(dir.path()).unwrap();
        assert_eq!(reopened.get("rec-00").unwrap().status, RecordingStatus::OnDisk);
    }

    #[test]
    fn upload_failure_returns_entry_to_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .update_status("rec-00", RecordingStatus::StartedUpload, &StatusExtra::server("s"))
            .unwrap();
        registry
            .update_status("rec-00", RecordingStatus::OnDisk, &StatusExtra::default())
            .unwrap();
        let entry = registry.get("rec-00").unwrap();
        assert_eq!(entry.status, RecordingStatus::OnDisk);
        assert!(entry.recording_id.is_none());
    }

    #[test]
    fn uploaded_without_remote_id_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .update_status("rec-00", RecordingStatus::StartedUpload, &StatusExtra::server("s"))
            .unwrap();
        let err = registry
            .update_status("rec-00", RecordingStatus::Uploaded, &StatusExtra::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidArgument { .. }));
    }

    #[test]
    fn unknown_recording_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        let err = registry
            .update_status("nope", RecordingStatus::StartedUpload, &StatusExtra::default())
            .unwrap_err();
        assert!(matches!(err, Error::UnknownRecording { .. }));
    }

    #[test]
    fn metadata_merge_is_deep_with_last_writer_wins() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 1);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry
            .merge_metadata("rec-00", &object(json!({"test": {"title": "a", "run": 1}})))
            .unwrap();
        registry
            .merge_metadata("rec-00", &object(json!({"test": {"title": "b"}, "ci": true})))
            .unwrap();

        let metadata = &registry.get("rec-00").unwrap().metadata;
        assert_eq!(metadata["test"]["title"], "b");
        assert_eq!(metadata["test"]["run"], 1);
        assert_eq!(metadata["ci"], true);
    }

    #[test]
    fn remove_deletes_artifact_and_history_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 2);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        let artifact = registry.get("rec-00").unwrap().path.clone().unwrap();

        registry.remove("rec-00").unwrap();
        assert!(!artifact.exists());
        assert!(registry.get("rec-00").is_none());

        // Second removal of the same id is not an error.
        registry.remove("rec-00").unwrap();

        let reopened = RecordingRegistry::open_directory(dir.path()).unwrap();
        assert!(reopened.get("rec-00").is_none());
        assert!(reopened.get("rec-01").is_some());
    }

    #[test]
    fn remove_all_clears_everything() {
        let dir = tempfile::tempdir().unwrap();
        seed_journal(dir.path(), 3);
        let mut registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        registry.remove_all().unwrap();
        assert!(registry.list(None, true).is_empty());
        assert!(!dir.path().join(JOURNAL_FILE).exists());
    }

    #[test]
    fn crash_events_accumulate_diagnostics() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join(JOURNAL_FILE);
        let lines = format!(
            "{}\n{}\n{}\n{}\n{}\n",
            json!({"kind": "createRecording", "id": "c1", "timestamp": "2024-05-01T10:00:00Z"}),
            json!({"kind": "writeStarted", "id": "c1", "path": dir.path().join("c1.rec")}),
            json!({"kind": "crashed", "id": "c1"}),
            json!({"kind": "crashData", "id": "c1", "data": {"signal": 11}}),
            json!({"kind": "crashData", "id": "c1", "data": {"frame": "main"}}),
        );
        fs::write(journal, lines).unwrap();

        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        let entry = registry.get("c1").unwrap();
        assert_eq!(entry.status, RecordingStatus::Crashed);
        assert_eq!(entry.crash_data.len(), 2);
    }

    #[test]
    fn sourcemap_events_attach_with_original_sources() {
        let dir = tempfile::tempdir().unwrap();
        let journal = dir.path().join(JOURNAL_FILE);
        let lines = format!(
            "{}\n{}\n{}\n",
            json!({"kind": "createRecording", "id": "s1", "timestamp": "2024-05-01T10:00:00Z"}),
            json!({"kind": "addSourcemap", "id": "s1", "sourcemap": {
                "id": "map-1", "path": "/maps/app.js.map",
                "baseURL": "https://app.test/", "targetMapURLHash": "sha-1"}}),
            json!({"kind": "addOriginalSource", "id": "s1", "sourcemapId": "map-1",
                "path": "src/app.ts", "parentOffset": 16}),
        );
        fs::write(journal, lines).unwrap();

        let registry = RecordingRegistry::open_directory(dir.path()).unwrap();
        let entry = registry.get("s1").unwrap();
        assert_eq!(entry.sourcemaps.len(), 1);
        let map = &entry.sourcemaps[0];
        assert_eq!(map.id, "map-1");
        assert_eq!(map.base_url, "https://app.test/");
        assert_eq!(map.original_sources.len(), 1);
        assert_eq!(map.original_sources[0].path, "src/app.ts");
        assert_eq!(map.original_sources[0].parent_offset, 16);
    }
}
