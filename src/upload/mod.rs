//! Upload pipeline: drives registry entries through the upload states
//! with retry, and batches parallel uploads under a concurrency cap.

pub mod client;
pub mod retry;

pub use client::{ClientFuture, HttpUploadClient, UploadClient};
pub use retry::{exponential_backoff_retry, MAX_ATTEMPTS};

use futures::stream::{self, StreamExt};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{Error, Result};
use crate::recording::{RecordingEntry, RecordingStatus};
use crate::registry::{RecordingRegistry, StatusExtra};

/// Hard cap on the batch-upload concurrency window.
pub const MAX_BATCH_SIZE: usize = 25;

/// Concurrency window used when no batch size is requested.
pub const DEFAULT_BATCH_SIZE: usize = 20;

/// One recording scheduled for transmission.
struct UploadJob {
    entry: RecordingEntry,
    crashed: bool,
}

/// Result of a completed transmission.
struct UploadOutcome {
    recording_id: String,
    crashed: bool,
}

/// Drives uploads against a registry through an [`UploadClient`].
pub struct UploadPipeline<'a> {
    registry: &'a mut RecordingRegistry,
    client: &'a dyn UploadClient,
    server: String,
    verbose: bool,
}

impl<'a> UploadPipeline<'a> {
    /// Creates a pipeline over the given registry and network client.
    pub fn new(
        registry: &'a mut RecordingRegistry,
        client: &'a dyn UploadClient,
        config: &Config,
    ) -> Self {
        Self { registry, client, server: config.server.clone(), verbose: config.verbose }
    }

    fn progress(&self, message: &str) {
        debug!("{message}");
        if self.verbose {
            println!("{message}");
        }
    }

    /// Uploads a single recording, returning the remote recording id.
    ///
    /// A crashed recording transmits its crash diagnostics instead of
    /// an artifact and lands in `CrashUploaded`. An already-uploaded
    /// recording returns its existing remote id without retransmitting.
    ///
    /// # Errors
    ///
    /// - [`Error::UnknownRecording`] for an id the registry does not know.
    /// - [`Error::InvalidArgument`] for unusable or in-progress entries.
    /// - [`Error::FatalUpload`] once retries are exhausted; the entry is
    ///   returned to `OnDisk` and stays eligible for a later attempt.
    pub async fn upload_one(&mut self, id: &str) -> Result<String> {
        let entry = self
            .registry
            .get(id)
            .ok_or_else(|| Error::UnknownRecording { id: id.to_string() })?
            .clone();

        match entry.status {
            RecordingStatus::Uploaded | RecordingStatus::CrashUploaded => {
                self.progress(&format!("{id} was already uploaded"));
                return entry.recording_id.ok_or_else(|| Error::InvalidArgument {
                    message: format!("{id} is uploaded but has no remote id"),
                });
            }
            RecordingStatus::Unusable => {
                return Err(Error::InvalidArgument {
                    message: format!(
                        "{id} is unusable: {}",
                        entry.unusable_reason.as_deref().unwrap_or("unknown reason")
                    ),
                });
            }
            RecordingStatus::StartedWrite | RecordingStatus::StartedUpload => {
                return Err(Error::InvalidArgument {
                    message: format!("{id} has an operation in progress"),
                });
            }
            RecordingStatus::OnDisk | RecordingStatus::Unknown | RecordingStatus::Crashed => {}
        }

        let crashed = entry.status == RecordingStatus::Crashed;
        self.registry.update_status(
            id,
            RecordingStatus::StartedUpload,
            &StatusExtra::server(self.server.clone()),
        )?;
        self.progress(&format!("uploading {id}"));

        let job = UploadJob { entry, crashed };
        let result = transmit(self.client, &job).await;
        self.commit(id, result)
    }

    /// Uploads a recording and asks the server to process it.
    ///
    /// # Errors
    ///
    /// Propagates [`UploadPipeline::upload_one`] failures; a processing
    /// failure after a successful upload is an [`Error::FatalUpload`].
    pub async fn process_one(&mut self, id: &str) -> Result<String> {
        let recording_id = self.upload_one(id).await?;
        self.progress(&format!("processing {id}"));
        exponential_backoff_retry(
            || self.client.process_recording(&recording_id),
            |e| warn!(id, error = %e, "processing attempt failed"),
        )
        .await
        .map_err(|e| Error::FatalUpload { id: id.to_string(), message: e.to_string() })?;
        Ok(recording_id)
    }

    /// Uploads every eligible recording with bounded parallelism.
    ///
    /// Entries are selected via the registry's `list` (respecting
    /// `filter` and `include_in_progress`) and restricted to statuses
    /// that can legally start an upload; already-uploaded entries are
    /// counted as successes without retransmitting. The concurrency
    /// window is `batch_size` capped at [`MAX_BATCH_SIZE`]. Per-entry
    /// failures never abort the batch.
    ///
    /// Returns `true` only if every selected entry ended `Uploaded` or
    /// `CrashUploaded`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::RegistryIo`] only for journal failures while
    /// recording transitions; network failures are reflected in the
    /// `false` result instead.
    pub async fn upload_all(
        &mut self,
        filter: Option<&str>,
        batch_size: Option<usize>,
        include_in_progress: bool,
    ) -> Result<bool> {
        let window = batch_size.unwrap_or(DEFAULT_BATCH_SIZE).clamp(1, MAX_BATCH_SIZE);

        let mut all_ok = true;
        let mut jobs: Vec<UploadJob> = Vec::new();
        let candidates: Vec<RecordingEntry> = self
            .registry
            .list(filter, include_in_progress)
            .into_iter()
            .cloned()
            .collect();
        for entry in candidates {
            match entry.status {
                RecordingStatus::Uploaded | RecordingStatus::CrashUploaded => {}
                RecordingStatus::Unusable => {
                    warn!(id = %entry.id, "skipping unusable recording");
                }
                RecordingStatus::StartedWrite | RecordingStatus::StartedUpload => {
                    // Only reachable with include_in_progress; these
                    // cannot start another upload and count as failures.
                    eprintln!("cannot upload {}: operation in progress", entry.id);
                    all_ok = false;
                }
                RecordingStatus::OnDisk | RecordingStatus::Unknown | RecordingStatus::Crashed => {
                    let crashed = entry.status == RecordingStatus::Crashed;
                    self.registry.update_status(
                        &entry.id,
                        RecordingStatus::StartedUpload,
                        &StatusExtra::server(self.server.clone()),
                    )?;
                    jobs.push(UploadJob { entry, crashed });
                }
            }
        }

        self.progress(&format!(
            "uploading {} recording(s), {window} at a time",
            jobs.len()
        ));

        let client = self.client;
        let results: Vec<(String, Result<UploadOutcome>)> = stream::iter(jobs)
            .map(|job| async move {
                let id = job.entry.id.clone();
                let result = transmit(client, &job).await;
                (id, result)
            })
            .buffer_unordered(window)
            .collect()
            .await;

        for (id, result) in results {
            if self.commit(&id, result).is_err() {
                all_ok = false;
            }
        }
        Ok(all_ok)
    }

    /// Records the outcome of a transmission in the registry.
    fn commit(&mut self, id: &str, result: Result<UploadOutcome>) -> Result<String> {
        match result {
            Ok(outcome) => {
                let status = if outcome.crashed {
                    RecordingStatus::CrashUploaded
                } else {
                    RecordingStatus::Uploaded
                };
                self.registry.update_status(
                    id,
                    status,
                    &StatusExtra::recording_id(outcome.recording_id.clone()),
                )?;
                self.progress(&format!("uploaded {id} as {}", outcome.recording_id));
                Ok(outcome.recording_id)
            }
            Err(e) => {
                eprintln!("upload of {id} failed: {e}");
                if let Err(journal_error) = self.registry.update_status(
                    id,
                    RecordingStatus::OnDisk,
                    &StatusExtra::default(),
                ) {
                    warn!(id, error = %journal_error, "failed to record upload failure");
                }
                Err(Error::FatalUpload { id: id.to_string(), message: e.to_string() })
            }
        }
    }
}

/// Transmits one recording. Every network call runs under the bounded
/// retry policy; the registry is never touched here, so transmissions
/// can run concurrently.
async fn transmit(client: &dyn UploadClient, job: &UploadJob) -> Result<UploadOutcome> {
    let entry = &job.entry;
    let on_fail = |e: &Error| warn!(id = %entry.id, error = %e, "upload attempt failed");

    let recording_id =
        exponential_backoff_retry(|| client.begin_upload(entry), on_fail).await?;

    if job.crashed {
        exponential_backoff_retry(
            || client.upload_crash_data(&recording_id, &entry.crash_data),
            on_fail,
        )
        .await?;
    } else {
        let path = entry.path.as_ref().ok_or_else(|| Error::InvalidArgument {
            message: format!("{} has no artifact on disk", entry.id),
        })?;
        exponential_backoff_retry(|| client.upload_artifact(&recording_id, path), on_fail)
            .await?;
        for sourcemap in &entry.sourcemaps {
            exponential_backoff_retry(
                || client.upload_sourcemap(&recording_id, sourcemap),
                on_fail,
            )
            .await?;
        }
    }

    exponential_backoff_retry(|| client.finish_upload(&recording_id), on_fail).await?;
    Ok(UploadOutcome { recording_id, crashed: job.crashed })
}
