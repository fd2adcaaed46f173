//! Network seam of the upload pipeline.
//!
//! The remote protocol is opaque to the rest of the crate: every call
//! either succeeds (yielding a remote recording id for the begin call)
//! or fails with a transient error the retry layer can absorb.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::recording::{RecordingEntry, SourceMapEntry};

/// Boxed future type alias keeping [`UploadClient`] dyn-compatible.
pub type ClientFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T>> + Send + 'a>>;

/// Transmits recordings, metadata, and sourcemaps to the remote service.
pub trait UploadClient: Send + Sync {
    /// Announces an upload and obtains the remote recording id.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network or server
    /// failure.
    fn begin_upload(&self, entry: &RecordingEntry) -> ClientFuture<'_, String>;

    /// Transmits the recording's binary artifact.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network, server,
    /// or artifact-read failure.
    fn upload_artifact(&self, recording_id: &str, path: &Path) -> ClientFuture<'_, ()>;

    /// Transmits one sourcemap descriptor and its content.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network or server
    /// failure.
    fn upload_sourcemap(&self, recording_id: &str, sourcemap: &SourceMapEntry)
        -> ClientFuture<'_, ()>;

    /// Transmits crash diagnostics for a crashed recording.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network or server
    /// failure.
    fn upload_crash_data(&self, recording_id: &str, data: &[Value]) -> ClientFuture<'_, ()>;

    /// Marks the upload as complete.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network or server
    /// failure.
    fn finish_upload(&self, recording_id: &str) -> ClientFuture<'_, ()>;

    /// Asks the server to process an uploaded recording.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network or server
    /// failure.
    fn process_recording(&self, recording_id: &str) -> ClientFuture<'_, ()>;

    /// Uploads a standalone sourcemap file under a named group.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::TransientUpload`] on any network, server,
    /// or file-read failure.
    fn upload_standalone_sourcemap(&self, group: &str, path: &Path) -> ClientFuture<'_, ()>;
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct BeginUploadRequest<'a> {
    id: &'a str,
    metadata: &'a Map<String, Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    build_id: Option<&'a str>,
    runtime: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BeginUploadResponse {
    recording_id: String,
}

/// Live [`UploadClient`] backed by HTTP.
pub struct HttpUploadClient {
    client: reqwest::Client,
    server: String,
    api_key: Option<String>,
}

impl HttpUploadClient {
    /// Creates a client targeting the configured server.
    #[must_use]
    pub fn new(config: &Config) -> Self {
        Self {
            client: reqwest::Client::new(),
            server: config.server.clone(),
            api_key: config.api_key.clone(),
        }
    }

    fn post(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.post(format!("{}{path}", self.server));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    fn put(&self, path: &str) -> reqwest::RequestBuilder {
        let builder = self.client.put(format!("{}{path}", self.server));
        match &self.api_key {
            Some(key) => builder.bearer_auth(key),
            None => builder,
        }
    }

    async fn send(builder: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = builder
            .send()
            .await
            .map_err(|e| Error::TransientUpload { message: e.to_string() })?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let body = response.text().await.unwrap_or_default();
            Err(Error::TransientUpload {
                message: format!("server responded {status}: {body}"),
            })
        }
    }

    async fn read_file(path: &Path) -> Result<Vec<u8>> {
        tokio::fs::read(path).await.map_err(|e| Error::TransientUpload {
            message: format!("failed to read {}: {e}", path.display()),
        })
    }
}

impl UploadClient for HttpUploadClient {
    fn begin_upload(&self, entry: &RecordingEntry) -> ClientFuture<'_, String> {
        let entry = entry.clone();
        Box::pin(async move {
            debug!(id = %entry.id, "beginning upload");
            let body = serde_json::to_value(BeginUploadRequest {
                id: &entry.id,
                metadata: &entry.metadata,
                build_id: entry.build_id.as_deref(),
                runtime: &entry.runtime,
            })?;
            let response = Self::send(self.post("/v1/recordings").json(&body)).await?;
            let parsed: BeginUploadResponse = response
                .json()
                .await
                .map_err(|e| Error::TransientUpload { message: e.to_string() })?;
            Ok(parsed.recording_id)
        })
    }

    fn upload_artifact(&self, recording_id: &str, path: &Path) -> ClientFuture<'_, ()> {
        let recording_id = recording_id.to_string();
        let path: PathBuf = path.to_path_buf();
        Box::pin(async move {
            let bytes = Self::read_file(&path).await?;
            debug!(recording_id = %recording_id, bytes = bytes.len(), "uploading artifact");
            Self::send(
                self.put(&format!("/v1/recordings/{recording_id}/artifact")).body(bytes),
            )
            .await?;
            Ok(())
        })
    }

    fn upload_sourcemap(
        &self,
        recording_id: &str,
        sourcemap: &SourceMapEntry,
    ) -> ClientFuture<'_, ()> {
        let recording_id = recording_id.to_string();
        let sourcemap = sourcemap.clone();
        Box::pin(async move {
            let content = Self::read_file(Path::new(&sourcemap.path)).await?;
            let body = serde_json::json!({
                "sourcemap": sourcemap,
                "content": String::from_utf8_lossy(&content),
            });
            Self::send(
                self.post(&format!("/v1/recordings/{recording_id}/sourcemaps")).json(&body),
            )
            .await?;
            Ok(())
        })
    }

    fn upload_crash_data(&self, recording_id: &str, data: &[Value]) -> ClientFuture<'_, ()> {
        let recording_id = recording_id.to_string();
        let data = data.to_vec();
        Box::pin(async move {
            Self::send(
                self.post(&format!("/v1/recordings/{recording_id}/crash-data")).json(&data),
            )
            .await?;
            Ok(())
        })
    }

    fn finish_upload(&self, recording_id: &str) -> ClientFuture<'_, ()> {
        let recording_id = recording_id.to_string();
        Box::pin(async move {
            Self::send(self.post(&format!("/v1/recordings/{recording_id}/finish"))).await?;
            Ok(())
        })
    }

    fn process_recording(&self, recording_id: &str) -> ClientFuture<'_, ()> {
        let recording_id = recording_id.to_string();
        Box::pin(async move {
            Self::send(self.post(&format!("/v1/recordings/{recording_id}/process"))).await?;
            Ok(())
        })
    }

    fn upload_standalone_sourcemap(&self, group: &str, path: &Path) -> ClientFuture<'_, ()> {
        let group = group.to_string();
        let path = path.to_path_buf();
        Box::pin(async move {
            let content = Self::read_file(&path).await?;
            let body = serde_json::json!({
                "group": group,
                "name": path.file_name().map(|n| n.to_string_lossy().into_owned()),
                "content": String::from_utf8_lossy(&content),
            });
            Self::send(self.post("/v1/sourcemaps").json(&body)).await?;
            Ok(())
        })
    }
}
