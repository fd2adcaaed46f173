//! `replay upload`, `replay process`, and `replay upload-all` commands.

use uuid::Uuid;

use crate::cli::ConnectionOpts;
use crate::config::Config;
use crate::registry::RecordingRegistry;
use crate::upload::{HttpUploadClient, UploadPipeline};

/// Resolves configuration from connection options, verbose for the CLI.
pub(crate) fn resolve_config(opts: ConnectionOpts) -> Result<Config, String> {
    Config::resolve(opts.directory, opts.server, opts.api_key)
        .map(Config::verbose)
        .map_err(|e| e.to_string())
}

/// Rejects ids that cannot be recording ids before touching the network.
pub(crate) fn validate_id(id: &str) -> Result<(), String> {
    Uuid::parse_str(id)
        .map(|_| ())
        .map_err(|_| format!("{id} is not a valid recording id"))
}

/// Execute the `upload` command.
///
/// # Errors
///
/// Returns an error string when the recording cannot be uploaded.
pub async fn run_upload(id: String, opts: ConnectionOpts) -> Result<(), String> {
    validate_id(&id)?;
    let config = resolve_config(opts)?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    let client = HttpUploadClient::new(&config);
    let mut pipeline = UploadPipeline::new(&mut registry, &client, &config);
    let recording_id = pipeline.upload_one(&id).await.map_err(|e| e.to_string())?;
    println!("{recording_id}");
    Ok(())
}

/// Execute the `process` command.
///
/// # Errors
///
/// Returns an error string when the upload or processing request fails.
pub async fn run_process(id: String, opts: ConnectionOpts) -> Result<(), String> {
    validate_id(&id)?;
    let config = resolve_config(opts)?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    let client = HttpUploadClient::new(&config);
    let mut pipeline = UploadPipeline::new(&mut registry, &client, &config);
    let recording_id = pipeline.process_one(&id).await.map_err(|e| e.to_string())?;
    println!("{recording_id}");
    Ok(())
}

/// Execute the `upload-all` command.
///
/// # Errors
///
/// Returns an error string when any selected recording fails to upload;
/// per-recording failures are printed as they happen.
pub async fn run_upload_all(
    opts: ConnectionOpts,
    filter: Option<String>,
    batch_size: Option<usize>,
    include_in_progress: bool,
) -> Result<(), String> {
    let config = resolve_config(opts)?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    let client = HttpUploadClient::new(&config);
    let mut pipeline = UploadPipeline::new(&mut registry, &client, &config);
    let uploaded_all = pipeline
        .upload_all(filter.as_deref(), batch_size, include_in_progress)
        .await
        .map_err(|e| e.to_string())?;
    if uploaded_all {
        Ok(())
    } else {
        Err("some recordings failed to upload".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::validate_id;

    #[test]
    fn uuid_ids_are_accepted() {
        assert!(validate_id("3a1d5a21-4b79-4f2a-8f72-7c3d2f9b66aa").is_ok());
    }

    #[test]
    fn other_ids_are_rejected() {
        assert!(validate_id("latest").is_err());
        assert!(validate_id("").is_err());
    }
}
