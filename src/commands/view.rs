//! `replay view` and `replay view-latest` commands.

use crate::cli::ConnectionOpts;
use crate::config::VIEW_BASE_URL;
use crate::recording::RecordingStatus;
use crate::registry::RecordingRegistry;
use crate::upload::{HttpUploadClient, UploadPipeline};

use super::upload::{resolve_config, validate_id};

/// Execute the `view` (id given) or `view-latest` (no id) command.
///
/// Uploads the recording first when it has not been uploaded yet, then
/// prints the devtools link.
///
/// # Errors
///
/// Returns an error string when no recording matches or the upload fails.
pub async fn run(id: Option<String>, opts: ConnectionOpts) -> Result<(), String> {
    if let Some(id) = &id {
        validate_id(id)?;
    }
    let config = resolve_config(opts)?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;

    let entry = match &id {
        Some(id) => registry.get(id).ok_or_else(|| format!("unknown recording {id}"))?,
        None => registry.latest().ok_or_else(|| "no recordings found".to_string())?,
    };
    let local_id = entry.id.clone();

    let recording_id = match (entry.status, &entry.recording_id) {
        (RecordingStatus::Uploaded | RecordingStatus::CrashUploaded, Some(remote)) => {
            remote.clone()
        }
        _ => {
            let client = HttpUploadClient::new(&config);
            let mut pipeline = UploadPipeline::new(&mut registry, &client, &config);
            pipeline.upload_one(&local_id).await.map_err(|e| e.to_string())?
        }
    };

    println!("{VIEW_BASE_URL}/recording/{recording_id}");
    Ok(())
}
