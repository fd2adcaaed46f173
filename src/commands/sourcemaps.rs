//! `replay upload-sourcemaps` command.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::Config;
use crate::upload::{exponential_backoff_retry, HttpUploadClient, UploadClient};

const DEFAULT_EXTENSIONS: [&str; 2] = [".js", ".map"];

/// Execute the `upload-sourcemaps` command: walk the given paths for
/// files matching the extension list and upload each under `group`.
///
/// # Errors
///
/// Returns an error string when a path cannot be walked or an upload
/// exhausts its retries.
#[allow(clippy::too_many_arguments)]
pub async fn run(
    group: String,
    api_key: Option<String>,
    dry_run: bool,
    extensions: Option<Vec<String>>,
    ignore: Vec<String>,
    root: Option<PathBuf>,
    server: Option<String>,
    paths: Vec<PathBuf>,
) -> Result<(), String> {
    let config = Config::resolve(None, server, api_key)
        .map(Config::verbose)
        .map_err(|e| e.to_string())?;
    let extensions = extensions
        .unwrap_or_else(|| DEFAULT_EXTENSIONS.iter().map(ToString::to_string).collect());

    let base = root.unwrap_or_else(|| PathBuf::from("."));
    let mut files = Vec::new();
    for path in &paths {
        let path = if path.is_absolute() { path.clone() } else { base.join(path) };
        collect_files(&path, &extensions, &ignore, &mut files)?;
    }
    files.sort();

    if files.is_empty() {
        println!("no sourcemap files found");
        return Ok(());
    }

    let client = HttpUploadClient::new(&config);
    for file in &files {
        if dry_run {
            println!("would upload {} to group {group}", file.display());
            continue;
        }
        println!("uploading {}", file.display());
        exponential_backoff_retry(
            || client.upload_standalone_sourcemap(&group, file),
            |e| warn!(file = %file.display(), error = %e, "sourcemap upload attempt failed"),
        )
        .await
        .map_err(|e| format!("failed to upload {}: {e}", file.display()))?;
    }
    println!("uploaded {} sourcemap file(s)", files.len());
    Ok(())
}

/// Recursively collects files matching the extension list.
fn collect_files(
    path: &Path,
    extensions: &[String],
    ignore: &[String],
    out: &mut Vec<PathBuf>,
) -> Result<(), String> {
    let display_path = path.display().to_string();
    if ignore.iter().any(|pattern| display_path.contains(pattern.as_str())) {
        debug!(path = %display_path, "ignored by pattern");
        return Ok(());
    }
    if path.is_dir() {
        let entries =
            fs::read_dir(path).map_err(|e| format!("failed to read {display_path}: {e}"))?;
        for entry in entries {
            let entry = entry.map_err(|e| format!("failed to read {display_path}: {e}"))?;
            collect_files(&entry.path(), extensions, ignore, out)?;
        }
    } else if extensions.iter().any(|ext| display_path.ends_with(ext.as_str())) {
        out.push(path.to_path_buf());
    }
    Ok(())
}
