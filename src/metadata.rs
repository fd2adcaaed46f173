//! Per-worker metadata files: path resolution and durable appends.
//!
//! Parallel test workers never share a metadata file: the path is
//! partitioned by (runner tag, worker index), so no cross-process
//! locking is needed. Appends are atomic at record granularity — a
//! concurrent reader sees either the whole new record or none of it.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process;

use serde_json::Value;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::events::TestRunRecord;

/// Resolves the metadata file path for one worker of one runner.
///
/// The mapping is deterministic and collision-free: distinct runner
/// tags or worker indices always yield distinct paths under the
/// configured recording directory.
#[must_use]
pub fn metadata_file_path(config: &Config, runner_tag: &str, worker_index: u32) -> PathBuf {
    let tag = runner_tag.to_uppercase();
    config.directory.join(format!("{tag}_METADATA_{worker_index}"))
}

/// Creates the metadata file (and the recording directory) if missing.
///
/// # Errors
///
/// Returns [`Error::RegistryIo`] when the directory or file cannot be
/// created.
pub fn init_metadata_file(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| Error::registry_io(parent, e))?;
    }
    if !path.exists() {
        fs::write(path, "").map_err(|e| Error::registry_io(path, e))?;
    }
    Ok(())
}

/// Durably appends one test-run record to a worker's metadata file.
///
/// # Errors
///
/// Returns [`Error::RegistryIo`] on filesystem failure or
/// [`Error::Json`] if the record cannot be serialized. On failure the
/// file retains its previous contents; no partial record is committed.
pub fn append_record(path: &Path, record: &TestRunRecord) -> Result<()> {
    append_json_line(path, &serde_json::to_value(record)?)
}

/// Appends one JSON value as a line to a JSON-lines file.
///
/// Shared by metadata files and the registry journal. The append is
/// implemented as rewrite-to-temp-and-rename so readers never observe
/// a partially written record, and the temp file is synced before the
/// rename so the append is durable when this returns.
pub(crate) fn append_json_line(path: &Path, value: &Value) -> Result<()> {
    let mut contents = match fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::registry_io(path, e)),
    };
    if !contents.is_empty() && !contents.ends_with('\n') {
        contents.push('\n');
    }
    contents.push_str(&serde_json::to_string(value)?);
    contents.push('\n');
    write_atomic(path, contents.as_bytes())
}

/// Writes a file atomically via a same-directory temp file and rename.
pub(crate) fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty()).unwrap_or(Path::new("."));
    let file_name = path.file_name().map_or_else(
        || "metadata".to_string(),
        |name| name.to_string_lossy().into_owned(),
    );
    let tmp = dir.join(format!(".{file_name}.{}.tmp", process::id()));

    let mut file = fs::File::create(&tmp).map_err(|e| Error::registry_io(&tmp, e))?;
    file.write_all(bytes).map_err(|e| Error::registry_io(&tmp, e))?;
    file.sync_all().map_err(|e| Error::registry_io(&tmp, e))?;
    drop(file);

    fs::rename(&tmp, path).map_err(|e| Error::registry_io(path, e))
}
