//! `replay metadata` command.

use std::path::PathBuf;

use serde_json::{Map, Value};
use tracing::warn;

use crate::config::Config;
use crate::registry::RecordingRegistry;

/// Execute the `metadata` command: merge a JSON object into every
/// recording matching the filter.
///
/// With `--keys`, only the named top-level keys of the patch are
/// merged. With `--warn`, malformed input is downgraded to a warning
/// and the command succeeds without changing anything.
///
/// # Errors
///
/// Returns an error string for malformed metadata (unless `--warn`) or
/// when the registry cannot be read or written.
pub fn run(
    init: Option<&str>,
    keys: &[String],
    warn_only: bool,
    filter: Option<&str>,
    directory: Option<PathBuf>,
) -> Result<(), String> {
    let Some(init) = init else {
        return Err("metadata requires --init <json>".to_string());
    };

    let patch = match parse_patch(init, keys) {
        Ok(patch) => patch,
        Err(message) if warn_only => {
            warn!("{message}");
            eprintln!("warning: {message}");
            return Ok(());
        }
        Err(message) => return Err(message),
    };

    let config = Config::resolve(directory, None, None).map_err(|e| e.to_string())?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    let ids: Vec<String> =
        registry.list(filter, true).into_iter().map(|e| e.id.clone()).collect();
    for id in &ids {
        registry.merge_metadata(id, &patch).map_err(|e| e.to_string())?;
    }
    println!("updated metadata for {} recording(s)", ids.len());
    Ok(())
}

/// Parses the `--init` payload, restricted to `keys` when provided.
fn parse_patch(init: &str, keys: &[String]) -> Result<Map<String, Value>, String> {
    let value: Value =
        serde_json::from_str(init).map_err(|e| format!("malformed metadata JSON: {e}"))?;
    let Value::Object(mut patch) = value else {
        return Err("metadata must be a JSON object".to_string());
    };
    if !keys.is_empty() {
        patch.retain(|key, _| keys.contains(key));
    }
    Ok(patch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_object_metadata() {
        assert!(parse_patch("[1, 2]", &[]).is_err());
        assert!(parse_patch("not json", &[]).is_err());
    }

    #[test]
    fn restricts_to_requested_keys() {
        let patch =
            parse_patch(r#"{"ci": true, "secret": "x"}"#, &["ci".to_string()]).unwrap();
        assert_eq!(patch.len(), 1);
        assert_eq!(patch["ci"], true);
    }

    #[test]
    fn warn_mode_swallows_malformed_input() {
        let dir = tempfile::tempdir().unwrap();
        let result = run(Some("not json"), &[], true, None, Some(dir.path().to_path_buf()));
        assert!(result.is_ok());
    }

    #[test]
    fn missing_init_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(None, &[], false, None, Some(dir.path().to_path_buf())).is_err());
    }
}
