//! `replay ls` command.

use std::path::PathBuf;

use crate::config::Config;
use crate::format::{format_entries_human, format_entries_json};
use crate::registry::RecordingRegistry;

/// Execute the `ls` command.
///
/// # Errors
///
/// Returns an error string if the recording directory cannot be read.
pub fn run(
    directory: Option<PathBuf>,
    all: bool,
    json: bool,
    filter: Option<&str>,
) -> Result<(), String> {
    let config = Config::resolve(directory, None, None).map_err(|e| e.to_string())?;
    let registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    let entries = registry.list(filter, all);
    if json {
        println!("{}", format_entries_json(&entries));
    } else {
        println!("{}", format_entries_human(&entries));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn ls_succeeds_on_an_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(run(Some(dir.path().to_path_buf()), false, false, None).is_ok());
        assert!(run(Some(dir.path().to_path_buf()), true, true, Some("x")).is_ok());
    }
}
