//! `replay rm` and `replay rm-all` commands.

use std::path::PathBuf;

use crate::config::Config;
use crate::registry::RecordingRegistry;

/// Execute the `rm` command. Removing an unknown id is not an error.
///
/// # Errors
///
/// Returns an error string when the recording directory cannot be
/// read or rewritten.
pub fn run_one(id: &str, directory: Option<PathBuf>) -> Result<(), String> {
    let config = Config::resolve(directory, None, None).map_err(|e| e.to_string())?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    registry.remove(id).map_err(|e| e.to_string())?;
    println!("removed {id}");
    Ok(())
}

/// Execute the `rm-all` command.
///
/// # Errors
///
/// Returns an error string when the recording directory cannot be
/// read or rewritten.
pub fn run_all(directory: Option<PathBuf>) -> Result<(), String> {
    let config = Config::resolve(directory, None, None).map_err(|e| e.to_string())?;
    let mut registry = RecordingRegistry::open(&config).map_err(|e| e.to_string())?;
    registry.remove_all().map_err(|e| e.to_string())?;
    println!("removed all recordings");
    Ok(())
}
