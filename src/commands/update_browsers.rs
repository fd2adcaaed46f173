//! `replay update-browsers` command.

use std::path::PathBuf;

use crate::config::Config;

/// Execute the `update-browsers` command.
///
/// Browser binaries are installed and updated by the recording runtime
/// packages, not by this CLI; this command only reports where they
/// would go.
///
/// # Errors
///
/// Returns an error string when no recording directory can be resolved.
pub fn run(directory: Option<PathBuf>) -> Result<(), String> {
    let config = Config::resolve(directory, None, None).map_err(|e| e.to_string())?;
    println!(
        "browsers are managed by the recording runtime packages; runtimes install under {}",
        config.directory.join("runtimes").display()
    );
    Ok(())
}
