//! Core library for the `replay` CLI: recording lifecycle management
//! and the metadata-upload pipeline.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod events;
pub mod format;
pub mod mapper;
pub mod metadata;
pub mod recording;
pub mod registry;
pub mod reporter;
pub mod upload;

use clap::Parser;

/// Run the CLI with the provided arguments.
///
/// # Errors
///
/// Returns an error string when argument parsing fails or command execution fails.
pub fn run<I, T>(args: I) -> Result<(), String>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    let cli = cli::Cli::try_parse_from(args).map_err(|err| err.to_string())?;
    commands::dispatch(cli.command)
}

#[cfg(test)]
mod tests {
    use super::run;

    #[test]
    fn run_executes_ls() {
        let dir = tempfile::tempdir().unwrap();
        let directory = dir.path().to_str().unwrap().to_string();
        let result = run(["replay", "ls", "--directory", &directory]);
        assert!(result.is_ok());
    }

    #[test]
    fn run_errors_on_unknown_subcommand() {
        let result = run(["replay", "unknown"]);
        assert!(result.is_err());
    }
}
