//! CLI argument definitions.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

/// Top-level CLI parser for `replay`.
#[derive(Debug, Parser)]
#[command(name = "replay", version, about = "Manage and upload session recordings")]
pub struct Cli {
    /// The command to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// Options shared by commands that talk to the remote service.
#[derive(Debug, Clone, Args)]
pub struct ConnectionOpts {
    /// Alternate recording directory.
    #[arg(long)]
    pub directory: Option<PathBuf>,
    /// Alternate server to upload recordings to.
    #[arg(long)]
    pub server: Option<String>,
    /// Authentication API key.
    #[arg(long)]
    pub api_key: Option<String>,
}

/// Supported top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// List information about all recordings.
    Ls {
        /// Alternate recording directory.
        #[arg(long)]
        directory: Option<PathBuf>,
        /// Include all recordings, even ones with operations in progress.
        #[arg(short, long)]
        all: bool,
        /// Output in JSON format.
        #[arg(long)]
        json: bool,
        /// String to filter recordings.
        #[arg(long)]
        filter: Option<String>,
    },
    /// Upload a recording to the remote server.
    Upload {
        /// Recording id.
        id: String,
        #[command(flatten)]
        opts: ConnectionOpts,
    },
    /// Upload a recording to the remote server and process it.
    Process {
        /// Recording id.
        id: String,
        #[command(flatten)]
        opts: ConnectionOpts,
    },
    /// Upload all recordings to the remote server.
    UploadAll {
        #[command(flatten)]
        opts: ConnectionOpts,
        /// String to filter recordings.
        #[arg(long)]
        filter: Option<String>,
        /// Number of recordings to upload in parallel (max 25).
        #[arg(long)]
        batch_size: Option<usize>,
        /// Include recordings with an in-progress status.
        #[arg(long)]
        include_in_progress: bool,
    },
    /// Print the devtools link for a recording, uploading it if needed.
    View {
        /// Recording id.
        id: String,
        #[command(flatten)]
        opts: ConnectionOpts,
    },
    /// Print the devtools link for the latest recording, uploading it if needed.
    ViewLatest {
        #[command(flatten)]
        opts: ConnectionOpts,
    },
    /// Remove a specific recording.
    Rm {
        /// Recording id.
        id: String,
        /// Alternate recording directory.
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Remove all recordings.
    RmAll {
        /// Alternate recording directory.
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Update browsers used in automation.
    UpdateBrowsers {
        /// Alternate recording directory.
        #[arg(long)]
        directory: Option<PathBuf>,
    },
    /// Upload sourcemaps to the remote server.
    UploadSourcemaps {
        /// The name to group these sourcemaps under, e.g. a commit SHA
        /// or release version.
        #[arg(short, long)]
        group: String,
        /// Authentication API key.
        #[arg(long)]
        api_key: Option<String>,
        /// Perform all of the usual logic but skip the final upload.
        #[arg(long)]
        dry_run: bool,
        /// Comma-separated list of extensions to process.
        #[arg(short = 'x', long, value_delimiter = ',')]
        extensions: Option<Vec<String>>,
        /// Ignore files whose path contains this pattern (repeatable).
        #[arg(short, long)]
        ignore: Vec<String>,
        /// The base directory to use when computing relative paths.
        #[arg(long)]
        root: Option<PathBuf>,
        /// Alternate server to upload sourcemaps to.
        #[arg(long)]
        server: Option<String>,
        /// Files or directories to scan for sourcemaps.
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },
    /// Merge metadata into recordings.
    Metadata {
        /// JSON object to merge into matching recordings.
        #[arg(long)]
        init: Option<String>,
        /// Restrict the merge to the given top-level keys.
        #[arg(long, num_args = 1..)]
        keys: Vec<String>,
        /// Downgrade malformed metadata to a warning.
        #[arg(long)]
        warn: bool,
        /// String to filter recordings.
        #[arg(long)]
        filter: Option<String>,
        /// Alternate recording directory.
        #[arg(long)]
        directory: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::{Cli, Command};
    use clap::Parser;

    #[test]
    fn parses_ls_with_filter() {
        let cli = Cli::parse_from(["replay", "ls", "--all", "--json", "--filter", "crashed"]);
        match cli.command {
            Command::Ls { all, json, filter, .. } => {
                assert!(all);
                assert!(json);
                assert_eq!(filter.as_deref(), Some("crashed"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_upload_with_connection_options() {
        let cli = Cli::parse_from([
            "replay",
            "upload",
            "3a1d5a21-4b79-4f2a-8f72-7c3d2f9b66aa",
            "--server",
            "https://dispatch.example.test",
            "--api-key",
            "key",
        ]);
        match cli.command {
            Command::Upload { id, opts } => {
                assert_eq!(id, "3a1d5a21-4b79-4f2a-8f72-7c3d2f9b66aa");
                assert_eq!(opts.server.as_deref(), Some("https://dispatch.example.test"));
                assert_eq!(opts.api_key.as_deref(), Some("key"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn parses_upload_all_batch_options() {
        let cli = Cli::parse_from([
            "replay",
            "upload-all",
            "--batch-size",
            "10",
            "--include-in-progress",
        ]);
        match cli.command {
            Command::UploadAll { batch_size, include_in_progress, .. } => {
                assert_eq!(batch_size, Some(10));
                assert!(include_in_progress);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn upload_sourcemaps_requires_group_and_paths() {
        assert!(Cli::try_parse_from(["replay", "upload-sourcemaps", "dist"]).is_err());
        assert!(Cli::try_parse_from(["replay", "upload-sourcemaps", "-g", "v1"]).is_err());
        let cli =
            Cli::parse_from(["replay", "upload-sourcemaps", "-g", "v1", "-x", ".js,.map", "dist"]);
        match cli.command {
            Command::UploadSourcemaps { group, extensions, paths, .. } => {
                assert_eq!(group, "v1");
                assert_eq!(extensions.unwrap(), vec![".js", ".map"]);
                assert_eq!(paths.len(), 1);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }
}
