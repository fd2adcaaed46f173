//! Process configuration, resolved once at startup and threaded through
//! every component.

use std::env;
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Default upstream ingestion server.
pub const DEFAULT_SERVER: &str = "https://dispatch.replay.io";

/// Base URL for viewing uploaded recordings.
pub const VIEW_BASE_URL: &str = "https://app.replay.io";

/// Environment variable overriding the recording directory.
pub const DIRECTORY_ENV: &str = "RECORD_REPLAY_DIRECTORY";

/// Environment variable overriding the ingestion server.
pub const SERVER_ENV: &str = "RECORD_REPLAY_SERVER";

/// Environment variable supplying the API key.
pub const API_KEY_ENV: &str = "RECORD_REPLAY_API_KEY";

/// Resolved process configuration.
///
/// Core logic never consults the environment directly; everything it
/// needs is captured here at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding recordings, the journal, and metadata files.
    pub directory: PathBuf,
    /// Ingestion server base URL.
    pub server: String,
    /// Authentication API key, if provided.
    pub api_key: Option<String>,
    /// Whether commands print progress to stdout.
    pub verbose: bool,
}

impl Config {
    /// Resolves configuration from explicit options and the environment.
    ///
    /// Directory resolution order: explicit option, `RECORD_REPLAY_DIRECTORY`,
    /// then `$HOME`/`%USERPROFILE%` joined with `.replay`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] when no directory can be determined
    /// because the environment defines no home directory.
    pub fn resolve(
        directory: Option<PathBuf>,
        server: Option<String>,
        api_key: Option<String>,
    ) -> Result<Self> {
        let directory = match directory {
            Some(dir) => dir,
            None => match non_empty_env(DIRECTORY_ENV) {
                Some(dir) => PathBuf::from(dir),
                None => home_dir()?.join(".replay"),
            },
        };
        let server = server
            .or_else(|| non_empty_env(SERVER_ENV))
            .unwrap_or_else(|| DEFAULT_SERVER.to_string());
        let api_key = api_key.or_else(|| non_empty_env(API_KEY_ENV));
        Ok(Self { directory, server, api_key, verbose: false })
    }

    /// Returns a copy with verbose progress output enabled.
    #[must_use]
    pub fn verbose(mut self) -> Self {
        self.verbose = true;
        self
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.is_empty())
}

fn home_dir() -> Result<PathBuf> {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| Error::Config {
            message: "neither HOME nor USERPROFILE is set; pass --directory".to_string(),
        })
}

/// Reads a boolean feature toggle from the environment.
///
/// The toggle defaults to enabled; only the values `1` and `true`
/// (case-insensitive) keep it enabled once the variable is set.
#[must_use]
pub fn env_flag_enabled(name: &str) -> bool {
    match env::var(name) {
        Ok(value) if !value.is_empty() => {
            let value = value.to_lowercase();
            value == "1" || value == "true"
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_directory_wins_over_environment() {
        let config =
            Config::resolve(Some(PathBuf::from("/tmp/recordings")), None, None).unwrap();
        assert_eq!(config.directory, PathBuf::from("/tmp/recordings"));
    }

    #[test]
    fn server_defaults_to_upstream_dispatch() {
        let config = Config::resolve(Some(PathBuf::from("/tmp/r")), None, None).unwrap();
        assert_eq!(config.server, DEFAULT_SERVER);
    }

    #[test]
    fn explicit_server_and_key_are_kept() {
        let config = Config::resolve(
            Some(PathBuf::from("/tmp/r")),
            Some("https://dispatch.example.test".into()),
            Some("key-123".into()),
        )
        .unwrap();
        assert_eq!(config.server, "https://dispatch.example.test");
        assert_eq!(config.api_key.as_deref(), Some("key-123"));
    }

    #[test]
    fn env_flag_defaults_to_enabled_when_unset() {
        assert!(env_flag_enabled("REPLAY_CLI_TEST_FLAG_THAT_IS_NEVER_SET"));
    }
}
