//! Error taxonomy shared across the registry, reporter, and upload pipeline.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

use crate::recording::RecordingStatus;

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the recording registry and upload pipeline.
///
/// Configuration-shape problems and best-effort source reads are *not*
/// represented here: they degrade to logged warnings with fallback
/// behavior and never fail the caller.
#[derive(Debug, Error)]
pub enum Error {
    /// A status change not permitted by the recording state machine.
    /// Registry state is left untouched when this is returned.
    #[error("invalid status transition for recording {id}: {from} -> {to}")]
    InvalidTransition {
        /// The recording whose status change was rejected.
        id: String,
        /// Status the entry currently holds.
        from: RecordingStatus,
        /// Status the caller attempted to move to.
        to: RecordingStatus,
    },

    /// Filesystem failure while reading or writing the recording
    /// directory, the journal, or a metadata file.
    #[error("registry I/O failure at {path}: {source}")]
    RegistryIo {
        /// The path involved in the failed operation.
        path: PathBuf,
        /// The underlying filesystem error.
        #[source]
        source: io::Error,
    },

    /// A single failed network attempt. The retry loop absorbs these
    /// until attempts are exhausted.
    #[error("upload attempt failed: {message}")]
    TransientUpload {
        /// Description of the failed attempt.
        message: String,
    },

    /// All retry attempts for a recording were exhausted. The entry is
    /// returned to a retry-eligible status, never left in-progress.
    #[error("upload of recording {id} failed after retries: {message}")]
    FatalUpload {
        /// The recording that could not be uploaded.
        id: String,
        /// The last attempt's failure.
        message: String,
    },

    /// No recording with the given id exists in the registry.
    #[error("unknown recording {id}")]
    UnknownRecording {
        /// The id that was looked up.
        id: String,
    },

    /// A caller-supplied argument that cannot be acted on (malformed
    /// recording id, upload of an unusable recording, missing
    /// transition data).
    #[error("{message}")]
    InvalidArgument {
        /// Description of the rejected argument.
        message: String,
    },

    /// Process-level configuration failure (e.g. no home directory to
    /// root the default recording directory under).
    #[error("configuration error: {message}")]
    Config {
        /// Description of the configuration problem.
        message: String,
    },

    /// A payload could not be serialized or deserialized.
    #[error("malformed JSON payload: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Helper for wrapping a filesystem error with the path it occurred at.
    pub(crate) fn registry_io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::RegistryIo { path: path.into(), source }
    }
}
