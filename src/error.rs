//! Error types for mkv-harvest
//!
//! This module provides the error taxonomy for the pipeline:
//! - Pre-acquisition failures that abort before any shared state exists
//!   (`BackendUnreachable`, `SlotBusy`)
//! - Pipeline-level failures that trigger the shared cleanup routine
//!   (`JobFailed`, `Cancelled`, `NoMediaFound`)
//! - Per-file / per-category failures that are absorbed at the narrowest
//!   scope (`Extract`) and never abort the batch

use std::path::PathBuf;
use thiserror::Error;

use crate::types::Gid;

/// Result type alias for mkv-harvest operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for mkv-harvest
///
/// Each variant carries enough context for the chat layer to render a
/// single user-visible message for the terminal outcome.
#[derive(Debug, Error)]
pub enum Error {
    /// The aria2 RPC endpoint did not respond to the connectivity probe.
    ///
    /// Raised before any download state is created, so no cleanup is needed.
    #[error("unable to connect to the aria2 RPC server: {0}")]
    BackendUnreachable(String),

    /// Another user already holds the global download slot.
    ///
    /// Raised before the backend is touched. Not logged as an error — this
    /// is an expected rejection, not a fault.
    #[error("a download is already in progress (gid {gid}, user {user_id})")]
    SlotBusy {
        /// Backend handle of the in-flight download
        gid: Gid,
        /// User who owns the slot
        user_id: String,
        /// Guild the slot was acquired from
        guild_id: String,
    },

    /// RPC-level backend error (malformed response, RPC error object, ...)
    #[error("backend error: {0}")]
    Backend(#[from] BackendError),

    /// The backend reported the job itself in an error state.
    ///
    /// Carries the backend's own error message; triggers full cleanup.
    #[error("download failed: {0}")]
    JobFailed(String),

    /// Cooperative cancellation was observed.
    #[error("operation cancelled")]
    Cancelled,

    /// The finished download contains no recognized Matroska files.
    #[error("no Matroska files (.mkv, .mk3d, .mka) found under {0}")]
    NoMediaFound(PathBuf),

    /// Probe or extraction failure for one file or one category.
    ///
    /// Always absorbed at the per-file / per-category scope; a value of
    /// this variant escaping the extraction loop is a bug.
    #[error("extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP transport error while talking to the backend
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

/// Errors from the aria2 JSON-RPC client
#[derive(Debug, Error)]
pub enum BackendError {
    /// The RPC endpoint returned a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    Rpc {
        /// JSON-RPC error code
        code: i64,
        /// JSON-RPC error message
        message: String,
    },

    /// The job handle is not known to the backend
    #[error("job {0} not found")]
    JobNotFound(Gid),

    /// The response body did not have the expected shape
    #[error("malformed backend response: {0}")]
    MalformedResponse(String),
}

impl BackendError {
    /// Whether this error means the job simply no longer exists.
    ///
    /// aria2 reports removals of unknown gids as an RPC error; `remove`
    /// and `remove_all` treat that as success.
    pub fn is_not_found(&self) -> bool {
        match self {
            BackendError::JobNotFound(_) => true,
            BackendError::Rpc { message, .. } => message.contains("not found"),
            BackendError::MalformedResponse(_) => false,
        }
    }
}

/// Probe and extraction errors (mkvmerge, mkvextract, mediainfo)
#[derive(Debug, Error)]
pub enum ExtractError {
    /// Container introspection failed (non-zero exit, bad JSON, or shape mismatch)
    #[error("probe failed for {path}: {reason}")]
    ProbeFailed {
        /// The file that could not be probed
        path: PathBuf,
        /// Why the probe failed
        reason: String,
    },

    /// An external tool invocation failed
    #[error("{tool} failed: {reason}")]
    ToolFailed {
        /// Name of the tool that failed (mkvextract, mediainfo, ...)
        tool: String,
        /// Captured stderr or spawn error
        reason: String,
    },

    /// The tool exited successfully but did not produce the expected file
    #[error("{tool} produced no output at {path}")]
    MissingOutput {
        /// Name of the tool
        tool: String,
        /// The output path that was expected
        path: PathBuf,
    },

    /// Building or splitting the output archive failed
    #[error("archive error for {path}: {reason}")]
    ArchiveFailed {
        /// The archive being built or split
        path: PathBuf,
        /// Why it failed
        reason: String,
    },
}
