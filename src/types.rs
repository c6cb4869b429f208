//! Core types and events for mkv-harvest

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Backend-assigned handle identifying one download transfer.
///
/// aria2 calls this a GID — an opaque hex string. It is never parsed,
/// only passed back to the backend.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Gid(pub String);

impl Gid {
    /// Borrow the raw gid string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Gid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for Gid {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Gid {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Backend-reported state of one job
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    /// Transfer in progress
    Active,
    /// Queued inside the backend
    Waiting,
    /// Paused inside the backend
    Paused,
    /// Backend reported a failure
    Error,
    /// Transfer finished successfully
    Complete,
    /// Removed before completion
    Removed,
}

impl JobState {
    /// Parse the backend's status string.
    ///
    /// Unknown strings map to `Waiting` — the poll loop treats anything
    /// non-terminal as in-progress, so an unrecognized state degrades to
    /// "keep polling" rather than a hard failure.
    pub fn parse(s: &str) -> Self {
        match s {
            "active" => JobState::Active,
            "waiting" => JobState::Waiting,
            "paused" => JobState::Paused,
            "error" => JobState::Error,
            "complete" => JobState::Complete,
            "removed" => JobState::Removed,
            _ => JobState::Waiting,
        }
    }

    /// Whether this state ends the poll loop
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Error | JobState::Complete | JobState::Removed)
    }

    /// Whether the transfer finished successfully
    pub fn is_complete(self) -> bool {
        matches!(self, JobState::Complete)
    }
}

impl std::fmt::Display for JobState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            JobState::Active => "active",
            JobState::Waiting => "waiting",
            JobState::Paused => "paused",
            JobState::Error => "error",
            JobState::Complete => "complete",
            JobState::Removed => "removed",
        };
        write!(f, "{}", s)
    }
}

/// Which phase of a transfer a poll loop is bound to
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DownloadPhase {
    /// Torrent metadata fetch (before the payload transfer exists)
    Metadata,
    /// Torrent payload transfer (the `followed_by` child job)
    Payload,
    /// Plain HTTP/FTP fetch
    Direct,
}

impl std::fmt::Display for DownloadPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DownloadPhase::Metadata => "metadata",
            DownloadPhase::Payload => "payload",
            DownloadPhase::Direct => "direct",
        };
        write!(f, "{}", s)
    }
}

/// One polled snapshot of a job.
///
/// Constructed only from backend responses; the backend is the source of
/// truth and no snapshot is cached across polls.
#[derive(Clone, Debug)]
pub struct JobStatus {
    /// Backend handle
    pub gid: Gid,
    /// Human-readable name (torrent name or first file name)
    pub name: String,
    /// Current state
    pub state: JobState,
    /// Bytes transferred so far
    pub completed_bytes: u64,
    /// Total bytes (0 until known)
    pub total_bytes: u64,
    /// Current transfer rate in bytes per second
    pub download_speed: u64,
    /// Seeder count for torrent transfers
    pub num_seeders: Option<u64>,
    /// Number of files in the transfer
    pub num_files: usize,
    /// Destination directory reported by the backend
    pub dir: PathBuf,
    /// Child job gids spawned when a metadata fetch completes
    pub followed_by: Vec<Gid>,
    /// Backend error message, when `state` is `Error`
    pub error_message: Option<String>,
    /// Whether the backend classifies this as a torrent transfer
    pub is_torrent: bool,
}

impl JobStatus {
    /// Progress as a fraction in `[0.0, 1.0]`
    pub fn progress(&self) -> f64 {
        if self.total_bytes == 0 {
            0.0
        } else {
            self.completed_bytes as f64 / self.total_bytes as f64
        }
    }

    /// Estimated time remaining at the current rate, when computable
    pub fn eta(&self) -> Option<Duration> {
        if self.download_speed == 0 || self.total_bytes <= self.completed_bytes {
            return None;
        }
        let remaining = self.total_bytes - self.completed_bytes;
        Some(Duration::from_secs(remaining / self.download_speed.max(1)))
    }
}

/// Output category of one extraction pass
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Subtitle tracks, zipped
    Subtitles,
    /// Declared attachments (fonts, cover art), zipped
    Attachments,
    /// Chapter table as one XML file
    Chapters,
    /// Plain-text container info report
    Info,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Category::Subtitles => "subtitles",
            Category::Attachments => "attachments",
            Category::Chapters => "chapters",
            Category::Info => "info",
        };
        write!(f, "{}", s)
    }
}

/// Result of extracting one category from one file.
///
/// `paths` holds the uploadable artifacts — a single archive, or its split
/// parts when the archive exceeded the size ceiling. `count` is always the
/// number of logical items extracted (tracks or attachments), never the
/// number of archive parts.
#[derive(Clone, Debug)]
pub struct ExtractedSet {
    /// Category these artifacts belong to
    pub category: Category,
    /// Uploadable artifact paths, each at most the configured ceiling
    pub paths: Vec<PathBuf>,
    /// Pre-split count of extracted items
    pub count: usize,
}

/// Extracted chapter table
#[derive(Clone, Debug)]
pub struct ChapterFile {
    /// Path to the chapters XML file
    pub path: PathBuf,
    /// Number of chapter entries declared by the container
    pub count: usize,
}

/// Per-file outcome delivered to the chat layer, in discovery order
#[derive(Clone, Debug)]
pub struct FileReport {
    /// File name relative to the download directory
    pub file_name: String,
    /// Number of subtitle tracks extracted
    pub subtitles: usize,
    /// Number of attachments extracted
    pub attachments: usize,
    /// Number of chapter entries extracted
    pub chapters: usize,
    /// Uploadable artifact paths for this file, all categories
    pub artifacts: Vec<PathBuf>,
    /// Error text when processing this file failed
    pub error: Option<String>,
}

impl FileReport {
    /// Report for a file that failed before producing any artifacts
    pub fn failed(file_name: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            subtitles: 0,
            attachments: 0,
            chapters: 0,
            artifacts: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Pipeline events broadcast to all subscribers.
///
/// The chat layer subscribes and renders these as message edits; every
/// terminal outcome of a run maps to exactly one of `Completed`, `Failed`,
/// or `Cancelled`.
#[derive(Clone, Debug)]
pub enum Event {
    /// A URL was submitted to the backend
    DownloadStarted {
        /// Backend handle of the new job
        gid: Gid,
        /// The submitted URL
        url: String,
    },

    /// One fresh poll snapshot
    Progress {
        /// Snapshot read from the backend
        status: JobStatus,
        /// Phase the poll loop is bound to
        phase: DownloadPhase,
    },

    /// A completed metadata fetch spawned the payload transfer
    PhaseChanged {
        /// The metadata job that completed
        parent: Gid,
        /// The payload job now being polled
        child: Gid,
    },

    /// The transfer finished; extraction starts next
    DownloadComplete {
        /// Backend handle of the finished job
        gid: Gid,
        /// Directory containing the fetched content
        dir: PathBuf,
    },

    /// Matroska files discovered under the destination, sorted
    FilesListed {
        /// File names relative to the destination directory
        names: Vec<String>,
    },

    /// One file finished processing (successfully or not)
    FileProcessed {
        /// 1-based position in the batch
        index: usize,
        /// Batch size
        total: usize,
        /// Outcome for this file
        report: FileReport,
    },

    /// Terminal: the run finished and cleanup completed
    Completed,

    /// Terminal: the run failed
    Failed {
        /// User-visible failure message
        message: String,
    },

    /// Terminal: cooperative cancellation was observed
    Cancelled,

    /// Queue processing started
    QueueStarted {
        /// Number of URLs in the snapshot being processed
        total: usize,
    },

    /// One queued URL finished
    QueueItemDone {
        /// 1-based position in the queue snapshot
        index: usize,
        /// Snapshot size
        total: usize,
        /// The URL that finished
        url: String,
        /// Whether this URL completed successfully
        success: bool,
        /// Failure message for unsuccessful URLs
        message: Option<String>,
    },

    /// Queue processing finished (all URLs attempted)
    QueueFinished,
}

/// Identity of the user driving one pipeline invocation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunContext {
    /// Chat-platform user id
    pub user_id: String,
    /// Chat-platform guild (server) id
    pub guild_id: String,
}

impl RunContext {
    /// Create a run context
    pub fn new(user_id: impl Into<String>, guild_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            guild_id: guild_id.into(),
        }
    }
}
