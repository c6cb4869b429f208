//! Configuration types for mkv-harvest

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// aria2 RPC endpoint configuration
///
/// Groups settings for reaching the download backend.
/// Used as a nested sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BackendConfig {
    /// JSON-RPC endpoint URL (default: "http://localhost:6800/jsonrpc")
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,

    /// RPC secret token (None = no authentication)
    #[serde(default)]
    pub secret: Option<String>,

    /// Interval between status polls (default: 2s)
    #[serde(default = "default_poll_interval")]
    pub poll_interval: Duration,

    /// Timeout for a single RPC round trip (default: 20s)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            secret: None,
            poll_interval: default_poll_interval(),
            request_timeout: default_request_timeout(),
        }
    }
}

/// Directory and persisted-store layout
///
/// The temp directory contains both the download and extract directories;
/// clearing it is the pipeline's blanket cleanup. The three store files are
/// plain JSON documents consumed by the file-backed stores.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Root temporary directory (default: "./temp")
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,

    /// Directory the backend downloads into (default: "./temp/downloads")
    #[serde(default = "default_download_dir")]
    pub download_dir: PathBuf,

    /// Directory extraction works in (default: "./temp/extracted")
    #[serde(default = "default_extract_dir")]
    pub extract_dir: PathBuf,

    /// Single-slot record file (default: "./data/current_download.json")
    #[serde(default = "default_slot_file")]
    pub slot_file: PathBuf,

    /// Per-user URL queue file (default: "./data/queue.json")
    #[serde(default = "default_queue_file")]
    pub queue_file: PathBuf,

    /// Channel allowlist file (default: "./data/allowed_channels.json")
    #[serde(default = "default_channels_file")]
    pub channels_file: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            temp_dir: default_temp_dir(),
            download_dir: default_download_dir(),
            extract_dir: default_extract_dir(),
            slot_file: default_slot_file(),
            queue_file: default_queue_file(),
            channels_file: default_channels_file(),
        }
    }
}

/// External tool paths (mkvmerge, mkvextract, mediainfo)
///
/// When a path is not set explicitly and `search_path` is enabled, the
/// binary is located via the system PATH at service construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ToolsConfig {
    /// Explicit path to mkvmerge (None = discover)
    #[serde(default)]
    pub mkvmerge_path: Option<PathBuf>,

    /// Explicit path to mkvextract (None = discover)
    #[serde(default)]
    pub mkvextract_path: Option<PathBuf>,

    /// Explicit path to mediainfo (None = discover)
    #[serde(default)]
    pub mediainfo_path: Option<PathBuf>,

    /// Search PATH for binaries not configured explicitly (default: true)
    #[serde(default = "default_true")]
    pub search_path: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            mkvmerge_path: None,
            mkvextract_path: None,
            mediainfo_path: None,
            search_path: true,
        }
    }
}

/// Upload constraints of the chat surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Attachment size ceiling in bytes (default: 10 MiB).
    ///
    /// Archives above this are split into parts of at most this size.
    #[serde(default = "default_attachment_limit")]
    pub attachment_limit: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            attachment_limit: default_attachment_limit(),
        }
    }
}

/// Top-level configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// aria2 RPC endpoint settings
    #[serde(default)]
    pub backend: BackendConfig,

    /// Directory and store layout
    #[serde(default)]
    pub storage: StorageConfig,

    /// External tool paths
    #[serde(default)]
    pub tools: ToolsConfig,

    /// Chat-surface upload constraints
    #[serde(default)]
    pub upload: UploadConfig,
}

fn default_rpc_url() -> String {
    "http://localhost:6800/jsonrpc".to_string()
}

fn default_poll_interval() -> Duration {
    Duration::from_secs(2)
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_temp_dir() -> PathBuf {
    PathBuf::from("./temp")
}

fn default_download_dir() -> PathBuf {
    PathBuf::from("./temp/downloads")
}

fn default_extract_dir() -> PathBuf {
    PathBuf::from("./temp/extracted")
}

fn default_slot_file() -> PathBuf {
    PathBuf::from("./data/current_download.json")
}

fn default_queue_file() -> PathBuf {
    PathBuf::from("./data/queue.json")
}

fn default_channels_file() -> PathBuf {
    PathBuf::from("./data/allowed_channels.json")
}

fn default_attachment_limit() -> u64 {
    10 * 1024 * 1024
}

fn default_true() -> bool {
    true
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sensible() {
        let config = Config::default();
        assert_eq!(config.backend.rpc_url, "http://localhost:6800/jsonrpc");
        assert_eq!(config.backend.poll_interval, Duration::from_secs(2));
        assert_eq!(config.upload.attachment_limit, 10 * 1024 * 1024);
        assert!(config.tools.search_path);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let config: Config = serde_json::from_str(
            r#"{ "backend": { "rpc_url": "http://aria2:6800/jsonrpc", "secret": "s3cret" } }"#,
        )
        .unwrap();
        assert_eq!(config.backend.rpc_url, "http://aria2:6800/jsonrpc");
        assert_eq!(config.backend.secret.as_deref(), Some("s3cret"));
        assert_eq!(config.storage.temp_dir, PathBuf::from("./temp"));
        assert_eq!(config.upload.attachment_limit, 10 * 1024 * 1024);
    }
}
