//! JSON-RPC plumbing for the aria2 backend.
//!
//! aria2 speaks JSON-RPC 2.0 over HTTP POST and returns every numeric
//! field as a decimal string; the raw response types here absorb that
//! quirk before the typed [`JobStatus`](crate::types::JobStatus) is built.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::PathBuf;

use crate::error::{BackendError, Error, Result};
use crate::types::{Gid, JobState, JobStatus};

/// Fields requested from `aria2.tellStatus` and the `tell*` list calls
pub(super) const STATUS_KEYS: &[&str] = &[
    "gid",
    "status",
    "totalLength",
    "completedLength",
    "downloadSpeed",
    "numSeeders",
    "errorMessage",
    "followedBy",
    "dir",
    "files",
    "bittorrent",
];

#[derive(Serialize)]
pub(super) struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: &'static str,
    pub method: &'a str,
    pub params: Value,
}

#[derive(Deserialize)]
pub(super) struct RpcResponse {
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
pub(super) struct RpcErrorBody {
    pub code: i64,
    pub message: String,
}

impl RpcErrorBody {
    pub(super) fn into_error(self, gid: Option<&Gid>) -> Error {
        if let Some(gid) = gid {
            if self.message.contains("not found") {
                return BackendError::JobNotFound(gid.clone()).into();
            }
        }
        BackendError::Rpc {
            code: self.code,
            message: self.message,
        }
        .into()
    }
}

/// Raw `tellStatus` payload as aria2 serializes it
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct RawStatus {
    pub gid: String,
    pub status: String,
    #[serde(default)]
    pub total_length: Option<String>,
    #[serde(default)]
    pub completed_length: Option<String>,
    #[serde(default)]
    pub download_speed: Option<String>,
    #[serde(default)]
    pub num_seeders: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub followed_by: Option<Vec<String>>,
    #[serde(default)]
    pub dir: Option<String>,
    #[serde(default)]
    pub files: Vec<RawFile>,
    #[serde(default)]
    pub bittorrent: Option<RawBittorrent>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawFile {
    #[serde(default)]
    pub path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawBittorrent {
    #[serde(default)]
    pub info: Option<RawBtInfo>,
}

#[derive(Debug, Deserialize)]
pub(super) struct RawBtInfo {
    #[serde(default)]
    pub name: Option<String>,
}

fn parse_u64(field: &Option<String>) -> u64 {
    field
        .as_deref()
        .and_then(|s| s.parse().ok())
        .unwrap_or(0)
}

impl RawStatus {
    /// Human-readable name: torrent name, else the first file's name,
    /// else the gid itself.
    fn name(&self) -> String {
        if let Some(name) = self
            .bittorrent
            .as_ref()
            .and_then(|bt| bt.info.as_ref())
            .and_then(|info| info.name.clone())
        {
            return name;
        }
        if let Some(path) = self.files.first().and_then(|f| f.path.as_deref()) {
            if let Some(file_name) = std::path::Path::new(path).file_name() {
                return file_name.to_string_lossy().into_owned();
            }
        }
        self.gid.clone()
    }

    pub(super) fn into_status(self) -> Result<JobStatus> {
        let name = self.name();
        let is_torrent = self.bittorrent.is_some();
        let num_seeders = if is_torrent {
            Some(parse_u64(&self.num_seeders))
        } else {
            None
        };

        Ok(JobStatus {
            name,
            state: JobState::parse(&self.status),
            completed_bytes: parse_u64(&self.completed_length),
            total_bytes: parse_u64(&self.total_length),
            download_speed: parse_u64(&self.download_speed),
            num_seeders,
            num_files: self.files.len(),
            dir: PathBuf::from(self.dir.unwrap_or_default()),
            followed_by: self
                .followed_by
                .unwrap_or_default()
                .into_iter()
                .map(Gid::from)
                .collect(),
            error_message: self.error_message.filter(|m| !m.is_empty()),
            is_torrent,
            gid: Gid::from(self.gid),
        })
    }
}
