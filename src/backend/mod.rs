//! aria2 download driver.
//!
//! Thin client over the aria2 JSON-RPC interface: submit URLs, poll job
//! status, classify terminal states, and perform blanket removal during
//! cleanup. The backend is the source of truth for all job state; this
//! module never caches a snapshot across polls.
//!
//! Torrent submissions go through a two-phase lifecycle: the first job
//! fetches metadata and, on completion, names the payload job in its
//! `followed_by` list. Re-binding to that child is the orchestrator's
//! responsibility; the driver only surfaces the field.

mod rpc;


use futures::Stream;
use serde_json::{Value, json};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::config::BackendConfig;
use crate::error::{BackendError, Error, Result};
use crate::types::{DownloadPhase, Gid, JobStatus};

use rpc::{RpcRequest, RpcResponse, STATUS_KEYS};

/// Client for the aria2 JSON-RPC backend
#[derive(Clone)]
pub struct Aria2Client {
    http: reqwest::Client,
    rpc_url: String,
    secret: Option<String>,
    poll_interval: std::time::Duration,
    download_dir: PathBuf,
}

impl Aria2Client {
    /// Create a client for the configured endpoint
    pub fn new(config: &BackendConfig, download_dir: PathBuf) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            rpc_url: config.rpc_url.clone(),
            secret: config.secret.clone(),
            poll_interval: config.poll_interval,
            download_dir,
        })
    }

    /// Build the params array, prepending the secret token when configured
    fn params(&self, rest: Vec<Value>) -> Value {
        let mut params = Vec::with_capacity(rest.len() + 1);
        if let Some(secret) = &self.secret {
            params.push(json!(format!("token:{}", secret)));
        }
        params.extend(rest);
        Value::Array(params)
    }

    /// One JSON-RPC round trip. `gid` is used only to classify
    /// "not found" errors.
    async fn call(&self, method: &str, rest: Vec<Value>, gid: Option<&Gid>) -> Result<Value> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: "mkv-harvest",
            method,
            params: self.params(rest),
        };

        let response = self
            .http
            .post(&self.rpc_url)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        let body: RpcResponse = response.json().await.map_err(|e| {
            Error::Backend(BackendError::MalformedResponse(format!(
                "HTTP {}: {}",
                status, e
            )))
        })?;

        if let Some(error) = body.error {
            return Err(error.into_error(gid));
        }
        body.result.ok_or_else(|| {
            Error::Backend(BackendError::MalformedResponse(
                "response carried neither result nor error".to_string(),
            ))
        })
    }

    /// Connectivity probe via `aria2.getVersion`.
    ///
    /// Any failure — transport, HTTP status, RPC error — is collapsed into
    /// `BackendUnreachable` so callers can fail fast before acquiring state.
    pub async fn check_connection(&self) -> Result<String> {
        let result = self
            .call("aria2.getVersion", Vec::new(), None)
            .await
            .map_err(|e| Error::BackendUnreachable(e.to_string()))?;
        let version = result
            .get("version")
            .and_then(Value::as_str)
            .unwrap_or("unknown")
            .to_string();
        info!(version, "connected to aria2 RPC server");
        Ok(version)
    }

    /// Submit a URL for download, routing magnet references to the magnet
    /// path and everything else to the direct-URI path. Returns the new
    /// job's gid and the phase its poll loop starts in.
    pub async fn submit(&self, url: &str) -> Result<(Gid, DownloadPhase)> {
        tokio::fs::create_dir_all(&self.download_dir).await?;

        if url.starts_with("magnet:") {
            let gid = self.add_magnet(url).await?;
            Ok((gid, DownloadPhase::Metadata))
        } else {
            let gid = self.add_uri(url).await?;
            Ok((gid, DownloadPhase::Direct))
        }
    }

    async fn add_magnet(&self, magnet: &str) -> Result<Gid> {
        debug!("submitting magnet reference");
        self.add(magnet).await
    }

    async fn add_uri(&self, uri: &str) -> Result<Gid> {
        // Reject garbage before it reaches the backend
        url::Url::parse(uri).map_err(|e| Error::Other(format!("invalid URL '{}': {}", uri, e)))?;
        debug!("submitting direct URI");
        self.add(uri).await
    }

    async fn add(&self, uri: &str) -> Result<Gid> {
        let options = json!({ "dir": self.download_dir.to_string_lossy() });
        let result = self
            .call("aria2.addUri", vec![json!([uri]), options], None)
            .await?;
        let gid = result
            .as_str()
            .map(Gid::from)
            .ok_or_else(|| BackendError::MalformedResponse("addUri returned no gid".to_string()))?;
        info!(gid = %gid, "download submitted");
        Ok(gid)
    }

    /// One fresh status snapshot; a single network round trip.
    pub async fn status(&self, gid: &Gid) -> Result<JobStatus> {
        let result = self
            .call(
                "aria2.tellStatus",
                vec![json!(gid.as_str()), json!(STATUS_KEYS)],
                Some(gid),
            )
            .await?;
        let raw: rpc::RawStatus = serde_json::from_value(result)
            .map_err(|e| BackendError::MalformedResponse(e.to_string()))?;
        raw.into_status()
    }

    /// Lazy, unbounded sequence of fresh status snapshots.
    ///
    /// Each element is read from the backend when polled; the stream ends
    /// after yielding a snapshot whose state is complete. The caller owns
    /// pacing and cancellation — this stream never sleeps.
    pub fn poll_stream(&self, gid: Gid) -> impl Stream<Item = Result<JobStatus>> + '_ {
        futures::stream::unfold((gid, false), move |(gid, done)| async move {
            if done {
                return None;
            }
            let item = self.status(&gid).await;
            let done = matches!(&item, Ok(s) if s.state.is_complete());
            Some((item, (gid, done)))
        })
    }

    /// Poll at the configured interval until the job completes; returns
    /// the directory containing the fetched content.
    ///
    /// No internal timeout — cancellation is enforced by the caller. A
    /// backend-reported error state fails with the backend's message.
    pub async fn wait_for_completion(&self, gid: &Gid) -> Result<PathBuf> {
        loop {
            let status = self.status(gid).await?;
            if status.state.is_complete() {
                return Ok(status.dir);
            }
            if status.state == crate::types::JobState::Error {
                return Err(Error::JobFailed(
                    status
                        .error_message
                        .unwrap_or_else(|| "unknown backend error".to_string()),
                ));
            }
            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Remove one job. Idempotent — a gid the backend no longer knows is
    /// treated as already removed.
    pub async fn remove(&self, gid: &Gid, force: bool) -> Result<()> {
        let method = if force { "aria2.forceRemove" } else { "aria2.remove" };
        match self.call(method, vec![json!(gid.as_str())], Some(gid)).await {
            Ok(_) => Ok(()),
            Err(Error::Backend(e)) if e.is_not_found() => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Blanket cleanup: remove every active, waiting, and stopped job.
    ///
    /// Never fails the caller — individual removal errors are logged and
    /// skipped, because cleanup runs on error paths where a secondary
    /// failure must not mask the original one.
    pub async fn remove_all(&self, force: bool) {
        for (method, list_params) in [
            ("aria2.tellActive", vec![json!(STATUS_KEYS)]),
            (
                "aria2.tellWaiting",
                vec![json!(0), json!(1000), json!(STATUS_KEYS)],
            ),
            (
                "aria2.tellStopped",
                vec![json!(0), json!(1000), json!(STATUS_KEYS)],
            ),
        ] {
            let jobs = match self.call(method, list_params, None).await {
                Ok(Value::Array(jobs)) => jobs,
                Ok(_) => Vec::new(),
                Err(e) => {
                    warn!(method, error = %e, "failed to list jobs during cleanup");
                    continue;
                }
            };

            for job in jobs {
                let Some(gid) = job.get("gid").and_then(Value::as_str).map(Gid::from) else {
                    continue;
                };
                let result = if method == "aria2.tellStopped" {
                    // Stopped jobs are history entries; drop the result record
                    self.call(
                        "aria2.removeDownloadResult",
                        vec![json!(gid.as_str())],
                        Some(&gid),
                    )
                    .await
                    .map(|_| ())
                } else {
                    self.remove(&gid, force).await
                };
                if let Err(e) = result {
                    warn!(gid = %gid, error = %e, "failed to remove job during cleanup");
                }
            }
        }

        if let Err(e) = self.call("aria2.purgeDownloadResult", Vec::new(), None).await {
            warn!(error = %e, "failed to purge download results");
        }
    }
}
