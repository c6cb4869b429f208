//! Backend poll loop and the torrent phase transition.

use futures::StreamExt;
use std::path::PathBuf;
use std::pin::pin;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{DownloadPhase, Event, Gid, JobState, JobStatus};

use super::HarvestPipeline;

impl HarvestPipeline {
    /// Poll the submitted job to completion and return the directory
    /// holding the fetched content.
    ///
    /// A metadata fetch that completes with a `followed_by` child re-binds
    /// the loop to the child before the run advances to extraction; the
    /// payload lands on disk only when the child completes.
    pub(super) async fn drive(&self, gid: &Gid, phase: DownloadPhase) -> Result<PathBuf> {
        let status = self.poll_until_complete(gid, phase).await?;

        let status = match status.followed_by.first() {
            Some(child) => {
                info!(parent = %gid, child = %child, "metadata complete, following payload job");
                self.emit_event(Event::PhaseChanged {
                    parent: gid.clone(),
                    child: child.clone(),
                });
                self.poll_until_complete(child, DownloadPhase::Payload)
                    .await?
            }
            None => status,
        };

        info!(gid = %status.gid, dir = %status.dir.display(), "download complete");
        self.emit_event(Event::DownloadComplete {
            gid: status.gid.clone(),
            dir: status.dir.clone(),
        });
        Ok(status.dir)
    }

    /// One gid to completion: fresh snapshot, progress event, paced sleep.
    ///
    /// The cancel latch is observed before every poll and during every
    /// sleep; a backend-reported error state fails the run with the
    /// backend's own message.
    async fn poll_until_complete(&self, gid: &Gid, phase: DownloadPhase) -> Result<JobStatus> {
        let token = self.cancel.token();
        let interval = self.config.backend.poll_interval;
        let mut stream = pin!(self.backend.poll_stream(gid.clone()));

        loop {
            if self.cancel.is_set() {
                warn!(gid = %gid, "cancellation observed during poll loop");
                return Err(Error::Cancelled);
            }

            let status = match stream.next().await {
                Some(status) => status?,
                // The stream only ends after a complete snapshot, which
                // returns below; hitting this means the backend lied
                None => {
                    return Err(Error::Other(format!(
                        "status stream for {} ended unexpectedly",
                        gid
                    )));
                }
            };

            match status.state {
                JobState::Error => {
                    let message = status
                        .error_message
                        .unwrap_or_else(|| "unknown backend error".to_string());
                    return Err(Error::JobFailed(message));
                }
                JobState::Removed => {
                    return Err(Error::JobFailed(
                        "download was removed from the backend".to_string(),
                    ));
                }
                _ => {}
            }

            self.emit_event(Event::Progress {
                status: status.clone(),
                phase,
            });

            if status.state.is_complete() {
                return Ok(status);
            }

            tokio::select! {
                _ = token.cancelled() => {
                    warn!(gid = %gid, "cancellation observed during poll sleep");
                    return Err(Error::Cancelled);
                }
                _ = tokio::time::sleep(interval) => {}
            }
        }
    }
}
