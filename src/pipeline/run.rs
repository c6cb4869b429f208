//! Top-level run entry points.
//!
//! `process_url` and `process_queue` are the outermost boundary: they
//! run the state machine and translate every internal outcome into
//! exactly one terminal event. Callers always get both the `Result` and
//! the event; nothing below this layer emits terminal events.

use std::sync::Arc;
use tracing::{error, info, warn};

use crate::error::{Error, Result};
use crate::store::SlotRecord;
use crate::types::{Event, RunContext};

use super::HarvestPipeline;

impl HarvestPipeline {
    /// Download one URL and extract every Matroska file it produces.
    ///
    /// Runs the full state machine: connectivity probe, slot
    /// acquisition, submit, poll, extract, cleanup. Emits exactly one
    /// terminal event (`Completed`, `Failed`, or `Cancelled`) and
    /// returns the matching `Result`.
    pub async fn process_url(&self, ctx: &RunContext, url: &str) -> Result<()> {
        let result = self.attempt_url(ctx, url).await;
        self.emit_terminal(&result);
        result
    }

    /// Process every URL in the caller's persisted queue, one at a time.
    ///
    /// Snapshots the queue up front; later additions belong to the next
    /// run. Each URL goes through the same state machine as
    /// [`process_url`]; a failed URL is reported and the batch continues,
    /// a tripped cancel latch stops the batch and leaves the remaining
    /// URLs queued. Successfully processed URLs are removed from the
    /// persisted queue immediately, so a crash mid-batch loses no work.
    pub async fn process_queue(&self, ctx: &RunContext) -> Result<()> {
        let links = match self.queue.get(&ctx.user_id).await? {
            Some(entry) if !entry.links.is_empty() => entry.links,
            _ => {
                info!(user_id = %ctx.user_id, "queue is empty, nothing to process");
                self.emit_event(Event::QueueFinished);
                return Ok(());
            }
        };

        let total = links.len();
        info!(user_id = %ctx.user_id, total, "processing download queue");
        self.emit_event(Event::QueueStarted { total });

        for (index, url) in links.into_iter().enumerate() {
            let outcome = self.attempt_url(ctx, &url).await;
            let (success, message) = match &outcome {
                Ok(()) => {
                    if let Err(e) = self.queue.remove(&ctx.user_id, &[url.clone()]).await {
                        warn!(error = %e, "failed to remove finished link from the queue");
                    }
                    (true, None)
                }
                Err(Error::Cancelled) => {
                    self.emit_event(Event::Cancelled);
                    return Err(Error::Cancelled);
                }
                Err(e) => {
                    error!(url = %url, error = %e, "queued download failed");
                    (false, Some(e.to_string()))
                }
            };

            self.emit_event(Event::QueueItemDone {
                index: index + 1,
                total,
                url,
                success,
                message,
            });

            // A latch tripped late in the finished item stops the batch
            // before the next submission
            if self.cancel.is_set() {
                warn!(user_id = %ctx.user_id, "queue processing cancelled");
                self.emit_event(Event::Cancelled);
                return Err(Error::Cancelled);
            }
        }

        self.emit_event(Event::QueueFinished);
        Ok(())
    }

    /// One URL through the full state machine, without emitting terminal
    /// events. Shared by the single-URL and queue paths.
    async fn attempt_url(&self, ctx: &RunContext, url: &str) -> Result<()> {
        // Fail fast before acquiring anything
        self.backend.check_connection().await?;

        // Slot acquisition is atomic: the busy check, the submit, and the
        // record write all happen under one lock, so concurrent callers
        // cannot both observe a free slot. The guard is released as soon
        // as the record is on disk; losers get SlotBusy, they do not wait.
        let acquire = Arc::clone(&self.run_lock).lock_owned().await;

        if let Some(record) = self.slot.load().await? {
            info!(gid = %record.gid, owner = %record.user_id, "slot is busy, rejecting");
            return Err(Error::SlotBusy {
                gid: record.gid,
                user_id: record.user_id,
                guild_id: record.guild_id,
            });
        }

        let (gid, phase) = self.backend.submit(url).await?;
        self.emit_event(Event::DownloadStarted {
            gid: gid.clone(),
            url: url.to_string(),
        });

        // From here on the backend holds a job: every exit goes through cleanup
        let outcome = async {
            self.slot.save(&SlotRecord::new(gid.clone(), ctx)).await?;
            // Only the slot winner resets the latch; a cancel aimed at a
            // running job must survive a losing contender
            self.cancel.clear();
            drop(acquire);
            let dest = self.drive(&gid, phase).await?;
            self.harvest(&dest).await
        }
        .await;

        self.cleanup().await;
        outcome
    }

    /// Translate a run outcome into its single terminal event
    fn emit_terminal(&self, result: &Result<()>) {
        match result {
            Ok(()) => self.emit_event(Event::Completed),
            Err(Error::Cancelled) => self.emit_event(Event::Cancelled),
            Err(e) => self.emit_event(Event::Failed {
                message: e.to_string(),
            }),
        }
    }
}
