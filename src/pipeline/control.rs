//! Cancellation, slot status, and the queue / channel commands.

use tracing::{info, warn};

use crate::error::Result;
use crate::store::{SlotRecord, UserQueue};
use crate::types::RunContext;

use super::HarvestPipeline;

/// Outcome of a cancellation request
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CancelOutcome {
    /// Nothing is running
    Idle,
    /// The latch was tripped; the running pipeline stops at its next check
    Requested,
    /// The caller does not own the active download
    NotOwner {
        /// User id of the slot owner
        owner: String,
    },
}

impl HarvestPipeline {
    /// Request cancellation of the active download.
    ///
    /// Only the user who started the download may cancel it; the latch is
    /// tripped and the running pipeline stops at its next cancel check,
    /// then runs its normal cleanup.
    pub async fn cancel(&self, ctx: &RunContext) -> Result<CancelOutcome> {
        let Some(record) = self.slot.load().await? else {
            return Ok(CancelOutcome::Idle);
        };
        if !record.owned_by(ctx) {
            warn!(
                requester = %ctx.user_id,
                owner = %record.user_id,
                "cancel request denied, caller does not own the slot"
            );
            return Ok(CancelOutcome::NotOwner {
                owner: record.user_id,
            });
        }

        info!(gid = %record.gid, user_id = %ctx.user_id, "cancellation requested");
        self.cancel.set();
        Ok(CancelOutcome::Requested)
    }

    /// Unconditionally trip the cancel latch, bypassing the owner check
    pub fn force_cancel(&self) {
        info!("forced cancellation requested");
        self.cancel.set();
    }

    /// The current slot record, if a download is active
    pub async fn slot_status(&self) -> Result<Option<SlotRecord>> {
        self.slot.load().await
    }

    /// Add links to a user's queue; returns how many were actually new
    pub async fn queue_add(&self, ctx: &RunContext, links: &[String]) -> Result<usize> {
        self.queue.add(&ctx.user_id, links).await
    }

    /// A user's pending links, in submission order
    pub async fn queue_links(&self, ctx: &RunContext) -> Result<Vec<String>> {
        Ok(self
            .queue
            .get(&ctx.user_id)
            .await?
            .map(|entry: UserQueue| entry.links)
            .unwrap_or_default())
    }

    /// Remove specific links from a user's queue; returns how many matched
    pub async fn queue_remove(&self, ctx: &RunContext, links: &[String]) -> Result<usize> {
        self.queue.remove(&ctx.user_id, links).await
    }

    /// Drop a user's queue entirely
    pub async fn queue_clear(&self, ctx: &RunContext) -> Result<()> {
        self.queue.clear(&ctx.user_id).await
    }

    /// Permit pipeline commands in a channel
    pub async fn allow_channel(&self, guild_id: &str, channel_id: &str) -> Result<()> {
        self.channels.allow(guild_id, channel_id).await
    }

    /// Revoke a channel's permission
    pub async fn disallow_channel(&self, guild_id: &str, channel_id: &str) -> Result<()> {
        self.channels.disallow(guild_id, channel_id).await
    }

    /// Whether pipeline commands are permitted in a channel.
    /// Deny-by-default: an absent store file permits nothing.
    pub async fn channel_allowed(&self, guild_id: &str, channel_id: &str) -> Result<bool> {
        self.channels.is_allowed(guild_id, channel_id).await
    }
}
