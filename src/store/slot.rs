//! Global single-slot tracker.
//!
//! Persists which user/guild currently owns the one active download slot.
//! This record is the primary mutual-exclusion mechanism: the pipeline
//! rejects new submissions while it exists and deletes it unconditionally
//! at the end of every run.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

use crate::error::Result;
use crate::types::{Gid, RunContext};

/// Persisted record of the system-wide active download
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRecord {
    /// Backend handle of the active job
    pub gid: Gid,
    /// User who started the download
    pub user_id: String,
    /// Guild the download was started from
    pub guild_id: String,
    /// When the slot was acquired
    pub started_at: DateTime<Utc>,
}

impl SlotRecord {
    /// Build a record for a freshly submitted job
    pub fn new(gid: Gid, ctx: &RunContext) -> Self {
        Self {
            gid,
            user_id: ctx.user_id.clone(),
            guild_id: ctx.guild_id.clone(),
            started_at: Utc::now(),
        }
    }

    /// Whether this context owns the slot
    pub fn owned_by(&self, ctx: &RunContext) -> bool {
        self.user_id == ctx.user_id
    }
}

/// File-backed store for the single [`SlotRecord`]
#[derive(Clone, Debug)]
pub struct SlotStore {
    path: PathBuf,
}

impl SlotStore {
    /// Create a store backed by the given file path
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Persist the record, marking the slot as held
    pub async fn save(&self, record: &SlotRecord) -> Result<()> {
        debug!(gid = %record.gid, user_id = %record.user_id, "acquiring download slot");
        super::write_json(&self.path, record).await
    }

    /// Load the current record; `None` means the slot is free.
    ///
    /// A corrupt file is treated as free — a stale unreadable record must
    /// not wedge the system permanently. The corruption is logged.
    pub async fn load(&self) -> Result<Option<SlotRecord>> {
        match super::read_json::<SlotRecord>(&self.path).await {
            Ok(record) => Ok(record),
            Err(crate::error::Error::Serialization(e)) => {
                tracing::warn!(path = %self.path.display(), error = %e, "slot record unreadable, treating as free");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Delete the record, marking the slot as free. Idempotent.
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!(path = %self.path.display(), "download slot released");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
