//! JSON-file-backed persistence
//!
//! Three small stores, each one JSON document on disk:
//! - [`SlotStore`] — the single-entry record of the system-wide active
//!   download (presence = busy, absence = free)
//! - [`QueueStore`] — per-user ordered URL queues
//! - [`ChannelStore`] — the per-guild channel allowlist
//!
//! All stores tolerate a missing file on read and create parent
//! directories on write. They are thin data wrappers; the pipeline owns
//! when they are written and deleted.

mod channels;
mod queue;
mod slot;

pub use channels::ChannelStore;
pub use queue::{QueueStore, UserQueue};
pub use slot::{SlotRecord, SlotStore};

use std::path::Path;

use crate::error::Result;

/// Write a JSON document atomically enough for our purposes:
/// parent directories are created, then the file is replaced in one write.
async fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let bytes = serde_json::to_vec_pretty(value)?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}

/// Read and parse a JSON document; `Ok(None)` when the file does not exist.
async fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match tokio::fs::read(path).await {
        Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e.into()),
    }
}
