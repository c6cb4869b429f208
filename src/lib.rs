//! # mkv-harvest
//!
//! Backend library for chat bots that download media and hand back the
//! interesting parts of Matroska containers: subtitle tracks, attachments
//! (fonts, cover art), and chapter tables.
//!
//! ## Design Philosophy
//!
//! mkv-harvest is designed to be:
//! - **Library-first** - No CLI or chat client, purely a Rust crate for embedding
//! - **Event-driven** - Consumers subscribe to events, no polling required
//! - **Single-slot** - One download at a time system-wide, by design
//! - **Failure-isolating** - One broken file or category never sinks the batch
//!
//! Downloads are driven through an external aria2 daemon over its JSON-RPC
//! interface; extraction shells out to the mkvtoolnix tools.
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use mkv_harvest::{Config, FileReport, HarvestPipeline, ProgressSink, RunContext};
//!
//! struct Uploader;
//!
//! #[async_trait::async_trait]
//! impl ProgressSink for Uploader {
//!     async fn file_ready(&self, report: &FileReport) -> mkv_harvest::Result<()> {
//!         // Upload report.artifacts here; the files are deleted once
//!         // this call returns.
//!         Ok(())
//!     }
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let pipeline = HarvestPipeline::new(Config::default())?.with_sink(Arc::new(Uploader));
//!
//!     // Subscribe to progress events (the chat layer renders these)
//!     let mut events = pipeline.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     let ctx = RunContext::new("user-id", "guild-id");
//!     pipeline
//!         .process_url(&ctx, "magnet:?xt=urn:btih:...")
//!         .await?;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// aria2 RPC download driver
pub mod backend;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Matroska extraction engine
pub mod mkv;
/// Download-and-extract orchestrator
pub mod pipeline;
/// Chat-facing text rendering
pub mod report;
/// JSON file stores (slot, queue, channel allowlist)
pub mod store;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use backend::Aria2Client;
pub use config::{BackendConfig, Config, StorageConfig, ToolsConfig, UploadConfig};
pub use error::{BackendError, Error, ExtractError, Result};
pub use mkv::{ContainerInfo, MkvService, SystemToolRunner, ToolRunner};
pub use pipeline::{CancelOutcome, CancelSignal, HarvestPipeline, ProgressSink};
pub use store::{ChannelStore, QueueStore, SlotRecord, SlotStore, UserQueue};
pub use types::{
    Category, ChapterFile, DownloadPhase, Event, ExtractedSet, FileReport, Gid, JobState,
    JobStatus, RunContext,
};
