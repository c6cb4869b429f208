//! Download-and-extract orchestrator split into focused submodules.
//!
//! The `HarvestPipeline` struct and its methods are organized by domain:
//! - [`run`] - Top-level URL and queue processing
//! - [`download`] - Backend poll loop and torrent phase transition
//! - [`extract_loop`] - Media discovery and per-file extraction
//! - [`control`] - Cancellation, slot status, queue and channel commands
//! - [`cleanup`] - Shared end-of-run cleanup

mod cleanup;
mod control;
mod download;
mod extract_loop;
mod run;


pub use control::CancelOutcome;

use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

use crate::backend::Aria2Client;
use crate::config::Config;
use crate::error::Result;
use crate::mkv::{MkvService, ToolRunner};
use crate::store::{ChannelStore, QueueStore, SlotStore};
use crate::types::{Event, FileReport};

/// Consumer seam for per-file extraction results.
///
/// `file_ready` is awaited after a file's artifacts land on disk and
/// before the extraction working directory is purged, so the artifact
/// paths in the report are readable for exactly the duration of the
/// call. A chat front end uploads from here; the broadcast [`Event`]
/// channel stays fire-and-forget and carries progress only.
///
/// A sink error is logged and the batch continues; delivery failures
/// are isolated the same way per-file extraction failures are.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    /// Deliver one finished file report while its artifacts still exist
    async fn file_ready(&self, report: &FileReport) -> Result<()>;
}

/// Process-wide cancellation latch.
///
/// Sticky once set; stays set until the next run wins the download slot
/// and clears it, so a cancel aimed at a running job cannot be wiped by a
/// contender that loses the slot. Cloning shares the latch. The
/// inner token is swapped on `clear` rather than reset, because a
/// `CancellationToken` cannot be un-cancelled.
#[derive(Clone)]
pub struct CancelSignal {
    token: Arc<Mutex<CancellationToken>>,
}

impl CancelSignal {
    /// Create an unset latch
    pub fn new() -> Self {
        Self {
            token: Arc::new(Mutex::new(CancellationToken::new())),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CancellationToken> {
        // A poisoned lock only means a panicked holder; the token is still valid
        self.token.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Trip the latch
    pub fn set(&self) {
        self.lock().cancel();
    }

    /// Whether the latch is currently tripped
    pub fn is_set(&self) -> bool {
        self.lock().is_cancelled()
    }

    /// Reset the latch once a new run has acquired the slot
    pub fn clear(&self) {
        *self.lock() = CancellationToken::new();
    }

    /// Snapshot of the current token, for `select!`-style waits.
    ///
    /// Valid until the next `clear`; long waits should re-check `is_set`
    /// rather than hold one token across runs.
    pub fn token(&self) -> CancellationToken {
        self.lock().clone()
    }
}

impl Default for CancelSignal {
    fn default() -> Self {
        Self::new()
    }
}

/// Main pipeline instance (cloneable - all fields are Arc-wrapped or cheap)
#[derive(Clone)]
pub struct HarvestPipeline {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// aria2 RPC client
    pub(crate) backend: Aria2Client,
    /// Matroska extraction service
    pub(crate) mkv: MkvService,
    /// Single-slot ownership record
    pub(crate) slot: SlotStore,
    /// Per-user URL queue
    pub(crate) queue: QueueStore,
    /// Channel allowlist
    pub(crate) channels: ChannelStore,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<Event>,
    /// Process-wide cancellation latch
    pub(crate) cancel: CancelSignal,
    /// Awaited consumer for per-file results, if attached
    pub(crate) sink: Option<Arc<dyn ProgressSink>>,
    /// Serializes slot acquisition (check, submit, record) across tasks
    pub(crate) run_lock: Arc<tokio::sync::Mutex<()>>,
}

impl HarvestPipeline {
    /// Create a pipeline using the real system tools
    pub fn new(config: Config) -> Result<Self> {
        let mkv = MkvService::new(&config.tools, &config.upload);
        Self::build(config, mkv)
    }

    /// Create a pipeline with an injected tool runner
    pub fn with_tool_runner(config: Config, runner: Arc<dyn ToolRunner>) -> Result<Self> {
        let mkv = MkvService::with_runner(&config.tools, &config.upload, runner);
        Self::build(config, mkv)
    }

    fn build(config: Config, mkv: MkvService) -> Result<Self> {
        let backend = Aria2Client::new(&config.backend, config.storage.download_dir.clone())?;
        let slot = SlotStore::new(config.storage.slot_file.clone());
        let queue = QueueStore::new(config.storage.queue_file.clone());
        let channels = ChannelStore::new(config.storage.channels_file.clone());
        let (event_tx, _rx) = tokio::sync::broadcast::channel(1000);

        Ok(Self {
            config: Arc::new(config),
            backend,
            mkv,
            slot,
            queue,
            channels,
            event_tx,
            cancel: CancelSignal::new(),
            sink: None,
            run_lock: Arc::new(tokio::sync::Mutex::new(())),
        })
    }

    /// Attach a consumer for per-file extraction results.
    ///
    /// The sink is awaited per file before the working directory is
    /// purged; see [`ProgressSink`].
    pub fn with_sink(mut self, sink: Arc<dyn ProgressSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Subscribe to pipeline events.
    ///
    /// Multiple subscribers are supported; each receives all events
    /// independently. A subscriber that falls behind by more than 1000
    /// events receives `RecvError::Lagged`.
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Emit an event to all subscribers.
    ///
    /// With no active subscribers the event is silently dropped; the run
    /// does not depend on anyone listening.
    pub(crate) fn emit_event(&self, event: Event) {
        self.event_tx.send(event).ok();
    }
}
