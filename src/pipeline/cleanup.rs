//! Shared end-of-run cleanup.

use tracing::{info, warn};

use super::HarvestPipeline;

impl HarvestPipeline {
    /// Tear down everything a run may have left behind: backend jobs, the
    /// slot record, and the temp directory tree.
    ///
    /// Every exit path of a run converges here, so this must be safe to
    /// call in any state and must never fail — a cleanup error on an error
    /// path would mask the original failure. All problems are logged and
    /// absorbed.
    pub(crate) async fn cleanup(&self) {
        self.backend.remove_all(true).await;

        if let Err(e) = self.slot.clear().await {
            warn!(error = %e, "failed to clear the slot record");
        }

        let temp = &self.config.storage.temp_dir;
        match tokio::fs::remove_dir_all(temp).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %temp.display(), error = %e, "failed to purge temp dir"),
        }
        for dir in [
            &self.config.storage.download_dir,
            &self.config.storage.extract_dir,
        ] {
            if let Err(e) = tokio::fs::create_dir_all(dir).await {
                warn!(dir = %dir.display(), error = %e, "failed to recreate working dir");
            }
        }

        info!("cleanup finished");
    }
}
