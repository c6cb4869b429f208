//! Matroska extraction engine.
//!
//! Wraps the mkvtoolnix command-line tools: `mkvmerge -J` for container
//! introspection, `mkvextract` for pulling tracks, attachments, and
//! chapters, and `mediainfo` for the plain-text report. Extraction is
//! organized by category (subtitles, attachments, chapters) with each
//! category failing independently.

pub mod archive;
mod extract;
mod probe;
mod tools;

#[cfg(test)]
pub(crate) mod test_support;

pub use archive::{ArchiveKind, merge_instructions};
pub use probe::{Attachment, ChapterEdition, ContainerInfo, Track, TrackProperties, TrackType};
pub use tools::{SystemToolRunner, ToolOutput, ToolRunner};

use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{ToolsConfig, UploadConfig};
use crate::error::{ExtractError, Result};

use tools::resolve_binary;

/// Matroska extraction service
#[derive(Clone)]
pub struct MkvService {
    mkvmerge: PathBuf,
    mkvextract: PathBuf,
    mediainfo: PathBuf,
    runner: Arc<dyn ToolRunner>,
    attachment_limit: u64,
}

impl MkvService {
    /// Create a service using the real system tools
    pub fn new(tools: &ToolsConfig, upload: &UploadConfig) -> Self {
        Self::with_runner(tools, upload, Arc::new(SystemToolRunner))
    }

    /// Create a service with an injected tool runner
    pub fn with_runner(
        tools: &ToolsConfig,
        upload: &UploadConfig,
        runner: Arc<dyn ToolRunner>,
    ) -> Self {
        Self {
            mkvmerge: resolve_binary("mkvmerge", tools.mkvmerge_path.as_ref(), tools.search_path),
            mkvextract: resolve_binary(
                "mkvextract",
                tools.mkvextract_path.as_ref(),
                tools.search_path,
            ),
            mediainfo: resolve_binary(
                "mediainfo",
                tools.mediainfo_path.as_ref(),
                tools.search_path,
            ),
            runner,
            attachment_limit: upload.attachment_limit,
        }
    }

    /// Run mkvextract, failing on non-zero exit
    async fn run_mkvextract(&self, args: &[String]) -> Result<()> {
        let output = self.runner.run(&self.mkvextract, args).await?;
        if !output.success {
            return Err(ExtractError::ToolFailed {
                tool: "mkvextract".to_string(),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(())
    }
}
