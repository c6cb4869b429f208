//! Media discovery and the per-file extraction loop.
//!
//! One file failing never aborts its siblings: every per-file outcome is
//! captured in a [`FileReport`] and the loop moves on. Each report is
//! delivered through the attached [`ProgressSink`](super::ProgressSink)
//! while its artifacts are still on disk; only then is the extraction
//! working directory purged, success or not, so artifacts from one file
//! never bleed into the next report.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{Event, FileReport};

use super::HarvestPipeline;

/// Extensions recognized as Matroska media
const MEDIA_EXTENSIONS: &[&str] = &["mkv", "mk3d", "mka"];

/// Recursively enumerate Matroska files under `dest`, sorted by path for
/// a deterministic batch order.
fn find_media_files(dest: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = walkdir::WalkDir::new(dest)
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                None
            }
        })
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| MEDIA_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
        })
        .collect();
    files.sort();
    files
}

fn display_name(file: &Path, dest: &Path) -> String {
    file.strip_prefix(dest)
        .unwrap_or(file)
        .display()
        .to_string()
}

impl HarvestPipeline {
    /// Process every Matroska file under the finished download.
    ///
    /// Fails the run only when no media is found or cancellation is
    /// observed; individual file failures are reported and skipped.
    pub(super) async fn harvest(&self, dest: &Path) -> Result<()> {
        let files = find_media_files(dest);
        if files.is_empty() {
            return Err(Error::NoMediaFound(dest.to_path_buf()));
        }

        let names: Vec<String> = files.iter().map(|f| display_name(f, dest)).collect();
        info!(count = files.len(), "found Matroska files to process");
        self.emit_event(Event::FilesListed {
            names: names.clone(),
        });

        let total = files.len();
        for (index, file) in files.iter().enumerate() {
            if self.cancel.is_set() {
                warn!("cancellation observed during extraction loop");
                return Err(Error::Cancelled);
            }

            let report = self.process_file(file, &names[index]).await;

            // The sink runs to completion while the artifacts still exist;
            // everything under the extraction dir is gone after the purge.
            // A sink failure is reported and the batch continues.
            if let Some(sink) = &self.sink {
                if let Err(e) = sink.file_ready(&report).await {
                    warn!(file = %report.file_name, error = %e, "result sink failed");
                }
            }
            self.emit_event(Event::FileProcessed {
                index: index + 1,
                total,
                report,
            });

            self.purge_extract_dir().await;
        }

        Ok(())
    }

    /// Probe one file and run every extraction category over it. Never
    /// fails the batch: all errors end up inside the returned report.
    async fn process_file(&self, file: &Path, name: &str) -> FileReport {
        let out_dir = self.config.storage.extract_dir.clone();
        if let Err(e) = tokio::fs::create_dir_all(&out_dir).await {
            return FileReport::failed(name, format!("cannot create extraction dir: {}", e));
        }

        let info = match self.mkv.probe(file).await {
            Ok(info) => info,
            Err(e) => {
                warn!(file = %name, error = %e, "probe failed, skipping file");
                return FileReport::failed(name, e.to_string());
            }
        };

        let mut report = FileReport {
            file_name: name.to_string(),
            subtitles: 0,
            attachments: 0,
            chapters: 0,
            artifacts: Vec::new(),
            error: None,
        };

        // Info report degrades to nothing on failure
        match self.mkv.media_info(file).await {
            Ok(text) => {
                let info_path = out_dir.join("mkv_info.txt");
                match tokio::fs::write(&info_path, text).await {
                    Ok(()) => report.artifacts.push(info_path),
                    Err(e) => warn!(file = %name, error = %e, "failed to write info report"),
                }
            }
            Err(e) => warn!(file = %name, error = %e, "mediainfo failed"),
        }

        // Each category fails independently
        if let Some(set) = self.mkv.extract_subtitles(file, &info, &out_dir).await {
            report.subtitles = set.count;
            report.artifacts.extend(set.paths);
        }
        if let Some(set) = self.mkv.extract_attachments(file, &info, &out_dir).await {
            report.attachments = set.count;
            report.artifacts.extend(set.paths);
        }
        if let Some(chapters) = self.mkv.extract_chapters(file, &info, &out_dir).await {
            report.chapters = chapters.count;
            report.artifacts.push(chapters.path);
        }

        info!(
            file = %name,
            subtitles = report.subtitles,
            attachments = report.attachments,
            chapters = report.chapters,
            "file processed"
        );
        report
    }

    /// Empty the extraction working directory. Failures are logged only —
    /// a dirty working dir must not fail the batch.
    async fn purge_extract_dir(&self) {
        let dir = &self.config.storage.extract_dir;
        match tokio::fs::remove_dir_all(dir).await {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(dir = %dir.display(), error = %e, "failed to purge extraction dir"),
        }
    }
}
