//! Category extractors: subtitles, attachments, chapters, video tracks.
//!
//! Each category is independent. A failed track is logged and skipped; a
//! category where nothing could be extracted reports `None` and the rest
//! of the batch carries on.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::Result;
use crate::types::{Category, ChapterFile, ExtractedSet};

use super::archive::{bound_archive, build_archive};
use super::probe::{ContainerInfo, TrackType};
use super::MkvService;

/// Map a subtitle codec id to an output extension
fn subtitle_extension(codec: &str) -> &'static str {
    match codec {
        "SubRip/SRT" | "S_TEXT/UTF8" => "srt",
        "SubStationAlpha" => "ass",
        _ => "txt",
    }
}

/// Map an attachment MIME type to an output extension
fn attachment_extension(content_type: Option<&str>) -> &'static str {
    match content_type {
        Some("application/font-sfnt")
        | Some("application/x-truetype-font")
        | Some("font/ttf") => "ttf",
        Some("application/vnd.ms-opentype") | Some("font/otf") => "otf",
        Some("image/png") => "png",
        Some("image/jpeg") => "jpg",
        _ => "bin",
    }
}

impl MkvService {
    /// Extract every subtitle track, bundle the results into a zip, and
    /// apply the upload-size split rule. `None` when the container has no
    /// subtitle tracks or nothing could be extracted.
    pub async fn extract_subtitles(
        &self,
        file: &Path,
        info: &ContainerInfo,
        out_dir: &Path,
    ) -> Option<ExtractedSet> {
        let mut extracted = Vec::new();
        for track in info.tracks_of_type(TrackType::Subtitles) {
            let language = track.properties.language.as_deref().unwrap_or("und");
            let extension = subtitle_extension(&track.codec);
            let out_path = out_dir.join(format!("subtitle_{}.{}.{}", track.id, language, extension));

            let spec = format!("{}:{}", track.id, out_path.display());
            let args = vec![
                file.display().to_string(),
                "tracks".to_string(),
                spec,
            ];
            match self.run_mkvextract(&args).await {
                Ok(()) => extracted.push(out_path),
                Err(e) => {
                    warn!(track = track.id, error = %e, "subtitle track extraction failed");
                }
            }
        }

        if extracted.is_empty() {
            return None;
        }
        info!(file = %file.display(), count = extracted.len(), "extracted subtitle tracks");
        self.pack(extracted, out_dir, "subtitles.zip", Category::Subtitles)
            .await
    }

    /// Extract every attachment, preferring the declared file name and
    /// falling back to `attachment_{id}.{ext}` with the extension guessed
    /// from the MIME type. Same bundling and split rule as subtitles.
    pub async fn extract_attachments(
        &self,
        file: &Path,
        info: &ContainerInfo,
        out_dir: &Path,
    ) -> Option<ExtractedSet> {
        let mut extracted = Vec::new();
        for attachment in &info.attachments {
            let name = match &attachment.file_name {
                Some(name) if !name.is_empty() => name.clone(),
                _ => {
                    let extension = attachment_extension(attachment.content_type.as_deref());
                    format!("attachment_{}.{}", attachment.id, extension)
                }
            };
            let out_path = out_dir.join(name);

            let spec = format!("{}:{}", attachment.id, out_path.display());
            let args = vec![
                file.display().to_string(),
                "attachments".to_string(),
                spec,
            ];
            match self.run_mkvextract(&args).await {
                Ok(()) => extracted.push(out_path),
                Err(e) => {
                    warn!(attachment = attachment.id, error = %e, "attachment extraction failed");
                }
            }
        }

        if extracted.is_empty() {
            return None;
        }
        info!(file = %file.display(), count = extracted.len(), "extracted attachments");
        self.pack(extracted, out_dir, "attachments.zip", Category::Attachments)
            .await
    }

    /// Extract the chapter list to `chapters.xml`. `None` when the
    /// container declares zero chapter entries or extraction fails.
    pub async fn extract_chapters(
        &self,
        file: &Path,
        info: &ContainerInfo,
        out_dir: &Path,
    ) -> Option<ChapterFile> {
        let count = info.chapter_entries();
        if count == 0 {
            return None;
        }

        let out_path = out_dir.join("chapters.xml");
        let args = vec![
            file.display().to_string(),
            "chapters".to_string(),
            "--redirect-output".to_string(),
            out_path.display().to_string(),
        ];
        match self.run_mkvextract(&args).await {
            Ok(()) if out_path.is_file() => {
                info!(file = %file.display(), entries = count, "extracted chapters");
                Some(ChapterFile {
                    path: out_path,
                    count,
                })
            }
            Ok(()) => {
                let e = crate::error::ExtractError::MissingOutput {
                    tool: "mkvextract".to_string(),
                    path: out_path,
                };
                warn!(file = %file.display(), error = %e, "chapter extraction failed");
                None
            }
            Err(e) => {
                warn!(file = %file.display(), error = %e, "chapter extraction failed");
                None
            }
        }
    }

    /// Extract every video track to `track_{id}.mkv`. Failed tracks are
    /// skipped; an empty result is not an error.
    pub async fn extract_video_tracks(
        &self,
        file: &Path,
        info: &ContainerInfo,
        out_dir: &Path,
    ) -> Vec<PathBuf> {
        let mut extracted = Vec::new();
        for track in info.tracks_of_type(TrackType::Video) {
            let out_path = out_dir.join(format!("track_{}.mkv", track.id));
            let spec = format!("{}:{}", track.id, out_path.display());
            let args = vec![
                file.display().to_string(),
                "tracks".to_string(),
                spec,
            ];
            match self.run_mkvextract(&args).await {
                Ok(()) => extracted.push(out_path),
                Err(e) => {
                    warn!(track = track.id, error = %e, "video track extraction failed");
                }
            }
        }
        extracted
    }

    /// Bundle extracted files into a zip and apply the split rule. The
    /// reported count is the pre-split item count.
    async fn pack(
        &self,
        files: Vec<PathBuf>,
        out_dir: &Path,
        archive_name: &str,
        category: Category,
    ) -> Option<ExtractedSet> {
        let count = files.len();
        let archive_path = out_dir.join(archive_name);
        let ceiling = self.attachment_limit;

        let packed = tokio::task::spawn_blocking(move || -> Result<Vec<PathBuf>> {
            build_archive(&files, &archive_path)?;
            bound_archive(&archive_path, ceiling)
        })
        .await;

        match packed {
            Ok(Ok(paths)) => Some(ExtractedSet {
                category,
                paths,
                count,
            }),
            Ok(Err(e)) => {
                warn!(category = ?category, error = %e, "failed to package extracted files");
                None
            }
            Err(e) => {
                warn!(category = ?category, error = %e, "archive task panicked");
                None
            }
        }
    }
}
