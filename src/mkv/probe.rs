//! Container introspection via `mkvmerge -J`.
//!
//! The tool emits a JSON identification document; deserializing it into
//! the typed structs below is the schema validation — a document missing
//! required fields or carrying wrong types fails the probe. Probe
//! failures are non-fatal to the batch: the orchestrator skips the file.

use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::error::{ExtractError, Result};

use super::MkvService;

/// Parsed container manifest
#[derive(Clone, Debug, Deserialize)]
pub struct ContainerInfo {
    /// All tracks declared by the container
    #[serde(default)]
    pub tracks: Vec<Track>,
    /// Declared attachments (fonts, cover art, ...)
    #[serde(default)]
    pub attachments: Vec<Attachment>,
    /// Chapter editions; usually zero or one entry
    #[serde(default)]
    pub chapters: Vec<ChapterEdition>,
}

impl ContainerInfo {
    /// Tracks of the given type, in declaration order
    pub fn tracks_of_type(&self, track_type: TrackType) -> impl Iterator<Item = &Track> {
        self.tracks.iter().filter(move |t| t.track_type == track_type)
    }

    /// Total chapter entries across all editions
    pub fn chapter_entries(&self) -> usize {
        self.chapters.iter().map(|c| c.num_entries).sum()
    }
}

/// One stream within the container
#[derive(Clone, Debug, Deserialize)]
pub struct Track {
    /// Track id used by the extraction tool
    pub id: u64,
    /// Track classification
    #[serde(rename = "type")]
    pub track_type: TrackType,
    /// Codec identifier (e.g. "SubRip/SRT")
    pub codec: String,
    /// Optional per-track properties
    #[serde(default)]
    pub properties: TrackProperties,
}

/// Track classification as reported by mkvmerge
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackType {
    /// Video stream
    Video,
    /// Audio stream
    Audio,
    /// Subtitle stream
    Subtitles,
    /// Anything else (buttons, ...)
    #[serde(other)]
    Other,
}

/// Per-track properties we care about
#[derive(Clone, Debug, Default, Deserialize)]
pub struct TrackProperties {
    /// ISO 639-2 language code, when declared
    #[serde(default)]
    pub language: Option<String>,
}

/// One declared attachment
#[derive(Clone, Debug, Deserialize)]
pub struct Attachment {
    /// Attachment id used by the extraction tool
    pub id: u64,
    /// Declared file name, when present
    #[serde(default)]
    pub file_name: Option<String>,
    /// Declared MIME type, when present
    #[serde(default)]
    pub content_type: Option<String>,
}

/// One chapter edition
#[derive(Clone, Debug, Deserialize)]
pub struct ChapterEdition {
    /// Number of chapter entries in this edition
    #[serde(default)]
    pub num_entries: usize,
}

impl MkvService {
    /// Probe one container file.
    ///
    /// Non-zero exit, malformed JSON, and shape mismatches are all
    /// `ProbeFailed` — the three failure modes are indistinguishable to
    /// the caller by design, since each just skips the file.
    pub async fn probe(&self, file: &Path) -> Result<ContainerInfo> {
        let args = vec!["-J".to_string(), file.display().to_string()];
        let output = self.runner.run(&self.mkvmerge, &args).await.map_err(|e| {
            ExtractError::ProbeFailed {
                path: file.to_path_buf(),
                reason: e.to_string(),
            }
        })?;

        if !output.success {
            return Err(ExtractError::ProbeFailed {
                path: file.to_path_buf(),
                reason: format!("mkvmerge exited non-zero: {}", output.stderr.trim()),
            }
            .into());
        }

        let info: ContainerInfo =
            serde_json::from_str(&output.stdout).map_err(|e| ExtractError::ProbeFailed {
                path: file.to_path_buf(),
                reason: format!("identification output did not match schema: {}", e),
            })?;

        debug!(
            file = %file.display(),
            tracks = info.tracks.len(),
            attachments = info.attachments.len(),
            chapter_entries = info.chapter_entries(),
            "probed container"
        );
        Ok(info)
    }

    /// Plain-text container report via mediainfo, for the `info` artifact
    pub async fn media_info(&self, file: &Path) -> Result<String> {
        let args = vec![file.display().to_string()];
        let output = self.runner.run(&self.mediainfo, &args).await?;
        if !output.success {
            return Err(ExtractError::ToolFailed {
                tool: "mediainfo".to_string(),
                reason: output.stderr.trim().to_string(),
            }
            .into());
        }
        Ok(output.stdout)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "container": {"recognized": true, "supported": true, "type": "Matroska"},
        "tracks": [
            {"id": 0, "type": "video", "codec": "AVC/H.264/MPEG-4p10", "properties": {"language": "und"}},
            {"id": 1, "type": "audio", "codec": "AAC", "properties": {"language": "jpn"}},
            {"id": 2, "type": "subtitles", "codec": "SubRip/SRT", "properties": {"language": "eng"}},
            {"id": 3, "type": "subtitles", "codec": "SubStationAlpha", "properties": {}}
        ],
        "attachments": [
            {"id": 1, "file_name": "font.ttf", "content_type": "application/x-truetype-font"}
        ],
        "chapters": [{"num_entries": 7}]
    }"#;

    #[test]
    fn parses_mkvmerge_identification_output() {
        let info: ContainerInfo = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(info.tracks.len(), 4);
        assert_eq!(info.tracks_of_type(TrackType::Subtitles).count(), 2);
        assert_eq!(info.tracks_of_type(TrackType::Video).count(), 1);
        assert_eq!(info.attachments.len(), 1);
        assert_eq!(info.chapter_entries(), 7);
    }

    #[test]
    fn subtitle_track_without_language_defaults_to_none() {
        let info: ContainerInfo = serde_json::from_str(SAMPLE).unwrap();
        let ass = info
            .tracks
            .iter()
            .find(|t| t.codec == "SubStationAlpha")
            .unwrap();
        assert_eq!(ass.properties.language, None);
    }

    #[test]
    fn unknown_track_types_map_to_other() {
        let info: ContainerInfo = serde_json::from_str(
            r#"{"tracks": [{"id": 0, "type": "buttons", "codec": "VobBtn"}]}"#,
        )
        .unwrap();
        assert_eq!(info.tracks[0].track_type, TrackType::Other);
    }

    #[test]
    fn missing_required_fields_fail_the_parse() {
        // A track without an id violates the schema
        let result: std::result::Result<ContainerInfo, _> =
            serde_json::from_str(r#"{"tracks": [{"type": "video", "codec": "AVC"}]}"#);
        assert!(result.is_err());
    }
}
