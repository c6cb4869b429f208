//! Chat-facing text rendering for pipeline events.
//!
//! The pipeline itself only broadcasts typed events; these helpers turn
//! them into the multi-line status blocks the bot edits into its reply
//! message. Kept in the library so every front end renders identically.

use crate::mkv::{ArchiveKind, merge_instructions};
use crate::types::{DownloadPhase, FileReport, JobStatus};

/// Render one progress snapshot as a status block
pub fn format_progress(status: &JobStatus, phase: DownloadPhase) -> String {
    let seeders = status
        .num_seeders
        .map(|n| n.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    let eta = status
        .eta()
        .map(format_duration)
        .unwrap_or_else(|| "N/A".to_string());

    format!(
        "┏**{}**\n\
         ┠**Progress:** {:.1}%\n\
         ┠**GID:** `{}`\n\
         ┠**Processed:** {} of {}\n\
         ┠**Status:** {} ({})\n\
         ┠**Speed:** {}/s\n\
         ┠**Seeders:** {}\n\
         ┠**Total Files:** {}\n\
         ┖**ETA:** {}",
        status.name,
        status.progress() * 100.0,
        status.gid,
        format_bytes(status.completed_bytes),
        format_bytes(status.total_bytes),
        status.state,
        phase,
        format_bytes(status.download_speed),
        seeders,
        status.num_files,
        eta,
    )
}

/// Render a per-file outcome, including reassembly instructions when an
/// archive was split into parts.
pub fn format_file_report(report: &FileReport) -> String {
    if let Some(error) = &report.error {
        return format!("**{}** — failed: {}", report.file_name, error);
    }

    let mut lines = vec![format!(
        "**{}** — {} subtitle(s), {} attachment(s), {} chapter(s)",
        report.file_name, report.subtitles, report.attachments, report.chapters
    )];

    for kind in [ArchiveKind::Subtitles, ArchiveKind::Attachments] {
        let marker = match kind {
            ArchiveKind::Subtitles => "subtitles.part",
            ArchiveKind::Attachments => "attachments.part",
        };
        let parts: Vec<_> = report
            .artifacts
            .iter()
            .filter(|p| {
                p.file_name()
                    .and_then(|n| n.to_str())
                    .is_some_and(|n| n.starts_with(marker))
            })
            .cloned()
            .collect();
        if parts.len() > 1 {
            lines.push(merge_instructions(&parts, kind));
        }
    }

    lines.join("\n")
}

/// Human-readable byte count, binary units
pub fn format_bytes(bytes: u64) -> String {
    const UNITS: &[&str] = &["B", "KiB", "MiB", "GiB", "TiB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{}{}", bytes, UNITS[unit])
    } else {
        format!("{:.2}{}", value, UNITS[unit])
    }
}

/// Human-readable duration as `1h02m03s`
pub fn format_duration(duration: std::time::Duration) -> String {
    let total = duration.as_secs();
    let hours = total / 3600;
    let minutes = (total % 3600) / 60;
    let seconds = total % 60;
    if hours > 0 {
        format!("{}h{:02}m{:02}s", hours, minutes, seconds)
    } else if minutes > 0 {
        format!("{}m{:02}s", minutes, seconds)
    } else {
        format!("{}s", seconds)
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Gid, JobState};
    use std::path::PathBuf;
    use std::time::Duration;

    fn sample_status() -> JobStatus {
        JobStatus {
            gid: Gid::from("2089b05ecca3d829"),
            name: "Some Torrent".to_string(),
            state: JobState::Active,
            completed_bytes: 5 * 1024 * 1024,
            total_bytes: 10 * 1024 * 1024,
            download_speed: 1024 * 1024,
            num_seeders: Some(12),
            num_files: 3,
            dir: PathBuf::from("/downloads"),
            followed_by: Vec::new(),
            error_message: None,
            is_torrent: true,
        }
    }

    #[test]
    fn bytes_format_in_binary_units() {
        assert_eq!(format_bytes(0), "0B");
        assert_eq!(format_bytes(512), "512B");
        assert_eq!(format_bytes(1024), "1.00KiB");
        assert_eq!(format_bytes(10 * 1024 * 1024), "10.00MiB");
    }

    #[test]
    fn durations_format_compactly() {
        assert_eq!(format_duration(Duration::from_secs(42)), "42s");
        assert_eq!(format_duration(Duration::from_secs(125)), "2m05s");
        assert_eq!(format_duration(Duration::from_secs(3723)), "1h02m03s");
    }

    #[test]
    fn progress_block_names_the_job_and_phase() {
        let text = format_progress(&sample_status(), DownloadPhase::Payload);
        assert!(text.contains("Some Torrent"));
        assert!(text.contains("50.0%"));
        assert!(text.contains("`2089b05ecca3d829`"));
        assert!(text.contains("5.00MiB of 10.00MiB"));
        assert!(text.contains("active (payload)"));
        assert!(text.contains("**Seeders:** 12"));
    }

    #[test]
    fn split_archives_get_reassembly_instructions() {
        let report = FileReport {
            file_name: "a.mkv".to_string(),
            subtitles: 4,
            attachments: 0,
            chapters: 0,
            artifacts: vec![
                PathBuf::from("/x/subtitles.part000.zip"),
                PathBuf::from("/x/subtitles.part001.zip"),
            ],
            error: None,
        };
        let text = format_file_report(&report);
        assert!(text.contains("4 subtitle(s)"));
        assert!(text.contains("copy /b"));
        assert!(text.contains("cat "));
    }

    #[test]
    fn failed_files_render_the_error() {
        let report = FileReport::failed("b.mkv", "probe failed");
        let text = format_file_report(&report);
        assert!(text.contains("b.mkv"));
        assert!(text.contains("probe failed"));
    }
}
