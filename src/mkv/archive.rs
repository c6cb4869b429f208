//! Zip packaging and the upload-size split rule.
//!
//! Extracted files are bundled into one zip per category. When the zip
//! exceeds the upload ceiling it is split into raw byte-range parts,
//! `{stem}.partNNN.zip`, each at most one ceiling in size; concatenating
//! the parts in order reproduces the archive byte for byte. These are
//! synchronous filesystem routines; async callers go through
//! `spawn_blocking`.

use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::error::{ExtractError, Result};

/// Reassembly command targets
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ArchiveKind {
    /// Subtitle bundle
    Subtitles,
    /// Attachment bundle
    Attachments,
}

impl ArchiveKind {
    fn stem(self) -> &'static str {
        match self {
            ArchiveKind::Subtitles => "subs",
            ArchiveKind::Attachments => "attachments",
        }
    }
}

fn archive_error(path: &Path, err: impl std::fmt::Display) -> crate::error::Error {
    ExtractError::ArchiveFailed {
        path: path.to_path_buf(),
        reason: err.to_string(),
    }
    .into()
}

/// Bundle `files` into a zip at `archive_path`, storing each entry under
/// its base name.
pub fn build_archive(files: &[PathBuf], archive_path: &Path) -> Result<()> {
    let out = File::create(archive_path).map_err(|e| archive_error(archive_path, e))?;
    let mut zip = zip::ZipWriter::new(out);
    let options = zip::write::FileOptions::default()
        .compression_method(zip::CompressionMethod::Deflated);

    for file in files {
        let name = file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .ok_or_else(|| archive_error(file, "file has no name"))?;
        zip.start_file(name, options)
            .map_err(|e| archive_error(archive_path, e))?;
        let mut input = File::open(file).map_err(|e| archive_error(file, e))?;
        std::io::copy(&mut input, &mut zip).map_err(|e| archive_error(file, e))?;
    }

    zip.finish().map_err(|e| archive_error(archive_path, e))?;
    Ok(())
}

/// Apply the upload-size rule: an archive at or under `ceiling` bytes is
/// returned as-is; a larger one is split into sequential parts of at most
/// `ceiling` bytes each.
pub fn bound_archive(archive_path: &Path, ceiling: u64) -> Result<Vec<PathBuf>> {
    let size = std::fs::metadata(archive_path)
        .map_err(|e| archive_error(archive_path, e))?
        .len();
    if size <= ceiling {
        return Ok(vec![archive_path.to_path_buf()]);
    }
    warn!(
        archive = %archive_path.display(),
        size,
        ceiling,
        "archive exceeds the upload ceiling, splitting"
    );
    split_archive(archive_path, ceiling)
}

fn split_archive(archive_path: &Path, part_size: u64) -> Result<Vec<PathBuf>> {
    let stem = archive_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .ok_or_else(|| archive_error(archive_path, "archive has no name"))?;
    let extension = archive_path
        .extension()
        .map(|e| format!(".{}", e.to_string_lossy()))
        .unwrap_or_default();

    let mut input = File::open(archive_path).map_err(|e| archive_error(archive_path, e))?;
    let mut parts = Vec::new();
    let mut buffer = vec![0u8; part_size as usize];
    let mut index = 0usize;

    loop {
        let mut filled = 0;
        // Fill the buffer fully unless the input runs out
        while filled < buffer.len() {
            let n = input
                .read(&mut buffer[filled..])
                .map_err(|e| archive_error(archive_path, e))?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        if filled == 0 {
            break;
        }

        let part_path =
            archive_path.with_file_name(format!("{}.part{:03}{}", stem, index, extension));
        let mut part = File::create(&part_path).map_err(|e| archive_error(&part_path, e))?;
        part.write_all(&buffer[..filled])
            .map_err(|e| archive_error(&part_path, e))?;
        info!(part = %part_path.display(), bytes = filled, "wrote split archive part");
        parts.push(part_path);
        index += 1;
    }

    Ok(parts)
}

/// Human-readable commands for reassembling split archive parts into one
/// zip, for both Windows and Unix shells.
pub fn merge_instructions(paths: &[PathBuf], kind: ArchiveKind) -> String {
    let names: Vec<String> = paths
        .iter()
        .map(|p| {
            format!(
                "\"{}\"",
                p.file_name().map(|n| n.to_string_lossy()).unwrap_or_default()
            )
        })
        .collect();
    let windows = format!("copy /b {} {}.zip", names.join(" + "), kind.stem());
    let unix = format!("cat {} > {}.zip", names.join(" "), kind.stem());

    format!(
        "To merge the {} parts into a single zip file, use one of:\n\nWindows:\n{}\n\nUnix:\n{}",
        kind.stem(),
        windows,
        unix
    )
}
