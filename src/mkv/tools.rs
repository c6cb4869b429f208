//! External tool invocation seam.
//!
//! The extraction engine shells out to mkvmerge, mkvextract, and
//! mediainfo. `ToolRunner` is the trait seam between the engine and the
//! operating system so tests can script tool behavior without the
//! binaries installed; `SystemToolRunner` is the real implementation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::{ExtractError, Result};

/// Captured outcome of one tool invocation
#[derive(Clone, Debug)]
pub struct ToolOutput {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Captured stdout
    pub stdout: String,
    /// Captured stderr
    pub stderr: String,
}

/// Executes external processes on behalf of the extraction engine
#[async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `program` with `args`, capturing output. An `Err` here means
    /// the process could not be spawned; a non-zero exit is reported
    /// through [`ToolOutput::success`].
    async fn run(&self, program: &Path, args: &[String]) -> Result<ToolOutput>;
}

/// Real implementation backed by `tokio::process`
pub struct SystemToolRunner;

#[async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, program: &Path, args: &[String]) -> Result<ToolOutput> {
        let output = tokio::process::Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| ExtractError::ToolFailed {
                tool: program.display().to_string(),
                reason: format!("failed to spawn: {}", e),
            })?;

        Ok(ToolOutput {
            success: output.status.success(),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

/// Resolve a tool binary: explicit config wins, then PATH search, then a
/// bare name left to runtime lookup.
pub(super) fn resolve_binary(name: &str, configured: Option<&PathBuf>, search_path: bool) -> PathBuf {
    if let Some(path) = configured {
        return path.clone();
    }
    if search_path {
        if let Ok(path) = which::which(name) {
            return path;
        }
    }
    warn!(tool = name, "binary not found, relying on runtime PATH lookup");
    PathBuf::from(name)
}
