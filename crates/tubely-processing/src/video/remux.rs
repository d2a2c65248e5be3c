//! Fast-start remuxing: moves the MP4 index ahead of the media data so
//! playback can start before the whole file is downloaded.

use super::validate_tool_path;
use anyhow::Context;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tubely_core::AppError;

/// Suffix appended to the source path to name the remuxed output.
pub const PROCESSING_SUFFIX: &str = ".processing";

#[derive(Debug, thiserror::Error)]
pub enum RemuxError {
    #[error("failed to start ffmpeg: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffmpeg exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("ffmpeg reported success but produced no output at {0}")]
    MissingOutput(PathBuf),
}

impl From<RemuxError> for AppError {
    fn from(err: RemuxError) -> Self {
        AppError::Remux(err.to_string())
    }
}

/// Produces a fast-start copy of a video next to the source file.
#[async_trait]
pub trait FastStartRemuxer: Send + Sync {
    /// Returns the path of the new file. The source is left in place.
    async fn remux(&self, source: &Path) -> Result<PathBuf, RemuxError>;
}

/// `<source>.processing`
pub fn output_path_for(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_owned();
    name.push(PROCESSING_SUFFIX);
    PathBuf::from(name)
}

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new(ffmpeg_path: String) -> anyhow::Result<Self> {
        validate_tool_path(&ffmpeg_path).context("Invalid ffmpeg_path")?;
        Ok(Self { ffmpeg_path })
    }
}

#[async_trait]
impl FastStartRemuxer for FfmpegRemuxer {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffmpeg",
        process.executable.path = %self.ffmpeg_path,
        ffmpeg.operation = "faststart"
    ))]
    async fn remux(&self, source: &Path) -> Result<PathBuf, RemuxError> {
        let start = std::time::Instant::now();
        let output_path = output_path_for(source);

        // Streams are copied, not re-encoded. No -y: an existing output is an error.
        let output = Command::new(&self.ffmpeg_path)
            .arg("-i")
            .arg(source)
            .args(["-c", "copy", "-movflags", "faststart", "-f", "mp4"])
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(RemuxError::Spawn)?;

        if !output.status.success() {
            return Err(RemuxError::ToolFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        if !tokio::fs::try_exists(&output_path).await.unwrap_or(false) {
            return Err(RemuxError::MissingOutput(output_path));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            output = %output_path.display(),
            "Fast-start remux completed"
        );

        Ok(output_path)
    }
}
