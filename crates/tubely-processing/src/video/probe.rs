//! Media prober - reads stream geometry with ffprobe and classifies it

use super::validate_tool_path;
use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::Path;
use std::process::Stdio;
use tokio::process::Command;
use tubely_core::{AppError, Orientation};

#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("failed to start ffprobe: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("ffprobe exited with {status}: {stderr}")]
    ToolFailed { status: String, stderr: String },

    #[error("could not parse ffprobe output: {0}")]
    MalformedOutput(#[source] serde_json::Error),

    #[error("no video stream found")]
    NoVideoStream,

    #[error("invalid video geometry {width}x{height}")]
    InvalidGeometry { width: u32, height: u32 },
}

impl From<ProbeError> for AppError {
    fn from(err: ProbeError) -> Self {
        AppError::Probe(err.to_string())
    }
}

/// Determines the orientation of a staged video file.
#[async_trait]
pub trait MediaProber: Send + Sync {
    async fn probe(&self, path: &Path) -> Result<Orientation, ProbeError>;
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    #[serde(default)]
    codec_type: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
}

/// Width and height of the first video stream in ffprobe's JSON output.
pub fn parse_dimensions(stdout: &[u8]) -> Result<(u32, u32), ProbeError> {
    let output: ProbeOutput =
        serde_json::from_slice(stdout).map_err(ProbeError::MalformedOutput)?;

    let (width, height) = output
        .streams
        .iter()
        .filter(|s| s.codec_type.as_deref().map_or(true, |t| t == "video"))
        .find_map(|s| Some((s.width?, s.height?)))
        .ok_or(ProbeError::NoVideoStream)?;

    if width == 0 || height == 0 {
        return Err(ProbeError::InvalidGeometry { width, height });
    }

    Ok((width, height))
}

pub struct FfprobeProber {
    ffprobe_path: String,
}

impl FfprobeProber {
    pub fn new(ffprobe_path: String) -> anyhow::Result<Self> {
        validate_tool_path(&ffprobe_path).context("Invalid ffprobe_path")?;
        Ok(Self { ffprobe_path })
    }
}

#[async_trait]
impl MediaProber for FfprobeProber {
    #[tracing::instrument(skip(self), fields(
        process.executable.name = "ffprobe",
        process.executable.path = %self.ffprobe_path,
        ffmpeg.operation = "probe"
    ))]
    async fn probe(&self, path: &Path) -> Result<Orientation, ProbeError> {
        let start = std::time::Instant::now();

        let output = Command::new(&self.ffprobe_path)
            .args(["-v", "error", "-print_format", "json", "-show_streams"])
            .arg(path)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(ProbeError::Spawn)?;

        if !output.status.success() {
            return Err(ProbeError::ToolFailed {
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let (width, height) = parse_dimensions(&output.stdout)?;
        let orientation = Orientation::classify(width, height);

        tracing::info!(
            duration_ms = start.elapsed().as_millis(),
            width = width,
            height = height,
            orientation = %orientation,
            "Video probe completed"
        );

        Ok(orientation)
    }
}
