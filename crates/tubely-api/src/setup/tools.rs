//! External media tools

use anyhow::Result;
use std::sync::Arc;
use tubely_core::Config;
use tubely_processing::{FastStartRemuxer, FfmpegRemuxer, FfprobeProber, MediaProber};

pub fn setup_media_tools(
    config: &Config,
) -> Result<(Arc<dyn MediaProber>, Arc<dyn FastStartRemuxer>)> {
    let upload = config.upload();
    let prober = FfprobeProber::new(upload.ffprobe_path.clone())?;
    let remuxer = FfmpegRemuxer::new(upload.ffmpeg_path.clone())?;

    tracing::info!(
        ffprobe_path = %upload.ffprobe_path,
        ffmpeg_path = %upload.ffmpeg_path,
        "Media tools configured"
    );

    Ok((Arc::new(prober), Arc::new(remuxer)))
}
