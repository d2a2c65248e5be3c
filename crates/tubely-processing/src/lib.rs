//! Tubely Processing Library
//!
//! Wrappers around the external media tools the upload pipeline shells out to:
//! `ffprobe` for stream geometry and `ffmpeg` for the fast-start remux.

pub mod video;

pub use video::{
    output_path_for, FastStartRemuxer, FfmpegRemuxer, FfprobeProber, MediaProber, ProbeError,
    RemuxError, PROCESSING_SUFFIX,
};
