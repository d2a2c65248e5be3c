pub mod probe;
pub mod remux;

pub use probe::{FfprobeProber, MediaProber, ProbeError};
pub use remux::{
    output_path_for, FastStartRemuxer, FfmpegRemuxer, RemuxError, PROCESSING_SUFFIX,
};

use anyhow::{anyhow, Result};

/// Reject tool paths with shell metacharacters or traversal sequences.
pub(crate) fn validate_tool_path(path: &str) -> Result<()> {
    let dangerous_chars = [';', '|', '&', '$', '`', '(', ')', '<', '>', '\n', '\r'];
    if path.is_empty() || path.chars().any(|c| dangerous_chars.contains(&c)) {
        return Err(anyhow!("Tool path contains dangerous characters: {}", path));
    }

    if path.contains("..") {
        return Err(anyhow!("Tool path contains directory traversal: {}", path));
    }

    if !path
        .chars()
        .all(|c| c.is_alphanumeric() || c == '/' || c == '-' || c == '_' || c == '.' || c == '\\')
    {
        return Err(anyhow!("Tool path contains unsafe characters: {}", path));
    }

    Ok(())
}
