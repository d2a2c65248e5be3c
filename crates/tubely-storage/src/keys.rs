//! Shared key generation for storage backends.
//!
//! Key format: `{orientation}/{hex(32 random bytes)}.{extension}`.

use rand::Rng;
use tubely_core::Orientation;

/// Number of random bytes in a generated name (hex-encoded to 64 characters).
pub const RANDOM_NAME_BYTES: usize = 32;

/// Hex encoding of `RANDOM_NAME_BYTES` bytes from the thread-local CSPRNG.
pub fn random_hex() -> String {
    let mut bytes = [0u8; RANDOM_NAME_BYTES];
    rand::rng().fill(&mut bytes);
    hex::encode(bytes)
}

/// Generate a storage key under the orientation prefix.
pub fn derive_key(orientation: Orientation, extension: &str) -> String {
    format!("{}/{}.{}", orientation, random_hex(), extension)
}

/// Generate a storage key for an MP4 video.
pub fn derive_video_key(orientation: Orientation) -> String {
    derive_key(orientation, "mp4")
}
