//! Tubely Storage Library
//!
//! Object store abstraction with S3 and local filesystem backends.
//!
//! # Storage key format
//!
//! Video keys are namespaced by orientation: `{orientation}/{64 hex chars}.mp4`,
//! for example `landscape/9f86d0...a08.mp4`. The random part comes from 32
//! bytes of cryptographically secure randomness, so keys never collide in
//! practice and reveal nothing about the uploader. Key generation lives in the
//! `keys` module.
//!
//! Backends never hand out permanent URLs. Reads go through
//! [`Storage::presign_get`], which returns a URL that expires.

pub mod factory;
pub mod keys;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
pub use keys::{derive_video_key, random_hex};
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{Storage, StorageError, StorageResult};
pub use tubely_core::StorageBackend;
