//! Data models shared across crates.

mod storage;
mod video;

pub use storage::{ObjectRef, ObjectRefError, StoredRef};
pub use video::{CreateVideoRequest, Orientation, Video, VideoResponse};
