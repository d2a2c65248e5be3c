//! Video upload-and-publish pipeline
//!
//! stage → probe → derive key → remux → store → persist reference → sign

mod pipeline;
mod staging;

pub use pipeline::{IncomingVideo, UploadSettings, VideoUploadService};
