pub mod ownership;
pub mod signer;
pub mod thumbnail;
pub mod upload;

pub use ownership::load_owned_video;
pub use signer::UrlSigner;
pub use thumbnail::ThumbnailService;
pub use upload::{IncomingVideo, UploadSettings, VideoUploadService};
