//! Download/upload runs over an authenticated session

pub mod committer;
pub mod downloader;
pub mod ports;
pub mod session;
pub mod uploader;
pub mod watermark;

pub use committer::LastChangeCommitter;
pub use downloader::{Downloader, DownloaderSettings};
pub use session::SyncSession;
pub use uploader::{Uploader, UploaderSettings};
pub use watermark::WatermarkTracker;
