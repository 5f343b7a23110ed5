//! # Alyante Core
//!
//! Connector logic over ports, with no infrastructure dependencies.
//!
//! This crate contains:
//! - Port interfaces (credential store, auth endpoints, transport,
//!   entity/activity repositories)
//! - Token lifecycle and watermark tracking
//! - Download, upload and manipulation runs
//!
//! ## Architecture Principles
//! - Only depends on `alyante-domain`
//! - No database or HTTP code
//! - All external collaborators via traits

pub mod auth;
pub mod clock;
pub mod manipulation;
pub mod sync;

pub use auth::ports::{AuthApi, CredentialStore};
pub use auth::TokenProvider;
pub use clock::{Clock, FixedClock, SystemClock};
pub use manipulation::DateFormatManipulator;
pub use sync::ports::{
    ActivityRepository, CallRequest, CallResponse, EntityRepository, SyncTransport,
};
pub use sync::{
    Downloader, DownloaderSettings, LastChangeCommitter, SyncSession, Uploader, UploaderSettings,
    WatermarkTracker,
};
