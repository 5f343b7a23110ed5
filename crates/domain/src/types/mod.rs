//! Domain types and models

pub mod credential;
pub mod entity;
pub mod sync;

pub use credential::{parse_expiration, CredentialRecord, TokenState};
pub use entity::{Activity, Entity, EntityGroup};
pub use sync::{
    run_error_message, HttpMethod, OperationKind, QueryParams, ResourceParams, SyncMode,
    SyncSummary, WatermarkCommit,
};
