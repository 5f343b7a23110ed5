//! SQLite persistence for credentials, activities and entities

mod activity_repository;
mod credential_repository;
mod entity_repository;
mod manager;

pub use activity_repository::SqliteActivityRepository;
pub use credential_repository::SqliteCredentialStore;
pub use entity_repository::SqliteEntityRepository;
pub use manager::{DbConnection, DbManager};

use alyante_domain::AlyanteError;
use tokio::task;

use crate::errors::InfraError;

pub(crate) fn map_sql_error(err: rusqlite::Error) -> AlyanteError {
    AlyanteError::from(InfraError::from(err))
}

pub(crate) fn map_json_error(err: serde_json::Error) -> AlyanteError {
    AlyanteError::from(InfraError::from(err))
}

pub(crate) fn map_join_error(err: task::JoinError) -> AlyanteError {
    if err.is_cancelled() {
        AlyanteError::Internal("blocking task cancelled".into())
    } else {
        AlyanteError::Internal(format!("blocking task failed: {err}"))
    }
}
