//! Port interfaces for authentication and credential persistence

use alyante_domain::{CredentialRecord, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Durable key/value store for token and watermark state.
///
/// `save` is an upsert: at most one record exists per key and the last write
/// wins.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Load the record stored under `key`, if any.
    async fn load(&self, key: &str) -> Result<Option<CredentialRecord>>;

    /// Create or overwrite the record stored under `key`.
    async fn save(&self, key: &str, value: &str) -> Result<CredentialRecord>;
}

/// Vendor authentication endpoints.
///
/// Implementations map non-success statuses to `AlyanteError::Auth` and
/// return the decoded JSON body otherwise. Response field validation is left
/// to the caller.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// `POST /api/login` with `{username, password}`.
    async fn login(&self, username: &str, password: &str) -> Result<Value>;

    /// `POST /oauth/access_token` with a form-encoded refresh grant.
    async fn refresh(&self, refresh_token: &str) -> Result<Value>;

    /// `GET /api/validate`; `None` when the server answers 401.
    async fn validate(&self, access_token: &str) -> Result<Option<Value>>;
}
