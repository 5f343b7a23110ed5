//! Port interfaces for sync operations

use std::time::Duration;

use alyante_domain::{Activity, Entity, EntityGroup, HttpMethod, Result};
use async_trait::async_trait;

/// A fully prepared webservice call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: Vec<(String, String)>,
    pub body: Option<String>,
    pub timeout: Duration,
}

impl CallRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// Status and decoded body of a webservice call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallResponse {
    pub status: u16,
    pub body: String,
}

impl CallResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self { status, body: body.into() }
    }
}

/// Executes prepared requests.
///
/// Any HTTP status is a successful `send`; only network failures and body
/// decoding problems are errors (`AlyanteError::Transport`). Compressed
/// bodies are returned decompressed.
#[async_trait]
pub trait SyncTransport: Send + Sync {
    async fn send(&self, request: &CallRequest) -> Result<CallResponse>;
}

/// Persistence for downloaded and queued entities
#[async_trait]
pub trait EntityRepository: Send + Sync {
    /// Look up the entity keyed by `(activity_id, identifier, entity_type)`.
    async fn find_by_activity_identifier_type(
        &self,
        activity_id: i64,
        identifier: &str,
        entity_type: &str,
    ) -> Result<Option<Entity>>;

    /// Insert or update; returns the entity with its store id set.
    async fn save(&self, entity: &Entity) -> Result<Entity>;

    /// All entities of an activity grouped by identifier, groups ordered by
    /// first insertion.
    async fn find_grouped_by_identifier(&self, activity_id: i64) -> Result<Vec<EntityGroup>>;
}

/// Persistence for activities (sync runs)
#[async_trait]
pub trait ActivityRepository: Send + Sync {
    /// # Errors
    /// `AlyanteError::NotFound` when no activity has this id.
    async fn get_by_id(&self, id: i64) -> Result<Activity>;

    async fn save(&self, activity: &Activity) -> Result<()>;
}
