//! In-memory port implementations

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use alyante_core::{
    ActivityRepository, AuthApi, CallRequest, CallResponse, CredentialStore, EntityRepository,
    SyncTransport,
};
use alyante_domain::{Activity, AlyanteError, CredentialRecord, Entity, EntityGroup, Result};
use async_trait::async_trait;
use serde_json::Value;

/// Credential store backed by a map.
#[derive(Default)]
pub struct InMemoryCredentialStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl InMemoryCredentialStore {
    pub fn with_values(values: &[(&str, &str)]) -> Self {
        let store = Self::default();
        {
            let mut records = store.records.lock().unwrap();
            for (key, value) in values {
                records.insert((*key).to_string(), CredentialRecord::new(*key, *value));
            }
        }
        store
    }

    /// Overwrite a value behind the back of any component under test.
    pub fn overwrite(&self, key: &str, value: &str) {
        self.records.lock().unwrap().insert(key.to_string(), CredentialRecord::new(key, value));
    }

    pub fn value(&self, key: &str) -> Option<String> {
        self.records.lock().unwrap().get(key).map(|r| r.value.clone())
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn load(&self, key: &str) -> Result<Option<CredentialRecord>> {
        Ok(self.records.lock().unwrap().get(key).cloned())
    }

    async fn save(&self, key: &str, value: &str) -> Result<CredentialRecord> {
        let mut records = self.records.lock().unwrap();
        let record = match records.remove(key) {
            Some(existing) => existing.with_value(value),
            None => CredentialRecord::new(key, value),
        };
        records.insert(key.to_string(), record.clone());
        Ok(record)
    }
}

/// Scripted auth endpoints that count their calls.
#[derive(Default)]
pub struct MockAuthApi {
    login_responses: Mutex<VecDeque<Result<Value>>>,
    refresh_responses: Mutex<VecDeque<Result<Value>>>,
    validate_response: Mutex<Option<Value>>,
    pub login_calls: Mutex<Vec<(String, String)>>,
    pub refresh_calls: Mutex<Vec<String>>,
}

impl MockAuthApi {
    pub fn push_login(&self, response: Result<Value>) {
        self.login_responses.lock().unwrap().push_back(response);
    }

    pub fn push_refresh(&self, response: Result<Value>) {
        self.refresh_responses.lock().unwrap().push_back(response);
    }

    pub fn set_validate(&self, response: Option<Value>) {
        *self.validate_response.lock().unwrap() = response;
    }

    pub fn login_count(&self) -> usize {
        self.login_calls.lock().unwrap().len()
    }

    pub fn refresh_count(&self) -> usize {
        self.refresh_calls.lock().unwrap().len()
    }
}

#[async_trait]
impl AuthApi for MockAuthApi {
    async fn login(&self, username: &str, password: &str) -> Result<Value> {
        self.login_calls.lock().unwrap().push((username.to_string(), password.to_string()));
        self.login_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AlyanteError::Auth("no scripted login response".into())))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<Value> {
        self.refresh_calls.lock().unwrap().push(refresh_token.to_string());
        self.refresh_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AlyanteError::Auth("no scripted refresh response".into())))
    }

    async fn validate(&self, _access_token: &str) -> Result<Option<Value>> {
        Ok(self.validate_response.lock().unwrap().clone())
    }
}

/// Transport answering from a queue and recording every request.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<Result<CallResponse>>>,
    pub requests: Mutex<Vec<CallRequest>>,
}

impl ScriptedTransport {
    pub fn push(&self, status: u16, body: impl Into<String>) {
        self.responses.lock().unwrap().push_back(Ok(CallResponse::new(status, body)));
    }

    pub fn push_error(&self, error: AlyanteError) {
        self.responses.lock().unwrap().push_back(Err(error));
    }

    pub fn requests(&self) -> Vec<CallRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTransport for ScriptedTransport {
    async fn send(&self, request: &CallRequest) -> Result<CallResponse> {
        self.requests.lock().unwrap().push(request.clone());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(AlyanteError::Transport("no scripted response".into())))
    }
}

/// Entity repository keeping insertion order.
#[derive(Default)]
pub struct InMemoryEntityRepository {
    entities: Mutex<Vec<Entity>>,
    fail_saves: Mutex<bool>,
}

impl InMemoryEntityRepository {
    pub fn seed(&self, entity: Entity) -> Entity {
        let mut entities = self.entities.lock().unwrap();
        let mut entity = entity;
        entity.id = Some(entities.len() as i64 + 1);
        entities.push(entity.clone());
        entity
    }

    pub fn all(&self) -> Vec<Entity> {
        self.entities.lock().unwrap().clone()
    }

    pub fn find(&self, identifier: &str, entity_type: &str) -> Option<Entity> {
        self.all()
            .into_iter()
            .find(|e| e.identifier == identifier && e.entity_type == entity_type)
    }

    pub fn fail_saves(&self) {
        *self.fail_saves.lock().unwrap() = true;
    }
}

#[async_trait]
impl EntityRepository for InMemoryEntityRepository {
    async fn find_by_activity_identifier_type(
        &self,
        activity_id: i64,
        identifier: &str,
        entity_type: &str,
    ) -> Result<Option<Entity>> {
        Ok(self.entities.lock().unwrap().iter().find(|e| {
            e.activity_id == activity_id
                && e.identifier == identifier
                && e.entity_type == entity_type
        }).cloned())
    }

    async fn save(&self, entity: &Entity) -> Result<Entity> {
        if *self.fail_saves.lock().unwrap() {
            return Err(AlyanteError::Database("disk full".into()));
        }
        let mut entities = self.entities.lock().unwrap();
        match entity.id {
            Some(id) => {
                let slot = entities
                    .iter_mut()
                    .find(|e| e.id == Some(id))
                    .ok_or_else(|| AlyanteError::NotFound(format!("entity {id}")))?;
                *slot = entity.clone();
                Ok(entity.clone())
            }
            None => {
                let mut saved = entity.clone();
                saved.id = Some(entities.len() as i64 + 1);
                entities.push(saved.clone());
                Ok(saved)
            }
        }
    }

    async fn find_grouped_by_identifier(&self, activity_id: i64) -> Result<Vec<EntityGroup>> {
        let mut groups: Vec<EntityGroup> = Vec::new();
        for entity in self.entities.lock().unwrap().iter().filter(|e| e.activity_id == activity_id) {
            match groups.iter_mut().find(|g| g.identifier == entity.identifier) {
                Some(group) => group.entities.push(entity.clone()),
                None => groups.push(EntityGroup::new(entity.identifier.clone(), vec![entity.clone()])),
            }
        }
        Ok(groups)
    }
}

/// Activity repository backed by a map.
#[derive(Default)]
pub struct InMemoryActivityRepository {
    activities: Mutex<HashMap<i64, Activity>>,
}

impl InMemoryActivityRepository {
    pub fn with(activity: Activity) -> Self {
        let repo = Self::default();
        repo.activities.lock().unwrap().insert(activity.id, activity);
        repo
    }

    pub fn get(&self, id: i64) -> Option<Activity> {
        self.activities.lock().unwrap().get(&id).cloned()
    }
}

#[async_trait]
impl ActivityRepository for InMemoryActivityRepository {
    async fn get_by_id(&self, id: i64) -> Result<Activity> {
        self.get(id).ok_or_else(|| AlyanteError::NotFound(format!("activity {id}")))
    }

    async fn save(&self, activity: &Activity) -> Result<()> {
        self.activities.lock().unwrap().insert(activity.id, activity.clone());
        Ok(())
    }
}
