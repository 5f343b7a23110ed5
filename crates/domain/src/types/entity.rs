//! Generic persisted entities and the activities that own them

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{AlyanteError, Result};

/// A record downloaded from, or queued for upload to, the remote service.
///
/// Entities are unique per `(activity_id, identifier, entity_type)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Store identifier; `None` until first saved.
    pub id: Option<i64>,
    pub activity_id: i64,
    pub identifier: String,
    pub entity_type: String,
    /// Raw serialized record as received from the remote service.
    pub data_original: Option<String>,
    /// Record after local manipulation; the uploader reads this.
    pub data_manipulated: Option<String>,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Entity {
    pub fn new(
        activity_id: i64,
        identifier: impl Into<String>,
        entity_type: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            activity_id,
            identifier: identifier.into(),
            entity_type: entity_type.into(),
            data_original: None,
            data_manipulated: None,
            extra: Map::new(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Merge `values` into the extra map, overwriting existing keys.
    pub fn add_extra<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.extra.extend(values);
    }
}

/// Entities of one activity sharing an identifier, one per entity type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityGroup {
    pub identifier: String,
    pub entities: Vec<Entity>,
}

impl EntityGroup {
    pub fn new(identifier: impl Into<String>, entities: Vec<Entity>) -> Self {
        Self { identifier: identifier.into(), entities }
    }

    pub fn by_type(&self, entity_type: &str) -> Option<&Entity> {
        self.entities.iter().find(|e| e.entity_type == entity_type)
    }

    pub fn by_type_mut(&mut self, entity_type: &str) -> Option<&mut Entity> {
        self.entities.iter_mut().find(|e| e.entity_type == entity_type)
    }

    /// `{entity_type: manipulated data}` view used for dotted-path lookups.
    ///
    /// Entities without manipulated data map to `null`.
    pub fn manipulated_view(&self) -> Result<Value> {
        let mut view = Map::new();
        for entity in &self.entities {
            let data = match entity.data_manipulated.as_deref() {
                Some(raw) => serde_json::from_str(raw).map_err(|e| {
                    AlyanteError::InvalidInput(format!(
                        "Invalid manipulated data for entity {} of type {}: {e}",
                        entity.identifier, entity.entity_type
                    ))
                })?,
                None => Value::Null,
            };
            view.insert(entity.entity_type.clone(), data);
        }
        Ok(Value::Object(view))
    }
}

/// A sync run as tracked by the host pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub activity_type: String,
    #[serde(default)]
    pub extra: Map<String, Value>,
}

impl Activity {
    pub fn new(id: i64, activity_type: impl Into<String>) -> Self {
        Self { id, activity_type: activity_type.into(), extra: Map::new() }
    }

    /// String value of an extra key, if present and a string.
    pub fn extra_str(&self, key: &str) -> Option<&str> {
        self.extra.get(key).and_then(Value::as_str)
    }

    pub fn add_extra<I>(&mut self, values: I)
    where
        I: IntoIterator<Item = (String, Value)>,
    {
        self.extra.extend(values);
    }
}
