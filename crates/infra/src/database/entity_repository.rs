//! Entity persistence keyed by `(activity_id, identifier, type)`

use std::collections::HashMap;
use std::sync::Arc;

use alyante_core::EntityRepository;
use alyante_domain::{AlyanteError, Entity, EntityGroup, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use tokio::task;

use super::manager::DbManager;
use super::{map_join_error, map_json_error, map_sql_error};

const ENTITY_COLUMNS: &str =
    "id, activity_id, identifier, type, data_original, data_manipulated, extra";

/// SQLite-backed [`EntityRepository`]
pub struct SqliteEntityRepository {
    db: Arc<DbManager>,
}

impl SqliteEntityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl EntityRepository for SqliteEntityRepository {
    async fn find_by_activity_identifier_type(
        &self,
        activity_id: i64,
        identifier: &str,
        entity_type: &str,
    ) -> Result<Option<Entity>> {
        let db = Arc::clone(&self.db);
        let identifier = identifier.to_string();
        let entity_type = entity_type.to_string();

        task::spawn_blocking(move || -> Result<Option<Entity>> {
            let conn = db.get_connection()?;
            query_by_key(&conn, activity_id, &identifier, &entity_type)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, entity: &Entity) -> Result<Entity> {
        let db = Arc::clone(&self.db);
        let entity = entity.clone();

        task::spawn_blocking(move || -> Result<Entity> {
            let conn = db.get_connection()?;
            let id = match entity.id {
                Some(id) => update_entity(&conn, id, &entity)?,
                None => upsert_entity(&conn, &entity)?,
            };
            Ok(Entity { id: Some(id), ..entity })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn find_grouped_by_identifier(&self, activity_id: i64) -> Result<Vec<EntityGroup>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Vec<EntityGroup>> {
            let conn = db.get_connection()?;
            let entities = query_by_activity(&conn, activity_id)?;
            Ok(group_by_identifier(entities))
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn update_entity(conn: &Connection, id: i64, entity: &Entity) -> Result<i64> {
    let extra = serde_json::to_string(&entity.extra).map_err(map_json_error)?;
    let changed = conn
        .execute(
            "UPDATE entities
             SET activity_id = ?2, identifier = ?3, type = ?4,
                 data_original = ?5, data_manipulated = ?6, extra = ?7
             WHERE id = ?1",
            params![
                id,
                entity.activity_id,
                entity.identifier,
                entity.entity_type,
                entity.data_original,
                entity.data_manipulated,
                extra,
            ],
        )
        .map_err(map_sql_error)?;

    if changed == 0 {
        return Err(AlyanteError::NotFound(format!("entity {id} not found")));
    }
    Ok(id)
}

fn upsert_entity(conn: &Connection, entity: &Entity) -> Result<i64> {
    let extra = serde_json::to_string(&entity.extra).map_err(map_json_error)?;
    conn.execute(
        "INSERT INTO entities (activity_id, identifier, type, data_original, data_manipulated, extra)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT(activity_id, identifier, type) DO UPDATE SET
             data_original = excluded.data_original,
             data_manipulated = excluded.data_manipulated,
             extra = excluded.extra",
        params![
            entity.activity_id,
            entity.identifier,
            entity.entity_type,
            entity.data_original,
            entity.data_manipulated,
            extra,
        ],
    )
    .map_err(map_sql_error)?;

    conn.query_row(
        "SELECT id FROM entities WHERE activity_id = ?1 AND identifier = ?2 AND type = ?3",
        params![entity.activity_id, entity.identifier, entity.entity_type],
        |row| row.get(0),
    )
    .map_err(map_sql_error)
}

fn query_by_key(
    conn: &Connection,
    activity_id: i64,
    identifier: &str,
    entity_type: &str,
) -> Result<Option<Entity>> {
    let sql = format!(
        "SELECT {ENTITY_COLUMNS} FROM entities
         WHERE activity_id = ?1 AND identifier = ?2 AND type = ?3"
    );
    let raw = conn
        .query_row(&sql, params![activity_id, identifier, entity_type], map_raw_row)
        .optional()
        .map_err(map_sql_error)?;

    raw.map(RawEntity::into_entity).transpose()
}

fn query_by_activity(conn: &Connection, activity_id: i64) -> Result<Vec<Entity>> {
    let sql = format!("SELECT {ENTITY_COLUMNS} FROM entities WHERE activity_id = ?1 ORDER BY id");
    let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params![activity_id], map_raw_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;

    rows.into_iter().map(RawEntity::into_entity).collect()
}

/// Group entities by identifier, keeping groups in first-seen order.
fn group_by_identifier(entities: Vec<Entity>) -> Vec<EntityGroup> {
    let mut groups: Vec<EntityGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for entity in entities {
        match index.get(&entity.identifier) {
            Some(&pos) => groups[pos].entities.push(entity),
            None => {
                index.insert(entity.identifier.clone(), groups.len());
                groups.push(EntityGroup::new(entity.identifier.clone(), vec![entity]));
            }
        }
    }

    groups
}

struct RawEntity {
    id: i64,
    activity_id: i64,
    identifier: String,
    entity_type: String,
    data_original: Option<String>,
    data_manipulated: Option<String>,
    extra: String,
}

impl RawEntity {
    fn into_entity(self) -> Result<Entity> {
        let extra: Map<String, Value> = serde_json::from_str(&self.extra).map_err(map_json_error)?;
        Ok(Entity {
            id: Some(self.id),
            activity_id: self.activity_id,
            identifier: self.identifier,
            entity_type: self.entity_type,
            data_original: self.data_original,
            data_manipulated: self.data_manipulated,
            extra,
        })
    }
}

fn map_raw_row(row: &Row<'_>) -> rusqlite::Result<RawEntity> {
    Ok(RawEntity {
        id: row.get(0)?,
        activity_id: row.get(1)?,
        identifier: row.get(2)?,
        entity_type: row.get(3)?,
        data_original: row.get(4)?,
        data_manipulated: row.get(5)?,
        extra: row.get(6)?,
    })
}
