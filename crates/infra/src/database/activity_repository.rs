//! Activity (sync run) persistence

use std::sync::Arc;

use alyante_core::ActivityRepository;
use alyante_domain::{Activity, AlyanteError, Result};
use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::{Map, Value};
use tokio::task;

use super::manager::DbManager;
use super::{map_join_error, map_json_error, map_sql_error};

/// SQLite-backed [`ActivityRepository`]
pub struct SqliteActivityRepository {
    db: Arc<DbManager>,
}

impl SqliteActivityRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }

    /// Register a new activity and return it with its assigned id.
    pub async fn create(&self, activity_type: &str) -> Result<Activity> {
        let db = Arc::clone(&self.db);
        let activity_type = activity_type.to_string();

        task::spawn_blocking(move || -> Result<Activity> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO activities (type, extra) VALUES (?1, '{}')",
                params![activity_type],
            )
            .map_err(map_sql_error)?;
            Ok(Activity::new(conn.last_insert_rowid(), activity_type))
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl ActivityRepository for SqliteActivityRepository {
    async fn get_by_id(&self, id: i64) -> Result<Activity> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> Result<Activity> {
            let conn = db.get_connection()?;
            query_activity(&conn, id)?
                .ok_or_else(|| AlyanteError::NotFound(format!("activity {id} not found")))
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, activity: &Activity) -> Result<()> {
        let db = Arc::clone(&self.db);
        let activity = activity.clone();

        task::spawn_blocking(move || -> Result<()> {
            let conn = db.get_connection()?;
            let extra = serde_json::to_string(&activity.extra).map_err(map_json_error)?;
            conn.execute(
                "INSERT INTO activities (id, type, extra) VALUES (?1, ?2, ?3)
                 ON CONFLICT(id) DO UPDATE SET
                     type = excluded.type,
                     extra = excluded.extra,
                     updated_at = CAST(strftime('%s','now') AS INTEGER)",
                params![activity.id, activity.activity_type, extra],
            )
            .map_err(map_sql_error)?;
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_activity(conn: &Connection, id: i64) -> Result<Option<Activity>> {
    let row = conn
        .query_row("SELECT id, type, extra FROM activities WHERE id = ?1", params![id], |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
        })
        .optional()
        .map_err(map_sql_error)?;

    row.map(|(id, activity_type, extra)| -> Result<Activity> {
        let extra: Map<String, Value> = serde_json::from_str(&extra).map_err(map_json_error)?;
        Ok(Activity { id, activity_type, extra })
    })
    .transpose()
}
