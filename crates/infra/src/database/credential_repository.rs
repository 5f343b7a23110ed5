//! Credential store over the `alyante_data` table
//!
//! Holds the access/refresh token, their expiration and the per-activity-type
//! watermarks, one row per key.

use std::sync::Arc;

use alyante_core::CredentialStore;
use alyante_domain::{AlyanteError, CredentialRecord, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tokio::task;

use super::manager::DbManager;
use super::{map_join_error, map_sql_error};

/// SQLite-backed [`CredentialStore`]
pub struct SqliteCredentialStore {
    db: Arc<DbManager>,
}

impl SqliteCredentialStore {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl CredentialStore for SqliteCredentialStore {
    async fn load(&self, key: &str) -> Result<Option<CredentialRecord>> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();

        task::spawn_blocking(move || -> Result<Option<CredentialRecord>> {
            let conn = db.get_connection()?;
            query_record(&conn, &key)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn save(&self, key: &str, value: &str) -> Result<CredentialRecord> {
        let db = Arc::clone(&self.db);
        let key = key.to_string();
        let value = value.to_string();

        task::spawn_blocking(move || -> Result<CredentialRecord> {
            let conn = db.get_connection()?;
            upsert_record(&conn, &key, &value, Utc::now())?;
            query_record(&conn, &key)?.ok_or_else(|| {
                AlyanteError::Database(format!("credential '{key}' missing after save"))
            })
        })
        .await
        .map_err(map_join_error)?
    }
}

// ============================================================================
// SQL Operations (synchronous)
// ============================================================================

fn upsert_record(conn: &Connection, key: &str, value: &str, now: DateTime<Utc>) -> Result<()> {
    conn.execute(
        "INSERT INTO alyante_data (key, value, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?3)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
        params![key, value, now.to_rfc3339()],
    )
    .map_err(map_sql_error)?;
    Ok(())
}

fn query_record(conn: &Connection, key: &str) -> Result<Option<CredentialRecord>> {
    let raw = conn
        .query_row(
            "SELECT key, value, created_at, updated_at FROM alyante_data WHERE key = ?1",
            params![key],
            map_raw_row,
        )
        .optional()
        .map_err(map_sql_error)?;

    raw.map(RawRecord::into_record).transpose()
}

struct RawRecord {
    key: String,
    value: String,
    created_at: String,
    updated_at: String,
}

impl RawRecord {
    fn into_record(self) -> Result<CredentialRecord> {
        Ok(CredentialRecord {
            created_at: parse_timestamp(&self.created_at)?,
            updated_at: parse_timestamp(&self.updated_at)?,
            key: self.key,
            value: self.value,
        })
    }
}

fn map_raw_row(row: &Row<'_>) -> rusqlite::Result<RawRecord> {
    Ok(RawRecord {
        key: row.get(0)?,
        value: row.get(1)?,
        created_at: row.get(2)?,
        updated_at: row.get(3)?,
    })
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|err| AlyanteError::Database(format!("invalid stored timestamp '{value}': {err}")))
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    fn setup_store() -> (SqliteCredentialStore, TempDir) {
        let temp_dir = TempDir::new().expect("temp dir");
        let db = DbManager::new(temp_dir.path().join("creds.db"), 2).expect("db manager");
        db.run_migrations().expect("migrations");
        (SqliteCredentialStore::new(Arc::new(db)), temp_dir)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn load_missing_key_returns_none() {
        let (store, _dir) = setup_store();
        assert_eq!(store.load("access_token").await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn save_overwrites_single_record_per_key() {
        let (store, _dir) = setup_store();

        let first = store.save("access_token", "A1").await.unwrap();
        let second = store.save("access_token", "A2").await.unwrap();

        assert_eq!(second.value, "A2");
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);

        let loaded = store.load("access_token").await.unwrap().expect("record");
        assert_eq!(loaded.value, "A2");

        let conn = store.db.get_connection().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM alyante_data WHERE key = 'access_token'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(count, 1);
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn keys_are_independent() {
        let (store, _dir) = setup_store();

        store.save("last_change_products", "2024-01-01 00:00:01").await.unwrap();
        store.save("last_change_customers", "2024-02-01 00:00:01").await.unwrap();

        let products = store.load("last_change_products").await.unwrap().unwrap();
        assert_eq!(products.value, "2024-01-01 00:00:01");
    }
}
