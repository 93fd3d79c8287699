use crate::store::{SessionRecord, SessionStore, StoreError};
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};
use std::path::Path;

/// SQLite-backed session store; survives process restarts
pub struct SqliteSessionStore {
    pool: SqlitePool,
}

impl SqliteSessionStore {
    pub async fn new<P: AsRef<Path>>(db_path: P) -> Result<Self, StoreError> {
        let url = format!("sqlite:{}?mode=rwc", db_path.as_ref().display());
        let pool = SqlitePool::connect(&url)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// In-memory database, for tests
    pub async fn in_memory() -> Result<Self, StoreError> {
        let pool = SqlitePool::connect("sqlite::memory:")
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::query(include_str!("../migrations/001_create_sessions.sql"))
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<SessionRecord, StoreError> {
        let request_json: String = row.get("request");
        let state_json: String = row.get("state");

        Ok(SessionRecord {
            session_id: row.get("session_id"),
            request: serde_json::from_str(&request_json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            state: serde_json::from_str(&state_json)
                .map_err(|e| StoreError::Serialization(e.to_string()))?,
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        let request_json = serde_json::to_string(&record.request)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        let state_json = serde_json::to_string(&record.state)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;

        sqlx::query(
            "INSERT OR REPLACE INTO payment_sessions (session_id, request, state, updated_at)
             VALUES (?, ?, ?, ?)",
        )
        .bind(&record.session_id)
        .bind(&request_json)
        .bind(&state_json)
        .bind(record.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        let row = sqlx::query("SELECT * FROM payment_sessions WHERE session_id = ?")
            .bind(session_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        sqlx::query("DELETE FROM payment_sessions WHERE session_id = ?")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query("SELECT session_id FROM payment_sessions")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(rows.iter().map(|r| r.get("session_id")).collect())
    }
}
