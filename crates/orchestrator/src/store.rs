use async_trait::async_trait;
use payflow_types::{PaymentFlowState, PaymentRequest};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("connection error: {0}")]
    Connection(String),
}

/// Durable record of an in-flight payment, keyed by session id.
///
/// The record must survive a process restart for `resume_payment` to be
/// useful.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub request: PaymentRequest,
    pub state: PaymentFlowState,

    /// Unix seconds
    pub updated_at: i64,
}

impl SessionRecord {
    pub fn new(session_id: impl Into<String>, request: PaymentRequest, updated_at: i64) -> Self {
        Self {
            session_id: session_id.into(),
            request,
            state: PaymentFlowState::Idle,
            updated_at,
        }
    }
}

/// Persistence seam for resumable payment sessions
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError>;

    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError>;

    async fn delete(&self, session_id: &str) -> Result<(), StoreError>;

    /// Session ids with a persisted in-flight record
    async fn list_sessions(&self) -> Result<Vec<String>, StoreError>;
}

/// In-memory store for tests and single-process embedders
#[derive(Default)]
pub struct MemorySessionStore {
    records: RwLock<HashMap<String, SessionRecord>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn save(&self, record: &SessionRecord) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(record.session_id.clone(), record.clone());
        Ok(())
    }

    async fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(session_id)
            .cloned())
    }

    async fn delete(&self, session_id: &str) -> Result<(), StoreError> {
        self.records
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(session_id);
        Ok(())
    }

    async fn list_sessions(&self) -> Result<Vec<String>, StoreError> {
        Ok(self
            .records
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .keys()
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn test_record(session_id: &str) -> SessionRecord {
        let request = PaymentRequest::builder()
            .content_id("content-1")
            .creator("0xcreator")
            .amount(1_000)
            .max_slippage(Decimal::ZERO)
            .deadline(2_000_000_000)
            .payer("0xpayer")
            .session_id(session_id)
            .build()
            .unwrap();
        SessionRecord::new(session_id, request, 1700000000)
    }

    #[tokio::test]
    async fn test_memory_store_round_trip() {
        let store = MemorySessionStore::new();
        let record = test_record("session-1");

        store.save(&record).await.unwrap();
        let loaded = store.load("session-1").await.unwrap().unwrap();
        assert_eq!(loaded, record);

        store.delete("session-1").await.unwrap();
        assert!(store.load("session-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_memory_store_missing_session() {
        let store = MemorySessionStore::new();
        assert!(store.load("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_sessions() {
        let store = MemorySessionStore::new();
        store.save(&test_record("a")).await.unwrap();
        store.save(&test_record("b")).await.unwrap();

        let mut sessions = store.list_sessions().await.unwrap();
        sessions.sort();
        assert_eq!(sessions, vec!["a".to_string(), "b".to_string()]);
    }
}
