pub mod fakes;

use async_trait::async_trait;
use common::error::StatusStoreError;
use common::types::{JsonValue, StatusSnapshot};
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

const STATUS_TTL_SECS: u64 = 3600;

fn status_key(execution_id: &str) -> String {
    format!("execution_status:{execution_id}")
}

/// Read/write contract for the ephemeral status cache, implemented by
/// [`StatusStore`] against Redis and by [`fakes::InMemoryStatusStore`] for
/// tests that should not need a live Redis instance.
#[async_trait]
pub trait StatusReadWrite: Send + Sync {
    async fn put(
        &self,
        execution_id: &str,
        status: &str,
        result: Option<JsonValue>,
        timestamp: i64,
    ) -> Result<(), StatusStoreError>;

    async fn get(&self, execution_id: &str) -> Result<JsonValue, StatusStoreError>;
}

/// Ephemeral, TTL-bounded execution-status cache for polling clients.
///
/// This is advisory only: the authoritative record lives in the
/// orchestrator's Execution Record, kept current via the Callback Reporter.
/// A reader of this store sees the latest status the worker wrote, or
/// `not_found` once the entry has expired or was never written.
#[derive(Clone)]
pub struct StatusStore {
    conn: ConnectionManager,
}

impl StatusStore {
    pub async fn connect(redis_url: &str) -> Result<Self, StatusStoreError> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StatusStoreError::Connect(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| StatusStoreError::Connect(e.to_string()))?;
        Ok(Self { conn })
    }

    pub async fn put(
        &self,
        execution_id: &str,
        status: &str,
        result: Option<JsonValue>,
        timestamp: i64,
    ) -> Result<(), StatusStoreError> {
        let snapshot = StatusSnapshot {
            execution_id: execution_id.to_string(),
            status: status.to_string(),
            result,
            timestamp,
        };
        let payload = serde_json::to_string(&snapshot)
            .map_err(|e| StatusStoreError::Serialize(e.to_string()))?;
        let mut conn = self.conn.clone();
        conn.set_ex::<_, _, ()>(status_key(execution_id), payload, STATUS_TTL_SECS)
            .await
            .map_err(|e| StatusStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    pub async fn get(&self, execution_id: &str) -> Result<JsonValue, StatusStoreError> {
        let mut conn = self.conn.clone();
        let payload: Option<String> = conn
            .get(status_key(execution_id))
            .await
            .map_err(|e| StatusStoreError::Backend(e.to_string()))?;
        match payload {
            Some(raw) => serde_json::from_str(&raw)
                .map_err(|e| StatusStoreError::Serialize(e.to_string())),
            None => Ok(serde_json::json!({"status": "not_found"})),
        }
    }
}

#[async_trait]
impl StatusReadWrite for StatusStore {
    async fn put(
        &self,
        execution_id: &str,
        status: &str,
        result: Option<JsonValue>,
        timestamp: i64,
    ) -> Result<(), StatusStoreError> {
        StatusStore::put(self, execution_id, status, result, timestamp).await
    }

    async fn get(&self, execution_id: &str) -> Result<JsonValue, StatusStoreError> {
        StatusStore::get(self, execution_id).await
    }
}
