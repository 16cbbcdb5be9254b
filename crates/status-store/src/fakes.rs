use crate::StatusReadWrite;
use async_trait::async_trait;
use common::error::StatusStoreError;
use common::types::{JsonValue, StatusSnapshot};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory `StatusReadWrite` fake — no Redis required, no TTL expiry.
#[derive(Default)]
pub struct InMemoryStatusStore {
    snapshots: RwLock<HashMap<String, StatusSnapshot>>,
}

impl InMemoryStatusStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StatusReadWrite for InMemoryStatusStore {
    async fn put(
        &self,
        execution_id: &str,
        status: &str,
        result: Option<JsonValue>,
        timestamp: i64,
    ) -> Result<(), StatusStoreError> {
        self.snapshots.write().await.insert(
            execution_id.to_string(),
            StatusSnapshot {
                execution_id: execution_id.to_string(),
                status: status.to_string(),
                result,
                timestamp,
            },
        );
        Ok(())
    }

    async fn get(&self, execution_id: &str) -> Result<JsonValue, StatusStoreError> {
        match self.snapshots.read().await.get(execution_id) {
            Some(snapshot) => Ok(serde_json::to_value(snapshot)
                .map_err(|e| StatusStoreError::Serialize(e.to_string()))?),
            None => Ok(serde_json::json!({"status": "not_found"})),
        }
    }
}
