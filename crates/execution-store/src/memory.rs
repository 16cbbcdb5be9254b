use crate::{is_valid_transition, ExecutionRecord, ExecutionStore, ExecutionStoreError};
use async_trait::async_trait;
use common::types::{ExecutionStatus, JsonValue};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// In-memory `ExecutionStore` fake for tests — no Postgres required.
#[derive(Default)]
pub struct InMemoryExecutionStore {
    records: RwLock<HashMap<String, ExecutionRecord>>,
}

impl InMemoryExecutionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExecutionStore for InMemoryExecutionStore {
    async fn insert_queued(
        &self,
        execution_id: &str,
        user_id: i64,
        workflow_id: i64,
        node_id: Option<i64>,
    ) -> Result<(), ExecutionStoreError> {
        let record = ExecutionRecord {
            execution_id: execution_id.to_string(),
            user_id,
            workflow_id,
            node_id,
            status: ExecutionStatus::Queued,
            result: None,
            error: None,
        };
        self.records
            .write()
            .await
            .insert(execution_id.to_string(), record);
        Ok(())
    }

    async fn transition(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) -> Result<(), ExecutionStoreError> {
        let mut records = self.records.write().await;
        let record = records
            .get_mut(execution_id)
            .ok_or_else(|| ExecutionStoreError::NotFound(execution_id.to_string()))?;

        if !is_valid_transition(record.status, status) {
            return Err(ExecutionStoreError::InvalidTransition(
                execution_id.to_string(),
                record.status,
                status,
            ));
        }

        record.status = status;
        record.result = result;
        record.error = error;
        Ok(())
    }

    async fn get(&self, execution_id: &str) -> Result<ExecutionRecord, ExecutionStoreError> {
        self.records
            .read()
            .await
            .get(execution_id)
            .cloned()
            .ok_or_else(|| ExecutionStoreError::NotFound(execution_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_then_processing_then_completed_is_valid() {
        let store = InMemoryExecutionStore::new();
        store.insert_queued("e1", 1, 10, None).await.unwrap();
        store
            .transition("e1", ExecutionStatus::Processing, None, None)
            .await
            .unwrap();
        store
            .transition(
                "e1",
                ExecutionStatus::Completed,
                Some(serde_json::json!({"ok": true})),
                None,
            )
            .await
            .unwrap();
        let record = store.get("e1").await.unwrap();
        assert_eq!(record.status, ExecutionStatus::Completed);
    }

    #[tokio::test]
    async fn terminal_state_cannot_move_backward() {
        let store = InMemoryExecutionStore::new();
        store.insert_queued("e1", 1, 10, None).await.unwrap();
        store
            .transition("e1", ExecutionStatus::Completed, None, None)
            .await
            .unwrap();
        let err = store
            .transition("e1", ExecutionStatus::Queued, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionStoreError::InvalidTransition(_, _, _)));
    }

    #[tokio::test]
    async fn transition_on_unknown_execution_is_not_found() {
        let store = InMemoryExecutionStore::new();
        let err = store
            .transition("missing", ExecutionStatus::Processing, None, None)
            .await
            .unwrap_err();
        assert!(matches!(err, ExecutionStoreError::NotFound(_)));
    }
}
