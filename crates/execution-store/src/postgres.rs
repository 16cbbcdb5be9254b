use crate::{is_valid_transition, ExecutionRecord, ExecutionStore, ExecutionStoreError};
use async_trait::async_trait;
use common::types::{ExecutionStatus, JsonValue};
use sqlx::{PgPool, Row};

/// `sqlx`/Postgres-backed Execution Store.
///
/// Expects an `execution_records` table with columns matching
/// [`ExecutionRecord`]; migrations for this table live alongside the
/// orchestrator's own schema and are out of scope for this crate.
pub struct PostgresExecutionStore {
    pool: PgPool,
}

impl PostgresExecutionStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str) -> Result<Self, ExecutionStoreError> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| ExecutionStoreError::Backend(e.to_string()))?;
        Ok(Self::new(pool))
    }
}

fn parse_status(raw: &str) -> Result<ExecutionStatus, ExecutionStoreError> {
    match raw {
        "queued" => Ok(ExecutionStatus::Queued),
        "processing" => Ok(ExecutionStatus::Processing),
        "completed" => Ok(ExecutionStatus::Completed),
        "failed" => Ok(ExecutionStatus::Failed),
        other => Err(ExecutionStoreError::Backend(format!(
            "unrecognized execution status '{other}' in database row"
        ))),
    }
}

#[async_trait]
impl ExecutionStore for PostgresExecutionStore {
    async fn insert_queued(
        &self,
        execution_id: &str,
        user_id: i64,
        workflow_id: i64,
        node_id: Option<i64>,
    ) -> Result<(), ExecutionStoreError> {
        sqlx::query(
            "INSERT INTO execution_records
                (execution_id, user_id, workflow_id, node_id, status, result, error)
             VALUES ($1, $2, $3, $4, 'queued', NULL, NULL)",
        )
        .bind(execution_id)
        .bind(user_id)
        .bind(workflow_id)
        .bind(node_id)
        .execute(&self.pool)
        .await
        .map_err(|e| ExecutionStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn transition(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) -> Result<(), ExecutionStoreError> {
        let current = self.get(execution_id).await?;
        if !is_valid_transition(current.status, status) {
            return Err(ExecutionStoreError::InvalidTransition(
                execution_id.to_string(),
                current.status,
                status,
            ));
        }

        sqlx::query(
            "UPDATE execution_records
             SET status = $2, result = $3, error = $4
             WHERE execution_id = $1",
        )
        .bind(execution_id)
        .bind(status.as_str())
        .bind(result)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(|e| ExecutionStoreError::Backend(e.to_string()))?;
        Ok(())
    }

    async fn get(&self, execution_id: &str) -> Result<ExecutionRecord, ExecutionStoreError> {
        let row = sqlx::query(
            "SELECT execution_id, user_id, workflow_id, node_id, status, result, error
             FROM execution_records WHERE execution_id = $1",
        )
        .bind(execution_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| ExecutionStoreError::Backend(e.to_string()))?
        .ok_or_else(|| ExecutionStoreError::NotFound(execution_id.to_string()))?;

        Ok(ExecutionRecord {
            execution_id: row.try_get("execution_id").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
            user_id: row.try_get("user_id").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
            workflow_id: row.try_get("workflow_id").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
            node_id: row.try_get("node_id").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
            status: parse_status(row.try_get::<String, _>("status").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?.as_str())?,
            result: row.try_get("result").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
            error: row.try_get("error").map_err(|e| ExecutionStoreError::Backend(e.to_string()))?,
        })
    }
}
