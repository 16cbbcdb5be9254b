//! Execution Store — the durable Execution Record persistence port.
//!
//! Fronts whatever database backs execution history behind a trait so the
//! ingest HTTP handlers and the worker's callback path can be exercised in
//! tests against an in-memory fake without a live database.

mod memory;
mod postgres;

pub use memory::InMemoryExecutionStore;
pub use postgres::PostgresExecutionStore;

use async_trait::async_trait;
use common::types::{ExecutionStatus, JsonValue};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutionStoreError {
    #[error("execution {0} not found")]
    NotFound(String),

    #[error("cannot transition execution {0} from {1} to {2}")]
    InvalidTransition(String, ExecutionStatus, ExecutionStatus),

    #[error("backing store error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone)]
pub struct ExecutionRecord {
    pub execution_id: String,
    pub user_id: i64,
    pub workflow_id: i64,
    pub node_id: Option<i64>,
    pub status: ExecutionStatus,
    pub result: Option<JsonValue>,
    pub error: Option<String>,
}

/// Returns whether moving from `from` to `to` is a legal forward transition.
///
/// `Queued -> Processing -> {Completed, Failed}` is the only path; a
/// terminal state (`Completed`/`Failed`) never moves again.
pub fn is_valid_transition(from: ExecutionStatus, to: ExecutionStatus) -> bool {
    use ExecutionStatus::*;
    matches!(
        (from, to),
        (Queued, Processing) | (Queued, Completed) | (Queued, Failed)
            | (Processing, Completed)
            | (Processing, Failed)
    )
}

#[async_trait]
pub trait ExecutionStore: Send + Sync {
    async fn insert_queued(
        &self,
        execution_id: &str,
        user_id: i64,
        workflow_id: i64,
        node_id: Option<i64>,
    ) -> Result<(), ExecutionStoreError>;

    async fn transition(
        &self,
        execution_id: &str,
        status: ExecutionStatus,
        result: Option<JsonValue>,
        error: Option<String>,
    ) -> Result<(), ExecutionStoreError>;

    async fn get(&self, execution_id: &str) -> Result<ExecutionRecord, ExecutionStoreError>;
}
