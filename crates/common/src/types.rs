use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Opaque JSON value used throughout the engine for handler inputs/outputs.
pub type JsonValue = serde_json::Value;

/// The kind of work an `ExecutionJob` carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionType {
    Workflow,
    Node,
}

/// A single node in a workflow graph.
///
/// `data.type` selects the handler; everything else in `data` is
/// handler-specific input, potentially containing `{{path}}` template tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: i64,
    #[serde(default, rename = "positionX")]
    pub position_x: f64,
    #[serde(default, rename = "positionY")]
    pub position_y: f64,
    pub data: JsonValue,
}

impl Node {
    /// The `data.type` tag, defaulting to `"unknown"` when absent or non-string.
    pub fn node_type(&self) -> &str {
        self.data
            .get("type")
            .and_then(|v| v.as_str())
            .unwrap_or("unknown")
    }
}

/// A directed edge between two nodes, referenced by id within the same workflow.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Connection {
    pub from: i64,
    pub to: i64,
}

/// A credential bundle scoped to one integration platform (e.g. `"email"`).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: i64,
    pub title: String,
    pub platform: String,
    pub data: JsonValue,
}

/// The external event that caused a workflow to be enqueued.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(default)]
    pub headers: HashMap<String, String>,
    #[serde(default)]
    pub query: HashMap<String, String>,
    #[serde(default)]
    pub body: JsonValue,
    pub method: String,
    pub path: String,
}

/// The envelope placed on the queue by Trigger Intake or the Ingest API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionJob {
    pub execution_id: String,
    pub user_id: i64,
    pub execution_type: ExecutionType,
    pub workflow_id: i64,
    #[serde(default)]
    pub node_id: Option<i64>,
    #[serde(default)]
    pub workflow_name: String,
    #[serde(default)]
    pub workflow_title: String,
    #[serde(default)]
    pub credentials: HashMap<String, Credential>,
    /// Populated for `execution_type == Workflow` jobs.
    #[serde(default)]
    pub nodes: Vec<Node>,
    /// Populated for `execution_type == Node` jobs.
    #[serde(default)]
    pub node: Option<Node>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub trigger: Option<Trigger>,
    #[serde(default)]
    pub retry_count: u32,
}

/// Status of an execution, shared by the Status Store and Execution Store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Queued,
    Processing,
    Completed,
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionStatus::Queued => "queued",
            ExecutionStatus::Processing => "processing",
            ExecutionStatus::Completed => "completed",
            ExecutionStatus::Failed => "failed",
        }
    }
}

impl std::fmt::Display for ExecutionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A TTL-bounded status snapshot as written by the Status Store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub execution_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<JsonValue>,
    pub timestamp: i64,
}

/// The per-execution evaluation context threaded through the DAG Scheduler.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvaluationContext {
    /// Node results keyed by stringified node id.
    pub results: HashMap<String, JsonValue>,
    pub trigger: Option<Trigger>,
}

/// The result envelope a Node Executor handler produces, wrapped with its node id and type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub node_id: i64,
    #[serde(rename = "type")]
    pub node_type: String,
    pub result: JsonValue,
}

/// The result of running a full workflow job through the DAG Scheduler.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowRunResult {
    pub workflow_id: i64,
    pub order: Vec<i64>,
    pub results: HashMap<String, JsonValue>,
}
