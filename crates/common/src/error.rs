use thiserror::Error;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Top-level error aggregating every leaf crate's error type, the way a
/// binary's `main` sees failures bubble up through `?`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("status store error: {0}")]
    StatusStore(#[from] StatusStoreError),

    // execution-store's `ExecutionStoreError` depends on `common` for its
    // shared types, so it can't be `#[from]`'d here without a cycle; callers
    // flatten it to a string instead, same as the execution store's own
    // callers in ingest-api do.
    #[error("execution store error: {0}")]
    ExecutionStore(String),

    #[error("callback error: {0}")]
    Callback(#[from] CallbackError),

    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    #[error("node executor error: {0}")]
    NodeExecutor(#[from] NodeExecutorError),

    #[error("template error: {0}")]
    Template(#[from] TemplateError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("configuration error: {0}")]
    Configuration(String),
}

/// Errors raised by the Redis-backed execution queue.
#[derive(Debug, Error)]
pub enum QueueError {
    #[error("could not connect to queue backend: {0}")]
    Connect(String),

    #[error("queue payload serialization failed: {0}")]
    Serialize(String),

    #[error("queue backend command failed: {0}")]
    Backend(String),
}

/// Errors raised by the ephemeral status-snapshot store.
#[derive(Debug, Error)]
pub enum StatusStoreError {
    #[error("could not connect to status store backend: {0}")]
    Connect(String),

    #[error("status snapshot serialization failed: {0}")]
    Serialize(String),

    #[error("status store backend command failed: {0}")]
    Backend(String),
}

/// Errors raised while posting a status callback to the orchestrator.
///
/// The Callback Reporter itself never returns these — a failed delivery is
/// logged and swallowed, per its fire-and-forget contract — but the type is
/// kept for symmetry with every other crate's error surface and for any
/// future caller that wants the failure surfaced instead of swallowed.
#[derive(Debug, Error)]
pub enum CallbackError {
    #[error("callback request could not be built: {0}")]
    Request(String),

    #[error("callback delivery failed: {0}")]
    Delivery(String),

    #[error("orchestrator rejected callback with status {0}")]
    Rejected(u16),
}

/// Errors raised while resolving template tokens.
///
/// Resolution is a pure, total recursive walk over JSON: every input value
/// maps to an output value, with unresolved paths yielding `null` rather
/// than failing. This enum is never actually constructed; it exists so the
/// crate's public surface matches the error-per-crate convention the rest
/// of the workspace follows.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TemplateError {}

/// Errors raised while validating or running a DAG.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    #[error("connection references unknown node id {0}")]
    UnknownNode(i64),

    #[error("workflow graph has cycles or disconnected nodes")]
    CycleOrDisconnect,

    #[error("node {0} not found in workflow")]
    NodeNotFound(i64),

    #[error("node execution failed: {0}")]
    NodeFailed(String),

    #[error("job has no node to execute")]
    MissingNode,
}

/// Errors raised by a Node Executor handler.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NodeExecutorError {
    #[error("missing credential for platform '{0}'")]
    MissingCredential(String),

    #[error("handler '{0}' failed: {1}")]
    HandlerFailed(String, String),
}

/// Errors raised by the Ingest API's webhook and status surfaces.
///
/// Handlers map each variant to an HTTP response rather than returning it
/// directly (axum extractors want a `(StatusCode, Json<Value>)` on the
/// error path), but the enum is the single source of truth for what can go
/// wrong and which status code it deserves.
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("webhook not found")]
    WebhookNotFound,

    #[error("workflow not found")]
    WorkflowNotFound,

    #[error("execution not found")]
    ExecutionNotFound,

    #[error("invalid webhook signature: {0}")]
    Signature(String),

    #[error("invalid status transition: {0}")]
    InvalidTransition(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("malformed request: {0}")]
    BadRequest(String),

    #[error("queue enqueue failed: {0}")]
    Enqueue(String),

    #[error("persistence failure: {0}")]
    Store(String),
}
