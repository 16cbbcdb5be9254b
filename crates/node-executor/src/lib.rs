//! Node Executor — dispatches a node's `data.type` tag to a registered
//! handler and wraps the handler's result in the `{node_id, type, result}`
//! envelope the DAG Scheduler threads into its results context.

mod handlers;
mod registry;

pub use handlers::{ai_agent::AiAgentHandler, email::EmailHandler, telegram::TelegramHandler};
pub use registry::NodeRegistry;

use async_trait::async_trait;
use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue, Node, NodeResult};
use std::collections::HashMap;

/// A single node kind's execution logic.
///
/// Implementations receive the node's already-template-resolved `data`
/// object and the job's credential map, and return the raw result value to
/// be wrapped in the envelope. A handler that cannot complete its work
/// returns `Err`, which the caller treats as node failure.
#[async_trait]
pub trait NodeHandler: Send + Sync {
    async fn run(
        &self,
        inputs: &JsonValue,
        credentials: &HashMap<String, Credential>,
    ) -> Result<JsonValue, NodeExecutorError>;
}

/// Execute `node` (already template-resolved) against `credentials`,
/// returning the `{node_id, type, result}` envelope.
pub async fn execute_node(
    registry: &NodeRegistry,
    node: &Node,
    resolved_data: &JsonValue,
    credentials: &HashMap<String, Credential>,
) -> Result<NodeResult, NodeExecutorError> {
    let node_type = node.node_type().to_string();
    let result = registry.dispatch(&node_type, resolved_data, credentials).await?;
    Ok(NodeResult {
        node_id: node.id,
        node_type,
        result,
    })
}
