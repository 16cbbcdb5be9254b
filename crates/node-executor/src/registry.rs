use crate::handlers::{ai_agent::AiAgentHandler, email::EmailHandler, telegram::TelegramHandler};
use crate::NodeHandler;
use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue};
use std::collections::HashMap;
use std::sync::Arc;

/// Maps a node's `type` tag to its handler.
///
/// Closed over the built-in kinds by default (`ai_agent`, `email`,
/// `telegram`); callers may register additional handlers before the
/// registry is put into service. A `type` with no registered handler falls
/// back to the unknown-node contract rather than failing the node.
pub struct NodeRegistry {
    handlers: HashMap<String, Arc<dyn NodeHandler>>,
}

impl NodeRegistry {
    /// Build the registry with the built-in handler set.
    pub fn with_builtins(smtp_port: u16) -> Self {
        let mut registry = Self {
            handlers: HashMap::new(),
        };
        registry.register("ai_agent", Arc::new(AiAgentHandler));
        registry.register("email", Arc::new(EmailHandler::new(smtp_port)));
        registry.register("telegram", Arc::new(TelegramHandler::new()));
        registry
    }

    pub fn register(&mut self, node_type: &str, handler: Arc<dyn NodeHandler>) {
        self.handlers.insert(node_type.to_string(), handler);
    }

    pub async fn dispatch(
        &self,
        node_type: &str,
        inputs: &JsonValue,
        credentials: &HashMap<String, Credential>,
    ) -> Result<JsonValue, NodeExecutorError> {
        match self.handlers.get(node_type) {
            Some(handler) => handler.run(inputs, credentials).await,
            None => Ok(serde_json::json!({
                "status": "processed",
                "type": node_type,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_type_falls_back_to_processed_envelope() {
        let registry = NodeRegistry::with_builtins(465);
        let result = registry
            .dispatch("carrier_pigeon", &serde_json::json!({}), &HashMap::new())
            .await
            .unwrap();
        assert_eq!(
            result,
            serde_json::json!({"status": "processed", "type": "carrier_pigeon"})
        );
    }
}
