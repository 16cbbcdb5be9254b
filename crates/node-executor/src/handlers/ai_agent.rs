use crate::NodeHandler;
use async_trait::async_trait;
use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue};
use std::collections::HashMap;

/// Provider-agnostic stand-in for an LLM-backed agent node.
///
/// Echoes the conversation back alongside a deterministic placeholder
/// result. `formatted_response` is a flag, not a value: when set alongside a
/// `schema`, a real provider would run the model's output through a
/// structured-output parser keyed on that schema. Wiring a real model
/// provider is out of scope here; this handler exists so the rest of the
/// pipeline (template resolution feeding downstream nodes from
/// `results.{id}.result`) has a concrete envelope to build against.
pub struct AiAgentHandler;

#[async_trait]
impl NodeHandler for AiAgentHandler {
    async fn run(
        &self,
        inputs: &JsonValue,
        _credentials: &HashMap<String, Credential>,
    ) -> Result<JsonValue, NodeExecutorError> {
        let messages = inputs
            .get("messages")
            .cloned()
            .unwrap_or_else(|| JsonValue::Array(vec![]));
        let formatted_response = inputs
            .get("formatted_response")
            .and_then(JsonValue::as_bool)
            .unwrap_or(false);

        Ok(serde_json::json!({
            "messages": messages,
            "formatted_response": formatted_response,
            "result": "acknowledged",
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn echoes_messages_and_reflects_formatted_response_flag() {
        let handler = AiAgentHandler;
        let inputs = serde_json::json!({
            "schema": {"type": "object"},
            "messages": [{"role": "user", "content": "hi"}],
            "formatted_response": true,
        });
        let result = handler.run(&inputs, &HashMap::new()).await.unwrap();
        assert_eq!(
            result,
            serde_json::json!({
                "messages": [{"role": "user", "content": "hi"}],
                "formatted_response": true,
                "result": "acknowledged",
            })
        );
    }

    #[tokio::test]
    async fn formatted_response_defaults_to_false_when_absent() {
        let handler = AiAgentHandler;
        let inputs = serde_json::json!({"messages": []});
        let result = handler.run(&inputs, &HashMap::new()).await.unwrap();
        assert_eq!(result["formatted_response"], false);
    }
}
