use crate::handlers::{credential_data, require_str};
use crate::NodeHandler;
use async_trait::async_trait;
use common::error::NodeExecutorError;
use common::types::{Credential, JsonValue};
use std::collections::HashMap;

const TELEGRAM_PLATFORM: &str = "telegram";

/// Sends a message through the Telegram Bot API's `sendMessage` call.
///
/// The result is passed through verbatim — the caller can inspect the
/// provider's own success/error shape rather than us collapsing it to a
/// single status field.
pub struct TelegramHandler {
    client: reqwest::Client,
}

impl TelegramHandler {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }
}

impl Default for TelegramHandler {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for TelegramHandler {
    async fn run(
        &self,
        inputs: &JsonValue,
        credentials: &HashMap<String, Credential>,
    ) -> Result<JsonValue, NodeExecutorError> {
        let chat_id = require_str(inputs, "chat_id", "telegram")?;
        let message = require_str(inputs, "message", "telegram")?;

        let cred_data = credential_data(credentials, TELEGRAM_PLATFORM)?;
        let bot_token = require_str(cred_data, "bot_token", "telegram")?;

        let url = format!("https://api.telegram.org/bot{bot_token}/sendMessage");
        let response = self
            .client
            .post(&url)
            .json(&serde_json::json!({"chat_id": chat_id, "text": message}))
            .send()
            .await
            .map_err(|e| NodeExecutorError::HandlerFailed("telegram".to_string(), e.to_string()))?;

        response
            .json::<JsonValue>()
            .await
            .map_err(|e| NodeExecutorError::HandlerFailed("telegram".to_string(), e.to_string()))
    }
}
