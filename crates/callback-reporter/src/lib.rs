use common::error::CallbackError;
use common::types::JsonValue;
use serde::Serialize;
use std::time::Duration;

const STATUS_UPDATE_PATH: &str = "/api/v1/execution/status/update";
const CALLBACK_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
struct StatusUpdatePayload {
    execution_id: String,
    status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<JsonValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonValue>,
}

/// Reports execution status transitions to the orchestrator.
///
/// This is fire-and-forget by design: a failed callback is logged and
/// swallowed rather than propagated, because the status store carries a
/// secondary signal and the next transition will report the latest state
/// regardless of whether this one landed.
#[derive(Clone)]
pub struct CallbackReporter {
    client: reqwest::Client,
    backend_base_url: String,
    status_secret: Option<String>,
}

impl CallbackReporter {
    pub fn new(backend_base_url: String, status_secret: Option<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(CALLBACK_TIMEOUT)
            .build()
            .expect("callback reporter http client");
        Self {
            client,
            backend_base_url,
            status_secret,
        }
    }

    /// `error`, when present, is already the nested `{"error": "<message>"}`
    /// shape the orchestrator's status-update contract expects — callers
    /// build that object rather than handing this a bare string.
    pub async fn report_status(
        &self,
        execution_id: &str,
        status: &str,
        result: Option<JsonValue>,
        error: Option<JsonValue>,
    ) {
        let url = format!("{}{}", self.backend_base_url, STATUS_UPDATE_PATH);
        let payload = StatusUpdatePayload {
            execution_id: execution_id.to_string(),
            status: status.to_string(),
            result,
            error,
        };

        let mut request = self.client.post(&url).json(&payload);
        if let Some(secret) = &self.status_secret {
            request = request.header("X-Engine-Secret", secret);
        }

        if let Err(err) = self.deliver(request).await {
            tracing::warn!(execution_id, status, error = %err, "status callback not delivered");
        } else {
            tracing::debug!(execution_id, status, "status callback delivered");
        }
    }

    async fn deliver(&self, request: reqwest::RequestBuilder) -> Result<(), CallbackError> {
        let resp = request
            .send()
            .await
            .map_err(|e| CallbackError::Delivery(e.to_string()))?;
        if resp.status().is_success() {
            Ok(())
        } else {
            Err(CallbackError::Rejected(resp.status().as_u16()))
        }
    }
}
