use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use common::error::IngestError;
use common::types::ExecutionStatus;
use serde::Deserialize;
use serde_json::{json, Value};
use subtle::ConstantTimeEq;

#[derive(Debug, Deserialize)]
pub struct StatusUpdateBody {
    pub execution_id: String,
    pub status: String,
    #[serde(default)]
    pub result: Option<Value>,
    #[serde(default)]
    pub error: Option<String>,
}

fn parse_status(raw: &str) -> Option<ExecutionStatus> {
    match raw {
        "queued" => Some(ExecutionStatus::Queued),
        "processing" => Some(ExecutionStatus::Processing),
        "completed" => Some(ExecutionStatus::Completed),
        "failed" => Some(ExecutionStatus::Failed),
        _ => None,
    }
}

/// `POST /api/v1/execution/status/update` — the Callback Reporter's target.
///
/// Authenticated by constant-time comparison of `X-Engine-Secret` against
/// the configured secret. An unconfigured secret is accepted unauthenticated
/// here (the orchestrator's own session-auth fallback is out of scope for
/// this surface) — operators must configure the secret before production.
pub async fn handle_status_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(body): Json<StatusUpdateBody>,
) -> Result<StatusCode, (StatusCode, Json<Value>)> {
    do_status_update(state, headers, body)
        .await
        .map(|()| StatusCode::OK)
        .map_err(ingest_error_response)
}

async fn do_status_update(
    state: AppState,
    headers: HeaderMap,
    body: StatusUpdateBody,
) -> Result<(), IngestError> {
    if let Some(secret) = &state.status_secret {
        let provided = headers
            .get("X-Engine-Secret")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default();
        if !bool::from(provided.as_bytes().ct_eq(secret.as_bytes())) {
            return Err(IngestError::Unauthorized("invalid secret".to_string()));
        }
    }

    let status = parse_status(&body.status)
        .ok_or_else(|| IngestError::BadRequest("unknown status".to_string()))?;

    state
        .execution_store
        .transition(&body.execution_id, status, body.result, body.error)
        .await
        .map_err(transition_to_ingest_error)?;

    Ok(())
}

fn transition_to_ingest_error(err: execution_store::ExecutionStoreError) -> IngestError {
    use execution_store::ExecutionStoreError::*;
    match err {
        NotFound(_) => IngestError::ExecutionNotFound,
        InvalidTransition(..) => IngestError::InvalidTransition(err.to_string()),
        Backend(msg) => IngestError::Store(msg),
    }
}

fn ingest_error_response(err: IngestError) -> (StatusCode, Json<Value>) {
    let status = match err {
        IngestError::WebhookNotFound
        | IngestError::WorkflowNotFound
        | IngestError::ExecutionNotFound => StatusCode::NOT_FOUND,
        IngestError::Signature(_) | IngestError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        IngestError::InvalidTransition(_) | IngestError::BadRequest(_) => StatusCode::BAD_REQUEST,
        IngestError::Enqueue(_) | IngestError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({"error": err.to_string()})))
}

/// `GET /api/v1/execution/status/{execution_id}` — falls back to the
/// durable Execution Store once the TTL-bounded Status Store snapshot has
/// expired.
pub async fn handle_status_lookup(
    State(state): State<AppState>,
    Path(execution_id): Path<String>,
) -> Json<Value> {
    let snapshot = state.status_store.get(&execution_id).await.unwrap_or_else(|_| {
        json!({"status": "not_found"})
    });

    if snapshot.get("status").and_then(Value::as_str) != Some("not_found") {
        return Json(snapshot);
    }

    match state.execution_store.get(&execution_id).await {
        Ok(record) => Json(json!({
            "execution_id": record.execution_id,
            "status": record.status.as_str(),
            "result": record.result,
            "error": record.error,
        })),
        Err(_) => Json(json!({"status": "not_found"})),
    }
}
