use crate::signature::{self, SignatureError};
use crate::state::AppState;
use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, Method, StatusCode};
use axum::Json;
use common::error::IngestError;
use common::types::{ExecutionJob, ExecutionType, Trigger};
use serde_json::{json, Value};
use std::collections::HashMap;

pub async fn handle_webhook(
    State(state): State<AppState>,
    Path(path): Path<String>,
    method: Method,
    headers: HeaderMap,
    Query(query): Query<HashMap<String, String>>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), (StatusCode, Json<Value>)> {
    handle(state, path, method, headers, query, body)
        .await
        .map_err(ingest_error_response)
}

async fn handle(
    state: AppState,
    path: String,
    method: Method,
    headers: HeaderMap,
    query: HashMap<String, String>,
    body: Bytes,
) -> Result<(StatusCode, Json<Value>), IngestError> {
    let method_str = method.as_str().to_string();
    // axum's `*path` wildcard capture strips the leading slash; the signed
    // message and the registry both key on the full `/...` form the client
    // actually saw, so restore it before either lookup or verification.
    let path = if path.starts_with('/') {
        path
    } else {
        format!("/{path}")
    };

    let webhook = state
        .webhooks
        .lookup(&path, &method_str)
        .await
        .ok_or(IngestError::WebhookNotFound)?;

    if let Some(header_name) = webhook.header.as_deref().filter(|h| !h.is_empty()) {
        let secret = webhook.secret.as_deref().unwrap_or_default();
        let provided_signature = headers
            .get(header_name)
            .and_then(|v| v.to_str().ok());
        let provided_timestamp = headers.get("X-Timestamp").and_then(|v| v.to_str().ok());
        let now = chrono::Utc::now().timestamp();

        signature::verify(
            secret,
            &method_str,
            &path,
            &body,
            provided_signature,
            provided_timestamp,
            now,
        )
        .map_err(signature_to_ingest_error)?;
    }

    let workflow = state
        .workflows
        .load(webhook.workflow_id)
        .await
        .ok_or(IngestError::WorkflowNotFound)?;
    let credentials = state.credentials.load_for_user(webhook.user_id).await;

    let execution_id = uuid::Uuid::new_v4().to_string();
    let parsed_body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    let trigger = Trigger {
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.as_str().to_string(), v.to_string())))
            .collect(),
        query,
        body: parsed_body,
        method: method_str,
        path: path.clone(),
    };

    let job = ExecutionJob {
        execution_id: execution_id.clone(),
        user_id: webhook.user_id,
        execution_type: ExecutionType::Workflow,
        workflow_id: workflow.workflow_id,
        node_id: None,
        workflow_name: workflow.name,
        workflow_title: workflow.title,
        credentials,
        nodes: workflow.nodes,
        node: None,
        connections: workflow.connections,
        trigger: Some(trigger),
        retry_count: 0,
    };

    state
        .queue
        .enqueue(&job)
        .await
        .map_err(|e| IngestError::Enqueue(e.to_string()))?;

    state
        .execution_store
        .insert_queued(&execution_id, webhook.user_id, workflow.workflow_id, None)
        .await
        .map_err(|e| IngestError::Store(e.to_string()))?;

    Ok((
        StatusCode::OK,
        Json(json!({"execution_id": execution_id, "status": "queued"})),
    ))
}

fn signature_to_ingest_error(err: SignatureError) -> IngestError {
    let message = match err {
        SignatureError::MissingSignature => "missing signature header",
        SignatureError::MissingTimestamp => "missing X-Timestamp header",
        SignatureError::InvalidTimestamp => "non-numeric timestamp",
        SignatureError::StaleTimestamp => "timestamp outside allowed window",
        SignatureError::Mismatch => "signature mismatch",
    };
    IngestError::Signature(message.to_string())
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
