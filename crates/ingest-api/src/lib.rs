pub mod handlers;
pub mod ports;
pub mod ports_sql;
pub mod signature;
pub mod state;

pub use state::AppState;

use axum::routing::{any, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Build the ingest HTTP surface: the webhook route, the status-update
/// callback route, and the status-lookup route.
pub fn create_server(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/webhook/*path", any(handlers::webhook::handle_webhook))
        .route(
            "/api/v1/execution/status/update",
            post(handlers::status::handle_status_update),
        )
        .route(
            "/api/v1/execution/status/:execution_id",
            get(handlers::status::handle_status_lookup),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::fakes::{
        InMemoryCredentialRepository, InMemoryWebhookRegistry, InMemoryWorkflowRepository,
    };
    use crate::ports::{WebhookDefinition, WorkflowDefinition};
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use common::types::Node;
    use execution_store::InMemoryExecutionStore;
    use hmac::{Hmac, Mac};
    use queue_client::fakes::InMemoryJobQueue;
    use sha2::Sha256;
    use status_store::fakes::InMemoryStatusStore;
    use std::sync::Arc;
    use tower::ServiceExt;

    fn sign(secret: &str, method: &str, path: &str, timestamp: &str, body: &[u8]) -> String {
        type HmacSha256 = Hmac<Sha256>;
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(method.as_bytes());
        mac.update(b"\n");
        mac.update(path.as_bytes());
        mac.update(b"\n");
        mac.update(timestamp.as_bytes());
        mac.update(b"\n");
        mac.update(body);
        hex::encode(mac.finalize().into_bytes())
    }

    async fn test_app() -> Router {
        let webhooks = Arc::new(InMemoryWebhookRegistry::new());
        webhooks
            .register(
                "/orders",
                "POST",
                WebhookDefinition {
                    workflow_id: 1,
                    user_id: 7,
                    header: Some("X-Signature".to_string()),
                    secret: Some("shh".to_string()),
                },
            )
            .await;
        webhooks
            .register(
                "/unsigned",
                "POST",
                WebhookDefinition {
                    workflow_id: 2,
                    user_id: 7,
                    header: None,
                    secret: None,
                },
            )
            .await;

        let workflows = Arc::new(InMemoryWorkflowRepository::new());
        workflows
            .insert(WorkflowDefinition {
                workflow_id: 1,
                name: "orders".to_string(),
                title: "Orders".to_string(),
                nodes: vec![Node {
                    id: 1,
                    position_x: 0.0,
                    position_y: 0.0,
                    data: serde_json::json!({"type": "unknown_kind"}),
                }],
                connections: vec![],
            })
            .await;
        workflows
            .insert(WorkflowDefinition {
                workflow_id: 2,
                name: "unsigned".to_string(),
                title: "Unsigned".to_string(),
                nodes: vec![],
                connections: vec![],
            })
            .await;

        let state = AppState {
            queue: Arc::new(InMemoryJobQueue::new()),
            status_store: Arc::new(InMemoryStatusStore::new()),
            execution_store: Arc::new(InMemoryExecutionStore::new()),
            webhooks,
            workflows,
            credentials: Arc::new(InMemoryCredentialRepository::new()),
            status_secret: Some("engine-secret".to_string()),
        };

        create_server(state)
    }

    #[tokio::test]
    async fn valid_signature_is_accepted_and_queues_execution() {
        let app = test_app().await;
        let body = b"{}".to_vec();
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = sign("shh", "POST", "/orders", &timestamp, &body);

        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhook/orders")
            .header("X-Signature", signature)
            .header("X-Timestamp", timestamp)
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn missing_signature_on_signed_webhook_is_rejected() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhook/orders")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn unsigned_webhook_requires_no_signature() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhook/unsigned")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn unknown_webhook_path_is_404() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/webhook/does-not-exist")
            .body(Body::from("{}"))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn status_update_without_secret_header_is_unauthorized() {
        let app = test_app().await;
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/execution/status/update")
            .header("content-type", "application/json")
            .body(Body::from(
                serde_json::json!({"execution_id": "e1", "status": "processing"}).to_string(),
            ))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn status_lookup_for_unknown_execution_is_not_found_shape() {
        let app = test_app().await;
        let request = Request::builder()
            .uri("/api/v1/execution/status/does-not-exist")
            .body(Body::empty())
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(value["status"], "not_found");
    }
}
