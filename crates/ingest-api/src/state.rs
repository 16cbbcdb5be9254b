use crate::ports::{CredentialRepository, WebhookRegistry, WorkflowRepository};
use execution_store::ExecutionStore;
use queue_client::JobQueue;
use status_store::StatusReadWrite;
use std::sync::Arc;

/// Shared application state for the ingest HTTP surface.
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<dyn JobQueue>,
    pub status_store: Arc<dyn StatusReadWrite>,
    pub execution_store: Arc<dyn ExecutionStore>,
    pub webhooks: Arc<dyn WebhookRegistry>,
    pub workflows: Arc<dyn WorkflowRepository>,
    pub credentials: Arc<dyn CredentialRepository>,
    /// Shared secret the status-update callback must present. `None` falls
    /// back to the orchestrator's own session auth, which this surface does
    /// not implement — a production deployment must set this.
    pub status_secret: Option<String>,
}
