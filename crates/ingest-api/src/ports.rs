//! Lookup ports the ingest handlers depend on. Kept as traits so the HTTP
//! layer can be exercised in tests against in-memory fakes.

use async_trait::async_trait;
use common::types::{Connection, Credential, Node};
use std::collections::HashMap;

#[derive(Debug, Clone)]
pub struct WebhookDefinition {
    pub workflow_id: i64,
    pub user_id: i64,
    /// Header name carrying the request signature; empty/`None` means the
    /// webhook is unsigned.
    pub header: Option<String>,
    pub secret: Option<String>,
}

#[async_trait]
pub trait WebhookRegistry: Send + Sync {
    async fn lookup(&self, path: &str, method: &str) -> Option<WebhookDefinition>;
}

#[derive(Debug, Clone)]
pub struct WorkflowDefinition {
    pub workflow_id: i64,
    pub name: String,
    pub title: String,
    pub nodes: Vec<Node>,
    pub connections: Vec<Connection>,
}

#[async_trait]
pub trait WorkflowRepository: Send + Sync {
    async fn load(&self, workflow_id: i64) -> Option<WorkflowDefinition>;
}

#[async_trait]
pub trait CredentialRepository: Send + Sync {
    async fn load_for_user(&self, user_id: i64) -> HashMap<String, Credential>;
}

/// In-memory fakes of the three ports above, for tests.
pub mod fakes {
    use super::*;
    use tokio::sync::RwLock;

    #[derive(Default)]
    pub struct InMemoryWebhookRegistry {
        entries: RwLock<HashMap<(String, String), WebhookDefinition>>,
    }

    impl InMemoryWebhookRegistry {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn register(&self, path: &str, method: &str, def: WebhookDefinition) {
            self.entries
                .write()
                .await
                .insert((path.to_string(), method.to_string()), def);
        }
    }

    #[async_trait]
    impl WebhookRegistry for InMemoryWebhookRegistry {
        async fn lookup(&self, path: &str, method: &str) -> Option<WebhookDefinition> {
            self.entries
                .read()
                .await
                .get(&(path.to_string(), method.to_string()))
                .cloned()
        }
    }

    #[derive(Default)]
    pub struct InMemoryWorkflowRepository {
        workflows: RwLock<HashMap<i64, WorkflowDefinition>>,
    }

    impl InMemoryWorkflowRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn insert(&self, def: WorkflowDefinition) {
            self.workflows.write().await.insert(def.workflow_id, def);
        }
    }

    #[async_trait]
    impl WorkflowRepository for InMemoryWorkflowRepository {
        async fn load(&self, workflow_id: i64) -> Option<WorkflowDefinition> {
            self.workflows.read().await.get(&workflow_id).cloned()
        }
    }

    #[derive(Default)]
    pub struct InMemoryCredentialRepository {
        by_user: RwLock<HashMap<i64, HashMap<String, Credential>>>,
    }

    impl InMemoryCredentialRepository {
        pub fn new() -> Self {
            Self::default()
        }

        pub async fn insert(&self, user_id: i64, credentials: HashMap<String, Credential>) {
            self.by_user.write().await.insert(user_id, credentials);
        }
    }

    #[async_trait]
    impl CredentialRepository for InMemoryCredentialRepository {
        async fn load_for_user(&self, user_id: i64) -> HashMap<String, Credential> {
            self.by_user
                .read()
                .await
                .get(&user_id)
                .cloned()
                .unwrap_or_default()
        }
    }
}
