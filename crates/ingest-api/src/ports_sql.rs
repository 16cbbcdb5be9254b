//! `sqlx`/Postgres-backed implementations of the lookup ports in
//! [`crate::ports`]. Schema is shared with the orchestrator's own database
//! (`webhooks`, `workflows`, `nodes`, `connections`, `credentials` tables);
//! this module only reads what it needs to materialize an Execution Job.

use crate::ports::{
    CredentialRepository, WebhookDefinition, WebhookRegistry, WorkflowDefinition,
    WorkflowRepository,
};
use async_trait::async_trait;
use common::types::{Connection, Credential, Node};
use sqlx::{PgPool, Row};
use std::collections::HashMap;

pub struct SqlWebhookRegistry {
    pool: PgPool,
}

impl SqlWebhookRegistry {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WebhookRegistry for SqlWebhookRegistry {
    async fn lookup(&self, path: &str, method: &str) -> Option<WebhookDefinition> {
        let row = sqlx::query(
            "SELECT workflow_id, user_id, header, secret
             FROM webhooks WHERE path = $1 AND method = $2",
        )
        .bind(path)
        .bind(method)
        .fetch_optional(&self.pool)
        .await
        .ok()??;

        Some(WebhookDefinition {
            workflow_id: row.try_get("workflow_id").ok()?,
            user_id: row.try_get("user_id").ok()?,
            header: row.try_get("header").ok()?,
            secret: row.try_get("secret").ok()?,
        })
    }
}

pub struct SqlWorkflowRepository {
    pool: PgPool,
}

impl SqlWorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl WorkflowRepository for SqlWorkflowRepository {
    async fn load(&self, workflow_id: i64) -> Option<WorkflowDefinition> {
        let workflow_row = sqlx::query("SELECT name, title FROM workflows WHERE id = $1")
            .bind(workflow_id)
            .fetch_optional(&self.pool)
            .await
            .ok()??;

        let node_rows = sqlx::query("SELECT id, position_x, position_y, data FROM nodes WHERE workflow_id = $1")
            .bind(workflow_id)
            .fetch_all(&self.pool)
            .await
            .ok()?;
        let nodes = node_rows
            .into_iter()
            .filter_map(|row| {
                Some(Node {
                    id: row.try_get("id").ok()?,
                    position_x: row.try_get("position_x").ok()?,
                    position_y: row.try_get("position_y").ok()?,
                    data: row.try_get("data").ok()?,
                })
            })
            .collect();

        let connection_rows =
            sqlx::query("SELECT from_node, to_node FROM connections WHERE workflow_id = $1")
                .bind(workflow_id)
                .fetch_all(&self.pool)
                .await
                .ok()?;
        let connections = connection_rows
            .into_iter()
            .filter_map(|row| {
                Some(Connection {
                    from: row.try_get("from_node").ok()?,
                    to: row.try_get("to_node").ok()?,
                })
            })
            .collect();

        Some(WorkflowDefinition {
            workflow_id,
            name: workflow_row.try_get("name").ok()?,
            title: workflow_row.try_get("title").ok()?,
            nodes,
            connections,
        })
    }
}

pub struct SqlCredentialRepository {
    pool: PgPool,
}

impl SqlCredentialRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CredentialRepository for SqlCredentialRepository {
    async fn load_for_user(&self, user_id: i64) -> HashMap<String, Credential> {
        let rows = sqlx::query("SELECT id, title, platform, data FROM credentials WHERE user_id = $1")
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .unwrap_or_default();

        rows.into_iter()
            .filter_map(|row| {
                let credential = Credential {
                    id: row.try_get("id").ok()?,
                    title: row.try_get("title").ok()?,
                    platform: row.try_get("platform").ok()?,
                    data: row.try_get("data").ok()?,
                };
                Some((credential.platform.clone(), credential))
            })
            .collect()
    }
}
