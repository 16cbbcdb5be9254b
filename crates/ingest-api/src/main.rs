use anyhow::Context;
use common::config::EngineConfig;
use execution_store::PostgresExecutionStore;
use ingest_api::ports_sql::{SqlCredentialRepository, SqlWebhookRegistry, SqlWorkflowRepository};
use ingest_api::{create_server, AppState};
use queue_client::QueueClient;
use sqlx::PgPool;
use status_store::StatusStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ingest_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid ingest-api configuration")?;

    let database_url = config
        .database_url
        .clone()
        .context("DATABASE_URL must be set for the ingest API")?;
    let pool = PgPool::connect(&database_url)
        .await
        .context("connecting to Postgres")?;

    let state = AppState {
        queue: Arc::new(
            QueueClient::connect(&config.redis_url)
                .await
                .map_err(|e| anyhow::anyhow!(e))
                .context("connecting to queue")?,
        ),
        status_store: Arc::new(
            StatusStore::connect(&config.redis_url)
                .await
                .map_err(|e| anyhow::anyhow!(e))
                .context("connecting to status store")?,
        ),
        execution_store: Arc::new(PostgresExecutionStore::new(pool.clone())),
        webhooks: Arc::new(SqlWebhookRegistry::new(pool.clone())),
        workflows: Arc::new(SqlWorkflowRepository::new(pool.clone())),
        credentials: Arc::new(SqlCredentialRepository::new(pool)),
        status_secret: config.engine_status_secret.clone(),
    };

    let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
    let port = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(8081);
    let addr = format!("{host}:{port}");

    let app = create_server(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("binding ingest-api listener")?;
    tracing::info!(%addr, "ingest-api listening");

    axum::serve(listener, app).await.context("ingest-api server error")?;
    Ok(())
}
