use anyhow::Context;
use callback_reporter::CallbackReporter;
use common::config::EngineConfig;
use node_executor::NodeRegistry;
use queue_client::QueueClient;
use status_store::StatusStore;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use worker::{run_loop, WorkerContext};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "worker=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = EngineConfig::from_env();
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("invalid worker configuration")?;

    tracing::info!(concurrency = config.worker_concurrency, "starting worker");

    let ctx = Arc::new(WorkerContext {
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
        callback: CallbackReporter::new(
            config.backend_base_url.clone(),
            config.engine_status_secret.clone(),
        ),
        registry: NodeRegistry::with_builtins(config.smtp_port),
        max_retries: config.max_retries,
    });

    let (shutdown_tx, shutdown_rx) = tokio::sync::watch::channel(false);

    let mut handles = Vec::with_capacity(config.worker_concurrency);
    for worker_id in 0..config.worker_concurrency {
        let ctx = ctx.clone();
        let rx = shutdown_rx.clone();
        handles.push(tokio::spawn(async move {
            tracing::debug!(worker_id, "worker loop started");
            run_loop(&ctx, rx).await;
        }));
    }

    wait_for_shutdown_signal().await;
    tracing::info!("shutdown signal received, draining in-flight jobs");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        let _ = handle.await;
    }

    tracing::info!("worker exited cleanly");
    Ok(())
}

async fn wait_for_shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install SIGINT handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
