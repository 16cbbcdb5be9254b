//! Worker Loop — dequeues jobs, dispatches them to the DAG Scheduler or the
//! Node Executor, reports status, and retries failures up to a fixed bound.

use callback_reporter::CallbackReporter;
use common::types::{ExecutionJob, ExecutionType};
use dag_scheduler::{run_single_node, run_workflow};
use node_executor::NodeRegistry;
use queue_client::JobQueue;
use status_store::StatusReadWrite;
use std::sync::Arc;
use std::time::Duration;

const DEQUEUE_TIMEOUT: Duration = Duration::from_secs(1);
const LOOP_ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Everything one worker loop needs to process jobs.
///
/// `queue` and `status_store` are trait objects so tests can swap in the
/// in-memory fakes without a live Redis instance, the same pattern the
/// Ingest API's `AppState` uses.
pub struct WorkerContext {
    pub queue: Arc<dyn JobQueue>,
    pub status_store: Arc<dyn StatusReadWrite>,
    pub callback: CallbackReporter,
    pub registry: NodeRegistry,
    pub max_retries: u32,
}

/// Run one cooperative worker loop until `shutdown` resolves.
///
/// On shutdown, the loop stops pulling new jobs but lets any job already in
/// flight run to completion — at most one extra node's worth of latency,
/// per the suspension-point model the dequeue/execute split is built on.
pub async fn run_loop(ctx: &WorkerContext, mut shutdown: tokio::sync::watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            tracing::info!("worker loop shutting down");
            return;
        }

        tokio::select! {
            biased;
            _ = shutdown.changed() => continue,
            dequeued = ctx.queue.dequeue(DEQUEUE_TIMEOUT) => {
                match dequeued {
                    Ok(Some(job)) => process_job(ctx, job).await,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::warn!(error = %e, "worker loop error, backing off");
                        tokio::time::sleep(LOOP_ERROR_BACKOFF).await;
                    }
                }
            }
        }
    }
}

async fn process_job(ctx: &WorkerContext, job: ExecutionJob) {
    let execution_id = job.execution_id.clone();
    let now = chrono::Utc::now().timestamp();

    let _ = ctx
        .status_store
        .put(&execution_id, "processing", None, now)
        .await;
    ctx.callback.report_status(&execution_id, "processing", None, None).await;

    match execute(ctx, &job).await {
        Ok(result) => {
            let now = chrono::Utc::now().timestamp();
            let _ = ctx
                .status_store
                .put(&execution_id, "completed", Some(result.clone()), now)
                .await;
            ctx.callback
                .report_status(&execution_id, "completed", Some(result), None)
                .await;
        }
        Err(message) => {
            if job.retry_count < ctx.max_retries {
                let mut retried = job.clone();
                retried.retry_count += 1;
                tracing::info!(
                    execution_id,
                    retry_count = retried.retry_count,
                    "retrying failed execution"
                );
                if let Err(e) = ctx.queue.requeue(&retried).await {
                    tracing::error!(execution_id, error = %e, "failed to requeue job");
                }
            } else {
                let now = chrono::Utc::now().timestamp();
                let error_payload = serde_json::json!({"error": message});
                let _ = ctx
                    .status_store
                    .put(&execution_id, "failed", Some(error_payload.clone()), now)
                    .await;
                ctx.callback
                    .report_status(&execution_id, "failed", None, Some(error_payload))
                    .await;
            }
        }
    }
}

async fn execute(ctx: &WorkerContext, job: &ExecutionJob) -> Result<serde_json::Value, String> {
    match job.execution_type {
        ExecutionType::Workflow => {
            let result = run_workflow(
                &ctx.registry,
                job.workflow_id,
                &job.nodes,
                &job.connections,
                &job.credentials,
                job.trigger.clone(),
            )
            .await
            .map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
        ExecutionType::Node => {
            let node = job
                .node
                .as_ref()
                .ok_or_else(|| "node job carries no node".to_string())?;
            let result = run_single_node(&ctx.registry, node, &job.credentials, job.trigger.clone())
                .await
                .map_err(|e| e.to_string())?;
            serde_json::to_value(result).map_err(|e| e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use common::types::{Credential, JsonValue as Json, Node};
    use node_executor::NodeHandler;
    use queue_client::fakes::InMemoryJobQueue;
    use status_store::fakes::InMemoryStatusStore;
    use std::collections::HashMap;

    struct AlwaysFailHandler;

    #[async_trait]
    impl NodeHandler for AlwaysFailHandler {
        async fn run(
            &self,
            _inputs: &Json,
            _credentials: &HashMap<String, Credential>,
        ) -> Result<Json, common::error::NodeExecutorError> {
            Err(common::error::NodeExecutorError::HandlerFailed(
                "doomed".to_string(),
                "simulated failure".to_string(),
            ))
        }
    }

    fn failing_node_job(execution_id: &str) -> ExecutionJob {
        ExecutionJob {
            execution_id: execution_id.to_string(),
            user_id: 1,
            execution_type: ExecutionType::Node,
            workflow_id: 1,
            node_id: Some(1),
            workflow_name: String::new(),
            workflow_title: String::new(),
            credentials: HashMap::new(),
            nodes: vec![],
            node: Some(Node {
                id: 1,
                position_x: 0.0,
                position_y: 0.0,
                data: serde_json::json!({"type": "doomed"}),
            }),
            connections: vec![],
            trigger: None,
            retry_count: 0,
        }
    }

    fn test_context(max_retries: u32) -> WorkerContext {
        let mut registry = NodeRegistry::with_builtins(465);
        registry.register("doomed", Arc::new(AlwaysFailHandler));
        WorkerContext {
            queue: Arc::new(InMemoryJobQueue::new()),
            status_store: Arc::new(InMemoryStatusStore::new()),
            callback: CallbackReporter::new("http://127.0.0.1:9".to_string(), None),
            registry,
            max_retries,
        }
    }

    /// S6 — a job that always fails is retried up to `max_retries` times,
    /// then reported terminally failed rather than retried forever.
    #[tokio::test]
    async fn retry_exhaustion_ends_in_terminal_failure() {
        let ctx = test_context(3);
        let job = failing_node_job("exec-retry-exhaustion");

        let mut current = job;
        let mut attempts = 0;
        loop {
            process_job(&ctx, current.clone()).await;
            attempts += 1;
            match ctx.queue.dequeue(Duration::from_millis(1)).await.unwrap() {
                Some(requeued) => current = requeued,
                None => break,
            }
        }

        assert_eq!(attempts, 4, "initial attempt plus 3 retries");

        let snapshot = ctx.status_store.get("exec-retry-exhaustion").await.unwrap();
        assert_eq!(snapshot["status"], "failed");
    }

    /// Property 5 (at-least-once delivery): a job that fails once and then
    /// succeeds is requeued exactly once and ends up completed, never lost.
    #[tokio::test]
    async fn failure_then_success_is_not_lost() {
        struct FlakyHandler {
            calls: std::sync::atomic::AtomicU32,
        }

        #[async_trait]
        impl NodeHandler for FlakyHandler {
            async fn run(
                &self,
                _inputs: &Json,
                _credentials: &HashMap<String, Credential>,
            ) -> Result<Json, common::error::NodeExecutorError> {
                let call = self.calls.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                if call == 0 {
                    Err(common::error::NodeExecutorError::HandlerFailed(
                        "flaky".to_string(),
                        "first attempt fails".to_string(),
                    ))
                } else {
                    Ok(serde_json::json!({"status": "ok"}))
                }
            }
        }

        let mut registry = NodeRegistry::with_builtins(465);
        registry.register(
            "flaky",
            Arc::new(FlakyHandler {
                calls: std::sync::atomic::AtomicU32::new(0),
            }),
        );
        let ctx = WorkerContext {
            queue: Arc::new(InMemoryJobQueue::new()),
            status_store: Arc::new(InMemoryStatusStore::new()),
            callback: CallbackReporter::new("http://127.0.0.1:9".to_string(), None),
            registry,
            max_retries: 3,
        };

        let mut job = failing_node_job("exec-flaky");
        job.node.as_mut().unwrap().data = serde_json::json!({"type": "flaky"});

        let mut current = job;
        loop {
            process_job(&ctx, current.clone()).await;
            match ctx.queue.dequeue(Duration::from_millis(1)).await.unwrap() {
                Some(requeued) => current = requeued,
                None => break,
            }
        }

        let snapshot = ctx.status_store.get("exec-flaky").await.unwrap();
        assert_eq!(snapshot["status"], "completed");
    }
}
