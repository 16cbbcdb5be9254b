pub mod fakes;

use async_trait::async_trait;
use common::error::QueueError;
use common::types::ExecutionJob;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use std::time::Duration;

const QUEUE_KEY: &str = "execution_queue";
const JOB_TTL_SECS: u64 = 3600;

fn job_key(execution_id: &str) -> String {
    format!("execution_queue:{execution_id}")
}

/// The execution queue's producer/consumer contract, implemented by
/// [`QueueClient`] against Redis and by [`fakes::InMemoryJobQueue`] for
/// tests that should not need a live Redis instance.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &ExecutionJob) -> Result<(), QueueError>;
    async fn dequeue(&self, timeout: Duration) -> Result<Option<ExecutionJob>, QueueError>;
    async fn requeue(&self, job: &ExecutionJob) -> Result<(), QueueError>;
}

/// Async client over the Redis execution queue.
///
/// Jobs are stored as two keys: a list (`execution_queue`) holding the
/// execution ids in FIFO order, and a per-job string key
/// (`execution_queue:{id}`) holding the serialized [`ExecutionJob`] payload
/// with a 1 hour TTL. This mirrors the producer/consumer split used by the
/// HTTP-facing ingest side (which pushes) and the worker loop (which pops).
#[derive(Clone)]
pub struct QueueClient {
    conn: ConnectionManager,
}

impl QueueClient {
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let client =
            redis::Client::open(redis_url).map_err(|e| QueueError::Connect(e.to_string()))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| QueueError::Connect(e.to_string()))?;
        Ok(Self { conn })
    }

    /// Enqueue a job: write its payload under a TTL-bounded key, then push
    /// its id onto the queue list.
    pub async fn enqueue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        let payload =
            serde_json::to_string(job).map_err(|e| QueueError::Serialize(e.to_string()))?;
        let mut conn = self.conn.clone();
        let key = job_key(&job.execution_id);
        conn.set_ex::<_, _, ()>(&key, payload, JOB_TTL_SECS)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        conn.lpush::<_, _, ()>(QUEUE_KEY, &job.execution_id)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Block on the queue for up to `timeout` waiting for a job id, then
    /// fetch and delete its payload. Returns `None` on timeout or if the
    /// payload has already expired (TTL raced the pop).
    pub async fn dequeue(&self, timeout: Duration) -> Result<Option<ExecutionJob>, QueueError> {
        let mut conn = self.conn.clone();
        let popped: Option<(String, String)> = conn
            .brpop(QUEUE_KEY, timeout.as_secs_f64())
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        let Some((_, execution_id)) = popped else {
            return Ok(None);
        };
        let key = job_key(&execution_id);
        let payload: Option<String> = conn
            .get(&key)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        let Some(payload) = payload else {
            return Ok(None);
        };
        conn.del::<_, ()>(&key)
            .await
            .map_err(|e| QueueError::Backend(e.to_string()))?;
        let job = serde_json::from_str(&payload).map_err(|e| QueueError::Serialize(e.to_string()))?;
        Ok(Some(job))
    }

    /// Requeue a job after a retryable failure, with `retry_count` already
    /// incremented by the caller. Re-enqueues at the head of the FIFO list,
    /// same as a fresh submission; there is no backoff.
    pub async fn requeue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        self.enqueue(job).await
    }
}

#[async_trait]
impl JobQueue for QueueClient {
    async fn enqueue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        QueueClient::enqueue(self, job).await
    }

    async fn dequeue(&self, timeout: Duration) -> Result<Option<ExecutionJob>, QueueError> {
        QueueClient::dequeue(self, timeout).await
    }

    async fn requeue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        QueueClient::requeue(self, job).await
    }
}
