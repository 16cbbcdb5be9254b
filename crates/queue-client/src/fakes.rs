use crate::JobQueue;
use async_trait::async_trait;
use common::error::QueueError;
use common::types::ExecutionJob;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::Mutex;

/// In-memory `JobQueue` fake — a plain FIFO `VecDeque`, no Redis required.
#[derive(Default)]
pub struct InMemoryJobQueue {
    jobs: Mutex<VecDeque<ExecutionJob>>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        self.jobs.lock().await.push_back(job.clone());
        Ok(())
    }

    async fn dequeue(&self, _timeout: Duration) -> Result<Option<ExecutionJob>, QueueError> {
        Ok(self.jobs.lock().await.pop_front())
    }

    async fn requeue(&self, job: &ExecutionJob) -> Result<(), QueueError> {
        self.enqueue(job).await
    }
}
