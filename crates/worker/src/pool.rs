//! Fixed-size pool of job workers fed by a bounded queue.
//!
//! Submissions beyond the queue capacity are rejected instead of spawning
//! more work, which turns overload into a visible `503` at the API.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use vidsum_core::types::JobId;

use crate::runner::JobRunner;

/// A job waiting for a free worker.
#[derive(Debug)]
struct QueuedJob {
    id: JobId,
    url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("Job queue is full")]
    QueueFull,

    #[error("Worker pool is shut down")]
    Closed,
}

pub struct WorkerPool {
    sender: mpsc::Sender<QueuedJob>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl WorkerPool {
    /// Spawn `worker_count` workers sharing a queue of `queue_capacity` jobs.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Panics
    /// Panics if `worker_count` or `queue_capacity` is 0.
    pub fn start(runner: Arc<JobRunner>, worker_count: usize, queue_capacity: usize) -> Self {
        assert!(worker_count > 0, "worker_count must be > 0");
        assert!(queue_capacity > 0, "queue_capacity must be > 0");

        let (sender, receiver) = mpsc::channel(queue_capacity);
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));
        let cancel = CancellationToken::new();

        let workers = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(run_worker(
                    worker_id,
                    Arc::clone(&receiver),
                    Arc::clone(&runner),
                    cancel.clone(),
                ))
            })
            .collect();

        tracing::info!(worker_count, queue_capacity, "Worker pool started");

        Self {
            sender,
            workers: Mutex::new(workers),
            cancel,
        }
    }

    /// Queue a job without waiting. Never blocks the caller.
    pub fn submit(&self, id: JobId, url: impl Into<String>) -> Result<(), SubmitError> {
        if self.cancel.is_cancelled() {
            return Err(SubmitError::Closed);
        }

        self.sender
            .try_send(QueuedJob {
                id,
                url: url.into(),
            })
            .map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::QueueFull,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            })
    }

    /// Number of jobs waiting for a worker.
    pub fn queued(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop accepting jobs and wait up to `timeout` for in-flight jobs.
    ///
    /// Workers finish the job they are running but take nothing new from the
    /// queue; jobs still queued keep their persisted `queued` status.
    pub async fn shutdown(&self, timeout: Duration) {
        tracing::info!("Shutting down worker pool");
        self.cancel.cancel();

        let workers: Vec<_> = match self.workers.lock() {
            Ok(mut guard) => guard.drain(..).collect(),
            Err(poisoned) => poisoned.into_inner().drain(..).collect(),
        };

        match tokio::time::timeout(timeout, futures::future::join_all(workers)).await {
            Ok(results) => {
                for (i, result) in results.into_iter().enumerate() {
                    if let Err(e) = result {
                        tracing::error!(worker_id = i, error = %e, "Worker task failed");
                    }
                }
                tracing::info!("All workers have stopped");
            }
            Err(_) => {
                tracing::warn!(
                    timeout_secs = timeout.as_secs(),
                    "Workers still busy after shutdown timeout; their jobs keep their last saved status",
                );
            }
        }
    }
}

async fn run_worker(
    worker_id: usize,
    receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<QueuedJob>>>,
    runner: Arc<JobRunner>,
    cancel: CancellationToken,
) {
    tracing::debug!(worker_id, "Worker started");

    loop {
        let next = tokio::select! {
            _ = cancel.cancelled() => None,
            job = async { receiver.lock().await.recv().await } => job,
        };
        let Some(job) = next else {
            break;
        };

        tracing::debug!(worker_id, job_id = %job.id, "Worker picked up job");

        // Run on its own task so a panicking stage cannot take the worker down.
        let runner = Arc::clone(&runner);
        let handle = tokio::spawn(async move { runner.run(job.id, &job.url).await });
        if let Err(e) = handle.await {
            tracing::error!(worker_id, error = %e, "Job task panicked");
        }
    }

    tracing::debug!(worker_id, "Worker stopped");
}
