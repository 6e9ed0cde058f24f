//! Worker pool and job dispatch.
//!
//! [`TaskQueue`] is the enqueue handle handed to request-path code: it
//! inserts a row and wakes the workers, never waiting for execution.
//! [`WorkerPool`] owns N tokio tasks that claim, dispatch, and settle jobs.
//! Handlers must be idempotent — the queue is at-least-once.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{watch, Notify};
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use fiscus_store::ConnectionPool;

use crate::errors::{Result, TaskError};
use crate::repository::JobRepository;
use crate::types::Job;

/// Attempts after which a repeatedly failing job is dropped.
const MAX_ATTEMPTS: i64 = 5;

/// Executes one kind of job.
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run the job. An `Err` releases the claim for redelivery.
    async fn run(&self, args: &serde_json::Value) -> Result<()>;
}

/// Maps `job_type` keys to handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn JobHandler>>,
}

impl HandlerRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler for a job type.
    pub fn register(&mut self, job_type: &str, handler: Arc<dyn JobHandler>) {
        let _ = self.handlers.insert(job_type.to_string(), handler);
    }

    fn get(&self, job_type: &str) -> Option<&Arc<dyn JobHandler>> {
        self.handlers.get(job_type)
    }
}

/// Enqueue handle shared with request-path code.
#[derive(Clone)]
pub struct TaskQueue {
    pool: ConnectionPool,
    notify: Arc<Notify>,
}

impl TaskQueue {
    /// Create a queue handle over the shared database pool.
    #[must_use]
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            notify: Arc::new(Notify::new()),
        }
    }

    /// Enqueue a job and wake the workers. Never blocks on execution.
    pub fn enqueue(&self, job_type: &str, args: &serde_json::Value) -> Result<Job> {
        let conn = self.pool.get()?;
        let job = JobRepository::enqueue(&conn, job_type, args)?;
        debug!(job_id = %job.id, job_type, "job enqueued");
        self.notify.notify_waiters();
        Ok(job)
    }

    /// Jobs currently queued or running.
    pub fn depth(&self) -> Result<usize> {
        let conn = self.pool.get()?;
        JobRepository::depth(&conn)
    }

    fn notifier(&self) -> Arc<Notify> {
        self.notify.clone()
    }
}

/// Worker pool configuration.
#[derive(Clone, Debug)]
pub struct WorkerPoolConfig {
    /// Number of worker tasks.
    pub workers: usize,
    /// Idle poll interval.
    pub poll_interval: Duration,
    /// Seconds before a claim is considered lost.
    pub visibility_timeout_secs: i64,
}

impl Default for WorkerPoolConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            poll_interval: Duration::from_millis(500),
            visibility_timeout_secs: 120,
        }
    }
}

/// Running worker tasks plus their shutdown signal.
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
    shutdown_tx: watch::Sender<bool>,
}

impl WorkerPool {
    /// Spawn the worker tasks.
    pub fn spawn(
        pool: ConnectionPool,
        queue: &TaskQueue,
        registry: Arc<HandlerRegistry>,
        config: &WorkerPoolConfig,
    ) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handles = (0..config.workers.max(1))
            .map(|worker_id| {
                let pool = pool.clone();
                let notify = queue.notifier();
                let registry = registry.clone();
                let config = config.clone();
                let mut shutdown_rx = shutdown_rx.clone();
                tokio::spawn(async move {
                    worker_loop(worker_id, pool, notify, registry, config, &mut shutdown_rx).await;
                })
            })
            .collect();
        Self {
            handles,
            shutdown_tx,
        }
    }

    /// Signal shutdown and wait for the workers to drain.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        for handle in self.handles {
            let _ = handle.await;
        }
    }
}

async fn worker_loop(
    worker_id: usize,
    pool: ConnectionPool,
    notify: Arc<Notify>,
    registry: Arc<HandlerRegistry>,
    config: WorkerPoolConfig,
    shutdown_rx: &mut watch::Receiver<bool>,
) {
    debug!(worker_id, "queue worker started");
    loop {
        if *shutdown_rx.borrow() {
            break;
        }

        let claimed = claim(&pool, config.visibility_timeout_secs);
        match claimed {
            Ok(Some(job)) => {
                dispatch(&pool, &registry, &job).await;
                continue; // look for more work immediately
            }
            Ok(None) => {}
            Err(e) => {
                error!(worker_id, error = %e, "claim failed");
            }
        }

        tokio::select! {
            () = notify.notified() => {}
            () = tokio::time::sleep(config.poll_interval) => {}
            _ = shutdown_rx.changed() => {}
        }
    }
    debug!(worker_id, "queue worker stopped");
}

fn claim(pool: &ConnectionPool, visibility_timeout_secs: i64) -> Result<Option<Job>> {
    let mut conn = pool.get()?;
    JobRepository::claim_next(&mut conn, visibility_timeout_secs)
}

async fn dispatch(pool: &ConnectionPool, registry: &HandlerRegistry, job: &Job) {
    let Some(handler) = registry.get(&job.job_type) else {
        warn!(job_id = %job.id, job_type = %job.job_type, "no handler registered, dropping job");
        settle(pool, &job.id, true);
        return;
    };

    match handler.run(&job.args).await {
        Ok(()) => settle(pool, &job.id, true),
        Err(e) => {
            if job.attempts >= MAX_ATTEMPTS {
                error!(
                    job_id = %job.id,
                    attempts = job.attempts,
                    error = %e,
                    "job exhausted its attempts, dropping"
                );
                settle(pool, &job.id, true);
            } else {
                warn!(job_id = %job.id, attempts = job.attempts, error = %e, "job failed, requeued");
                settle(pool, &job.id, false);
            }
        }
    }
}

fn settle(pool: &ConnectionPool, job_id: &str, complete: bool) {
    let result = pool
        .get()
        .map_err(TaskError::from)
        .and_then(|conn| {
            if complete {
                JobRepository::complete(&conn, job_id)
            } else {
                JobRepository::release(&conn, job_id)
            }
        });
    if let Err(e) = result {
        // The visibility timeout will redeliver the job later.
        error!(job_id, error = %e, "failed to settle job");
    }
}
