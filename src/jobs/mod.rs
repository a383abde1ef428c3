//! Background diagram jobs.
//!
//! Submissions land in a shared queue drained by a fixed pool of workers.
//! A job is only ever written by the worker that dequeued it; the
//! submitting call hands it off and never touches it again.

pub mod types;

pub use types::{DiagramJob, JobStatus};

use crate::config::JobsConfig;
use crate::error::JobError;
use crate::tutor::types::VisualizationPayload;
use futures_util::FutureExt;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use types::RUNNING_PROGRESS;

const RENDER_PANIC_MESSAGE: &str = "Diagram rendering failed";

pub type RenderFuture<'a> =
    Pin<Box<dyn Future<Output = Result<VisualizationPayload, String>> + Send + 'a>>;

/// Produces the visualization for a job question. The error string is
/// shown to whoever polls the job.
pub trait DiagramRenderer: Send + Sync {
    fn render<'a>(&'a self, question: &'a str) -> RenderFuture<'a>;
}

#[derive(Debug)]
struct JobRecord {
    seq: u64,
    job: DiagramJob,
}

#[derive(Debug, Default)]
struct JobTable {
    next_seq: u64,
    rows: HashMap<String, JobRecord>,
}

type SharedTable = Arc<Mutex<JobTable>>;

fn lock(table: &SharedTable) -> std::sync::MutexGuard<'_, JobTable> {
    table.lock().unwrap_or_else(PoisonError::into_inner)
}

pub struct DiagramJobManager {
    table: SharedTable,
    queue: mpsc::UnboundedSender<String>,
    cancel: CancellationToken,
    tracker: TaskTracker,
    list_limit_max: usize,
}

impl DiagramJobManager {
    /// Spawn `workers` tasks on the current tokio runtime.
    pub fn start(renderer: Arc<dyn DiagramRenderer>, workers: usize, list_limit_max: usize) -> Self {
        let table: SharedTable = Arc::default();
        let (queue, rx) = mpsc::unbounded_channel::<String>();
        let rx = Arc::new(tokio::sync::Mutex::new(rx));
        let cancel = CancellationToken::new();
        let tracker = TaskTracker::new();

        for worker in 0..workers.max(1) {
            tracker.spawn(run_worker(
                worker,
                Arc::clone(&table),
                Arc::clone(&rx),
                Arc::clone(&renderer),
                cancel.clone(),
            ));
        }
        tracker.close();

        Self {
            table,
            queue,
            cancel,
            tracker,
            list_limit_max: list_limit_max.max(1),
        }
    }

    pub fn from_config(renderer: Arc<dyn DiagramRenderer>, config: &JobsConfig) -> Self {
        Self::start(renderer, config.workers, config.list_limit_max)
    }

    /// Register a queued job and hand it to the pool.
    pub fn submit(&self, question: &str) -> Result<DiagramJob, JobError> {
        if self.cancel.is_cancelled() {
            return Err(JobError::PoolClosed);
        }
        let id = new_job_id();
        let job = DiagramJob::queued(&id, question);
        {
            let mut table = lock(&self.table);
            table.next_seq += 1;
            let seq = table.next_seq;
            table.rows.insert(
                id.clone(),
                JobRecord {
                    seq,
                    job: job.clone(),
                },
            );
        }
        if self.queue.send(id.clone()).is_err() {
            lock(&self.table).rows.remove(&id);
            return Err(JobError::PoolClosed);
        }
        tracing::info!(job_id = %id, "diagram job queued");
        Ok(job)
    }

    /// Snapshot of a job; unknown ids yield a synthetic `not_found` record.
    pub fn get(&self, id: &str) -> DiagramJob {
        lock(&self.table)
            .rows
            .get(id)
            .map_or_else(|| DiagramJob::not_found(id), |r| r.job.clone())
    }

    /// Newest first, `limit` clamped to `1..=list_limit_max`.
    pub fn list(&self, limit: usize) -> Vec<DiagramJob> {
        let limit = limit.clamp(1, self.list_limit_max);
        let table = lock(&self.table);
        let mut rows: Vec<&JobRecord> = table.rows.values().collect();
        rows.sort_by(|a, b| b.seq.cmp(&a.seq));
        rows.into_iter().take(limit).map(|r| r.job.clone()).collect()
    }

    pub fn delete(&self, id: &str) -> Result<(), JobError> {
        lock(&self.table)
            .rows
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| JobError::NotFound(id.to_string()))
    }

    pub fn len(&self) -> usize {
        lock(&self.table).rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting work and wait for workers to finish their current job.
    pub async fn shutdown(&self) {
        self.cancel.cancel();
        self.tracker.wait().await;
    }
}

impl Drop for DiagramJobManager {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn run_worker(
    worker: usize,
    table: SharedTable,
    rx: Arc<tokio::sync::Mutex<mpsc::UnboundedReceiver<String>>>,
    renderer: Arc<dyn DiagramRenderer>,
    cancel: CancellationToken,
) {
    loop {
        let next = tokio::select! {
            () = cancel.cancelled() => None,
            id = async { rx.lock().await.recv().await } => id,
        };
        let Some(id) = next else {
            break;
        };

        let question = {
            let mut guard = lock(&table);
            let Some(record) = guard.rows.get_mut(&id) else {
                tracing::debug!(worker, job_id = %id, "job deleted before pickup");
                continue;
            };
            if !record.job.advance(JobStatus::Running, RUNNING_PROGRESS) {
                continue;
            }
            record.job.question.clone().unwrap_or_default()
        };

        tracing::info!(worker, job_id = %id, "diagram job running");
        let outcome = AssertUnwindSafe(async { renderer.render(&question).await })
            .catch_unwind()
            .await
            .unwrap_or_else(|_| {
                tracing::error!(worker, job_id = %id, "diagram renderer panicked");
                Err(RENDER_PANIC_MESSAGE.to_string())
            });

        let mut guard = lock(&table);
        let Some(record) = guard.rows.get_mut(&id) else {
            tracing::debug!(worker, job_id = %id, "job deleted while running");
            continue;
        };
        match outcome {
            Ok(payload) => {
                tracing::info!(worker, job_id = %id, payload_id = %payload.id, "diagram job completed");
                record.job.complete(payload);
            }
            Err(message) => {
                tracing::warn!(worker, job_id = %id, error = %message, "diagram job failed");
                record.job.fail(message);
            }
        }
    }
    tracing::debug!(worker, "diagram worker stopped");
}

fn new_job_id() -> String {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    format!("viz-{}", &hex[..12])
}
