//! Bounded asynchronous write pipeline.
//!
//! The request path hands each accepted `(code, target)` pair to a
//! [`WritePipeline`] instead of writing it inline. The pipeline owns one
//! bounded queue and a fixed set of worker tasks that drain it, applying
//! every [`Task`] to the repository and then to the Bloom filter.
//!
//! Backpressure comes from the queue bound: [`WritePipeline::submit`] waits
//! for capacity until the caller's deadline and gives up without side
//! effects if none frees up. Shutdown closes the queue for new work and waits
//! for the workers to drain everything already accepted.

mod worker;

use crate::error::PipelineError;
use parking_lot::RwLock;
use shortline_cache::BloomFilter;
use shortline_core::{Repository, ShortCode};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use typed_builder::TypedBuilder;

/// A mapping waiting to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub code: ShortCode,
    pub target: String,
}

/// Sizing of the write pipeline. Fixed for the pipeline's lifetime.
#[derive(Debug, Clone, Copy, TypedBuilder)]
pub struct PipelineConfig {
    /// Maximum number of tasks waiting in the queue.
    #[builder(default = 100)]
    pub queue_capacity: usize,
    /// Number of worker tasks draining the queue.
    #[builder(default = 4)]
    pub workers: usize,
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), PipelineError> {
        if self.queue_capacity == 0 {
            return Err(PipelineError::InvalidConfig(
                "queue capacity must be greater than zero".to_string(),
            ));
        }
        if self.workers == 0 {
            return Err(PipelineError::InvalidConfig(
                "worker count must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Default)]
pub(crate) struct PipelineStats {
    pub(crate) accepted: AtomicU64,
    pub(crate) applied: AtomicU64,
    pub(crate) failed: AtomicU64,
}

/// A bounded queue plus a fixed pool of writers.
pub struct WritePipeline {
    /// `None` once shutdown has begun.
    sender: RwLock<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    stats: Arc<PipelineStats>,
    config: PipelineConfig,
}

impl WritePipeline {
    /// Creates the queue and spawns the workers on the current tokio runtime.
    ///
    /// Every worker gets its own handle to the shared repository and filter.
    pub fn spawn<R: Repository>(
        config: PipelineConfig,
        repository: Arc<R>,
        filter: Arc<BloomFilter>,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| PipelineError::NoRuntime(e.to_string()))?;

        let (tx, rx) = mpsc::channel(config.queue_capacity);
        let queue = Arc::new(Mutex::new(rx));
        let stats = Arc::new(PipelineStats::default());

        let workers = (0..config.workers)
            .map(|worker_id| {
                runtime.spawn(worker::worker_loop(
                    worker_id,
                    Arc::clone(&queue),
                    Arc::clone(&repository),
                    Arc::clone(&filter),
                    Arc::clone(&stats),
                ))
            })
            .collect();

        info!(
            queue_capacity = config.queue_capacity,
            workers = config.workers,
            "write pipeline started"
        );

        Ok(Self {
            sender: RwLock::new(Some(tx)),
            workers: Mutex::new(workers),
            stats,
            config,
        })
    }

    pub fn config(&self) -> PipelineConfig {
        self.config
    }

    /// Queues `task`, waiting for capacity until `deadline`.
    ///
    /// # Errors
    ///
    /// - [`PipelineError::CapacityTimeout`] if the queue stayed full until the
    ///   deadline. The task is dropped and never applied.
    /// - [`PipelineError::Closed`] if shutdown has begun.
    pub async fn submit(&self, task: Task, deadline: Instant) -> Result<(), PipelineError> {
        let Some(sender) = self.sender.read().clone() else {
            return Err(PipelineError::Closed);
        };

        // Reserve first so a timeout can never leave the task half-sent.
        let deadline = tokio::time::Instant::from_std(deadline);
        let reserved = tokio::time::timeout_at(deadline, sender.reserve()).await;
        match reserved {
            Ok(Ok(permit)) => {
                debug!(code = %task.code, "task queued");
                self.stats.accepted.fetch_add(1, Ordering::AcqRel);
                permit.send(task);
                Ok(())
            }
            Ok(Err(_)) => Err(PipelineError::Closed),
            Err(_) => {
                warn!(
                    code = %task.code,
                    queue_capacity = self.config.queue_capacity,
                    "write queue full until deadline, task discarded"
                );
                Err(PipelineError::CapacityTimeout)
            }
        }
    }

    /// Whether [`shutdown`](Self::shutdown) has been called.
    pub fn is_closed(&self) -> bool {
        self.sender.read().is_none()
    }

    /// Tasks sitting in the queue, counting slots reserved by in-flight
    /// submissions. Zero once shutdown has begun.
    pub fn queued(&self) -> usize {
        match self.sender.read().as_ref() {
            Some(sender) => sender.max_capacity() - sender.capacity(),
            None => 0,
        }
    }

    /// Tasks accepted but not yet applied, including those being applied.
    pub fn pending(&self) -> u64 {
        let accepted = self.stats.accepted.load(Ordering::Acquire);
        let done =
            self.stats.applied.load(Ordering::Acquire) + self.stats.failed.load(Ordering::Acquire);
        accepted.saturating_sub(done)
    }

    /// Tasks successfully written to the repository and the filter.
    pub fn applied(&self) -> u64 {
        self.stats.applied.load(Ordering::Acquire)
    }

    /// Tasks the repository rejected.
    pub fn failed(&self) -> u64 {
        self.stats.failed.load(Ordering::Acquire)
    }

    /// Stops accepting tasks and waits for the workers to drain the queue.
    ///
    /// Submissions already waiting for capacity may still complete; their
    /// tasks are drained too. Calling this more than once is harmless.
    pub async fn shutdown(&self) {
        let sender = self.sender.write().take();
        if let Some(sender) = sender {
            info!(pending = self.pending(), "write pipeline closing, draining queue");
            drop(sender);
        }

        let mut workers = self.workers.lock().await;
        for (worker_id, handle) in workers.drain(..).enumerate() {
            if let Err(e) = handle.await {
                error!(worker_id, error = %e, "writer exited abnormally");
            }
        }

        info!(
            applied = self.applied(),
            failed = self.failed(),
            "write pipeline drained"
        );
    }
}

impl std::fmt::Debug for WritePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WritePipeline")
            .field("config", &self.config)
            .field("closed", &self.is_closed())
            .field("pending", &self.pending())
            .finish()
    }
}
