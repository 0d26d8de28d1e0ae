use super::{PipelineStats, Task};
use shortline_cache::BloomFilter;
use shortline_core::Repository;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tracing::{error, trace};

/// Worker task that applies queued [`Task`]s until the queue is closed and
/// empty.
///
/// All workers share one receiver; whichever worker holds the lock waits for
/// the next task and releases the lock before applying it, so writes from
/// different workers overlap. A task that has been received always runs to
/// completion.
pub(super) async fn worker_loop<R: Repository>(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::Receiver<Task>>>,
    repository: Arc<R>,
    filter: Arc<BloomFilter>,
    stats: Arc<PipelineStats>,
) {
    trace!(worker_id, "writer started");

    loop {
        let next = {
            let mut rx = queue.lock().await;
            rx.recv().await
        };
        let Some(task) = next else {
            break;
        };

        if apply(worker_id, &task, repository.as_ref(), &filter).await {
            stats.applied.fetch_add(1, Ordering::AcqRel);
        } else {
            stats.failed.fetch_add(1, Ordering::AcqRel);
        }
    }

    trace!(worker_id, "writer stopped");
}

/// Writes the store first, then the filter, so the filter never claims a
/// code the store doesn't hold.
async fn apply<R: Repository>(
    worker_id: usize,
    task: &Task,
    repository: &R,
    filter: &BloomFilter,
) -> bool {
    match repository.store(&task.code, &task.target).await {
        Ok(()) => {
            filter.add(task.code.as_str());
            trace!(worker_id, code = %task.code, "task applied");
            true
        }
        Err(e) => {
            error!(
                worker_id,
                code = %task.code,
                error = %e,
                "failed to store short code, task dropped"
            );
            false
        }
    }
}
