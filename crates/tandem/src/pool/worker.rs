//! Worker threads and the job queue they share.

use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use parking_lot::{Condvar, Mutex};
use tracing::{debug, warn};
use crate::engine::Translator;
use crate::error::EngineError;
use super::queue_item::{JobResult, QueueItem};

struct QueueState {
    jobs: VecDeque<QueueItem>,
    /// Cleared once the pool shuts down; queued jobs are still drained
    running: bool,
}

/// FIFO queue of batches waiting for a worker.
pub(crate) struct JobQueue {
    state: Mutex<QueueState>,
    notifier: Condvar,
}

impl JobQueue {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState {
                jobs: VecDeque::new(),
                running: true,
            }),
            notifier: Condvar::new(),
        }
    }

    /// Enqueues `item` and wakes one idle worker.
    pub fn push(&self, item: QueueItem) {
        self.state.lock().jobs.push_back(item);
        self.notifier.notify_one();
    }

    /// Blocks until a job is available.
    ///
    /// Returns `None` only once the queue has been closed and fully drained.
    pub fn pop(&self) -> Option<QueueItem> {
        let mut state = self.state.lock();
        loop {
            if let Some(item) = state.jobs.pop_front() {
                return Some(item);
            }
            if !state.running {
                return None;
            }
            self.notifier.wait(&mut state);
        }
    }

    /// Stops accepting waits and wakes every worker so it can observe shutdown.
    pub fn close(&self) {
        self.state.lock().running = false;
        self.notifier.notify_all();
    }

    pub fn len(&self) -> usize {
        self.state.lock().jobs.len()
    }
}

/// A handle for one pool worker thread.
///
/// Dropping the handle joins the thread, so it returns only after the worker
/// has finished whatever it was running.
pub(crate) struct WorkerHandle {
    /// Handle to the spawned thread, becomes `None` after it has been joined
    handle: Option<JoinHandle<()>>,
}

impl WorkerHandle {
    /// Spawns a named worker that serves `queue` with `model` until the queue closes.
    pub fn spawn(index: usize, model: Arc<dyn Translator>, queue: Arc<JobQueue>) -> std::io::Result<Self> {
        let handle = thread::Builder::new()
            .name(format!("tandem-worker-{index}"))
            .spawn(move || worker_loop(index, model.as_ref(), &queue))?;
        Ok(Self { handle: Some(handle) })
    }

    /// Waits for the worker thread to exit.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("worker thread exited with a panic");
            }
        }
    }
}

impl Drop for WorkerHandle {
    fn drop(&mut self) {
        self.join();
    }
}

fn worker_loop(index: usize, model: &dyn Translator, queue: &JobQueue) {
    while let Some(item) = queue.pop() {
        let id = item.id();
        let result = run_job(model, &item);
        debug!(worker = index, request_id = %id, ok = result.is_ok(), "batch finished");
        if item.sender().send(result).is_err() {
            debug!(worker = index, request_id = %id, "result receiver dropped");
        }
    }
    debug!(worker = index, "worker stopped");
}

fn run_job(model: &dyn Translator, item: &QueueItem) -> JobResult {
    let batch = item.batch();
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| model.translate(batch, item.options())));
    match outcome {
        Ok(Ok(outputs)) if outputs.len() != batch.len() => Err(EngineError::new(format!(
            "engine returned {} results for a batch of {}",
            outputs.len(),
            batch.len()
        ))),
        Ok(Ok(outputs)) => {
            let max_hypotheses = item.options().num_hypotheses();
            outputs.iter().try_for_each(|output| output.validate(max_hypotheses))?;
            Ok(outputs)
        }
        Ok(Err(e)) => Err(e),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            warn!(request_id = %item.id(), %message, "model panicked while translating");
            Err(EngineError::new(format!("model panicked: {message}")))
        }
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
