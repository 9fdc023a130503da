use std::sync::Arc;
use tokio::sync::oneshot::channel;
use tracing::{debug, info};
use uuid::Uuid;
use crate::engine::Translator;
use crate::error::EngineError;
use crate::options::RequestOptions;
use super::item::TranslationFuture;
use super::queue_item::QueueItem;
use super::worker::{JobQueue, WorkerHandle};

/// # TranslatorPool
///
/// A fixed-size set of worker threads replicating one loaded model.
///
/// Batches are queued in submission order and picked up by whichever worker
/// is free, so at most `pool_size` translations run at once. Each batch is
/// handled by a single worker, which keeps the results of one batch
/// index-aligned with its input.
///
/// ## Shutdown
///
/// Dropping the pool is synchronous: it closes the queue, lets the workers
/// finish every batch already submitted, and joins all worker threads before
/// returning. Device resources are therefore never released mid-computation.
pub struct TranslatorPool {
    queue: Arc<JobQueue>,
    workers: Vec<WorkerHandle>,
}

impl TranslatorPool {
    /// Spawns `pool_size` workers sharing `model`.
    ///
    /// # Parameters
    ///
    /// * `pool_size` - Number of worker threads, must be positive
    /// * `model` - The loaded model every worker calls into
    ///
    /// # Returns
    ///
    /// A running pool, or an [`EngineError`] if `pool_size` is zero or a
    /// worker thread cannot be spawned. Workers spawned before a spawn
    /// failure are shut down again.
    pub fn new(pool_size: usize, model: Arc<dyn Translator>) -> Result<Self, EngineError> {
        if pool_size == 0 {
            return Err(EngineError::new("pool_size must be positive"));
        }
        let queue = Arc::new(JobQueue::new());
        let mut pool = Self {
            queue,
            workers: Vec::with_capacity(pool_size),
        };
        for index in 0..pool_size {
            let worker = WorkerHandle::spawn(index, model.clone(), pool.queue.clone())
                .map_err(|e| EngineError::new(format!("failed to spawn worker {index}: {e}")))?;
            pool.workers.push(worker);
        }
        info!(pool_size, "translator pool started");
        Ok(pool)
    }

    /// Submits `batch` and returns a future for its results.
    ///
    /// The batch is moved into the queue, so the caller keeps no borrowed
    /// state alive while it waits.
    ///
    /// # Parameters
    ///
    /// * `batch` - Token sequences, one per source item
    /// * `options` - Validated decoding options for every item of the batch
    ///
    /// # Returns
    ///
    /// A [`TranslationFuture`] resolving to one [`crate::engine::EngineOutput`]
    /// per item, in input order, or to the [`EngineError`] the engine raised.
    pub fn post(&self, batch: Vec<Vec<String>>, options: RequestOptions) -> TranslationFuture {
        self.post_with_id(Uuid::new_v4(), batch, options)
    }

    pub(crate) fn post_with_id(&self, id: Uuid, batch: Vec<Vec<String>>, options: RequestOptions) -> TranslationFuture {
        let (tx, rx) = channel();
        debug!(request_id = %id, batch_size = batch.len(), "batch queued");
        self.queue.push(QueueItem::new(id, batch, options, tx));
        TranslationFuture::new(rx)
    }

    pub fn pool_size(&self) -> usize {
        self.workers.len()
    }

    /// Number of batches queued but not yet picked up by a worker.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

impl Drop for TranslatorPool {
    fn drop(&mut self) {
        self.queue.close();
        for worker in self.workers.iter_mut() {
            worker.join();
        }
        info!(pool_size = self.workers.len(), "translator pool stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;
    use crate::engine::EngineOutput;
    use crate::engine::echo::EchoTranslator;

    fn sentence(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    /// Records the peak number of concurrent translations.
    struct ConcurrencyProbe {
        active: AtomicUsize,
        peak: AtomicUsize,
        finished: AtomicBool,
    }

    impl Translator for ConcurrencyProbe {
        fn translate(&self, batch: &[Vec<String>], _options: &RequestOptions) -> Result<Vec<EngineOutput>, EngineError> {
            let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            std::thread::sleep(Duration::from_millis(50));
            self.active.fetch_sub(1, Ordering::SeqCst);
            self.finished.store(true, Ordering::SeqCst);
            Ok(batch.iter().map(|_| EngineOutput::default()).collect())
        }
    }

    fn probe() -> Arc<ConcurrencyProbe> {
        Arc::new(ConcurrencyProbe {
            active: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        })
    }

    #[tokio::test]
    async fn test_post_resolves_in_input_order() {
        let pool = TranslatorPool::new(2, Arc::new(EchoTranslator::new())).unwrap();
        let batch = vec![sentence(&["a"]), sentence(&["b", "c"]), sentence(&["d"])];

        let outputs = pool.post(batch.clone(), RequestOptions::default()).await.unwrap();

        let firsts: Vec<_> = outputs.iter().map(|o| o.hypotheses()[0].clone()).collect();
        assert_eq!(firsts, batch);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pool_bounds_concurrency() {
        let model = probe();
        let pool = TranslatorPool::new(2, model.clone()).unwrap();

        let futures: Vec<_> = (0..6)
            .map(|_| pool.post(vec![sentence(&["x"])], RequestOptions::default()))
            .collect();
        for result in futures::future::join_all(futures).await {
            assert!(result.is_ok());
        }

        assert_eq!(model.peak.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_drop_waits_for_in_flight_work() {
        let model = probe();
        let pool = TranslatorPool::new(1, model.clone()).unwrap();
        let future = pool.post(vec![sentence(&["x"])], RequestOptions::default());

        drop(pool);

        assert!(model.finished.load(Ordering::SeqCst), "drop returned before the batch completed");
        assert!(future.wait().is_ok());
    }

    #[test]
    fn test_zero_sized_pool_is_rejected() {
        let err = TranslatorPool::new(0, Arc::new(EchoTranslator::new())).err().unwrap();
        assert!(err.reason().contains("pool_size"));
    }

    #[test]
    fn test_pool_reports_its_size() {
        let pool = TranslatorPool::new(1, Arc::new(EchoTranslator::new())).unwrap();
        assert_eq!(pool.pool_size(), 1);
        assert_eq!(pool.pending(), 0);
    }
}
