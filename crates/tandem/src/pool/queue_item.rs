use tokio::sync::oneshot::Sender;
use uuid::Uuid;
use crate::engine::EngineOutput;
use crate::error::EngineError;
use crate::options::RequestOptions;

/// What a worker sends back for one job.
pub(crate) type JobResult = Result<Vec<EngineOutput>, EngineError>;

/// # QueueItem
///
/// A batch waiting for a worker, paired with the channel its result goes to.
///
/// `QueueItem` owns an engine-consumable copy of the batch, so nothing the
/// caller owns is touched once the item is queued. The `id` ties worker log
/// events back to the dispatch that submitted the batch.
pub(crate) struct QueueItem {
    id: Uuid,
    batch: Vec<Vec<String>>,
    options: RequestOptions,
    sender: Sender<JobResult>,
}

impl QueueItem {
    pub fn new(id: Uuid, batch: Vec<Vec<String>>, options: RequestOptions, sender: Sender<JobResult>) -> Self {
        Self {
            id,
            batch,
            options,
            sender,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn batch(&self) -> &[Vec<String>] {
        &self.batch
    }

    pub fn options(&self) -> &RequestOptions {
        &self.options
    }

    /// Consumes the item, returning the sender for its result.
    pub fn sender(self) -> Sender<JobResult> {
        self.sender
    }
}
