use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use futures::FutureExt;
use tokio::sync::oneshot;
use crate::engine::EngineOutput;
use crate::error::EngineError;
use super::queue_item::JobResult;

/// # TranslationFuture
///
/// The result handle returned by [`super::TranslatorPool::post`].
///
/// An asynchronous wrapper around a Tokio oneshot receiver that resolves once
/// a worker has finished the batch. If the worker goes away without
/// answering, the future resolves to an [`EngineError`] rather than hanging.
///
/// Outside an async context the result can be collected with
/// [`wait`](Self::wait), which blocks only the calling thread.
pub struct TranslationFuture {
    /// The underlying channel receiver
    receiver: oneshot::Receiver<JobResult>,
}

impl TranslationFuture {
    pub(crate) fn new(receiver: oneshot::Receiver<JobResult>) -> Self {
        Self { receiver }
    }

    /// Blocks the current thread until the batch completes.
    ///
    /// # Panics
    ///
    /// Panics when called from within an asynchronous execution context.
    pub fn wait(self) -> Result<Vec<EngineOutput>, EngineError> {
        self.receiver.blocking_recv().unwrap_or_else(|_| Err(dropped()))
    }
}

fn dropped() -> EngineError {
    EngineError::new("worker dropped the request without a result")
}

impl Future for TranslationFuture {
    type Output = Result<Vec<EngineOutput>, EngineError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.receiver
            .poll_unpin(cx)
            .map(|received| received.unwrap_or_else(|_| Err(dropped())))
    }
}
