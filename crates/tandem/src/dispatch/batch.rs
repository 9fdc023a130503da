use std::time::Instant;
use tracing::debug;
use uuid::Uuid;
use crate::error::Result;
use crate::gate::ConcurrencyGate;
use crate::marshal::{BatchResult, ResultMarshaller};
use crate::options::RequestOptions;
use crate::pool::TranslatorPool;
use crate::request::TranslationRequest;

/// Submits an in-memory batch to the pool and marshals the results.
///
/// The request already owns a copy of the caller's tokens. The dispatcher
/// enters the gate, posts the batch and awaits the pool's future, leaves the
/// gate, and only then builds the caller-visible [`BatchResult`]. Either every
/// item gets a result or the call fails as a whole.
pub(crate) struct BatchDispatcher<'a> {
    pool: &'a TranslatorPool,
    gate: &'a ConcurrencyGate,
}

impl<'a> BatchDispatcher<'a> {
    pub fn new(pool: &'a TranslatorPool, gate: &'a ConcurrencyGate) -> Self {
        Self { pool, gate }
    }

    pub async fn dispatch(&self, request: TranslationRequest, options: RequestOptions) -> Result<BatchResult> {
        if request.is_empty() {
            return Ok(BatchResult::default());
        }

        let id = Uuid::new_v4();
        let batch_size = request.len();
        let started = Instant::now();
        let outputs = self
            .gate
            .run(self.pool.post_with_id(id, request.into_batch(), options))
            .await?;

        debug!(
            request_id = %id,
            batch_size,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch translated"
        );
        Ok(ResultMarshaller::marshal_batch(&outputs))
    }
}
