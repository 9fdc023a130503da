use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use crate::error::{Result, TranslateError};
use crate::gate::ConcurrencyGate;
use crate::options::RequestOptions;
use crate::pool::TranslatorPool;

/// Delegates a whole file translation to the pool.
///
/// File consumption blocks for as long as the file takes, so it runs on the
/// blocking pool inside the gate. No per-item results come back: the pool
/// writes directly to the output path.
pub(crate) struct FileStreamDispatcher<'a> {
    pool: &'a Arc<TranslatorPool>,
    gate: &'a ConcurrencyGate,
}

impl<'a> FileStreamDispatcher<'a> {
    pub fn new(pool: &'a Arc<TranslatorPool>, gate: &'a ConcurrencyGate) -> Self {
        Self { pool, gate }
    }

    pub async fn dispatch(
        &self,
        input: PathBuf,
        output: PathBuf,
        max_batch_size: usize,
        options: RequestOptions,
    ) -> Result<usize> {
        if max_batch_size == 0 {
            return Err(TranslateError::invalid("max_batch_size must be positive"));
        }

        info!(
            input = %input.display(),
            output = %output.display(),
            max_batch_size,
            "file translation started"
        );
        let pool = self.pool.clone();
        self.gate
            .run_blocking(move || {
                let with_scores = options.with_scores();
                pool.consume_text_file(&input, &output, max_batch_size, &options, with_scores)
            })
            .await
    }
}
