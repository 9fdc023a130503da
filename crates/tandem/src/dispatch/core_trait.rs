use std::path::PathBuf;
use async_trait::async_trait;
use crate::error::Result;
use crate::marshal::BatchResult;
use crate::options::DecodingParams;
use crate::request::TranslationRequest;

/// # Translate
///
/// The caller-facing dispatch surface.
///
/// Implemented by [`crate::ServiceHandle`]; callers that only need to submit
/// work can depend on this trait and swap in a test double.
///
/// ## Guarantees
///
/// * `translate_batch` returns exactly one result per request item, in
///   request order, or fails as a whole
/// * an empty request yields an empty result without reaching the engine
/// * invalid decoding parameters fail before any engine interaction
/// * no cancellation: once submitted, work runs to completion or failure
#[async_trait]
pub trait Translate: Send + Sync {
    /// Translates an in-memory batch.
    async fn translate_batch(&self, tokens: TranslationRequest, params: DecodingParams) -> Result<BatchResult>;

    /// Translates `input` into `output`, returning the number of lines translated.
    async fn translate_file(
        &self,
        input: PathBuf,
        output: PathBuf,
        max_batch_size: usize,
        params: DecodingParams,
    ) -> Result<usize>;
}
