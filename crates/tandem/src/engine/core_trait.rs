use std::path::PathBuf;
use std::sync::Arc;
use crate::config::BackendSettings;
use crate::error::{EngineError, ModelLoadError};
use crate::options::RequestOptions;
use super::device::Device;
use super::output::EngineOutput;

/// # Translator
///
/// A loaded sequence-to-sequence model, the computation a pool worker runs.
///
/// One instance is loaded per [`crate::ServiceHandle`] and shared by every
/// worker in its pool, so implementations must be safe to call from several
/// threads at once.
///
/// ## Implementation Notes
///
/// - `translate` is blocking and may take seconds; it is only ever invoked
///   from pool worker threads, never from an async executor thread.
/// - The returned vector must be index-aligned with `batch` and hold no more
///   than `options.num_hypotheses()` hypotheses per item.
/// - Failures (out of memory, a token outside the vocabulary) are reported as
///   [`EngineError`] and propagated unchanged to the caller.
pub trait Translator: Send + Sync + 'static {
    /// Translates every item of `batch` with the given decoding options.
    fn translate(
        &self,
        batch: &[Vec<String>],
        options: &RequestOptions,
    ) -> Result<Vec<EngineOutput>, EngineError>;
}

/// Everything a [`ModelLoader`] needs to place one model on a device.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub model_path: PathBuf,
    pub device: Device,
    pub device_index: usize,
    pub backend: BackendSettings,
}

/// # ModelLoader
///
/// Loads a model from disk onto a device.
///
/// Called exactly once per [`crate::ServiceHandle`]; the loaded model is
/// then replicated across the pool's workers by reference.
pub trait ModelLoader {
    /// Loads the model described by `request`.
    ///
    /// # Errors
    ///
    /// Returns [`ModelLoadError`] when the path is invalid or the device
    /// index is out of range for the requested device type.
    fn load(&self, request: &LoadRequest) -> Result<Arc<dyn Translator>, ModelLoadError>;
}
