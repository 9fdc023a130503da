use std::path::{Path, PathBuf};
use std::sync::Arc;
use async_trait::async_trait;
use tracing::{info, warn};
use crate::config::{BackendSettings, ServiceConfig};
use crate::dispatch::{BatchDispatcher, FileStreamDispatcher, Translate};
use crate::engine::{Device, LoadRequest, ModelLoader};
use crate::error::{Result, TranslateError};
use crate::gate::ConcurrencyGate;
use crate::marshal::BatchResult;
use crate::options::{DecodingParams, RequestOptions};
use crate::pool::TranslatorPool;
use crate::request::TranslationRequest;

/// # ServiceHandle
///
/// The single entry point callers interact with.
///
/// A handle loads one model, replicates it across a fixed-size worker pool
/// and owns that pool exclusively for its whole lifetime. The handle is not
/// `Clone`; share it by reference or behind an `Arc`. Concurrent dispatches
/// on one handle are safe and are queued by the pool.
///
/// ## Teardown
///
/// Dropping the last reference to the handle blocks until every batch already
/// submitted has finished and the workers have exited. From async code prefer
/// [`shutdown`](Self::shutdown), which waits for outstanding dispatches first
/// and performs the blocking teardown off the executor.
pub struct ServiceHandle {
    pool: Arc<TranslatorPool>,
    gate: ConcurrencyGate,
    device: Device,
    device_index: usize,
}

impl ServiceHandle {
    /// Loads `model_path` on `device` and starts `pool_size` workers.
    ///
    /// # Parameters
    ///
    /// * `loader` - Places the model on the requested device
    /// * `model_path` - Directory or file holding the model
    /// * `device` - Device selector: `cpu`, `cuda` (or `gpu`), or `auto`
    /// * `device_index` - Which device of that type to use
    /// * `pool_size` - Number of workers sharing the loaded model
    ///
    /// # Returns
    ///
    /// A ready handle owning the worker pool.
    ///
    /// # Errors
    ///
    /// * [`TranslateError::ModelLoad`] for an unknown device selector, or when
    ///   the loader rejects the path or device index
    /// * [`TranslateError::InvalidOptions`] when `pool_size` is zero
    pub fn create<L>(loader: &L, model_path: impl Into<PathBuf>, device: &str, device_index: usize, pool_size: usize) -> Result<Self>
    where
        L: ModelLoader + ?Sized,
    {
        Self::with_backend(loader, model_path, device, device_index, pool_size, BackendSettings::default())
    }

    /// Like [`create`](Self::create), with explicit numeric backend settings.
    pub fn with_backend<L>(
        loader: &L,
        model_path: impl Into<PathBuf>,
        device: &str,
        device_index: usize,
        pool_size: usize,
        backend: BackendSettings,
    ) -> Result<Self>
    where
        L: ModelLoader + ?Sized,
    {
        if pool_size == 0 {
            return Err(TranslateError::invalid("pool_size must be positive"));
        }
        let request = LoadRequest {
            model_path: model_path.into(),
            device: device.parse()?,
            device_index,
            backend,
        };

        let model = loader.load(&request)?;
        let pool = TranslatorPool::new(pool_size, model)?;
        info!(
            model = %request.model_path.display(),
            device = %request.device,
            device_index,
            pool_size,
            "translation service ready"
        );

        Ok(Self {
            pool: Arc::new(pool),
            gate: ConcurrencyGate::new(),
            device: request.device,
            device_index,
        })
    }

    pub fn from_config<L>(loader: &L, config: &ServiceConfig) -> Result<Self>
    where
        L: ModelLoader + ?Sized,
    {
        Self::with_backend(
            loader,
            config.model_path.clone(),
            &config.device,
            config.device_index,
            config.pool_size,
            config.backend(),
        )
    }

    /// Translates an in-memory batch; `None` or an empty batch yields an empty result.
    pub async fn translate_batch(&self, tokens: impl Into<TranslationRequest>, params: DecodingParams) -> Result<BatchResult> {
        let request = tokens.into();
        let options = RequestOptions::new(params)?;
        BatchDispatcher::new(&self.pool, &self.gate)
            .dispatch(request, options)
            .await
    }

    /// Translates `input` into `output` in chunks of `max_batch_size` lines.
    ///
    /// Returns the number of source lines translated. Output written before a
    /// mid-stream failure stays on disk.
    pub async fn translate_file(
        &self,
        input: impl AsRef<Path>,
        output: impl AsRef<Path>,
        max_batch_size: usize,
        params: DecodingParams,
    ) -> Result<usize> {
        let options = RequestOptions::new(params)?;
        FileStreamDispatcher::new(&self.pool, &self.gate)
            .dispatch(input.as_ref().to_path_buf(), output.as_ref().to_path_buf(), max_batch_size, options)
            .await
    }

    pub fn pool_size(&self) -> usize {
        self.pool.pool_size()
    }

    pub fn device(&self) -> Device {
        self.device
    }

    pub fn device_index(&self) -> usize {
        self.device_index
    }

    /// Dispatches currently waiting on native work.
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Waits for outstanding dispatches, then tears the pool down.
    pub async fn shutdown(self) {
        self.gate.drained().await;
        let pool = self.pool;
        if tokio::task::spawn_blocking(move || drop(pool)).await.is_err() {
            warn!("translator pool teardown panicked");
        }
    }
}

#[async_trait]
impl Translate for ServiceHandle {
    async fn translate_batch(&self, tokens: TranslationRequest, params: DecodingParams) -> Result<BatchResult> {
        ServiceHandle::translate_batch(self, tokens, params).await
    }

    async fn translate_file(
        &self,
        input: PathBuf,
        output: PathBuf,
        max_batch_size: usize,
        params: DecodingParams,
    ) -> Result<usize> {
        ServiceHandle::translate_file(self, input, output, max_batch_size, params).await
    }
}
