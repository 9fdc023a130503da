//! A deterministic identity-like model.
//!
//! The echo model copies its source tokens back as the best hypothesis and
//! rotates them for lower-ranked ones. It exists so that the dispatch layer can
//! be exercised end to end without a neural model on disk.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;
use crate::error::{EngineError, ModelLoadError};
use crate::options::RequestOptions;
use super::core_trait::{LoadRequest, ModelLoader, Translator};
use super::device::Device;
use super::output::EngineOutput;

/// Identity-like [`Translator`].
#[derive(Debug, Clone, Default)]
pub struct EchoTranslator {
    vocabulary: Option<HashSet<String>>,
    vocabulary_map: Option<HashSet<String>>,
    latency: Option<Duration>,
}

impl EchoTranslator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Closes the source vocabulary; any other source token fails the batch.
    pub fn with_vocabulary<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Target tokens kept when vocabulary restriction is requested.
    pub fn with_vocabulary_map<I, S>(mut self, tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.vocabulary_map = Some(tokens.into_iter().map(Into::into).collect());
        self
    }

    /// Sleeps for `latency` before answering each batch.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    fn translate_one(&self, source: &[String], options: &RequestOptions) -> Result<EngineOutput, EngineError> {
        if let Some(vocabulary) = &self.vocabulary {
            if let Some(unknown) = source.iter().find(|token| !vocabulary.contains(*token)) {
                return Err(EngineError::new(format!("token '{unknown}' is outside the vocabulary")));
            }
        }

        let count = options.num_hypotheses().min(options.beam_size());
        let mut hypotheses = Vec::with_capacity(count);
        let mut scores = Vec::with_capacity(count);
        for rank in 0..count {
            let mut tokens = source.to_vec();
            if !tokens.is_empty() {
                let shift = rank % tokens.len();
                tokens.rotate_left(shift);
            }
            if options.restrict_vocabulary() {
                if let Some(map) = &self.vocabulary_map {
                    tokens.retain(|token| map.contains(token));
                }
            }
            tokens.truncate(options.max_decoding_length());
            hypotheses.push(tokens);
            scores.push(-((rank + 1) as f32) / (1.0 + options.length_penalty().abs()));
        }

        let output = EngineOutput::new(hypotheses, scores);
        if !options.return_attention() {
            return Ok(output);
        }
        let attention = output
            .hypotheses()
            .iter()
            .map(|tokens| align(tokens, source))
            .collect();
        Ok(output.with_attention(attention))
    }
}

/// One row per output token with all weight on the source position it came from.
fn align(target: &[String], source: &[String]) -> Vec<Vec<f32>> {
    target
        .iter()
        .map(|token| {
            let mut row = vec![0.0; source.len()];
            if let Some(col) = source.iter().position(|s| s == token) {
                row[col] = 1.0;
            }
            row
        })
        .collect()
}

impl Translator for EchoTranslator {
    fn translate(&self, batch: &[Vec<String>], options: &RequestOptions) -> Result<Vec<EngineOutput>, EngineError> {
        if let Some(latency) = self.latency {
            std::thread::sleep(latency);
        }
        batch.iter().map(|source| self.translate_one(source, options)).collect()
    }
}

/// [`ModelLoader`] producing [`EchoTranslator`]s.
///
/// The model path must exist. CPU placement accepts only index 0; CUDA
/// placement accepts indices below the configured GPU count, which is zero
/// unless set with [`EchoLoader::with_gpu_count`].
#[derive(Debug, Clone, Default)]
pub struct EchoLoader {
    translator: EchoTranslator,
    gpu_count: usize,
}

impl EchoLoader {
    pub fn new(translator: EchoTranslator) -> Self {
        Self {
            translator,
            gpu_count: 0,
        }
    }

    pub fn with_gpu_count(mut self, gpu_count: usize) -> Self {
        self.gpu_count = gpu_count;
        self
    }
}

impl ModelLoader for EchoLoader {
    fn load(&self, request: &LoadRequest) -> Result<Arc<dyn Translator>, ModelLoadError> {
        if !request.model_path.exists() {
            return Err(ModelLoadError::new(format!(
                "model path {} does not exist",
                request.model_path.display()
            )));
        }

        let device = match request.device {
            Device::Auto if self.gpu_count > 0 => Device::Cuda,
            Device::Auto => Device::Cpu,
            other => other,
        };
        let available = match device {
            Device::Cuda => self.gpu_count,
            _ => 1,
        };
        if request.device_index >= available {
            return Err(ModelLoadError::new(format!(
                "device index {} is out of range for {device} ({available} available)",
                request.device_index
            )));
        }

        debug!(
            model = %request.model_path.display(),
            %device,
            device_index = request.device_index,
            compute_threads = request.backend.compute_threads,
            "loaded echo model"
        );
        Ok(Arc::new(self.translator.clone()))
    }
}
