//! Service configuration with layered sources.
//!
//! Sources are merged in order: built-in defaults, an optional JSON file, then
//! `TANDEM_`-prefixed environment variables (`TANDEM_POOL_SIZE=2`).

use std::path::{Path, PathBuf};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized};
use serde::{Deserialize, Serialize};
use crate::error::{Result, TranslateError};

pub const DEFAULT_COMPUTE_THREADS: usize = 4;
pub const DEFAULT_MAX_BATCH_SIZE: usize = 32;
const ENV_PREFIX: &str = "TANDEM_";

/// Process-wide numeric backend settings.
///
/// Passed explicitly to the model loader when a service is created instead
/// of living in a global.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendSettings {
    /// Threads the numeric backend may use inside one translation
    pub compute_threads: usize,
}

impl Default for BackendSettings {
    fn default() -> Self {
        Self {
            compute_threads: DEFAULT_COMPUTE_THREADS,
        }
    }
}

/// Builds the backend settings to hand to [`crate::ServiceHandle`] at startup.
pub fn initialize(compute_threads: usize) -> BackendSettings {
    BackendSettings { compute_threads }
}

/// Everything needed to stand up a [`crate::ServiceHandle`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub model_path: PathBuf,
    /// Device selector, parsed when the service is created
    pub device: String,
    pub device_index: usize,
    /// Number of pool workers sharing the loaded model
    pub pool_size: usize,
    pub compute_threads: usize,
    /// Chunk size used by file translation
    pub max_batch_size: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            device: "cpu".to_string(),
            device_index: 0,
            pool_size: 1,
            compute_threads: DEFAULT_COMPUTE_THREADS,
            max_batch_size: DEFAULT_MAX_BATCH_SIZE,
        }
    }
}

impl ServiceConfig {
    pub fn new(model_path: impl Into<PathBuf>) -> Self {
        Self {
            model_path: model_path.into(),
            ..Default::default()
        }
    }

    /// Loads configuration from defaults, `file` (when given and present), and the environment.
    pub fn load(file: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(ServiceConfig::default()));
        if let Some(file) = file {
            figment = figment.merge(Json::file(file));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX));
        Self::extract(figment)
    }

    fn extract(figment: Figment) -> Result<Self> {
        figment
            .extract()
            .map_err(|e| TranslateError::Config(e.to_string()))
    }

    pub fn backend(&self) -> BackendSettings {
        BackendSettings {
            compute_threads: self.compute_threads,
        }
    }
}
