//! Error taxonomy shared by every dispatch path.

use std::path::PathBuf;

/// Failure raised while loading a model onto a device.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("failed to load model: {reason}")]
pub struct ModelLoadError {
    reason: String,
}

impl ModelLoadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Failure surfaced by the inference engine while translating.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine failure: {reason}")]
pub struct EngineError {
    reason: String,
}

impl EngineError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// Errors returned to callers of a [`crate::ServiceHandle`].
#[derive(Debug, thiserror::Error)]
pub enum TranslateError {
    /// Invalid model path, device selector or device index.
    #[error(transparent)]
    ModelLoad(#[from] ModelLoadError),

    /// Decoding options that are internally inconsistent.
    #[error("invalid options: {0}")]
    InvalidOptions(String),

    /// The engine failed during submission or execution.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A configuration source could not be read or parsed.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// A file path in file mode could not be read or written.
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl TranslateError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidOptions(reason.into())
    }
}

pub type Result<T> = std::result::Result<T, TranslateError>;
