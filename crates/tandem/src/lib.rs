//! # Tandem
//!
//! Concurrent dispatch and result marshalling between async callers and a
//! fixed-size pool of sequence-translation workers.
//!
//! ## Overview
//!
//! Callers submit either an in-memory batch of tokenized sequences or a pair
//! of file paths, together with decoding options. Tandem forwards the work to
//! a pool of worker threads sharing one loaded model, waits for completion
//! without blocking the caller's executor, and turns the engine's native
//! results into plain records of hypotheses, scores and attention.
//!
//! The model itself stays outside this crate. It is plugged in through the
//! [`engine::ModelLoader`] and [`engine::Translator`] traits.
//!
//! ## Architecture
//!
//! ```text
//! caller -> ServiceHandle -> { BatchDispatcher | FileStreamDispatcher }
//!        -> ConcurrencyGate -> TranslatorPool workers -> Translator
//!        -> (batch only) ResultMarshaller -> caller
//! ```
//!
//! * [`ServiceHandle`] - owns the pool for its lifetime, the only entry point
//! * [`RequestOptions`] - validated decoding configuration, one per call
//! * [`ConcurrencyGate`] - keeps blocking native work off the async executor
//! * [`pool::TranslatorPool`] - fixed-size worker pool, synchronous teardown
//! * [`ResultMarshaller`] - engine output to [`TranslationResult`]
//!
//! ## Example
//!
//! ```rust
//! # use tandem::{DecodingParams, ServiceHandle};
//! # use tandem::engine::echo::EchoLoader;
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> tandem::Result<()> {
//! let model_dir = std::env::temp_dir();
//! let service = ServiceHandle::create(&EchoLoader::default(), model_dir, "cpu", 0, 2)?;
//!
//! let results = service
//!     .translate_batch(vec![vec!["hello", "world"]], DecodingParams::default())
//!     .await?;
//!
//! assert_eq!(results[0].best().unwrap().tokens, vec!["hello", "world"]);
//! service.shutdown().await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Guarantees
//!
//! Results are index-aligned with the request. An empty or absent batch never
//! reaches the engine. Errors are never swallowed: engine failures surface as
//! [`TranslateError::Engine`], and invalid options fail before any work is
//! submitted. There is no cancellation; submitted work always runs to the end.

mod config;
mod dispatch;
mod error;
mod gate;
mod marshal;
mod options;
mod request;
mod service;

pub mod engine;
pub mod pool;

pub use config::{initialize, BackendSettings, ServiceConfig};
pub use dispatch::Translate;
pub use error::{EngineError, ModelLoadError, Result, TranslateError};
pub use gate::{ConcurrencyGate, GateGuard};
pub use marshal::{BatchResult, Hypothesis, ResultMarshaller, TranslationResult};
pub use options::{DecodingParams, RequestOptions};
pub use request::TranslationRequest;
pub use service::ServiceHandle;
