//! # Inference Engine
//!
//! The collaborator boundary between the dispatch layer and a model.
//!
//! Nothing in this crate computes translations itself. A model is plugged in
//! through two traits:
//!
//! * [`ModelLoader`] - places one model on a device, once per service
//! * [`Translator`] - the blocking batch computation a pool worker runs
//!
//! Results come back as [`EngineOutput`] values, which the marshaller turns
//! into caller-visible records.
//!
//! The [`echo`] module ships a deterministic identity-like model so the
//! whole pipeline can run without model artifacts.

mod core_trait;
mod device;
mod output;

pub mod echo;

pub use core_trait::{LoadRequest, ModelLoader, Translator};
pub use device::Device;
pub use output::EngineOutput;
