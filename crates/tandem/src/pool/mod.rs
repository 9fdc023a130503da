//! # Worker Pool
//!
//! Fixed-size pool of worker threads executing a loaded [`crate::engine::Translator`].
//!
//! ## Module Structure
//!
//! * [`TranslatorPool`] - owns the workers; `post` submits an in-memory batch,
//!   `consume_text_file` streams a whole file through the workers
//! * [`TranslationFuture`] - result handle for one posted batch
//!
//! Workers run on plain OS threads: model calls block for as long as a
//! translation takes and must never occupy an async executor thread.

mod consume;
mod item;
mod queue_item;
mod translator_pool;
mod worker;

pub use item::TranslationFuture;
pub use translator_pool::TranslatorPool;
