//! # Dispatch
//!
//! The two ways work reaches the pool.
//!
//! * batch - an in-memory [`crate::TranslationRequest`] is posted, awaited and
//!   marshaled into a [`crate::BatchResult`]
//! * file - a path pair is handed to the pool's streaming file consumer on a
//!   blocking thread; results go straight to disk
//!
//! Both paths go through the [`crate::ConcurrencyGate`], so a running
//! translation never holds the caller's executor thread.

mod batch;
mod core_trait;
mod file;

pub(crate) use batch::BatchDispatcher;
pub(crate) use file::FileStreamDispatcher;
pub use core_trait::Translate;
