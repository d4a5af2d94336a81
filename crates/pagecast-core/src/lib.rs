#![deny(missing_docs)]
//! Pagecast core library.
//!
//! Loads a page-range catalog from object storage, picks one entry at random
//! and dispatches its pages as images through a messaging backend.

/// Caption composition for outgoing images.
pub mod caption;
/// Catalog model and CSV parsing.
pub mod catalog;
/// Configuration management.
pub mod config;
/// Single vs. grouped dispatch of a selected entry.
pub mod dispatch;
/// Error taxonomy.
pub mod error;
/// Page to presigned URL resolution.
pub mod media;
/// Messaging backend seam.
pub mod messenger;
/// One-shot job wiring loader, selector and dispatcher together.
pub mod runner;
/// Random entry selection.
pub mod selector;
/// Storage layer (S3 and S3-compatible).
pub mod storage;

#[cfg(test)]
pub mod testing;

pub use error::{PagecastError, Result};
