//! Errors raised while loading, selecting and dispatching a post.

use crate::messenger::MessengerError;
use crate::storage::StorageError;
use thiserror::Error;

/// Convenience alias used across the core crate
pub type Result<T, E = PagecastError> = std::result::Result<T, E>;

/// Top-level error taxonomy for one run
#[derive(Error, Debug)]
pub enum PagecastError {
    /// Invalid settings, detected before any network access
    #[error("Configuration error: {0}")]
    Configuration(String),
    /// Catalog resource could not be parsed
    #[error("Catalog format error: {0}")]
    CatalogFormat(String),
    /// No catalog entry has a page count inside the requested range
    #[error("No catalog entry with {min}..={max} pages")]
    NoMatchingPost {
        /// Lower page-count bound that was requested
        min: u32,
        /// Upper page-count bound that was requested
        max: u32,
    },
    /// Messaging backend rejected a send
    #[error("Delivery failed after {delivered} of {total} pages: {source}")]
    Delivery {
        /// Pages already delivered before the failure
        delivered: usize,
        /// Pages the entry spans
        total: usize,
        /// Underlying messenger error
        #[source]
        source: MessengerError,
    },
    /// A page URL could not be signed after earlier pages went out
    #[error("Signing failed after {delivered} of {total} pages: {source}")]
    Interrupted {
        /// Pages already delivered before the failure
        delivered: usize,
        /// Pages the entry spans
        total: usize,
        /// Underlying storage error
        #[source]
        source: StorageError,
    },
    /// Object storage failure (catalog fetch or URL signing)
    #[error(transparent)]
    Storage(#[from] StorageError),
}

impl PagecastError {
    /// Process exit status the binary reports for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Configuration(_) | Self::Storage(StorageError::Config(_)) => 2,
            Self::NoMatchingPost { .. } => 3,
            Self::CatalogFormat(_)
            | Self::Delivery { .. }
            | Self::Interrupted { .. }
            | Self::Storage(_) => 1,
        }
    }
}
