//! Messaging backend seam.
//!
//! The dispatcher only sees these two operations; the concrete bot client
//! (and the destination it posts to) is injected by the caller.

use async_trait::async_trait;
use thiserror::Error;

/// Errors reported by a messaging backend
#[derive(Error, Debug, Clone)]
pub enum MessengerError {
    /// Backend rejected the request (expired URL, unknown chat, ...)
    #[error("Telegram API error: {0}")]
    Api(String),
    /// Request never got a response
    #[error("Network error: {0}")]
    Network(String),
}

/// Interface for messaging backends
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Send one image fetched by the backend from `url`
    async fn send_single_image(
        &self,
        url: &str,
        caption: Option<String>,
    ) -> Result<(), MessengerError>;

    /// Send several images as one grouped message; `caption` goes on the group
    async fn send_image_group(
        &self,
        urls: &[String],
        caption: Option<String>,
    ) -> Result<(), MessengerError>;
}
