#![deny(missing_docs)]
//! Telegram transport adapter for Pagecast.

/// Telegram-specific messenger implementation.
pub mod bot;

pub use bot::messaging::TelegramMessenger;
