//! Photo and media group delivery through the Telegram Bot API.
//!
//! Telegram downloads each image itself from the presigned URL, so the URL
//! must still be valid when the request reaches Telegram. No retry is made.

use super::recipient::parse_recipient;
use async_trait::async_trait;
use pagecast_core::messenger::{Messenger, MessengerError};
use pagecast_core::PagecastError;
use reqwest::Url;
use teloxide::prelude::*;
use teloxide::types::{InputFile, InputMedia, InputMediaPhoto, Recipient};
use teloxide::RequestError;
use tracing::{debug, warn};

/// Maximum caption length accepted by Telegram for photos
pub const TELEGRAM_CAPTION_LIMIT: usize = 1024;

/// Sends images to one fixed Telegram chat
pub struct TelegramMessenger {
    bot: Bot,
    destination: Recipient,
}

impl TelegramMessenger {
    /// Messenger posting to `destination` (numeric id or `@channelusername`)
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `destination` cannot be parsed.
    pub fn new(token: impl Into<String>, destination: &str) -> Result<Self, PagecastError> {
        Ok(Self::with_bot(Bot::new(token), parse_recipient(destination)?))
    }

    /// Wrap an existing bot client
    #[must_use]
    pub const fn with_bot(bot: Bot, destination: Recipient) -> Self {
        Self { bot, destination }
    }

    /// Chat the messenger posts to
    #[must_use]
    pub const fn destination(&self) -> &Recipient {
        &self.destination
    }
}

#[async_trait]
impl Messenger for TelegramMessenger {
    async fn send_single_image(
        &self,
        url: &str,
        caption: Option<String>,
    ) -> Result<(), MessengerError> {
        let photo = InputFile::url(parse_url(url)?);
        let mut req = self.bot.send_photo(self.destination.clone(), photo);
        if let Some(caption) = caption {
            req = req.caption(fit_caption(caption));
        }
        req.await.map_err(map_request_error)?;
        debug!(destination = ?self.destination, "Photo sent");
        Ok(())
    }

    async fn send_image_group(
        &self,
        urls: &[String],
        caption: Option<String>,
    ) -> Result<(), MessengerError> {
        let media = build_media_group(urls, caption)?;
        self.bot
            .send_media_group(self.destination.clone(), media)
            .await
            .map_err(map_request_error)?;
        debug!(destination = ?self.destination, items = urls.len(), "Media group sent");
        Ok(())
    }
}

/// Build the media group payload; the caption rides on the first photo.
///
/// # Errors
///
/// Returns `Api` if a URL is malformed.
pub fn build_media_group(
    urls: &[String],
    mut caption: Option<String>,
) -> Result<Vec<InputMedia>, MessengerError> {
    urls.iter()
        .map(|url| {
            let mut photo = InputMediaPhoto::new(InputFile::url(parse_url(url)?));
            if let Some(text) = caption.take() {
                photo = photo.caption(fit_caption(text));
            }
            Ok::<_, MessengerError>(InputMedia::Photo(photo))
        })
        .collect()
}

/// Cut `text` to [`TELEGRAM_CAPTION_LIMIT`] UTF-16 code units, the unit
/// Telegram measures captions in. Never splits a character.
#[must_use]
pub fn fit_caption(text: String) -> String {
    let mut units = 0;
    let cut = text.char_indices().find_map(|(idx, c)| {
        units += c.len_utf16();
        (units > TELEGRAM_CAPTION_LIMIT).then_some(idx)
    });
    match cut {
        Some(cut) => {
            warn!(
                utf16_units = text.encode_utf16().count(),
                "Caption exceeds Telegram limit; truncating"
            );
            text[..cut].to_string()
        }
        None => text,
    }
}

fn parse_url(url: &str) -> Result<Url, MessengerError> {
    Url::parse(url).map_err(|e| MessengerError::Api(format!("invalid image URL: {e}")))
}

fn map_request_error(err: RequestError) -> MessengerError {
    match err {
        RequestError::Network(_) | RequestError::Io(_) => MessengerError::Network(err.to_string()),
        other => MessengerError::Api(other.to_string()),
    }
}
