use pagecast_core::PagecastError;
use teloxide::types::{ChatId, Recipient};

/// Parse a destination: a numeric chat id (`-100123…`) or an `@channelusername`.
///
/// # Errors
///
/// Returns `Configuration` for anything else.
pub fn parse_recipient(raw: &str) -> Result<Recipient, PagecastError> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Ok(Recipient::Id(ChatId(id)));
    }
    match raw.strip_prefix('@') {
        Some(name) if !name.is_empty() && name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
            Ok(Recipient::ChannelUsername(raw.to_string()))
        }
        _ => Err(PagecastError::Configuration(format!(
            "TELEGRAM_CHAT_ID must be a numeric id or @channelusername, got {raw:?}"
        ))),
    }
}
