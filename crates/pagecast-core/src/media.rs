//! Page index to presigned image URL resolution.

use crate::error::Result;
use crate::storage::ObjectStore;
use std::time::Duration;

/// Default lifetime of a presigned page URL
pub const DEFAULT_URL_EXPIRY: Duration = Duration::from_secs(60);

/// A page ready to be fetched by the messaging backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPage {
    /// Page index
    pub page_id: u32,
    /// Time-limited GET URL for the page image
    pub url: String,
    /// How long `url` stays valid after signing
    pub url_expiry: Duration,
}

/// Object key of a page image: `{prefix}page-{NNN}.png`, zero-padded to 3 digits
#[must_use]
pub fn page_object_key(prefix: &str, page_id: u32) -> String {
    format!("{prefix}page-{page_id:03}.png")
}

/// Maps page indices to presigned URLs of their image objects
pub struct MediaResolver<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    prefix: String,
    expiry: Duration,
}

impl<'a, S: ObjectStore + ?Sized> MediaResolver<'a, S> {
    /// Resolver for page images stored under `prefix`
    #[must_use]
    pub fn new(store: &'a S, prefix: impl Into<String>, expiry: Duration) -> Self {
        Self {
            store,
            prefix: prefix.into(),
            expiry,
        }
    }

    /// Sign a URL for `page_id`. The object is not checked for existence.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the URL cannot be signed.
    pub async fn resolve(&self, page_id: u32) -> Result<ResolvedPage> {
        let key = page_object_key(&self.prefix, page_id);
        let url = self.store.sign_get_url(&key, self.expiry).await?;
        Ok(ResolvedPage {
            page_id,
            url,
            url_expiry: self.expiry,
        })
    }
}
