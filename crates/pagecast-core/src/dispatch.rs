//! Sending a selected entry: one image, one image per page, or media groups.

use crate::caption::CaptionComposer;
use crate::catalog::CatalogEntry;
use crate::error::{PagecastError, Result};
use crate::media::MediaResolver;
use crate::messenger::{Messenger, MessengerError};
use crate::storage::ObjectStore;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Telegram accepts 2..=10 items per media group
pub const MEDIA_GROUP_LIMIT: usize = 10;

/// How entries spanning more than one page are sent
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MultiPageStrategy {
    /// One photo message per page, in page order, each with an `(i/total)` marker
    #[default]
    Sequential,
    /// All pages resolved up front and sent as media groups under one caption
    Grouped,
}

/// What a successful dispatch delivered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchReport {
    /// Pages delivered
    pub pages_sent: usize,
    /// Messages (single photos or media groups) issued
    pub messages_sent: usize,
}

/// Sends one catalog entry through a [`Messenger`]
pub struct Dispatcher<'a, M: Messenger + ?Sized, S: ObjectStore + ?Sized> {
    messenger: &'a M,
    resolver: MediaResolver<'a, S>,
    composer: CaptionComposer,
    strategy: MultiPageStrategy,
}

impl<'a, M: Messenger + ?Sized, S: ObjectStore + ?Sized> Dispatcher<'a, M, S> {
    /// Build a dispatcher using `strategy` for every multi-page entry
    #[must_use]
    pub const fn new(
        messenger: &'a M,
        resolver: MediaResolver<'a, S>,
        composer: CaptionComposer,
        strategy: MultiPageStrategy,
    ) -> Self {
        Self {
            messenger,
            resolver,
            composer,
            strategy,
        }
    }

    /// Send every page of `entry`.
    ///
    /// Sends are issued one at a time. Nothing already delivered is retried or
    /// rolled back.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if a URL cannot be signed before anything was sent,
    /// `Interrupted` if signing fails between sequential sends, and `Delivery`
    /// if the messenger rejects a send. Both carry the pages already delivered.
    pub async fn dispatch(&self, entry: &CatalogEntry) -> Result<DispatchReport> {
        let caption = entry.caption.as_deref();
        if entry.page_count() == 1 {
            return self.send_single(entry.from_page, caption).await;
        }
        match self.strategy {
            MultiPageStrategy::Sequential => self.send_sequential(entry, caption).await,
            MultiPageStrategy::Grouped => self.send_grouped(entry, caption).await,
        }
    }

    async fn send_single(&self, page_id: u32, caption: Option<&str>) -> Result<DispatchReport> {
        let page = self.resolver.resolve(page_id).await?;
        let caption = self.composer.compose(caption, 1, 1);
        self.messenger
            .send_single_image(&page.url, caption)
            .await
            .map_err(|source| delivery(0, 1, source))?;

        debug!(page_id, "Sent single page");
        Ok(DispatchReport {
            pages_sent: 1,
            messages_sent: 1,
        })
    }

    async fn send_sequential(
        &self,
        entry: &CatalogEntry,
        caption: Option<&str>,
    ) -> Result<DispatchReport> {
        let total = entry.page_count();
        let mut delivered = 0;

        for (position, page_id) in (1..).zip(entry.pages()) {
            let page = match self.resolver.resolve(page_id).await {
                Ok(page) => page,
                Err(PagecastError::Storage(source)) if delivered > 0 => {
                    return Err(PagecastError::Interrupted {
                        delivered,
                        total: total as usize,
                        source,
                    })
                }
                Err(e) => return Err(e),
            };
            let text = self.composer.compose(caption, position, total);
            self.messenger
                .send_single_image(&page.url, text)
                .await
                .map_err(|source| delivery(delivered, total as usize, source))?;

            delivered += 1;
            debug!(page_id, position, total, "Sent page");
        }

        Ok(DispatchReport {
            pages_sent: delivered,
            messages_sent: delivered,
        })
    }

    async fn send_grouped(
        &self,
        entry: &CatalogEntry,
        caption: Option<&str>,
    ) -> Result<DispatchReport> {
        let total = entry.page_count() as usize;
        let mut urls = Vec::with_capacity(total);
        for page_id in entry.pages() {
            urls.push(self.resolver.resolve(page_id).await?.url);
        }

        let mut group_caption = self.composer.compose_group(caption);
        let mut delivered = 0;
        let mut messages = 0;

        for chunk in urls.chunks(MEDIA_GROUP_LIMIT) {
            let text = group_caption.take();
            let sent = if let [url] = chunk {
                self.messenger.send_single_image(url, text).await
            } else {
                self.messenger.send_image_group(chunk, text).await
            };
            sent.map_err(|source| delivery(delivered, total, source))?;

            delivered += chunk.len();
            messages += 1;
            debug!(items = chunk.len(), delivered, total, "Sent media group");
        }

        Ok(DispatchReport {
            pages_sent: delivered,
            messages_sent: messages,
        })
    }
}

const fn delivery(delivered: usize, total: usize, source: MessengerError) -> PagecastError {
    PagecastError::Delivery {
        delivered,
        total,
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::DEFAULT_URL_EXPIRY;
    use crate::messenger::MockMessenger;
    use crate::storage::{MockObjectStore, StorageError};
    use mockall::Sequence;

    fn store() -> MockObjectStore {
        let mut store = MockObjectStore::new();
        store
            .expect_sign_get_url()
            .returning(|key, _| Ok(format!("https://s3.test/{key}")));
        store
    }

    fn url(page: u32) -> String {
        format!("https://s3.test/page-{page:03}.png")
    }

    fn entry(from: u32, to: u32, caption: Option<&str>) -> CatalogEntry {
        CatalogEntry {
            caption: caption.map(str::to_string),
            from_page: from,
            to_page: to,
        }
    }

    async fn run(
        messenger: &MockMessenger,
        strategy: MultiPageStrategy,
        signature: Option<&str>,
        entry: &CatalogEntry,
    ) -> Result<DispatchReport> {
        let store = store();
        let resolver = MediaResolver::new(&store, "", DEFAULT_URL_EXPIRY);
        let composer = CaptionComposer::new(signature.map(str::to_string));
        Dispatcher::new(messenger, resolver, composer, strategy)
            .dispatch(entry)
            .await
    }

    #[tokio::test]
    async fn single_page_has_no_marker() -> Result<()> {
        let mut messenger = MockMessenger::new();
        messenger
            .expect_send_single_image()
            .withf(|u, caption| u == url(4) && caption.as_deref() == Some("Intro"))
            .times(1)
            .returning(|_, _| Ok(()));
        messenger.expect_send_image_group().never();

        let report = run(
            &messenger,
            MultiPageStrategy::Grouped,
            None,
            &entry(4, 4, Some("Intro")),
        )
        .await?;
        assert_eq!(report.messages_sent, 1);
        Ok(())
    }

    #[tokio::test]
    async fn single_page_failure_is_delivery_error() {
        let mut messenger = MockMessenger::new();
        messenger
            .expect_send_single_image()
            .returning(|_, _| Err(MessengerError::Api("Bad Request: chat not found".into())));

        let result = run(&messenger, MultiPageStrategy::Sequential, None, &entry(2, 2, None)).await;
        assert!(matches!(
            result,
            Err(PagecastError::Delivery {
                delivered: 0,
                total: 1,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn sequential_sends_pages_in_order_with_markers() -> Result<()> {
        let mut messenger = MockMessenger::new();
        let mut seq = Sequence::new();
        for (i, page) in (10..=12).enumerate() {
            let expected_url = url(page);
            let expected_caption = format!("Z ({}/3)\n\nSig", i + 1);
            messenger
                .expect_send_single_image()
                .withf(move |u, c| u == expected_url && c.as_deref() == Some(expected_caption.as_str()))
                .times(1)
                .in_sequence(&mut seq)
                .returning(|_, _| Ok(()));
        }

        let report = run(
            &messenger,
            MultiPageStrategy::Sequential,
            Some("Sig"),
            &entry(10, 12, Some("Z")),
        )
        .await?;
        assert_eq!(
            report,
            DispatchReport {
                pages_sent: 3,
                messages_sent: 3
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn sequential_failure_reports_delivered_pages() {
        let mut messenger = MockMessenger::new();
        let mut seq = Sequence::new();
        messenger
            .expect_send_single_image()
            .times(3)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        messenger
            .expect_send_single_image()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Err(MessengerError::Api("Bad Request: failed to get HTTP URL content".into())));

        let result = run(&messenger, MultiPageStrategy::Sequential, None, &entry(1, 5, None)).await;
        assert!(matches!(
            result,
            Err(PagecastError::Delivery {
                delivered: 3,
                total: 5,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn signing_failure_mid_sequence_reports_delivered_pages() {
        let mut store = MockObjectStore::new();
        store
            .expect_sign_get_url()
            .withf(|key, _| key == "page-003.png")
            .returning(|_, _| Err(StorageError::Presign("credentials expired".into())));
        store
            .expect_sign_get_url()
            .returning(|key, _| Ok(format!("https://s3.test/{key}")));

        let mut messenger = MockMessenger::new();
        messenger
            .expect_send_single_image()
            .withf(|u, _| u == url(1) || u == url(2))
            .times(2)
            .returning(|_, _| Ok(()));

        let resolver = MediaResolver::new(&store, "", DEFAULT_URL_EXPIRY);
        let result = Dispatcher::new(
            &messenger,
            resolver,
            CaptionComposer::new(None),
            MultiPageStrategy::Sequential,
        )
        .dispatch(&entry(1, 5, None))
        .await;

        assert!(matches!(
            result,
            Err(PagecastError::Interrupted {
                delivered: 2,
                total: 5,
                source: StorageError::Presign(_),
            })
        ));
    }

    #[tokio::test]
    async fn signing_failure_before_first_send_is_storage_error() {
        let mut store = MockObjectStore::new();
        store
            .expect_sign_get_url()
            .returning(|_, _| Err(StorageError::Presign("credentials expired".into())));
        let mut messenger = MockMessenger::new();
        messenger.expect_send_single_image().never();

        let resolver = MediaResolver::new(&store, "", DEFAULT_URL_EXPIRY);
        let result = Dispatcher::new(
            &messenger,
            resolver,
            CaptionComposer::new(None),
            MultiPageStrategy::Sequential,
        )
        .dispatch(&entry(1, 5, None))
        .await;

        assert!(matches!(result, Err(PagecastError::Storage(_))));
    }

    #[tokio::test]
    async fn grouped_sends_one_group_with_one_caption() -> Result<()> {
        let mut messenger = MockMessenger::new();
        messenger
            .expect_send_image_group()
            .withf(|urls, caption| {
                urls == [url(10), url(11), url(12)].as_slice() && caption.as_deref() == Some("Z")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let report = run(&messenger, MultiPageStrategy::Grouped, None, &entry(10, 12, Some("Z"))).await?;
        assert_eq!(
            report,
            DispatchReport {
                pages_sent: 3,
                messages_sent: 1
            }
        );
        Ok(())
    }

    #[tokio::test]
    async fn grouped_splits_long_ranges() -> Result<()> {
        let mut messenger = MockMessenger::new();
        let mut seq = Sequence::new();
        messenger
            .expect_send_image_group()
            .withf(|urls, caption| urls.len() == 10 && caption.as_deref() == Some("Long"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));
        messenger
            .expect_send_single_image()
            .withf(|u, caption| u == url(11) && caption.is_none())
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _| Ok(()));

        let report = run(&messenger, MultiPageStrategy::Grouped, None, &entry(1, 11, Some("Long"))).await?;
        assert_eq!(report.pages_sent, 11);
        assert_eq!(report.messages_sent, 2);
        Ok(())
    }

    #[test]
    fn strategy_names() {
        assert_eq!(MultiPageStrategy::default(), MultiPageStrategy::Sequential);
    }
}
