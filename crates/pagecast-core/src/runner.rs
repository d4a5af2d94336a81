//! One-shot job: load catalog, pick a post, send it.

use crate::caption::CaptionComposer;
use crate::catalog::{CatalogEntry, CatalogLoader};
use crate::config::JobConfig;
use crate::dispatch::{DispatchReport, Dispatcher};
use crate::error::Result;
use crate::media::MediaResolver;
use crate::messenger::Messenger;
use crate::selector::{select, EntropySource};
use crate::storage::ObjectStore;
use tracing::info;

/// Summary of a completed run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Entry that was sent
    pub entry: CatalogEntry,
    /// Delivery counts
    pub report: DispatchReport,
}

/// Run one job end to end.
///
/// The catalog is loaded fresh, one entry is drawn from `rng` and every page
/// of it is sent through `messenger` using the configured strategy.
///
/// # Errors
///
/// Propagates every failure unrecovered: storage, catalog format, no
/// matching post, or delivery.
pub async fn run_once<S, M, R>(
    job: &JobConfig,
    store: &S,
    messenger: &M,
    rng: &mut R,
) -> Result<RunSummary>
where
    S: ObjectStore + ?Sized,
    M: Messenger + ?Sized,
    R: EntropySource + ?Sized,
{
    let catalog = CatalogLoader::new(store, job.catalog_key.clone(), job.catalog_delimiter)
        .load()
        .await?;

    let entry = select(&catalog, &job.criteria, rng)?.clone();
    info!(
        from = entry.from_page,
        to = entry.to_page,
        pages = entry.page_count(),
        candidates = catalog.len(),
        "Selected post"
    );

    let resolver = MediaResolver::new(store, job.storage_prefix.clone(), job.url_expiry);
    let composer = CaptionComposer::new(job.caption_signature.clone());
    let report = Dispatcher::new(messenger, resolver, composer, job.strategy)
        .dispatch(&entry)
        .await?;

    info!(
        pages = report.pages_sent,
        messages = report.messages_sent,
        strategy = ?job.strategy,
        "Post delivered"
    );
    Ok(RunSummary { entry, report })
}
