//! Catalog of labeled page ranges.
//!
//! The catalog is a character-separated text resource with a header row.
//! `from` is required, `to` and `caption` are optional:
//!
//! ```text
//! from,to,caption
//! 5,,Opening
//! 10,12,Chapter two
//! ```

use crate::error::{PagecastError, Result};
use crate::storage::ObjectStore;
use std::ops::RangeInclusive;
use tracing::{debug, info};

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// One labeled, contiguous page range
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    /// Free-form description
    pub caption: Option<String>,
    /// First page index (1-based)
    pub from_page: u32,
    /// Last page index, never below `from_page`
    pub to_page: u32,
}

impl CatalogEntry {
    /// Build an entry, rejecting ranges that run backwards or start at zero
    ///
    /// # Errors
    ///
    /// Returns `CatalogFormat` if `from_page < 1` or `to_page < from_page`.
    pub fn new(caption: Option<String>, from_page: u32, to_page: u32) -> Result<Self> {
        if from_page < 1 {
            return Err(PagecastError::CatalogFormat(format!(
                "page indices start at 1, got from={from_page}"
            )));
        }
        if to_page < from_page {
            return Err(PagecastError::CatalogFormat(format!(
                "to={to_page} is before from={from_page}"
            )));
        }
        Ok(Self {
            caption,
            from_page,
            to_page,
        })
    }

    /// Number of pages in the range (always >= 1)
    #[must_use]
    pub const fn page_count(&self) -> u32 {
        self.to_page.saturating_sub(self.from_page) + 1
    }

    /// Page indices in ascending order
    #[must_use]
    pub fn pages(&self) -> RangeInclusive<u32> {
        self.from_page..=self.to_page
    }
}

/// Every entry loaded for the current run
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    /// Wrap already validated entries
    #[must_use]
    pub const fn new(entries: Vec<CatalogEntry>) -> Self {
        Self { entries }
    }

    /// Parse a raw catalog resource.
    ///
    /// A leading UTF-8 byte-order mark is stripped so the first header is
    /// recognized. Any bad row fails the whole parse.
    ///
    /// # Errors
    ///
    /// Returns `CatalogFormat` for a missing `from` column, an unreadable
    /// record, a non-numeric page index or a backwards range.
    pub fn parse(raw: &[u8], delimiter: u8) -> Result<Self> {
        let raw = raw.strip_prefix(UTF8_BOM).unwrap_or(raw);

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(raw);

        let headers = reader
            .headers()
            .map_err(|e| PagecastError::CatalogFormat(format!("unreadable header: {e}")))?;
        let columns = Columns::locate(headers)?;

        let mut entries = Vec::new();
        for (index, record) in reader.records().enumerate() {
            let row = index + 1;
            let record = record
                .map_err(|e| PagecastError::CatalogFormat(format!("row {row}: {e}")))?;
            let entry = columns
                .entry(&record)
                .map_err(|e| PagecastError::CatalogFormat(format!("row {row}: {e}")))?;
            entries.push(entry);
        }

        Ok(Self { entries })
    }

    /// All entries in source order
    #[must_use]
    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Number of entries
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the catalog has no entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

struct Columns {
    from: usize,
    to: Option<usize>,
    caption: Option<usize>,
}

impl Columns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| headers.iter().position(|h| h.eq_ignore_ascii_case(name));
        let from = find("from").ok_or_else(|| {
            PagecastError::CatalogFormat("header row has no `from` column".to_string())
        })?;
        Ok(Self {
            from,
            to: find("to"),
            caption: find("caption"),
        })
    }

    fn entry(&self, record: &csv::StringRecord) -> std::result::Result<CatalogEntry, String> {
        let field = |idx: Option<usize>| {
            idx.and_then(|i| record.get(i))
                .filter(|value| !value.is_empty())
        };

        let from_raw = field(Some(self.from)).ok_or("missing `from` value")?;
        let from_page = parse_page("from", from_raw)?;
        let to_page = match field(self.to) {
            Some(raw) => parse_page("to", raw)?,
            None => from_page,
        };
        let caption = field(self.caption).map(str::to_string);

        CatalogEntry::new(caption, from_page, to_page).map_err(|e| match e {
            PagecastError::CatalogFormat(msg) => msg,
            other => other.to_string(),
        })
    }
}

fn parse_page(field: &str, raw: &str) -> std::result::Result<u32, String> {
    raw.parse::<u32>()
        .map_err(|_| format!("`{field}` is not a page number: {raw:?}"))
}

/// Fetches and parses the catalog from object storage
pub struct CatalogLoader<'a, S: ObjectStore + ?Sized> {
    store: &'a S,
    key: String,
    delimiter: u8,
}

impl<'a, S: ObjectStore + ?Sized> CatalogLoader<'a, S> {
    /// Loader for the catalog object at `key`
    #[must_use]
    pub fn new(store: &'a S, key: impl Into<String>, delimiter: u8) -> Self {
        Self {
            store,
            key: key.into(),
            delimiter,
        }
    }

    /// Object key the catalog is read from
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Read the catalog once from storage and parse it.
    ///
    /// The downloaded body lives only for the duration of this call.
    ///
    /// # Errors
    ///
    /// Returns `Storage` if the fetch fails and `CatalogFormat` if parsing does.
    pub async fn load(&self) -> Result<Catalog> {
        debug!(key = %self.key, "Loading catalog");
        let raw = self.store.fetch_object(&self.key).await?;
        let catalog = Catalog::parse(&raw, self.delimiter)?;
        info!(entries = catalog.len(), key = %self.key, "Catalog loaded");
        Ok(catalog)
    }
}
