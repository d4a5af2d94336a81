//! Random selection of one catalog entry within a page-count range.

use crate::catalog::{Catalog, CatalogEntry};
use crate::error::{PagecastError, Result};

/// Source of randomness for picking an entry.
///
/// Production uses [`fastrand::Rng`] seeded from process entropy; tests can
/// pass a seeded `Rng` or any fixed implementation.
pub trait EntropySource {
    /// Return an index in `0..len`; `len` is never zero
    fn pick_index(&mut self, len: usize) -> usize;
}

impl EntropySource for fastrand::Rng {
    fn pick_index(&mut self, len: usize) -> usize {
        self.usize(..len)
    }
}

/// Inclusive bounds on the page count of an acceptable entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SelectionCriteria {
    min_pages: u32,
    max_pages: u32,
}

impl SelectionCriteria {
    /// Validate and build selection bounds
    ///
    /// # Errors
    ///
    /// Returns `Configuration` if `min_pages < 1` or `max_pages < min_pages`.
    pub fn new(min_pages: u32, max_pages: u32) -> Result<Self> {
        if min_pages < 1 {
            return Err(PagecastError::Configuration(format!(
                "min_pages must be at least 1, got {min_pages}"
            )));
        }
        if max_pages < min_pages {
            return Err(PagecastError::Configuration(format!(
                "max_pages ({max_pages}) must not be below min_pages ({min_pages})"
            )));
        }
        Ok(Self {
            min_pages,
            max_pages,
        })
    }

    /// Lower bound
    #[must_use]
    pub const fn min_pages(&self) -> u32 {
        self.min_pages
    }

    /// Upper bound
    #[must_use]
    pub const fn max_pages(&self) -> u32 {
        self.max_pages
    }

    /// Whether `entry` spans an acceptable number of pages
    #[must_use]
    pub const fn accepts(&self, entry: &CatalogEntry) -> bool {
        let count = entry.page_count();
        self.min_pages <= count && count <= self.max_pages
    }
}

/// Pick one entry uniformly at random among those `criteria` accepts.
///
/// # Errors
///
/// Returns `NoMatchingPost` when no entry falls inside the range.
pub fn select<'c, R>(
    catalog: &'c Catalog,
    criteria: &SelectionCriteria,
    rng: &mut R,
) -> Result<&'c CatalogEntry>
where
    R: EntropySource + ?Sized,
{
    let candidates: Vec<&CatalogEntry> = catalog
        .entries()
        .iter()
        .filter(|entry| criteria.accepts(entry))
        .collect();

    if candidates.is_empty() {
        return Err(PagecastError::NoMatchingPost {
            min: criteria.min_pages,
            max: criteria.max_pages,
        });
    }

    let index = rng.pick_index(candidates.len());
    candidates
        .get(index)
        .copied()
        .ok_or_else(|| PagecastError::Configuration(format!("entropy source returned {index}")))
}
