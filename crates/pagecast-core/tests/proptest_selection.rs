use pagecast_core::catalog::{Catalog, CatalogEntry};
use pagecast_core::caption::CaptionComposer;
use pagecast_core::selector::{select, SelectionCriteria};
use pagecast_core::PagecastError;
use proptest::prelude::*;

fn ranges() -> impl Strategy<Value = Vec<(u32, u32)>> {
    prop::collection::vec((1u32..500, 0u32..40), 0..30)
}

fn catalog_from(ranges: &[(u32, u32)]) -> Catalog {
    Catalog::new(
        ranges
            .iter()
            .filter_map(|&(from, extra)| CatalogEntry::new(None, from, from + extra).ok())
            .collect(),
    )
}

proptest! {
    /// Selection never returns an entry outside the requested page-count range.
    #[test]
    fn selection_respects_bounds(
        ranges in ranges(),
        min in 1u32..20,
        span in 0u32..20,
        seed in any::<u64>(),
    ) {
        let catalog = catalog_from(&ranges);
        let criteria = SelectionCriteria::new(min, min + span).expect("valid range");
        let mut rng = fastrand::Rng::with_seed(seed);

        let any_match = catalog.entries().iter().any(|e| criteria.accepts(e));
        match select(&catalog, &criteria, &mut rng) {
            Ok(entry) => {
                prop_assert!(any_match);
                prop_assert!(entry.page_count() >= min);
                prop_assert!(entry.page_count() <= min + span);
                prop_assert!(catalog.entries().contains(entry));
            }
            Err(PagecastError::NoMatchingPost { .. }) => prop_assert!(!any_match),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// Parsed rows always satisfy to >= from; backwards rows fail the load.
    #[test]
    fn parsed_ranges_never_run_backwards(from in 1u32..1000, to in 1u32..1000) {
        let raw = format!("from,to,caption\n{from},{to},X\n");
        match Catalog::parse(raw.as_bytes(), b',') {
            Ok(catalog) => {
                prop_assert!(to >= from);
                let entry = &catalog.entries()[0];
                prop_assert_eq!(entry.page_count(), to - from + 1);
            }
            Err(PagecastError::CatalogFormat(_)) => prop_assert!(to < from),
            Err(other) => prop_assert!(false, "unexpected error: {other}"),
        }
    }

    /// A page marker appears exactly when the range has more than one page.
    #[test]
    fn marker_only_on_multi_page(caption in "[a-zA-Z]{1,12}", total in 1u32..30) {
        let composer = CaptionComposer::new(None);
        let text = composer.compose(Some(caption.as_str()), total, total).unwrap_or_default();
        prop_assert_eq!(text.ends_with(&format!("({total}/{total})")), total > 1);
        prop_assert!(text.starts_with(&caption));
    }
}
