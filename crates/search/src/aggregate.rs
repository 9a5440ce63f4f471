//! Category Aggregator.

use std::collections::BTreeMap;

use facet_core::record::{bucket_label, category_of};
use facet_core::{CategoryCounts, Record};
use serde_json::Value;

/// Count records per category and total them under `all_label`.
/// No records yields exactly `{all_label: 0}`.
pub fn aggregate(records: &[Record], all_label: &str) -> CategoryCounts {
    tally(records.iter().map(|r| r.category.as_str()), all_label)
}

/// Same as [`aggregate`] for records that were never projected; the category is
/// resolved from `category_field` with the usual fallback.
pub fn aggregate_values(raws: &[Value], category_field: &str, all_label: &str) -> CategoryCounts {
    let cats: Vec<String> = raws.iter().map(|v| category_of(v.get(category_field))).collect();
    tally(cats.iter().map(String::as_str), all_label)
}

fn tally<'a>(cats: impl Iterator<Item = &'a str>, all_label: &str) -> CategoryCounts {
    let mut buckets: BTreeMap<&str, usize> = BTreeMap::new();
    for c in cats {
        *buckets.entry(bucket_label(c, all_label)).or_insert(0) += 1;
    }
    CategoryCounts::from_totals(buckets, all_label)
}
