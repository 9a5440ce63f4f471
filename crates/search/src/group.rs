//! Result Grouper.

use std::collections::BTreeMap;

use facet_core::record::bucket_label;
use facet_core::Record;
use serde::Serialize;

/// Filtered records bucketed by category. Keys iterate lexicographically and
/// never include the All pseudo-category. Rebuilt, never patched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GroupedResults {
    buckets: BTreeMap<String, Vec<Record>>,
}

impl GroupedResults {
    pub fn get(&self, category: &str) -> Option<&[Record]> {
        self.buckets.get(category).map(Vec::as_slice)
    }

    pub fn bucket_len(&self, category: &str) -> usize {
        self.buckets.get(category).map_or(0, Vec::len)
    }

    pub fn contains(&self, category: &str) -> bool { self.buckets.contains_key(category) }

    pub fn categories(&self) -> impl Iterator<Item = &str> + '_ { self.buckets.keys().map(String::as_str) }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Record])> + '_ {
        self.buckets.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn is_empty(&self) -> bool { self.buckets.is_empty() }

    /// Number of categories.
    pub fn len(&self) -> usize { self.buckets.len() }

    /// Number of records across all buckets.
    pub fn record_count(&self) -> usize { self.buckets.values().map(Vec::len).sum() }

}

/// Partition `filtered` by category, preserving input order inside each bucket.
/// Buckets follow the same naming as the aggregator, so no bucket is keyed `all_label`.
pub fn group(filtered: &[Record], all_label: &str) -> GroupedResults {
    let mut buckets: BTreeMap<String, Vec<Record>> = BTreeMap::new();
    for r in filtered {
        buckets.entry(bucket_label(&r.category, all_label).to_string()).or_default().push(r.clone());
    }
    GroupedResults { buckets }
}
