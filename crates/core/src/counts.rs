use std::collections::BTreeMap;

use serde::Serialize;

/// Per-category tallies plus the synthetic "All" total.
///
/// Two shapes exist: a tally (`{c1: n1, .., All: sum}`, at minimum `{All: 0}`)
/// and the cleared set used while a query is too short (no keys at all).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCounts {
    all_label: String,
    counts: BTreeMap<String, usize>,
}

impl CategoryCounts {
    /// `{All: 0}`.
    pub fn empty(all_label: &str) -> Self {
        let mut counts = BTreeMap::new();
        counts.insert(all_label.to_string(), 0);
        Self { all_label: all_label.to_string(), counts }
    }

    /// No keys at all, not even the All label.
    pub fn cleared(all_label: &str) -> Self {
        Self { all_label: all_label.to_string(), counts: BTreeMap::new() }
    }

    /// Build from per-category totals. An entry keyed by the All label is ignored;
    /// the All value is always the sum of the rest.
    pub fn from_totals<I, K>(totals: I, all_label: &str) -> Self
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        let mut out = Self::empty(all_label);
        let mut total = 0usize;
        for (k, n) in totals {
            let k = k.into();
            if k == all_label { continue; }
            *out.counts.entry(k).or_insert(0) += n;
            total += n;
        }
        out.counts.insert(all_label.to_string(), total);
        out
    }

    pub fn all_label(&self) -> &str { &self.all_label }

    /// Count for `category`; absent keys read as zero.
    pub fn get(&self, category: &str) -> usize {
        self.counts.get(category).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize { self.get(&self.all_label) }

    pub fn contains(&self, category: &str) -> bool { self.counts.contains_key(category) }

    pub fn is_cleared(&self) -> bool { self.counts.is_empty() }

    /// Real categories (All excluded) in lexicographic order.
    pub fn categories(&self) -> impl Iterator<Item = (&str, usize)> + '_ {
        self.counts
            .iter()
            .filter(move |(k, _)| k.as_str() != self.all_label)
            .map(|(k, v)| (k.as_str(), *v))
    }

    /// Category labels for presentation: All first when requested, then the rest sorted.
    pub fn chip_order(&self, include_all: bool) -> Vec<String> {
        let mut keys: Vec<String> = Vec::with_capacity(self.counts.len());
        if include_all { keys.push(self.all_label.clone()); }
        keys.extend(self.categories().map(|(k, _)| k.to_string()));
        keys
    }

    /// Move the All total under a new label.
    pub fn relabel(&mut self, all_label: &str) {
        if all_label == self.all_label { return; }
        if let Some(total) = self.counts.remove(&self.all_label) {
            self.counts.insert(all_label.to_string(), total);
        }
        self.all_label = all_label.to_string();
    }

    pub fn as_map(&self) -> &BTreeMap<String, usize> { &self.counts }
}
