//! Whole-word name matching with an optional secondary-id substring check.

use facet_core::Record;
use regex::{Regex, RegexBuilder};

/// A query compiled once and applied to many records.
///
/// The query text is always escaped before it becomes a pattern; user input
/// never reaches the regex engine as syntax.
#[derive(Debug, Clone)]
pub struct QueryMatcher {
    word: Option<Regex>,
    /// Lowercased query, present only when long enough for secondary matching.
    secondary: Option<String>,
}

impl QueryMatcher {
    pub fn new(query: &str, min_secondary_len: usize) -> Self {
        let q = query.trim();
        if q.is_empty() {
            return Self { word: None, secondary: None };
        }
        let word = word_regex(q);
        let secondary = (q.chars().count() >= min_secondary_len).then(|| q.to_lowercase());
        Self { word, secondary }
    }

    pub fn matches(&self, record: &Record) -> bool {
        if let Some(re) = &self.word {
            if re.is_match(&record.name) { return true; }
        }
        match (&self.secondary, record.secondary.as_deref()) {
            (Some(q), Some(id)) => id.to_lowercase().contains(q.as_str()),
            _ => false,
        }
    }

    /// Records that match, in input order.
    pub fn filter(&self, records: &[Record]) -> Vec<Record> {
        records.iter().filter(|r| self.matches(r)).cloned().collect()
    }
}

/// One-shot form of `QueryMatcher::matches`.
pub fn matches(record: &Record, query: &str, min_secondary_len: usize) -> bool {
    QueryMatcher::new(query, min_secondary_len).matches(record)
}

/// Case-insensitive `\b<escaped>\b` pattern for a trimmed, non-empty term.
pub(crate) fn word_regex(term: &str) -> Option<Regex> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(term)))
        .case_insensitive(true)
        .build()
        .ok()
}
