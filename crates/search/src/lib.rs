//! Facet search: the pure building blocks the engine runs on every settled query.
//!
//! Nothing here holds state across queries except `VisibleWindows`, which the
//! engine rebuilds whenever the result set changes.

#![forbid(unsafe_code)]

pub mod aggregate;
pub mod group;
pub mod highlight;
pub mod matcher;
pub mod window;

pub use aggregate::{aggregate, aggregate_values};
pub use group::{group, GroupedResults};
pub use highlight::{any_word_spans, highlight, highlight_words, word_spans};
pub use matcher::{matches, QueryMatcher};
pub use window::VisibleWindows;

use facet_core::{CategoryCounts, Record};

/// Filtered records with their buckets and counts, ready for window reset.
#[derive(Debug, Clone)]
pub struct Evaluation {
    pub filtered: Vec<Record>,
    pub groups: GroupedResults,
    pub counts: CategoryCounts,
}

/// Match, group and count in one pass over `records`.
pub fn evaluate(records: &[Record], query: &str, min_secondary_len: usize, all_label: &str) -> Evaluation {
    let started = std::time::Instant::now();
    let filtered = QueryMatcher::new(query, min_secondary_len).filter(records);
    let eval = build(filtered, all_label);
    metrics::histogram!("facet_eval_ms", started.elapsed().as_secs_f64() * 1_000.0);
    metrics::counter!("facet_evaluations_total", 1u64);
    tracing::debug!(candidates = records.len(), hits = eval.filtered.len(), "evaluated query");
    eval
}

/// Group and count an already filtered set (e.g. results delivered by the host).
pub fn build(filtered: Vec<Record>, all_label: &str) -> Evaluation {
    let groups = group(&filtered, all_label);
    let counts = aggregate(&filtered, all_label);
    Evaluation { filtered, groups, counts }
}
