//! Recent-Query Store: bounded, most-recent-first, case-insensitively unique.
//!
//! Persisted as a JSON array of strings under one key. Storage is a
//! convenience: read failures load as empty, write failures are logged and dropped.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::KvStore;

pub struct RecentSearches {
    store: Arc<dyn KvStore>,
    key: String,
    max: usize,
    enabled: bool,
    items: Vec<String>,
}

impl RecentSearches {
    /// Nothing is read until [`load`](Self::load).
    pub fn new(store: Arc<dyn KvStore>, key: impl Into<String>, max: usize, enabled: bool) -> Self {
        Self { store, key: key.into(), max, enabled, items: Vec::new() }
    }

    pub fn items(&self) -> &[String] { &self.items }

    pub fn is_enabled(&self) -> bool { self.enabled }

    /// Replace the in-memory list with the persisted one. Any failure yields an empty list.
    pub fn load(&mut self) -> &[String] {
        self.items = if self.enabled { self.read() } else { Vec::new() };
        &self.items
    }

    /// Move `term` (trimmed) to the front, dropping any case-insensitive duplicate
    /// and anything past the cap, then persist. Returns false when nothing changed.
    pub fn add(&mut self, term: &str) -> bool {
        if !self.enabled { return false; }
        let term = term.trim();
        if term.is_empty() { return false; }
        let folded = term.to_lowercase();
        self.items.retain(|s| s.to_lowercase() != folded);
        self.items.insert(0, term.to_string());
        self.items.truncate(self.max);
        self.save();
        true
    }

    pub fn clear(&mut self) {
        self.items.clear();
        if self.enabled { self.save(); }
    }

    fn read(&self) -> Vec<String> {
        let bytes = match self.store.get(&self.key) {
            Ok(Some(b)) => b,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!(error = %e, key = %self.key, "recent searches unreadable; starting empty");
                return Vec::new();
            }
        };
        match serde_json::from_slice::<Vec<String>>(&bytes) {
            Ok(raw) => sanitize(raw, self.max),
            Err(e) => {
                debug!(error = %e, key = %self.key, "recent searches slot is not a string array");
                Vec::new()
            }
        }
    }

    fn save(&self) {
        let bytes = match serde_json::to_vec(&self.items) {
            Ok(b) => b,
            Err(e) => {
                warn!(error = %e, "failed to encode recent searches");
                return;
            }
        };
        if let Err(e) = self.store.set(&self.key, &bytes) {
            metrics::counter!("facet_recent_save_failures_total", 1u64);
            warn!(error = %e, key = %self.key, "failed to persist recent searches");
        }
    }
}

/// Enforce the list invariants on data we did not write ourselves.
fn sanitize(raw: Vec<String>, max: usize) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(raw.len().min(max));
    for s in raw {
        let s = s.trim();
        if s.is_empty() { continue; }
        let folded = s.to_lowercase();
        if out.iter().any(|o| o.to_lowercase() == folded) { continue; }
        out.push(s.to_string());
    }
    out.truncate(max);
    out
}
