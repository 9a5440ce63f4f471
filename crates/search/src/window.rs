//! Visible-Window Tracker ("show more" pagination per category).

use facet_core::Record;
use rustc_hash::FxHashMap;

use crate::group::GroupedResults;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    size: usize,
    visible: usize,
}

/// How many items of each bucket are exposed.
#[derive(Debug, Clone, Default)]
pub struct VisibleWindows {
    batch: usize,
    windows: FxHashMap<String, Window>,
}

impl VisibleWindows {
    /// Every category starts at `min(batch, bucket size)`.
    pub fn reset(groups: &GroupedResults, batch: usize) -> Self {
        let windows = groups
            .iter()
            .map(|(k, v)| (k.to_string(), Window { size: v.len(), visible: batch.min(v.len()) }))
            .collect();
        Self { batch, windows }
    }

    /// No categories tracked.
    pub fn cleared(batch: usize) -> Self { Self { batch, windows: FxHashMap::default() } }

    /// Expose the whole bucket. Returns false for unknown categories.
    pub fn expand(&mut self, category: &str) -> bool {
        match self.windows.get_mut(category) {
            Some(w) => { w.visible = w.size; true }
            None => false,
        }
    }

    pub fn visible(&self, category: &str) -> usize {
        self.windows.get(category).map_or(0, |w| w.visible)
    }

    pub fn visible_slice<'a>(&self, groups: &'a GroupedResults, category: &str) -> &'a [Record] {
        let items = groups.get(category).unwrap_or(&[]);
        &items[..self.visible(category).min(items.len())]
    }

    /// Gates the "show more" affordance.
    pub fn has_more(&self, category: &str) -> bool {
        self.windows.get(category).is_some_and(|w| w.size > w.visible)
    }

    /// Gates the "show all in category" affordance; independent of expansion.
    pub fn has_show_all(&self, category: &str) -> bool {
        self.windows.get(category).is_some_and(|w| w.size > self.batch)
    }
}
