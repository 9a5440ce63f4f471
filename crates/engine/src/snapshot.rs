//! Read-only presentation snapshot of the engine.

use facet_core::{EngineMode, Record};
use serde::Serialize;

use crate::engine::SearchEngine;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryChip {
    pub name: String,
    pub count: usize,
    pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupView {
    pub category: String,
    pub total: usize,
    /// The visible window, not the whole bucket.
    pub items: Vec<Record>,
    pub has_more: bool,
    pub has_show_all: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Default)]
pub struct Snapshot {
    pub version: u64,
    pub query: String,
    pub mode: EngineMode,
    pub loading: bool,
    pub open: bool,
    pub active_category: String,
    pub categories: Vec<CategoryChip>,
    pub groups: Vec<GroupView>,
    pub recent: Vec<String>,
    pub no_results: bool,
    pub term_too_short: bool,
    pub min_query_len: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_for_term: Option<String>,
}

impl Snapshot {
    pub fn capture(engine: &SearchEngine) -> Self {
        let active = engine.active_category().to_string();
        let categories = engine
            .current_categories()
            .into_iter()
            .map(|name| CategoryChip {
                count: engine.category_count(&name),
                active: name == active,
                name,
            })
            .collect();
        let groups = engine
            .groups()
            .iter()
            .map(|(category, bucket)| GroupView {
                category: category.to_string(),
                total: bucket.len(),
                items: engine.visible_results(category).to_vec(),
                has_more: engine.should_show_more(category),
                has_show_all: engine.should_show_category_link(category),
            })
            .collect();
        let mode = engine.mode();
        Self {
            version: engine.version(),
            query: engine.query().to_string(),
            mode,
            loading: engine.is_loading(),
            open: engine.is_open(),
            active_category: active,
            categories,
            groups,
            recent: engine.recent_searches().to_vec(),
            no_results: mode == EngineMode::Filtering && !engine.is_loading() && engine.filtered().is_empty(),
            term_too_short: mode == EngineMode::TooShort,
            min_query_len: engine.config().min_query_len,
            search_for_term: engine.formatted_search_for_term(),
        }
    }

    pub fn group(&self, category: &str) -> Option<&GroupView> {
        self.groups.iter().find(|g| g.category == category)
    }
}
