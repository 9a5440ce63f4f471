use facet_core::{EngineMode, Record};
use serde::Serialize;

/// Everything the engine tells its host. Drained in emission order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum EngineEvent {
    /// Every keystroke, not debounced.
    TermChanged(String),
    /// Debounced, trimmed, long enough.
    QuerySubmitted(String),
    LoadingChanged(bool),
    ResultsChanged { mode: EngineMode, total: usize },
    CategorySelected(String),
    ShowMoreClicked(String),
    ItemSelected(Record),
    RecentSearchSelected(String),
    NavigateToCategory { term: String, category: String },
    NavigateToAll { term: String },
    SearchCleared,
    VisibilityChanged(bool),
    SearchForTermClicked(String),
    EnterPressed(String),
}
