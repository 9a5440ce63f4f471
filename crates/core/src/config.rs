//! Engine configuration.
//!
//! Defaults match the behavior hosts expect out of the box. `apply_env` overlays
//! `FACET_*` variables on top of whatever was loaded.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::record::{FieldMap, UNCATEGORIZED};
use crate::{Error, Result};

/// Where filtering happens once a query settles.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FilterMode {
    /// Match the full record set locally.
    #[default]
    Internal,
    /// Emit `QuerySubmitted` and wait for the host to deliver results.
    Delegated,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EngineConfig {
    pub fields: FieldMap,
    pub filter_mode: FilterMode,
    pub debounce_ms: u64,
    pub batch_size: usize,
    pub min_query_len: usize,
    pub min_secondary_query_len: usize,
    pub all_label: String,
    pub recent_enabled: bool,
    pub max_recent: usize,
    pub recent_key: String,
    /// `None` leaves the panel open on blur.
    pub blur_grace_ms: Option<u64>,
    pub close_on_item_select: bool,
    pub close_on_navigate: bool,
    pub show_more_links: bool,
    pub category_links: bool,
    pub hide_all_chip_initial: bool,
    pub show_search_for_term_line: bool,
    pub search_for_term_format: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fields: FieldMap::default(),
            filter_mode: FilterMode::Internal,
            debounce_ms: 300,
            batch_size: 5,
            min_query_len: 1,
            min_secondary_query_len: 3,
            all_label: "All".into(),
            recent_enabled: true,
            max_recent: 5,
            recent_key: "facet_search_recent".into(),
            blur_grace_ms: Some(150),
            close_on_item_select: false,
            close_on_navigate: true,
            show_more_links: true,
            category_links: true,
            hide_all_chip_initial: true,
            show_search_for_term_line: false,
            search_for_term_format: "Search for {term}".into(),
        }
    }
}

impl EngineConfig {
    pub fn from_json(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        Ok(cfg)
    }

    pub fn debounce(&self) -> Duration { Duration::from_millis(self.debounce_ms) }

    pub fn blur_grace(&self) -> Option<Duration> { self.blur_grace_ms.map(Duration::from_millis) }

    /// Overlay `FACET_*` environment variables. Unparsable values are logged and skipped.
    pub fn apply_env(&mut self) {
        self.apply_vars(|k| std::env::var(k).ok());
    }

    fn apply_vars(&mut self, get: impl Fn(&str) -> Option<String>) {
        fn parse<T: std::str::FromStr>(key: &str, raw: Option<String>, slot: &mut T) {
            let Some(raw) = raw else { return };
            match raw.trim().parse::<T>() {
                Ok(v) => *slot = v,
                Err(_) => warn!(key, value = %raw, "ignoring unparsable config override"),
            }
        }
        parse("FACET_DEBOUNCE_MS", get("FACET_DEBOUNCE_MS"), &mut self.debounce_ms);
        parse("FACET_BATCH_SIZE", get("FACET_BATCH_SIZE"), &mut self.batch_size);
        parse("FACET_MIN_QUERY_LEN", get("FACET_MIN_QUERY_LEN"), &mut self.min_query_len);
        parse("FACET_MIN_SECONDARY_QUERY_LEN", get("FACET_MIN_SECONDARY_QUERY_LEN"), &mut self.min_secondary_query_len);
        parse("FACET_MAX_RECENT", get("FACET_MAX_RECENT"), &mut self.max_recent);
        parse("FACET_RECENT_ENABLED", get("FACET_RECENT_ENABLED"), &mut self.recent_enabled);
        if let Some(v) = get("FACET_ALL_LABEL") { self.all_label = v; }
        if let Some(v) = get("FACET_RECENT_KEY") { self.recent_key = v; }
        if let Some(v) = get("FACET_BLUR_GRACE_MS") {
            match v.trim() {
                "" | "off" | "none" => self.blur_grace_ms = None,
                s => match s.parse::<u64>() {
                    Ok(ms) => self.blur_grace_ms = Some(ms),
                    Err(_) => warn!(key = "FACET_BLUR_GRACE_MS", value = %v, "ignoring unparsable config override"),
                },
            }
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(Error::InvalidConfig("batch_size must be at least 1".into()));
        }
        if self.fields.id.is_empty() || self.fields.name.is_empty() || self.fields.category.is_empty() {
            return Err(Error::InvalidConfig("id, name and category field names are required".into()));
        }
        if self.all_label.is_empty() || self.all_label == UNCATEGORIZED {
            return Err(Error::InvalidConfig(format!("all_label must be non-empty and not {UNCATEGORIZED:?}")));
        }
        Ok(())
    }
}
