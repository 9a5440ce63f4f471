//! Search Pipeline.
//!
//! Keystrokes land in `input` and are reported immediately; the filtering work
//! happens once the debounce deadline passes without a newer keystroke. All
//! time-dependent calls take `now` so the host (or a test) owns the clock.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use facet_core::{CategoryCounts, EngineConfig, EngineMode, FilterMode, Projector, Record, UNCATEGORIZED};
use facet_persist::{KvStore, RecentSearches};
use facet_search::{aggregate, build, evaluate, Evaluation, GroupedResults, VisibleWindows};
use serde_json::Value;
use tracing::debug;

use crate::event::EngineEvent;
use crate::timer::{earliest, Deadline};
use crate::visibility::Visibility;

pub struct SearchEngine {
    cfg: EngineConfig,
    records: Vec<Record>,
    /// Pre-aggregated totals supplied instead of raw records.
    totals: Option<BTreeMap<String, usize>>,
    initial_counts: CategoryCounts,

    query: String,
    pending: Option<String>,
    debounce: Deadline,
    last_settled: Option<String>,

    mode: EngineMode,
    loading: bool,
    filtered: Vec<Record>,
    groups: GroupedResults,
    filtered_counts: CategoryCounts,
    windows: VisibleWindows,

    recent: RecentSearches,
    visibility: Visibility,
    events: Vec<EngineEvent>,
    version: u64,
    shut_down: bool,
}

impl SearchEngine {
    /// Starts in `Initial` with no records; recent searches are loaded from `store`.
    pub fn new(cfg: EngineConfig, store: Arc<dyn KvStore>) -> Self {
        let all = cfg.all_label.clone();
        let mut recent = RecentSearches::new(store, cfg.recent_key.clone(), cfg.max_recent, cfg.recent_enabled);
        recent.load();
        let visibility = Visibility::new(&all, cfg.blur_grace());
        Self {
            records: Vec::new(),
            totals: None,
            initial_counts: CategoryCounts::empty(&all),
            query: String::new(),
            pending: None,
            debounce: Deadline::default(),
            last_settled: None,
            mode: EngineMode::Initial,
            loading: false,
            filtered: Vec::new(),
            groups: GroupedResults::default(),
            filtered_counts: CategoryCounts::cleared(&all),
            windows: VisibleWindows::cleared(cfg.batch_size),
            recent,
            visibility,
            events: Vec::new(),
            version: 0,
            shut_down: false,
            cfg,
        }
    }

    // ---- inputs ----

    /// Replace the full record set (raw host values projected through the configured fields).
    pub fn set_records(&mut self, raws: Vec<Value>) {
        let records = self.cfg.fields.project_all(raws);
        self.set_projected_records(records);
    }

    pub fn set_projected_records(&mut self, records: Vec<Record>) {
        if self.shut_down { return; }
        metrics::gauge!("facet_records", records.len() as f64);
        self.records = records;
        self.totals = None;
        self.data_changed();
    }

    /// Use pre-aggregated per-category totals as the unfiltered counts.
    pub fn set_category_totals<I, K>(&mut self, totals: I)
    where
        I: IntoIterator<Item = (K, usize)>,
        K: Into<String>,
    {
        if self.shut_down { return; }
        self.records.clear();
        self.totals = Some(totals.into_iter().map(|(k, n)| (k.into(), n)).collect());
        self.data_changed();
    }

    fn data_changed(&mut self) {
        self.version += 1;
        self.recompute_initial();
        if self.query.trim().is_empty() {
            self.reset_to_initial(false);
        }
    }

    /// Results computed by the host for the last submitted query.
    pub fn deliver_results(&mut self, results: Option<Vec<Value>>) {
        let records = results.map(|raws| self.cfg.fields.project_all(raws));
        self.deliver_records(records);
    }

    pub fn deliver_records(&mut self, results: Option<Vec<Record>>) {
        if self.shut_down { return; }
        self.version += 1;
        self.set_loading(false);
        match results {
            Some(records) if !records.is_empty() => {
                self.mode = EngineMode::Filtering;
                let eval = build(records, &self.cfg.all_label);
                self.apply(eval);
            }
            _ => {
                self.filtered.clear();
                self.groups = GroupedResults::default();
                self.filtered_counts = CategoryCounts::empty(&self.cfg.all_label);
                self.windows = VisibleWindows::cleared(self.cfg.batch_size);
                let len = self.query.trim().chars().count();
                self.mode = if len == 0 {
                    EngineMode::Initial
                } else if len < self.cfg.min_query_len {
                    EngineMode::TooShort
                } else {
                    EngineMode::Filtering
                };
                let all = self.cfg.all_label.clone();
                self.visibility.reconcile(&all, |_| false);
                self.results_changed();
            }
        }
    }

    // ---- query text ----

    /// A keystroke: reported now, evaluated after the debounce window.
    pub fn input(&mut self, text: &str, now: Instant) {
        if self.shut_down { return; }
        self.version += 1;
        self.query = text.to_string();
        self.events.push(EngineEvent::TermChanged(text.to_string()));
        if !text.is_empty() && !self.visibility.is_open() {
            self.visibility.set_open(true, &mut self.events);
        }
        self.pending = Some(text.to_string());
        self.debounce.arm(now + self.cfg.debounce());
    }

    /// Fire whatever deadlines have passed.
    pub fn poll(&mut self, now: Instant) {
        if self.shut_down { return; }
        let open_before = self.visibility.is_open();
        self.visibility.poll(now, &mut self.events);
        if open_before != self.visibility.is_open() { self.version += 1; }
        if self.debounce.fire(now) {
            if let Some(raw) = self.pending.take() {
                self.version += 1;
                self.settle(&raw);
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        if self.shut_down { return None; }
        earliest(self.debounce.at(), self.visibility.blur_deadline())
    }

    fn settle(&mut self, raw: &str) {
        let trimmed = raw.trim().to_string();
        if self.last_settled.as_deref() == Some(trimmed.as_str()) {
            debug!(query = %trimmed, "settled query unchanged; skipping");
            return;
        }
        self.last_settled = Some(trimmed.clone());
        let len = trimmed.chars().count();

        if len == 0 {
            self.reset_to_initial(true);
            if self.visibility.is_focused() {
                self.visibility.set_open(true, &mut self.events);
            }
        } else if len < self.cfg.min_query_len {
            debug!(query = %trimmed, min = self.cfg.min_query_len, "query too short");
            self.set_loading(false);
            self.mode = EngineMode::TooShort;
            self.filtered.clear();
            self.groups = GroupedResults::default();
            self.filtered_counts = CategoryCounts::cleared(&self.cfg.all_label);
            self.windows = VisibleWindows::cleared(self.cfg.batch_size);
            let all = self.cfg.all_label.clone();
            self.visibility.reconcile(&all, |_| false);
            self.results_changed();
        } else {
            self.mode = EngineMode::Filtering;
            self.set_loading(true);
            self.recent.add(&trimmed);
            self.events.push(EngineEvent::QuerySubmitted(trimmed.clone()));
            if self.cfg.filter_mode == FilterMode::Internal {
                let eval = evaluate(&self.records, &trimmed, self.cfg.min_secondary_query_len, &self.cfg.all_label);
                self.apply(eval);
                self.set_loading(false);
            }
        }
    }

    fn apply(&mut self, eval: Evaluation) {
        let Evaluation { filtered, groups, counts } = eval;
        self.windows = VisibleWindows::reset(&groups, self.cfg.batch_size);
        self.filtered = filtered;
        self.groups = groups;
        self.filtered_counts = counts;
        let all = self.cfg.all_label.clone();
        let groups = &self.groups;
        self.visibility.reconcile(&all, |c| groups.contains(c));
        self.results_changed();
    }

    fn reset_to_initial(&mut self, reload_recent: bool) {
        self.filtered.clear();
        self.groups = GroupedResults::default();
        self.filtered_counts = CategoryCounts::cleared(&self.cfg.all_label);
        self.windows = VisibleWindows::cleared(self.cfg.batch_size);
        let all = self.cfg.all_label.clone();
        self.visibility.select(&all);
        self.set_loading(false);
        self.recompute_initial();
        if reload_recent && self.recent.is_enabled() {
            self.recent.load();
        }
        self.mode = EngineMode::Initial;
        self.results_changed();
    }

    fn recompute_initial(&mut self) {
        self.initial_counts = match &self.totals {
            Some(t) => CategoryCounts::from_totals(t.iter().map(|(k, n)| (k.as_str(), *n)), &self.cfg.all_label),
            None => aggregate(&self.records, &self.cfg.all_label),
        };
    }

    fn set_loading(&mut self, loading: bool) {
        if self.loading != loading {
            self.loading = loading;
            self.events.push(EngineEvent::LoadingChanged(loading));
        }
    }

    fn results_changed(&mut self) {
        let total = self.filtered.len();
        debug!(mode = ?self.mode, total, "results changed");
        self.events.push(EngineEvent::ResultsChanged { mode: self.mode, total });
    }

    // ---- panel signals ----

    pub fn focus(&mut self) {
        if self.shut_down { return; }
        self.version += 1;
        self.visibility.focus(&mut self.events);
        if self.query.trim().is_empty() {
            self.reset_to_initial(true);
        }
    }

    pub fn blur(&mut self, now: Instant) {
        if self.shut_down { return; }
        self.visibility.blur(now);
    }

    /// Click or pointer-down inside the component.
    pub fn pointer_down_inside(&mut self) {
        if self.shut_down { return; }
        self.visibility.interact();
    }

    /// Dismissing the panel by clicking away also discards the query.
    pub fn outside_click(&mut self, now: Instant) {
        if self.shut_down { return; }
        self.version += 1;
        self.visibility.outside_click(&mut self.events);
        if !self.query.is_empty() {
            self.input("", now);
            self.events.push(EngineEvent::SearchCleared);
        }
    }

    // ---- result-panel commands ----

    pub fn clear_search(&mut self, now: Instant) {
        if self.shut_down { return; }
        self.input("", now);
        self.events.push(EngineEvent::SearchCleared);
        self.visibility.focus(&mut self.events);
    }

    pub fn select_category(&mut self, category: &str) {
        if self.shut_down { return; }
        self.version += 1;
        self.visibility.interact();
        if self.visibility.select(category) {
            if !self.mode.is_initial() {
                self.events.push(EngineEvent::CategorySelected(category.to_string()));
            }
            if category == self.cfg.all_label {
                self.windows = VisibleWindows::reset(&self.groups, self.cfg.batch_size);
            }
        }
        self.visibility.set_open(true, &mut self.events);
    }

    pub fn show_more(&mut self, category: &str) {
        if self.shut_down { return; }
        self.visibility.interact();
        if !self.windows.expand(category) {
            debug!(category, "show more for unknown category ignored");
            return;
        }
        self.version += 1;
        if self.visibility.select(category) {
            self.events.push(EngineEvent::CategorySelected(category.to_string()));
        }
        self.events.push(EngineEvent::ShowMoreClicked(category.to_string()));
        self.visibility.set_open(true, &mut self.events);
    }

    pub fn select_recent(&mut self, term: &str, now: Instant) {
        if self.shut_down { return; }
        self.visibility.interact();
        self.input(term, now);
        self.events.push(EngineEvent::RecentSearchSelected(term.to_string()));
        self.visibility.focus(&mut self.events);
    }

    /// Select a result by id. Unknown ids are ignored.
    pub fn select_item(&mut self, id: &str) {
        if self.shut_down { return; }
        self.visibility.interact();
        let Some(record) = self.filtered.iter().find(|r| r.id == id).cloned() else {
            debug!(id, "selected id is not in the current results");
            return;
        };
        self.version += 1;
        self.events.push(EngineEvent::ItemSelected(record));
        let open = !self.cfg.close_on_item_select;
        self.visibility.set_open(open, &mut self.events);
    }

    pub fn navigate_to_category(&mut self, category: &str) {
        if self.shut_down { return; }
        self.version += 1;
        self.visibility.interact();
        self.events.push(EngineEvent::NavigateToCategory { term: self.query.clone(), category: category.to_string() });
        let open = !self.cfg.close_on_navigate;
        self.visibility.set_open(open, &mut self.events);
    }

    pub fn navigate_to_all(&mut self) {
        if self.shut_down { return; }
        self.version += 1;
        self.visibility.interact();
        self.events.push(EngineEvent::NavigateToAll { term: self.query.clone() });
        let open = !self.cfg.close_on_navigate;
        self.visibility.set_open(open, &mut self.events);
    }

    pub fn search_for_term_clicked(&mut self) {
        if self.shut_down || self.query.is_empty() { return; }
        self.events.push(EngineEvent::SearchForTermClicked(self.query.clone()));
    }

    pub fn enter_pressed(&mut self) {
        if self.shut_down { return; }
        self.events.push(EngineEvent::EnterPressed(self.query.clone()));
    }

    pub fn set_all_label(&mut self, label: &str) {
        if self.shut_down || label.is_empty() || label == UNCATEGORIZED || label == self.cfg.all_label { return; }
        self.version += 1;
        let old = std::mem::replace(&mut self.cfg.all_label, label.to_string());
        if self.visibility.active() == old || self.query.is_empty() {
            self.visibility.select(label);
        }
        // Counts and buckets depend on the label, so both are rebuilt rather than renamed.
        self.recompute_initial();
        if self.filtered.is_empty() {
            self.filtered_counts.relabel(label);
        } else {
            let eval = build(std::mem::take(&mut self.filtered), label);
            self.apply(eval);
        }
    }

    /// Cancel both timers. Every later command and poll is ignored.
    pub fn shutdown(&mut self) {
        self.debounce.cancel();
        self.pending = None;
        self.visibility.cancel_timers();
        self.shut_down = true;
    }

    // ---- reads ----

    pub fn drain_events(&mut self) -> Vec<EngineEvent> { std::mem::take(&mut self.events) }

    pub fn config(&self) -> &EngineConfig { &self.cfg }
    pub fn version(&self) -> u64 { self.version }
    pub fn is_shut_down(&self) -> bool { self.shut_down }
    pub fn query(&self) -> &str { &self.query }
    pub fn mode(&self) -> EngineMode { self.mode }
    pub fn is_loading(&self) -> bool { self.loading }
    pub fn is_open(&self) -> bool { self.visibility.is_open() }
    pub fn active_category(&self) -> &str { self.visibility.active() }
    pub fn records(&self) -> &[Record] { &self.records }
    pub fn filtered(&self) -> &[Record] { &self.filtered }
    pub fn groups(&self) -> &GroupedResults { &self.groups }
    pub fn windows(&self) -> &VisibleWindows { &self.windows }
    pub fn initial_counts(&self) -> &CategoryCounts { &self.initial_counts }
    pub fn filtered_counts(&self) -> &CategoryCounts { &self.filtered_counts }
    pub fn recent_searches(&self) -> &[String] { self.recent.items() }

    /// The count set presentation should read for the current mode.
    pub fn authoritative_counts(&self) -> &CategoryCounts {
        if self.mode.is_initial() { &self.initial_counts } else { &self.filtered_counts }
    }

    pub fn category_count(&self, category: &str) -> usize { self.authoritative_counts().get(category) }

    /// Category chips in display order.
    pub fn current_categories(&self) -> Vec<String> {
        let counts = self.authoritative_counts();
        let include_all = if self.mode.is_initial() {
            !self.cfg.hide_all_chip_initial
        } else {
            counts.total() > 0
        };
        counts.chip_order(include_all)
    }

    pub fn visible_results(&self, category: &str) -> &[Record] { self.windows.visible_slice(&self.groups, category) }

    pub fn should_show_more(&self, category: &str) -> bool {
        self.cfg.show_more_links && self.windows.has_more(category)
    }

    pub fn should_show_category_link(&self, category: &str) -> bool {
        self.cfg.category_links && self.windows.has_show_all(category)
    }

    /// "Search for {term}" line, when enabled.
    pub fn formatted_search_for_term(&self) -> Option<String> {
        self.cfg
            .show_search_for_term_line
            .then(|| self.cfg.search_for_term_format.replacen("{term}", &self.query, 1))
    }
}
