use std::sync::Arc;
use std::time::{Duration, Instant};

use facet_core::{EngineConfig, EngineMode, FieldMap, FilterMode};
use facet_engine::{EngineEvent, SearchEngine, Snapshot};
use facet_persist::{KvStore, MemoryStore};
use serde_json::{json, Value};

const SETTLE: Duration = Duration::from_millis(300);

fn cfg() -> EngineConfig {
    EngineConfig { fields: FieldMap::new("id", "name", "cat"), ..Default::default() }
}

fn produce() -> Vec<Value> {
    vec![
        json!({"id": 1, "name": "Apple", "cat": "Fruit"}),
        json!({"id": 2, "name": "Carrot", "cat": "Veg"}),
    ]
}

fn engine(cfg: EngineConfig) -> (Arc<MemoryStore>, SearchEngine) {
    let store = Arc::new(MemoryStore::new());
    let mut e = SearchEngine::new(cfg, store.clone());
    e.set_records(produce());
    (store, e)
}

/// Type `text` and let the debounce settle.
fn settle(e: &mut SearchEngine, text: &str, now: &mut Instant) {
    e.input(text, *now);
    *now += SETTLE;
    e.poll(*now);
}

fn submitted(events: &[EngineEvent]) -> Vec<String> {
    events
        .iter()
        .filter_map(|ev| match ev {
            EngineEvent::QuerySubmitted(q) => Some(q.clone()),
            _ => None,
        })
        .collect()
}

#[test]
fn burst_of_keystrokes_evaluates_once() {
    let (_s, mut e) = engine(cfg());
    let t0 = Instant::now();
    e.input("a", t0);
    e.input("ab", t0 + Duration::from_millis(100));
    e.input("abc", t0 + Duration::from_millis(200));
    e.poll(t0 + Duration::from_millis(400));
    assert_eq!(e.mode(), EngineMode::Initial);
    e.poll(t0 + Duration::from_millis(500));

    let events = e.drain_events();
    assert_eq!(submitted(&events), vec!["abc"]);
    let terms: Vec<_> = events.iter().filter(|ev| matches!(ev, EngineEvent::TermChanged(_))).collect();
    assert_eq!(terms.len(), 3);
    assert_eq!(e.recent_searches(), &["abc"]);
}

#[test]
fn whole_word_match_groups_and_counts() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();

    settle(&mut e, "app", &mut now);
    assert_eq!(e.mode(), EngineMode::Filtering);
    assert!(e.filtered().is_empty());
    assert!(Snapshot::capture(&e).no_results);

    settle(&mut e, "apple", &mut now);
    assert_eq!(e.filtered_counts().get("Fruit"), 1);
    assert_eq!(e.filtered_counts().total(), 1);
    assert!(!e.filtered_counts().contains("Veg"));
    let fruit = e.groups().get("Fruit").unwrap();
    assert_eq!(fruit.len(), 1);
    assert_eq!(fruit[0].id, "1");
    assert_eq!(e.groups().len(), 1);
}

#[test]
fn clearing_the_query_restores_full_counts() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    settle(&mut e, "", &mut now);

    assert_eq!(e.mode(), EngineMode::Initial);
    assert!(e.filtered().is_empty());
    assert!(e.groups().is_empty());
    assert_eq!(e.authoritative_counts().total(), 2);
    assert_eq!(e.authoritative_counts().get("Veg"), 1);
    assert_eq!(e.active_category(), "All");
    assert!(!e.is_loading());
}

#[test]
fn outside_click_closes_and_discards_query() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    e.focus();
    settle(&mut e, "apple", &mut now);
    assert!(e.is_open());
    e.drain_events();

    e.outside_click(now);
    assert!(!e.is_open());
    assert_eq!(e.query(), "");
    let events = e.drain_events();
    assert!(events.contains(&EngineEvent::VisibilityChanged(false)));
    assert!(events.contains(&EngineEvent::TermChanged(String::new())));
    assert!(events.contains(&EngineEvent::SearchCleared));

    now += SETTLE;
    e.poll(now);
    assert_eq!(e.mode(), EngineMode::Initial);
    assert!(!e.is_open());
}

#[test]
fn outside_click_beats_pending_blur() {
    let (_s, mut e) = engine(cfg());
    let now = Instant::now();
    e.focus();
    e.blur(now);
    assert_eq!(e.next_deadline(), Some(now + Duration::from_millis(150)));
    e.outside_click(now + Duration::from_millis(10));
    assert!(!e.is_open());
    assert_eq!(e.next_deadline(), None);
}

#[test]
fn blur_closes_after_grace_unless_interrupted() {
    let (_s, mut e) = engine(cfg());
    let now = Instant::now();
    e.focus();
    e.blur(now);
    e.pointer_down_inside();
    e.poll(now + Duration::from_secs(1));
    assert!(e.is_open());

    e.blur(now);
    e.poll(now + Duration::from_millis(149));
    assert!(e.is_open());
    e.poll(now + Duration::from_millis(150));
    assert!(!e.is_open());
}

#[test]
fn short_query_clears_everything() {
    let (_s, mut e) = engine(EngineConfig { min_query_len: 3, ..cfg() });
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    settle(&mut e, "ap", &mut now);

    assert_eq!(e.mode(), EngineMode::TooShort);
    assert!(e.filtered_counts().is_cleared());
    assert!(e.groups().is_empty());
    assert!(e.current_categories().is_empty());
    assert!(!e.is_loading());
    let snap = Snapshot::capture(&e);
    assert!(snap.term_too_short);
    assert!(!snap.no_results);
    assert_eq!(e.recent_searches(), &["apple"]);
}

#[test]
fn identical_settled_queries_are_suppressed() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    settle(&mut e, " apple ", &mut now);
    assert_eq!(submitted(&e.drain_events()), vec!["apple"]);
    assert_eq!(e.recent_searches(), &["apple"]);
}

#[test]
fn delegated_results_drive_grouping() {
    let (_s, mut e) = engine(EngineConfig { filter_mode: FilterMode::Delegated, ..cfg() });
    let mut now = Instant::now();
    settle(&mut e, "pie", &mut now);
    assert!(e.is_loading());
    assert_eq!(e.mode(), EngineMode::Filtering);
    let events = e.drain_events();
    assert!(events.contains(&EngineEvent::LoadingChanged(true)));
    assert_eq!(submitted(&events), vec!["pie"]);

    e.deliver_results(Some(vec![json!({"id": 7, "name": "Apple pie", "cat": "Dessert"})]));
    assert!(!e.is_loading());
    assert_eq!(e.groups().bucket_len("Dessert"), 1);
    assert_eq!(e.filtered_counts().total(), 1);

    e.deliver_results(None);
    assert_eq!(e.mode(), EngineMode::Filtering);
    assert!(!e.filtered_counts().is_cleared());
    assert_eq!(e.filtered_counts().total(), 0);
    assert!(e.groups().is_empty());
}

#[test]
fn show_more_expands_and_selects() {
    let store = Arc::new(MemoryStore::new());
    let mut e = SearchEngine::new(EngineConfig { batch_size: 2, ..cfg() }, store);
    e.set_records((1..=3).map(|i| json!({"id": i, "name": format!("apple {i}"), "cat": "Fruit"})).collect());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    e.drain_events();

    assert_eq!(e.visible_results("Fruit").len(), 2);
    assert!(e.should_show_more("Fruit"));
    e.show_more("Fruit");
    assert_eq!(e.visible_results("Fruit").len(), 3);
    assert!(!e.should_show_more("Fruit"));
    assert!(e.should_show_category_link("Fruit"));
    assert_eq!(e.active_category(), "Fruit");
    let events = e.drain_events();
    assert_eq!(
        events,
        vec![EngineEvent::CategorySelected("Fruit".into()), EngineEvent::ShowMoreClicked("Fruit".into())]
    );

    e.select_category("All");
    assert_eq!(e.visible_results("Fruit").len(), 2);
}

#[test]
fn active_category_survives_only_while_it_has_results() {
    let store = Arc::new(MemoryStore::new());
    let mut e = SearchEngine::new(cfg(), store);
    e.set_records(vec![
        json!({"id": 1, "name": "Apple", "cat": "Fruit"}),
        json!({"id": 2, "name": "Apple tart", "cat": "Dessert"}),
    ]);
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    e.select_category("Dessert");
    settle(&mut e, "tart", &mut now);
    assert_eq!(e.active_category(), "Dessert");

    settle(&mut e, "apple", &mut now);
    e.select_category("Fruit");
    settle(&mut e, "tart", &mut now);
    assert_eq!(e.active_category(), "All");
}

#[test]
fn category_chips_follow_mode() {
    let (_s, mut e) = engine(cfg());
    e.focus();
    assert_eq!(e.current_categories(), vec!["Fruit", "Veg"]);

    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    assert_eq!(e.current_categories(), vec!["All", "Fruit"]);

    let (_s, mut e) = engine(EngineConfig { hide_all_chip_initial: false, ..cfg() });
    e.focus();
    assert_eq!(e.current_categories(), vec!["All", "Fruit", "Veg"]);
}

#[test]
fn item_selection_and_navigation_close_when_configured() {
    let (_s, mut e) = engine(EngineConfig { close_on_item_select: true, ..cfg() });
    let mut now = Instant::now();
    e.focus();
    settle(&mut e, "apple", &mut now);
    e.drain_events();

    e.select_item("nope");
    assert!(e.drain_events().is_empty());
    e.select_item("1");
    let events = e.drain_events();
    assert!(matches!(&events[0], EngineEvent::ItemSelected(r) if r.id == "1" && r.raw["cat"] == "Fruit"));
    assert!(!e.is_open());

    e.navigate_to_category("Fruit");
    assert_eq!(
        e.drain_events(),
        vec![EngineEvent::NavigateToCategory { term: "apple".into(), category: "Fruit".into() }]
    );

    let (_s, mut e) = engine(EngineConfig { close_on_navigate: false, ..cfg() });
    e.navigate_to_all();
    assert!(e.is_open());
}

#[test]
fn recent_searches_load_at_start_and_tolerate_storage_failure() {
    let store = Arc::new(MemoryStore::new());
    store.set("facet_search_recent", br#"["pear"]"#).unwrap();
    let mut e = SearchEngine::new(cfg(), store.clone());
    assert_eq!(e.recent_searches(), &["pear"]);

    store.fail_writes(true);
    e.set_records(produce());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    assert_eq!(e.mode(), EngineMode::Filtering);
    assert_eq!(e.recent_searches(), &["apple", "pear"]);
    assert_eq!(store.peek("facet_search_recent").unwrap(), br#"["pear"]"#.to_vec());
}

#[test]
fn shutdown_cancels_pending_work() {
    let (_s, mut e) = engine(cfg());
    let now = Instant::now();
    e.focus();
    e.input("apple", now);
    e.blur(now);
    e.shutdown();
    assert_eq!(e.next_deadline(), None);
    e.drain_events();

    e.poll(now + Duration::from_secs(5));
    e.input("carrot", now);
    assert!(e.drain_events().is_empty());
    assert_eq!(e.mode(), EngineMode::Initial);
    assert!(e.recent_searches().is_empty());
    assert!(e.is_open());
}

#[test]
fn totals_replace_record_counts() {
    let store = Arc::new(MemoryStore::new());
    let mut e = SearchEngine::new(cfg(), store);
    e.set_category_totals([("Books", 2usize), ("Music", 3)]);
    assert_eq!(e.initial_counts().total(), 5);
    assert_eq!(e.category_count("Music"), 3);
    assert!(e.records().is_empty());
}

#[test]
fn all_label_can_be_renamed() {
    let (_s, mut e) = engine(cfg());
    e.set_all_label("Everything");
    assert_eq!(e.active_category(), "Everything");
    assert_eq!(e.initial_counts().get("Everything"), 2);
    assert_eq!(e.initial_counts().get("All"), 0);
}

#[test]
fn search_for_term_line_and_clicks() {
    let (_s, mut e) = engine(EngineConfig { show_search_for_term_line: true, ..cfg() });
    e.search_for_term_clicked();
    assert!(e.drain_events().is_empty());
    e.input("kiwi", Instant::now());
    assert_eq!(e.formatted_search_for_term().as_deref(), Some("Search for kiwi"));
    e.drain_events();
    e.search_for_term_clicked();
    e.enter_pressed();
    assert_eq!(
        e.drain_events(),
        vec![EngineEvent::SearchForTermClicked("kiwi".into()), EngineEvent::EnterPressed("kiwi".into())]
    );
}

#[test]
fn clear_search_and_recent_selection_keep_panel_open() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    e.clear_search(now);
    assert!(e.is_open());
    assert!(e.drain_events().contains(&EngineEvent::SearchCleared));

    e.select_recent("carrot", now);
    assert_eq!(e.query(), "carrot");
    assert!(e.drain_events().contains(&EngineEvent::RecentSearchSelected("carrot".into())));
    now += SETTLE;
    e.poll(now);
    assert_eq!(e.groups().bucket_len("Veg"), 1);
    assert!(e.is_open());
}

#[test]
fn item_selection_keeps_panel_open_by_default() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    e.focus();
    settle(&mut e, "apple", &mut now);
    e.drain_events();
    e.select_item("1");
    assert!(e.is_open());
    assert!(!e.drain_events().contains(&EngineEvent::VisibilityChanged(false)));
}

#[test]
fn reset_to_initial_reloads_recent_searches_from_storage() {
    let (store, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    store.set("facet_search_recent", br#"["other", "apple"]"#).unwrap();
    assert_eq!(e.recent_searches(), &["apple"]);

    settle(&mut e, "", &mut now);
    assert_eq!(e.mode(), EngineMode::Initial);
    assert_eq!(e.recent_searches(), &["other", "apple"]);
}

#[test]
fn record_change_does_not_reload_recent_searches() {
    let (store, mut e) = engine(cfg());
    store.set("facet_search_recent", br#"["written elsewhere"]"#).unwrap();
    e.set_records(produce());
    assert_eq!(e.mode(), EngineMode::Initial);
    assert!(e.recent_searches().is_empty());
}

#[test]
fn record_change_during_a_query_keeps_filtering() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "apple", &mut now);
    e.set_records(vec![
        json!({"id": 1, "name": "Apple", "cat": "Fruit"}),
        json!({"id": 2, "name": "Carrot", "cat": "Veg"}),
        json!({"id": 3, "name": "Leek", "cat": "Veg"}),
    ]);
    assert_eq!(e.mode(), EngineMode::Filtering);
    assert_eq!(e.initial_counts().total(), 3);
    assert_eq!(e.initial_counts().get("Veg"), 2);
    assert_eq!(e.filtered_counts().total(), 1);
    assert_eq!(e.authoritative_counts().total(), 1);
}

#[test]
fn delegated_empty_delivery_follows_the_query_length() {
    let cfg = EngineConfig { filter_mode: FilterMode::Delegated, min_query_len: 3, ..cfg() };
    let (_s, mut e) = engine(cfg);
    e.deliver_results(None);
    assert_eq!(e.mode(), EngineMode::Initial);
    assert_eq!(e.filtered_counts().total(), 0);
    assert!(!e.filtered_counts().is_cleared());

    e.input("ap", Instant::now());
    e.deliver_results(Some(Vec::new()));
    assert_eq!(e.mode(), EngineMode::TooShort);
    assert!(!e.is_loading());
    assert!(e.groups().is_empty());
}

#[test]
fn all_label_rename_rebuilds_counts_and_buckets() {
    let (_s, mut e) = engine(cfg());
    let mut now = Instant::now();
    settle(&mut e, "carrot", &mut now);
    e.set_all_label("Veg");
    assert_eq!(e.filtered_counts().total(), 1);
    assert_eq!(e.filtered_counts().get("Uncategorized"), 1);
    assert!(!e.groups().contains("Veg"));
    assert_eq!(e.initial_counts().total(), 2);

    e.set_all_label("Uncategorized");
    assert_eq!(e.config().all_label, "Veg");
}
