use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use facet_core::{EngineConfig, FilterMode};
use facet_engine::{spawn_engine, Command, EngineEvent, SearchEngine, Snapshot};
use facet_persist::{KvStore, MemoryStore, RecentSearches, SqliteStore};
use facet_search::{aggregate_values, highlight, highlight_words};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::signal;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "facetctl", version, about = "Facet search CLI")]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, global = true, default_value_t = Output::Human)]
    output: Output,

    /// Engine config as JSON; FACET_* variables are applied on top
    #[arg(long = "config", global = true, env = "FACET_CONFIG")]
    config: Option<PathBuf>,

    /// SQLite file for recent searches (default: FACET_DB_PATH or ~/.facet/facet.db)
    #[arg(long = "db", global = true)]
    db: Option<String>,

    /// Keep recent searches in memory only
    #[arg(long = "no-history", global = true, action = ArgAction::SetTrue)]
    no_history: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Output { Human, Json }

#[derive(Subcommand, Debug)]
enum Commands {
    /// Type the given terms in quick succession against a JSON array of records
    Query {
        /// Path to a JSON array of records
        records: PathBuf,
        /// Keystrokes; only the last one settles
        #[arg(required = true)]
        terms: Vec<String>,
        /// Expand these categories past the batch size
        #[arg(long = "more")]
        more: Vec<String>,
    },
    /// Print per-category counts for a record file
    Counts {
        records: PathBuf,
    },
    /// Drive the engine interactively: each stdin line is a keystroke, or a JSON command
    Watch {
        records: PathBuf,
    },
    /// Inspect or clear the persisted recent searches
    Recent {
        #[command(subcommand)]
        action: RecentAction,
    },
}

#[derive(Subcommand, Debug)]
enum RecentAction {
    List,
    Clear,
}

fn init_tracing() {
    let env = std::env::var("FACET_LOG").unwrap_or_else(|_| "info".to_string());
    let filter = tracing_subscriber::EnvFilter::from_str(&env).unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_writer(std::io::stderr).init();
}

fn init_metrics() {
    if let Ok(addr) = std::env::var("FACET_METRICS_ADDR") {
        if let Ok(sock) = addr.parse::<std::net::SocketAddr>() {
            let builder = metrics_exporter_prometheus::PrometheusBuilder::new();
            match builder.with_http_listener(sock).install() {
                Ok(_) => info!(addr = %addr, "Prometheus metrics exporter listening"),
                Err(e) => warn!(error = %e, "failed to install metrics exporter"),
            }
        } else {
            warn!(addr = %addr, "invalid FACET_METRICS_ADDR; expected host:port");
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EngineConfig> {
    let mut cfg = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).with_context(|| format!("reading config {}", p.display()))?;
            EngineConfig::from_json(&text).with_context(|| format!("parsing config {}", p.display()))?
        }
        None => EngineConfig::default(),
    };
    cfg.apply_env();
    cfg.validate()?;
    Ok(cfg)
}

fn load_records(path: &Path) -> Result<Vec<Value>> {
    let text = std::fs::read_to_string(path).with_context(|| format!("reading records {}", path.display()))?;
    let raws: Vec<Value> = serde_json::from_str(&text).with_context(|| format!("{} is not a JSON array", path.display()))?;
    Ok(raws)
}

/// Recent searches are a convenience; an unusable database degrades to memory.
fn open_store(cli: &Cli) -> Arc<dyn KvStore> {
    if cli.no_history {
        return Arc::new(MemoryStore::new());
    }
    let opened = match cli.db.as_deref() {
        Some(path) => SqliteStore::open(path),
        None => SqliteStore::open_default(),
    };
    match opened {
        Ok(store) => Arc::new(store),
        Err(e) => {
            warn!(error = %e, "recent-search database unavailable; history kept in memory");
            Arc::new(MemoryStore::new())
        }
    }
}

#[derive(Serialize)]
struct QueryOutput<'a> {
    snapshot: &'a Snapshot,
    events: &'a [EngineEvent],
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    init_metrics();
    let cli = Cli::parse();
    let mut cfg = load_config(cli.config.as_deref())?;

    match &cli.command {
        Commands::Query { records, terms, more } => {
            if cfg.filter_mode == FilterMode::Delegated {
                warn!("query filters locally; ignoring delegated filter_mode");
                cfg.filter_mode = FilterMode::Internal;
            }
            let raws = load_records(records)?;
            info!(records = raws.len(), terms = terms.len(), "query invoked");
            let mut engine = SearchEngine::new(cfg, open_store(&cli));
            engine.set_records(raws);
            engine.focus();
            let start = Instant::now();
            for term in terms {
                engine.input(term, start);
            }
            while let Some(at) = engine.next_deadline() {
                engine.poll(at);
            }
            for category in more {
                engine.show_more(category);
            }
            let events = engine.drain_events();
            let snap = Snapshot::capture(&engine);
            match cli.output {
                Output::Human => print_snapshot(&snap),
                Output::Json => println!("{}", serde_json::to_string_pretty(&QueryOutput { snapshot: &snap, events: &events })?),
            }
        }
        Commands::Counts { records } => {
            let raws = load_records(records)?;
            let counts = aggregate_values(&raws, &cfg.fields.category, &cfg.all_label);
            match cli.output {
                Output::Human => {
                    println!("{:<24} {}", counts.all_label(), counts.total());
                    for (category, n) in counts.categories() {
                        println!("{:<24} {}", category, n);
                    }
                }
                Output::Json => println!("{}", serde_json::to_string_pretty(counts.as_map())?),
            }
        }
        Commands::Watch { records } => {
            let raws = load_records(records)?;
            let mut engine = SearchEngine::new(cfg, open_store(&cli));
            engine.set_records(raws);
            watch(engine, cli.output).await?;
        }
        Commands::Recent { action } => {
            let mut recent = RecentSearches::new(open_store(&cli), cfg.recent_key.clone(), cfg.max_recent, true);
            recent.load();
            match action {
                RecentAction::List => match cli.output {
                    Output::Human => {
                        for (i, term) in recent.items().iter().enumerate() {
                            println!("{:>2}. {}", i + 1, term);
                        }
                    }
                    Output::Json => println!("{}", serde_json::to_string_pretty(recent.items())?),
                },
                RecentAction::Clear => {
                    let n = recent.items().len();
                    recent.clear();
                    info!(removed = n, "recent searches cleared");
                }
            }
        }
    }
    Ok(())
}

async fn watch(engine: SearchEngine, output: Output) -> Result<()> {
    let cap = std::env::var("FACET_QUEUE_CAP").ok().and_then(|s| s.parse::<usize>().ok()).unwrap_or(64);
    let (handle, mut events) = spawn_engine(engine, cap);
    let mut versions = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    handle.send(Command::Focus).await?;

    loop {
        tokio::select! {
            line = lines.next_line() => {
                match line? {
                    Some(line) => {
                        let Some(cmd) = next_command(&line) else { continue };
                        metrics::counter!("facetctl_commands_total", 1u64);
                        handle.send(cmd).await?;
                    }
                    None => break,
                }
            }
            Some(ev) = events.recv() => match output {
                Output::Human => println!("* {}", describe(&ev)),
                Output::Json => println!("{}", serde_json::to_string(&ev)?),
            },
            Ok(()) = versions.changed() => {
                let snap = handle.current();
                match output {
                    Output::Human => print_snapshot(&snap),
                    Output::Json => println!("{}", serde_json::to_string(&*snap)?),
                }
            }
            _ = signal::ctrl_c() => {
                info!("interrupted");
                break;
            }
        }
    }
    handle.shutdown().await;
    Ok(())
}

/// A line starting with `{` is a JSON command; anything else is the new query text.
fn parse_line(line: &str) -> Result<Command> {
    if line.trim_start().starts_with('{') {
        serde_json::from_str(line).with_context(|| format!("invalid command: {}", line))
    } else {
        Ok(Command::Input(line.to_string()))
    }
}

/// A bad line is reported and skipped; the session keeps going.
fn next_command(line: &str) -> Option<Command> {
    match parse_line(line) {
        Ok(cmd) => Some(cmd),
        Err(e) => {
            warn!(error = %e, "skipping unreadable command line");
            None
        }
    }
}

fn describe(ev: &EngineEvent) -> String {
    match ev {
        EngineEvent::ItemSelected(r) => format!("item selected: {} ({})", r.name, r.id),
        other => format!("{:?}", other),
    }
}

fn mark(name: &str, query: &str) -> String {
    if query.split_whitespace().count() > 1 { highlight_words(name, query) } else { highlight(name, query) }
}

fn print_snapshot(snap: &Snapshot) {
    let panel = if snap.open { "open" } else { "closed" };
    let loading = if snap.loading { " • loading" } else { "" };
    println!("query {:?} • {:?} • panel {}{}", snap.query, snap.mode, panel, loading);
    let chips: Vec<String> = snap
        .categories
        .iter()
        .map(|c| if c.active { format!("[*{} {}]", c.name, c.count) } else { format!("[{} {}]", c.name, c.count) })
        .collect();
    if !chips.is_empty() {
        println!("{}", chips.join(" "));
    }
    if snap.term_too_short {
        println!("type at least {} characters", snap.min_query_len);
    } else if snap.no_results {
        println!("no results");
    }
    if let Some(line) = &snap.search_for_term {
        println!("{}", line);
    }
    for g in &snap.groups {
        println!("{} ({})", g.category, g.total);
        for r in &g.items {
            println!("  {:<8} {}", r.id, mark(&r.name, &snap.query));
        }
        if g.has_more {
            println!("  ... {} more", g.total - g.items.len());
        }
        if g.has_show_all {
            println!("  -> all in {}", g.category);
        }
    }
    if snap.mode.is_initial() && !snap.recent.is_empty() {
        println!("recent: {}", snap.recent.join(", "));
    }
}
