//! Facet persistence: a small key/value port plus the recent-query history built on it.

#![forbid(unsafe_code)]

use anyhow::{Context, Result};
use metrics::histogram;

mod memory;
pub mod recent;

pub use memory::MemoryStore;
pub use recent::RecentSearches;

/// Byte-oriented key/value slot store. Every call may fail; callers decide
/// whether a failure matters.
pub trait KvStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;
    fn set(&self, key: &str, value: &[u8]) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// SQLite-backed store. Simple, synchronous; one row per key.
pub struct SqliteStore {
    db: std::sync::Mutex<rusqlite::Connection>,
}

impl SqliteStore {
    pub fn open_default() -> Result<Self> {
        let path = std::env::var("FACET_DB_PATH").unwrap_or_else(|_| default_db_path());
        Self::open(&path)
    }

    pub fn open(path: &str) -> Result<Self> {
        let started = std::time::Instant::now();
        let db = rusqlite::Connection::open(path).with_context(|| format!("opening recent-search db {}", path))?;
        db.pragma_update(None, "journal_mode", "WAL").ok();
        db.pragma_update(None, "synchronous", "NORMAL").ok();
        db.execute(
            "CREATE TABLE IF NOT EXISTS kv (
                key   TEXT PRIMARY KEY,
                value BLOB NOT NULL
            )",
            [],
        )
        .context("creating kv table")?;
        histogram!("facet_kv_open_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(Self { db: std::sync::Mutex::new(db) })
    }

    fn conn(&self) -> Result<std::sync::MutexGuard<'_, rusqlite::Connection>> {
        self.db.lock().map_err(|_| anyhow::anyhow!("sqlite connection mutex poisoned"))
    }
}

impl KvStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let started = std::time::Instant::now();
        let db = self.conn()?;
        let mut stmt = db.prepare("SELECT value FROM kv WHERE key = ?1")?;
        let mut rows = stmt.query([key])?;
        let out = match rows.next()? {
            Some(row) => Some(row.get::<_, Vec<u8>>(0)?),
            None => None,
        };
        histogram!("facet_kv_get_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(out)
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        let started = std::time::Instant::now();
        let db = self.conn()?;
        db.execute(
            "INSERT INTO kv(key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            (key, value),
        )
        .with_context(|| format!("writing key {}", key))?;
        histogram!("facet_kv_set_ms", started.elapsed().as_secs_f64() * 1000.0);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let db = self.conn()?;
        db.execute("DELETE FROM kv WHERE key = ?1", [key])?;
        Ok(())
    }
}

/// `~/.facet/facet.db`, or `facet.db` in the working directory without a home.
fn default_db_path() -> String {
    let Some(home) = std::env::var_os("HOME") else { return "facet.db".to_string() };
    let dir = std::path::PathBuf::from(home).join(".facet");
    let _ = std::fs::create_dir_all(&dir);
    dir.join("facet.db").to_string_lossy().into_owned()
}
