use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use anyhow::{anyhow, Result};
use rustc_hash::FxHashMap;

use crate::KvStore;

/// In-memory store for tests and hosts without durable storage.
/// Reads and writes can be made to fail to exercise degraded paths.
#[derive(Default)]
pub struct MemoryStore {
    slots: Mutex<FxHashMap<String, Vec<u8>>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    pub fn fail_reads(&self, on: bool) { self.fail_reads.store(on, Ordering::Relaxed); }

    /// Simulates a full or unavailable backing store.
    pub fn fail_writes(&self, on: bool) { self.fail_writes.store(on, Ordering::Relaxed); }

    /// Raw slot contents, bypassing failure injection.
    pub fn peek(&self, key: &str) -> Option<Vec<u8>> {
        self.slots.lock().ok().and_then(|m| m.get(key).cloned())
    }
}

impl KvStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        if self.fail_reads.load(Ordering::Relaxed) { return Err(anyhow!("read refused for {}", key)); }
        let slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        Ok(slots.get(key).cloned())
    }

    fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) { return Err(anyhow!("quota exceeded writing {}", key)); }
        let mut slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        slots.insert(key.to_string(), value.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        if self.fail_writes.load(Ordering::Relaxed) { return Err(anyhow!("remove refused for {}", key)); }
        let mut slots = self.slots.lock().map_err(|_| anyhow!("memory store poisoned"))?;
        slots.remove(key);
        Ok(())
    }
}
