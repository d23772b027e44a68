// src/cache/mod.rs

//! Result cache: latest successful output per script body.
//!
//! Entries never expire and the map is unbounded; it lives as long as the
//! runner that owns it.

pub mod hash;

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, info};

pub use hash::ScriptHash;

/// Content-hash keyed store of captured output.
///
/// Lookups from the run-start path and stores from the run-completion path
/// share one lock.
#[derive(Debug, Default)]
pub struct ResultCache {
    entries: Mutex<HashMap<ScriptHash, String>>,
}

impl ResultCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cached output for `hash`, if a successful run has been recorded.
    pub fn lookup(&self, hash: &ScriptHash) -> Option<String> {
        let hit = self.entries().get(hash).cloned();
        match hit {
            Some(_) => debug!(hash = %hash.short(), "result cache hit"),
            None => debug!(hash = %hash.short(), "result cache miss"),
        }
        hit
    }

    /// Record `output` for `hash`, replacing any earlier entry.
    pub fn store(&self, hash: ScriptHash, output: String) {
        let bytes = output.len();
        let replaced = self.entries().insert(hash.clone(), output).is_some();
        info!(hash = %hash.short(), bytes, replaced, "stored run output in result cache");
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ScriptHash, String>> {
        // A panic while holding the lock cannot leave the map half-written.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;

    #[test]
    fn lookup_on_empty_cache_misses() {
        let cache = ResultCache::new();
        assert!(cache.lookup(&ScriptHash::of("a")).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn store_overwrites_previous_entry() {
        let cache = ResultCache::new();
        let key = ScriptHash::of("println(1)");
        cache.store(key.clone(), "1\n".to_string());
        cache.store(key.clone(), "one\n".to_string());
        assert_eq!(cache.lookup(&key).as_deref(), Some("one\n"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn concurrent_stores_and_lookups_do_not_lose_entries() {
        let cache = Arc::new(ResultCache::new());
        let workers: Vec<_> = (0..8)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for j in 0..50 {
                        let key = ScriptHash::of(&format!("script-{i}-{j}"));
                        cache.store(key.clone(), format!("{i}:{j}"));
                        assert!(cache.lookup(&key).is_some());
                    }
                })
            })
            .collect();
        for w in workers {
            w.join().unwrap();
        }
        assert_eq!(cache.len(), 8 * 50);
    }
}
