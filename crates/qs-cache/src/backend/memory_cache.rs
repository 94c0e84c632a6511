//! Process-local cache backend.
//!
//! Used when Redis is disabled and as the backend of tests. Expiry follows the
//! tokio clock so paused-time tests can step over TTLs.

use super::Cache;
use crate::{CacheError, CacheResult};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::time::Instant;

struct Entry {
    value: Vec<u8>,
    expires_at: Instant,
}

/// In-memory cache with TTL expiry and glob pattern deletes.
#[derive(Default)]
pub struct MemoryCache {
    entries: Mutex<HashMap<String, Entry>>,
    unavailable: AtomicBool,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Simulates a backend outage: every operation fails until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of live entries.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.lock().values().filter(|e| e.expires_at > now).count()
    }

    /// Returns true when no live entry exists.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sorted list of live keys.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        let now = Instant::now();
        let mut keys: Vec<String> = self
            .entries
            .lock()
            .iter()
            .filter(|(_, e)| e.expires_at > now)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }

    /// Remaining lifetime of a key.
    #[must_use]
    pub fn ttl(&self, key: &str) -> Option<Duration> {
        let now = Instant::now();
        self.entries
            .lock()
            .get(key)
            .filter(|e| e.expires_at > now)
            .map(|e| e.expires_at - now)
    }

    fn check_available(&self) -> CacheResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CacheError::backend("memory cache switched off"))
        } else {
            Ok(())
        }
    }

    fn insert(entries: &mut HashMap<String, Entry>, key: &str, value: &[u8], ttl: Duration) {
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_vec(),
                expires_at: Instant::now() + ttl.max(Duration::from_secs(1)),
            },
        );
    }
}

impl std::fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.lock().len())
            .field("unavailable", &self.unavailable.load(Ordering::Relaxed))
            .finish()
    }
}

/// Glob match supporting `*` and `?`, the subset used by key patterns.
pub(crate) fn glob_match(pattern: &str, text: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let t: Vec<char> = text.chars().collect();
    let (mut pi, mut ti) = (0, 0);
    let mut star: Option<(usize, usize)> = None;

    while ti < t.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == t[ti]) {
            pi += 1;
            ti += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ti));
            pi += 1;
        } else if let Some((sp, st)) = star {
            pi = sp + 1;
            ti = st + 1;
            star = Some((sp, st + 1));
        } else {
            return false;
        }
    }

    p[pi..].iter().all(|&c| c == '*')
}

#[async_trait]
impl Cache for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Vec<u8>> {
        self.check_available()?;
        let mut entries = self.entries.lock();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(entry.value.clone()),
            Some(_) => {
                entries.remove(key);
                Err(CacheError::NotFound)
            }
            None => Err(CacheError::NotFound),
        }
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<()> {
        self.check_available()?;
        Self::insert(&mut self.entries.lock(), key, value, ttl);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &[u8], ttl: Duration) -> CacheResult<bool> {
        self.check_available()?;
        let mut entries = self.entries.lock();
        if entries.get(key).is_some_and(|e| e.expires_at > Instant::now()) {
            return Ok(false);
        }
        Self::insert(&mut entries, key, value, ttl);
        Ok(true)
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        self.check_available()?;
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> CacheResult<bool> {
        self.check_available()?;
        Ok(self.ttl(key).is_some())
    }

    async fn mget(&self, keys: &[String]) -> CacheResult<HashMap<String, Vec<u8>>> {
        self.check_available()?;
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(keys
            .iter()
            .filter_map(|key| {
                entries
                    .get(key)
                    .filter(|e| e.expires_at > now)
                    .map(|e| (key.clone(), e.value.clone()))
            })
            .collect())
    }

    async fn mset(&self, entries: &HashMap<String, Vec<u8>>, ttl: Duration) -> CacheResult<()> {
        self.check_available()?;
        let mut store = self.entries.lock();
        for (key, value) in entries {
            Self::insert(&mut store, key, value, ttl);
        }
        Ok(())
    }

    async fn delete_pattern(&self, pattern: &str) -> CacheResult<u64> {
        self.check_available()?;
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !glob_match(pattern, key));
        Ok((before - entries.len()) as u64)
    }

    async fn ping(&self) -> CacheResult<()> {
        self.check_available()
    }
}
