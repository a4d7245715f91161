//! Key/value stores with time-to-live
//!
//! Copyright (c) 2025 Courier Team
//! Licensed under the MIT or Apache-2.0 license
//!
//! The engine only needs `get` and `set` from the response cache, the
//! rule-set cache and the mock cache. [`MemoryStore`] is the in-process
//! implementation; anything shared across processes implements [`Store`].

use crate::error::StoreError;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Cache-aside key/value contract
///
/// Implementations must be safe for concurrent use; the engine performs no
/// locking or request coalescing of its own.
pub trait Store<V>: Send + Sync {
    /// Fetch a live entry
    fn get(&self, key: &str) -> StoreResult<Option<V>>;

    /// Write an entry; `None` ttl never expires
    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> StoreResult<()>;
}

/// Stored value with its expiry
#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
    expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| now < at)
    }
}

/// Configuration for [`MemoryStore`]
#[derive(Debug, Clone)]
pub struct MemoryStoreConfig {
    /// Name used in errors and logs
    pub name: String,
    /// Maximum number of entries; the oldest insertion is evicted first
    pub max_entries: usize,
}

impl Default for MemoryStoreConfig {
    fn default() -> Self {
        Self {
            name: "memory".to_string(),
            max_entries: 1000,
        }
    }
}

/// In-memory store with lazy expiry
#[derive(Debug)]
pub struct MemoryStore<V> {
    config: MemoryStoreConfig,
    entries: Mutex<HashMap<String, Entry<V>>>,
}

impl<V: Clone> MemoryStore<V> {
    pub fn new() -> Self {
        Self::with_config(MemoryStoreConfig::default())
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self::with_config(MemoryStoreConfig {
            name: name.into(),
            ..Default::default()
        })
    }

    pub fn with_config(config: MemoryStoreConfig) -> Self {
        Self {
            config,
            entries: Mutex::new(HashMap::new()),
        }
    }

    /// Number of stored entries, expired ones included until next touched
    pub fn len(&self) -> usize {
        self.entries.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove every entry
    pub fn clear(&self) -> StoreResult<()> {
        self.lock()?.clear();
        Ok(())
    }

    fn lock(&self) -> StoreResult<std::sync::MutexGuard<'_, HashMap<String, Entry<V>>>> {
        self.entries.lock().map_err(|_| StoreError::Poisoned {
            store: self.config.name.clone(),
        })
    }

    fn evict_oldest(entries: &mut HashMap<String, Entry<V>>) {
        let oldest = entries
            .iter()
            .min_by_key(|(_, entry)| entry.inserted_at)
            .map(|(key, _)| key.clone());
        if let Some(key) = oldest {
            entries.remove(&key);
        }
    }
}

impl<V: Clone> Default for MemoryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> Store<V> for MemoryStore<V> {
    fn get(&self, key: &str) -> StoreResult<Option<V>> {
        let now = Instant::now();
        let mut entries = self.lock()?;
        match entries.get(key) {
            Some(entry) if entry.is_live(now) => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.remove(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: V, ttl: Option<Duration>) -> StoreResult<()> {
        let now = Instant::now();
        let mut entries = self.lock()?;

        if !entries.contains_key(key) && entries.len() >= self.config.max_entries {
            entries.retain(|_, entry| entry.is_live(now));
            if entries.len() >= self.config.max_entries {
                Self::evict_oldest(&mut entries);
            }
        }

        entries.insert(
            key.to_string(),
            Entry {
                value,
                inserted_at: now,
                expires_at: ttl.map(|ttl| now + ttl),
            },
        );
        Ok(())
    }
}
