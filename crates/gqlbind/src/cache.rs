//! Key-value cache drivers used for persisted queries.

use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::{debug, trace};

/// Name of the built-in in-memory driver.
pub const MEMORY_DRIVER: &str = "memory";

/// A string cache with per-entry expiry.
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn has(&self, key: &str) -> bool;

    async fn get(&self, key: &str) -> Option<String>;

    async fn set(&self, key: &str, value: String, ttl: Duration);
}

/// A cached value with TTL support.
#[derive(Clone, Debug)]
pub struct CachedEntry {
    pub value: Arc<str>,
    pub cached_at: Instant,
    pub ttl: Duration,
}

impl CachedEntry {
    pub fn new(value: String, ttl: Duration) -> Self {
        Self {
            value: Arc::from(value),
            cached_at: Instant::now(),
            ttl,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.cached_at.elapsed() > self.ttl
    }
}

/// Process-local cache backed by a `DashMap`. Expired entries are dropped
/// on read and swept on every write.
#[derive(Clone, Default)]
pub struct MemoryCache {
    entries: Arc<DashMap<String, CachedEntry>>,
}

impl fmt::Debug for MemoryCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryCache")
            .field("entries", &self.entries.len())
            .finish()
    }
}

impl MemoryCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn live(&self, key: &str) -> Option<CachedEntry> {
        let entry = self.entries.get(key).map(|e| e.value().clone())?;
        if entry.is_expired() {
            trace!(key = %key, "Cache entry expired");
            self.entries.remove(key);
            return None;
        }
        Some(entry)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

#[async_trait]
impl CacheStore for MemoryCache {
    async fn has(&self, key: &str) -> bool {
        self.live(key).is_some()
    }

    async fn get(&self, key: &str) -> Option<String> {
        self.live(key).map(|entry| entry.value.to_string())
    }

    async fn set(&self, key: &str, value: String, ttl: Duration) {
        let before = self.entries.len();
        self.entries.retain(|_, entry| !entry.is_expired());
        let swept = before.saturating_sub(self.entries.len());
        if swept > 0 {
            trace!(swept, "Swept expired cache entries");
        }
        self.entries
            .insert(key.to_string(), CachedEntry::new(value, ttl));
    }
}

/// Named cache drivers with a default.
pub struct CacheManager {
    drivers: DashMap<String, Arc<dyn CacheStore>>,
    default_driver: String,
}

impl fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.drivers.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("CacheManager")
            .field("drivers", &names)
            .field("default_driver", &self.default_driver)
            .finish()
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheManager {
    /// A manager whose default driver is an in-memory cache.
    #[must_use]
    pub fn new() -> Self {
        let manager = Self {
            drivers: DashMap::new(),
            default_driver: MEMORY_DRIVER.to_string(),
        };
        manager.extend(MEMORY_DRIVER, Arc::new(MemoryCache::new()));
        manager
    }

    /// Registers a driver under a name, replacing any previous one.
    pub fn extend(&self, name: impl Into<String>, store: Arc<dyn CacheStore>) {
        let name = name.into();
        debug!(driver = %name, "Registering cache driver");
        self.drivers.insert(name, store);
    }

    /// Returns the named driver, or the default one for `None`.
    ///
    /// An unknown name falls back to the default driver.
    #[must_use]
    pub fn driver(&self, name: Option<&str>) -> Arc<dyn CacheStore> {
        let wanted = name.unwrap_or(&self.default_driver);
        if let Some(store) = self.drivers.get(wanted) {
            return Arc::clone(store.value());
        }
        debug!(driver = %wanted, "Unknown cache driver, using the default");
        self.default_store()
    }

    fn default_store(&self) -> Arc<dyn CacheStore> {
        match self.drivers.get(&self.default_driver) {
            Some(store) => Arc::clone(store.value()),
            None => Arc::new(MemoryCache::new()),
        }
    }

    #[must_use]
    pub fn has_driver(&self, name: &str) -> bool {
        self.drivers.contains_key(name)
    }
}
