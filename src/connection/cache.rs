//! Time-bounded cache of database handles.

use crate::config::ConnectionConfig;
use crate::db::DatabaseClient;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

struct CachedHandle {
    handle: Arc<dyn DatabaseClient>,
    created_at: Instant,
}

/// Caches one handle per connection config for a fixed time-to-live.
///
/// Expired entries are never returned; they are replaced on the next `put`.
pub struct HandleCache {
    ttl: Duration,
    entries: HashMap<ConnectionConfig, CachedHandle>,
}

impl HandleCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Returns the cached handle for `config` if it is younger than the TTL.
    pub fn get(&self, config: &ConnectionConfig) -> Option<Arc<dyn DatabaseClient>> {
        self.entries
            .get(config)
            .filter(|entry| entry.created_at.elapsed() < self.ttl)
            .map(|entry| Arc::clone(&entry.handle))
    }

    /// Stores a handle, replacing any previous entry for the same config.
    pub fn put(&mut self, config: ConnectionConfig, handle: Arc<dyn DatabaseClient>) {
        self.entries.insert(
            config,
            CachedHandle {
                handle,
                created_at: Instant::now(),
            },
        );
    }

    /// Removes the entry for one config. Returns true if one was present.
    pub fn invalidate(&mut self, config: &ConnectionConfig) -> bool {
        self.entries.remove(config).is_some()
    }

    /// Removes every entry regardless of age.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Number of entries held, including expired ones.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
