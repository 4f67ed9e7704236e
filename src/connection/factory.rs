//! Builds and caches database handles for connection configs.

use super::cache::HandleCache;
use crate::config::ConnectionConfig;
use crate::db::{Connector, DatabaseClient};
use crate::error::Result;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

/// Produces database handles, reusing a cached handle while it is fresh.
///
/// Shared across sessions behind an `Arc`. Lookups take the read lock;
/// a miss takes the write lock and checks again before connecting, so
/// concurrent first calls for the same config open a single pool.
pub struct ConnectionFactory {
    connector: Arc<dyn Connector>,
    cache: RwLock<HandleCache>,
}

impl ConnectionFactory {
    pub fn new(connector: Arc<dyn Connector>, ttl: Duration) -> Self {
        Self {
            connector,
            cache: RwLock::new(HandleCache::new(ttl)),
        }
    }

    /// Returns a handle for `config`, connecting on a cache miss.
    ///
    /// Fails with `ConfigIncomplete` before touching the connector when any
    /// field is empty, and with `Connection` when the connector fails.
    pub async fn obtain(&self, config: &ConnectionConfig) -> Result<Arc<dyn DatabaseClient>> {
        config.validate()?;

        if let Some(handle) = self.cache.read().await.get(config) {
            debug!("Reusing cached handle for {}", config.display_string());
            return Ok(handle);
        }

        let mut cache = self.cache.write().await;
        if let Some(handle) = cache.get(config) {
            return Ok(handle);
        }

        info!("Opening connection to {}", config.display_string());
        let handle = self.connector.connect(config).await?;
        cache.put(config.clone(), Arc::clone(&handle));

        Ok(handle)
    }

    /// Drops the cached handle for one config.
    pub async fn invalidate(&self, config: &ConnectionConfig) {
        if self.cache.write().await.invalidate(config) {
            debug!("Invalidated handle for {}", config.display_string());
        }
    }

    /// Drops every cached handle. The next `obtain` reconnects.
    pub async fn invalidate_all(&self) {
        self.cache.write().await.clear();
        info!("Connection cache cleared");
    }
}
