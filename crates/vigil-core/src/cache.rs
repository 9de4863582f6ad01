//! Named value cache — generic key/value store outside the entity model.
//!
//! Holds ad hoc cached computations addressed by an arbitrary string key.
//! The on-demand poll path routes requests whose kind equals [`CACHE_KIND`]
//! here as a purge, bypassing the entity registry entirely.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;

/// Reserved sentinel kind that addresses the value cache instead of the
/// entity registry. Matched case-insensitively.
pub const CACHE_KIND: &str = "cache";

/// Clonable handle over the shared cache map.
#[derive(Debug, Clone, Default)]
pub struct ValueCache {
    entries: Arc<RwLock<HashMap<String, serde_json::Value>>>,
}

impl ValueCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace an entry.
    pub async fn put(&self, key: impl Into<String>, value: serde_json::Value) {
        let mut entries = self.entries.write().await;
        entries.insert(key.into(), value);
    }

    /// Fetch a copy of an entry.
    pub async fn get(&self, key: &str) -> Option<serde_json::Value> {
        let entries = self.entries.read().await;
        entries.get(key).cloned()
    }

    /// Remove an entry. True iff it was present.
    pub async fn purge(&self, key: &str) -> bool {
        let mut entries = self.entries.write().await;
        entries.remove(key).is_some()
    }

    /// Drop every entry.
    pub async fn purge_all(&self) {
        let mut entries = self.entries.write().await;
        entries.clear();
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}
