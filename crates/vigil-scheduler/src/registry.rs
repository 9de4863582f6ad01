//! Entity registry — deduplicated set of pollable entities.
//!
//! Keyed by `(kind, key)` with case-insensitive kinds. Mutations take the
//! write lock only for the duration of the map change; the sweep never
//! iterates under the lock — it takes a snapshot copy, so registration and
//! removal mid-sweep cannot race the scan.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::RwLock;
use tracing::debug;

use vigil_core::{MetricPoller, Pollable};

/// Map key: lowercased kind + exact key.
fn map_key(kind: &str, key: &str) -> (String, String) {
    (kind.to_ascii_lowercase(), key.to_string())
}

/// Thread-safe registry of pollable entities.
#[derive(Default)]
pub struct Registry {
    entities: RwLock<HashMap<(String, String), Arc<dyn Pollable>>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entity. False (and no change) if the identity is already
    /// registered.
    pub async fn register(&self, entity: Arc<dyn Pollable>) -> bool {
        let id = entity.id();
        let mut entities = self.entities.write().await;
        if entities.contains_key(&map_key(&id.kind, &id.key)) {
            debug!(entity = %id, "duplicate registration rejected");
            return false;
        }
        entities.insert(map_key(&id.kind, &id.key), entity);
        debug!(entity = %id, "entity registered");
        true
    }

    /// Remove an entity. True iff it was present.
    pub async fn unregister(&self, kind: &str, key: &str) -> bool {
        let mut entities = self.entities.write().await;
        let removed = entities.remove(&map_key(kind, key)).is_some();
        if removed {
            debug!(kind, key, "entity unregistered");
        }
        removed
    }

    /// Find an entity by identity, kind matched case-insensitively.
    pub async fn lookup(&self, kind: &str, key: &str) -> Option<Arc<dyn Pollable>> {
        let entities = self.entities.read().await;
        entities.get(&map_key(kind, key)).cloned()
    }

    /// All entities of a kind, case-insensitive match.
    pub async fn list_by_kind(&self, kind: &str) -> Vec<Arc<dyn Pollable>> {
        let entities = self.entities.read().await;
        entities
            .iter()
            .filter(|((k, _), _)| k.eq_ignore_ascii_case(kind))
            .map(|(_, e)| Arc::clone(e))
            .collect()
    }

    /// Find a metric poller by id, scanning every entity's pollers.
    pub async fn lookup_poller(
        &self,
        poller_id: &str,
    ) -> Option<(Arc<dyn Pollable>, Arc<dyn MetricPoller>)> {
        let snapshot = self.snapshot().await;
        for entity in snapshot {
            if let Some(poller) = entity.pollers().into_iter().find(|p| p.id() == poller_id) {
                return Some((entity, poller));
            }
        }
        None
    }

    /// Copy of the current entity set, for lock-free iteration.
    pub async fn snapshot(&self) -> Vec<Arc<dyn Pollable>> {
        let entities = self.entities.read().await;
        entities.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entities.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entities.read().await.is_empty()
    }
}
