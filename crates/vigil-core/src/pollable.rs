//! The pollable entity contract.
//!
//! A monitored item (host, database, network device) implements [`Pollable`];
//! each of its data sources implements [`MetricPoller`]. The scheduler is
//! polymorphic over these traits and has no knowledge of concrete kinds.
//!
//! The `due` and `in_progress` flags are owned by the entity, not the
//! scheduler: the entity must flip them atomically around its own poll
//! execution, because they are the coordination signal the sweep reads.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::PollError;

/// Identity of a pollable entity: `(kind, key)`, unique among all
/// registered entities at any instant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId {
    /// Concrete entity family, e.g. "Host", "Database".
    pub kind: String,
    /// Unique key within the kind, e.g. a hostname or connection name.
    pub key: String,
}

impl EntityId {
    pub fn new(kind: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            key: key.into(),
        }
    }

    /// Identity match: kind is case-insensitive, key is exact.
    pub fn matches(&self, kind: &str, key: &str) -> bool {
        self.kind.eq_ignore_ascii_case(kind) && self.key == key
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.kind, self.key)
    }
}

/// A monitored entity the scheduler can drive.
#[async_trait]
pub trait Pollable: Send + Sync {
    /// The entity's `(kind, key)` identity.
    fn id(&self) -> EntityId;

    /// Whether any of the entity's pollers has reached its next-due time.
    fn is_due(&self) -> bool;

    /// Whether a poll of this entity is currently executing.
    ///
    /// The sweep skips entities with this flag set; a poller that stalls
    /// forever leaves it set and silently drops the entity out of future
    /// sweeps (degraded, not fatal).
    fn in_progress(&self) -> bool;

    /// Refresh the entity's pollers. `force` polls them regardless of
    /// due-ness. The entity maintains its own `in_progress`/`due`
    /// bookkeeping around execution.
    async fn poll_now(&self, force: bool);

    /// The metric pollers this entity owns.
    fn pollers(&self) -> Vec<Arc<dyn MetricPoller>>;
}

/// A single polled data source within an entity.
#[async_trait]
pub trait MetricPoller: Send + Sync {
    /// Opaque id, unique within the owning entity and assumed globally
    /// unique for lookup purposes.
    fn id(&self) -> String;

    /// Outcome of the most recent poll.
    fn last_poll_succeeded(&self) -> bool;

    /// Forced, awaitable poll. Implementations record success or failure
    /// in their own state before returning.
    async fn poll(&self) -> Result<(), PollError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_matches_kind_case_insensitively() {
        let id = EntityId::new("Host", "web-01");
        assert!(id.matches("host", "web-01"));
        assert!(id.matches("HOST", "web-01"));
        assert!(!id.matches("Host", "web-02"));
        assert!(!id.matches("Database", "web-01"));
    }

    #[test]
    fn id_key_is_case_sensitive() {
        let id = EntityId::new("Host", "Web-01");
        assert!(!id.matches("host", "web-01"));
    }

    #[test]
    fn id_displays_as_kind_slash_key() {
        let id = EntityId::new("Host", "web-01");
        assert_eq!(id.to_string(), "Host/web-01");
    }

    #[test]
    fn id_round_trips_through_json() {
        let id = EntityId::new("Host", "web-01");
        let json = serde_json::to_string(&id).unwrap();
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
