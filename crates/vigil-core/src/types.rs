//! Snapshot types for the status and worker-capacity surfaces.
//!
//! All types are serializable so the (external) dashboard and health
//! endpoints can render them directly. Snapshots are built fresh on each
//! request and never stored.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::pollable::Pollable;

/// Overall scheduler health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Health {
    /// Loop alive, at least one entity registered.
    Good,
    /// Loop alive but nothing is registered yet.
    Unknown,
    /// The poll loop's background task is not alive.
    Critical,
}

/// Per-entity introspection row included in [`StatusSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EntityInfo {
    pub kind: String,
    pub key: String,
    pub due: bool,
    pub in_progress: bool,
    pub poller_count: usize,
}

impl EntityInfo {
    /// Capture a row from a live entity.
    pub fn of(entity: &dyn Pollable) -> Self {
        let id = entity.id();
        Self {
            kind: id.kind,
            key: id.key,
            due: entity.is_due(),
            in_progress: entity.in_progress(),
            poller_count: entity.pollers().len(),
        }
    }
}

/// Point-in-time health summary of the scheduler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StatusSnapshot {
    pub health: Health,
    /// Coarse diagnosis when health is not `Good`
    /// ("loop thread dead", "no entities registered").
    pub reason: Option<String>,
    /// Unix timestamp (seconds) when the scheduler was created.
    pub started_at_epoch: u64,
    /// Unix timestamp (seconds) when the last sweep finished dispatching.
    /// Records completion of the scan, not of the dispatched polls.
    pub last_sweep_epoch: Option<u64>,
    /// Cumulative sweeps performed.
    pub sweep_count: u64,
    /// Sweep ticks skipped due to lock contention (if counting is enabled).
    pub skipped_sweeps: u64,
    /// Cumulative polls handed to the task runner. Stays flat when no
    /// runner was ever configured.
    pub dispatched_polls: u64,
    /// Polls currently executing on the task runner.
    pub in_flight: u64,
    /// Total registered entities.
    pub entity_count: usize,
    /// Total metric pollers across all entities.
    pub poller_count: usize,
    /// Entity count grouped by concrete kind; values sum to `entity_count`.
    pub by_kind: HashMap<String, usize>,
    /// Full entity list for introspection.
    pub entities: Vec<EntityInfo>,
}

/// Worker capacity of the underlying execution substrate,
/// built fresh on each request.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct WorkerPoolSnapshot {
    pub min_workers: usize,
    pub max_workers: usize,
    pub available_workers: usize,
}
