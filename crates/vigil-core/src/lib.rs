//! vigil-core — shared contract and types for the Vigil polling scheduler.
//!
//! Defines what a monitored item must expose for the scheduler to drive it,
//! the snapshot types the dashboard consumes, and the named value cache used
//! for ad hoc cached computations outside the entity model.
//!
//! # Architecture
//!
//! ```text
//! Pollable (trait)
//!   ├── EntityId (kind + key identity, kind matched case-insensitively)
//!   ├── due / in-progress flags (owned and updated by the entity)
//!   └── MetricPoller (trait) — one polled data source per instance
//!
//! StatusSnapshot ── point-in-time health summary (serde, dashboard-facing)
//! ValueCache ────── generic key/value store, purged via the CACHE_KIND
//!                   sentinel on the on-demand poll path
//! ```

pub mod cache;
pub mod error;
pub mod pollable;
pub mod types;

pub use cache::{CACHE_KIND, ValueCache};
pub use error::{PollError, PollResult};
pub use pollable::{EntityId, MetricPoller, Pollable};
pub use types::{EntityInfo, Health, StatusSnapshot, WorkerPoolSnapshot};
