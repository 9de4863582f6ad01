//! vigil-scheduler — the global polling scheduler.
//!
//! Drives periodic refreshes of every registered pollable entity and serves
//! on-demand refreshes of a single entity or metric poller. Concrete
//! protocol pollers, the presentation layer, and config loading live
//! outside this crate; they talk to the scheduler through `vigil-core`.
//!
//! # Architecture
//!
//! ```text
//! Scheduler
//!   ├── Registry (kind/key → Arc<dyn Pollable>, mutation-locked)
//!   ├── TaskRunner (injected substrate; TokioRunner by default)
//!   ├── Poll loop (supervisor task → tick loop → sweep_once)
//!   │     └── sweep lock (timed acquisition, contended ticks skipped)
//!   ├── ValueCache (purged via the CACHE_KIND sentinel)
//!   └── StatusSnapshot (health + counters, built fresh per request)
//! ```
//!
//! # Concurrency
//!
//! Two locks, never nested: the registry mutation lock (short-held) and the
//! sweep serialization lock (bounded 500ms wait, never held across an
//! awaited poll). Sweeps dispatch fire-and-forget onto the task runner and
//! only the on-demand path awaits poll completion. Stopping the loop is
//! cooperative and does not interrupt in-flight polls.

pub mod config;
pub mod registry;
pub mod runner;
pub mod scheduler;

pub use config::SchedulerConfig;
pub use registry::Registry;
pub use runner::{BoxFuture, TaskRunner, TokioRunner};
pub use scheduler::Scheduler;

#[cfg(test)]
pub(crate) mod testutil;
