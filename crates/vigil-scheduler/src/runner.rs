//! Task runner — the injected execution substrate for dispatched polls.
//!
//! The scheduler never creates per-poll threads itself; it hands each poll
//! to a [`TaskRunner`] and moves on. [`TokioRunner`] is the in-repo
//! substrate backed by `tokio::spawn`; embedders with their own worker
//! pools supply their own implementation.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use tracing::debug;

use vigil_core::WorkerPoolSnapshot;

/// Boxed unit of asynchronous work.
pub type BoxFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Accepts a unit of asynchronous work and arranges its execution without
/// blocking the caller.
pub trait TaskRunner: Send + Sync {
    /// Submit work for execution. Must not wait for the work to finish.
    fn submit(&self, work: BoxFuture);

    /// Worker capacity of the substrate, built fresh per request.
    fn capacity(&self) -> WorkerPoolSnapshot;
}

/// Task runner backed by the ambient tokio runtime.
///
/// Tracks a live-task gauge; the min/max bounds are advisory (tokio does
/// not cap spawned tasks) and feed the capacity snapshot.
pub struct TokioRunner {
    min_workers: usize,
    max_workers: usize,
    live: Arc<AtomicUsize>,
}

impl TokioRunner {
    pub fn new() -> Self {
        let parallelism = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(4);
        Self::with_limits(1, parallelism * 4)
    }

    pub fn with_limits(min_workers: usize, max_workers: usize) -> Self {
        Self {
            min_workers,
            max_workers,
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Number of submitted tasks still running.
    pub fn live_tasks(&self) -> usize {
        self.live.load(Ordering::Relaxed)
    }
}

impl Default for TokioRunner {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskRunner for TokioRunner {
    fn submit(&self, work: BoxFuture) {
        let live = Arc::clone(&self.live);
        live.fetch_add(1, Ordering::Relaxed);
        tokio::spawn(async move {
            work.await;
            let remaining = live.fetch_sub(1, Ordering::Relaxed) - 1;
            debug!(live = remaining, "runner task finished");
        });
    }

    fn capacity(&self) -> WorkerPoolSnapshot {
        let live = self.live.load(Ordering::Relaxed);
        WorkerPoolSnapshot {
            min_workers: self.min_workers,
            max_workers: self.max_workers,
            available_workers: self.max_workers.saturating_sub(live),
        }
    }
}
