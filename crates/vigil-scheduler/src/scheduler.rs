//! The scheduler — sweep dispatch, poll loop, on-demand polls, status.
//!
//! One explicit object owns the registry, the value cache, both locks, the
//! counters, and the injected task runner; nothing lives in process-wide
//! statics, so tests run independent instances side by side.
//!
//! The sweep path is fire-and-forget: a tick scans a snapshot of the
//! registry and submits forced polls to the task runner without awaiting
//! them. Only the on-demand path suspends its caller until the targeted
//! poll finishes. Sweeps are serialized by a timed lock; a tick that cannot
//! take the lock within the configured wait is skipped, never queued.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use vigil_core::{
    CACHE_KIND, EntityInfo, Health, MetricPoller, Pollable, StatusSnapshot, ValueCache,
    WorkerPoolSnapshot,
};

use crate::config::SchedulerConfig;
use crate::registry::Registry;
use crate::runner::TaskRunner;

/// The global polling scheduler. A cheap clonable handle over shared
/// state, like `ValueCache`.
#[derive(Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

struct Inner {
    config: SchedulerConfig,
    registry: Registry,
    cache: ValueCache,
    /// Injected execution substrate. Unset means sweep dispatch is a
    /// silent no-op.
    runner: RwLock<Option<Arc<dyn TaskRunner>>>,
    /// Serializes sweeps. Taken with a bounded wait; never held across an
    /// awaited poll completion.
    sweep_lock: Mutex<()>,
    sweep_count: AtomicU64,
    skipped_sweeps: AtomicU64,
    dispatched_polls: AtomicU64,
    /// Polls currently executing on the runner.
    in_flight: Arc<AtomicU64>,
    started_at_epoch: u64,
    /// Unix seconds of the last completed sweep scan; 0 = never.
    last_sweep_epoch: AtomicU64,
    shutdown_tx: watch::Sender<bool>,
    loop_handle: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        let (shutdown_tx, _) = watch::channel(false);
        Self {
            inner: Arc::new(Inner {
                config,
                registry: Registry::new(),
                cache: ValueCache::new(),
                runner: RwLock::new(None),
                sweep_lock: Mutex::new(()),
                sweep_count: AtomicU64::new(0),
                skipped_sweeps: AtomicU64::new(0),
                dispatched_polls: AtomicU64::new(0),
                in_flight: Arc::new(AtomicU64::new(0)),
                started_at_epoch: epoch_secs(),
                last_sweep_epoch: AtomicU64::new(0),
                shutdown_tx,
                loop_handle: Mutex::new(None),
            }),
        }
    }

    // ── Wiring ──────────────────────────────────────────────────────

    /// Wire the execution substrate. Must precede useful dispatch;
    /// calling again replaces the runner (last write wins).
    pub async fn configure(&self, runner: Arc<dyn TaskRunner>) {
        let mut slot = self.inner.runner.write().await;
        if slot.is_some() {
            warn!("task runner reconfigured, replacing existing runner");
        }
        *slot = Some(runner);
        info!("task runner configured");
    }

    /// Capacity snapshot of the configured substrate, if any.
    pub async fn runner_capacity(&self) -> Option<WorkerPoolSnapshot> {
        let slot = self.inner.runner.read().await;
        slot.as_ref().map(|r| r.capacity())
    }

    // ── Registry surface ────────────────────────────────────────────

    pub async fn register(&self, entity: Arc<dyn Pollable>) -> bool {
        self.inner.registry.register(entity).await
    }

    pub async fn unregister(&self, kind: &str, key: &str) -> bool {
        self.inner.registry.unregister(kind, key).await
    }

    pub async fn lookup(&self, kind: &str, key: &str) -> Option<Arc<dyn Pollable>> {
        self.inner.registry.lookup(kind, key).await
    }

    pub async fn list_by_kind(&self, kind: &str) -> Vec<Arc<dyn Pollable>> {
        self.inner.registry.list_by_kind(kind).await
    }

    pub async fn lookup_poller(
        &self,
        poller_id: &str,
    ) -> Option<(Arc<dyn Pollable>, Arc<dyn MetricPoller>)> {
        self.inner.registry.lookup_poller(poller_id).await
    }

    /// Live entity list, for introspection beyond the status snapshot.
    pub async fn entities(&self) -> Vec<Arc<dyn Pollable>> {
        self.inner.registry.snapshot().await
    }

    /// The named value cache behind the [`CACHE_KIND`] sentinel.
    pub fn cache(&self) -> &ValueCache {
        &self.inner.cache
    }

    // ── Sweep dispatch ──────────────────────────────────────────────

    /// Run one sweep. Returns the number of polls dispatched.
    ///
    /// Skipped entirely (backpressure by omission) if the sweep lock
    /// cannot be taken within `sweep_lock_wait` — a previous sweep is
    /// still scanning.
    pub async fn sweep_once(&self) -> usize {
        let inner = &self.inner;
        let guard = match tokio::time::timeout(
            inner.config.sweep_lock_wait,
            inner.sweep_lock.lock(),
        )
        .await
        {
            Ok(guard) => guard,
            Err(_) => {
                if inner.config.count_skipped_sweeps {
                    inner.skipped_sweeps.fetch_add(1, Ordering::Relaxed);
                }
                debug!("sweep still in flight, tick skipped");
                return 0;
            }
        };

        inner.sweep_count.fetch_add(1, Ordering::Relaxed);

        let runner = { inner.runner.read().await.clone() };
        let dispatched = match runner {
            Some(runner) => {
                // The scan runs as its own task so a panic from a hostile
                // entity is contained here: the tick is lost, the lock is
                // released, and the next tick proceeds normally.
                let scheduler = self.clone();
                let scan = tokio::spawn(async move {
                    scheduler.scan_and_dispatch(runner).await
                });
                match scan.await {
                    Ok(dispatched) => dispatched,
                    Err(e) => {
                        error!(error = %e, "sweep scan aborted");
                        0
                    }
                }
            }
            // Latent misconfiguration, not an error: the sweep runs but
            // performs no work.
            None => 0,
        };

        // Completion of the dispatch scan, not of the dispatched polls.
        inner.last_sweep_epoch.store(epoch_secs(), Ordering::Relaxed);
        drop(guard);

        if dispatched > 0 {
            debug!(dispatched, "sweep dispatched polls");
        }
        dispatched
    }

    /// Scan a registry snapshot and submit forced polls for every entity
    /// that is due and not already in progress.
    async fn scan_and_dispatch(&self, runner: Arc<dyn TaskRunner>) -> usize {
        let entities = self.inner.registry.snapshot().await;
        let mut dispatched = 0;

        for entity in entities {
            if entity.in_progress() || !entity.is_due() {
                continue;
            }

            let id = entity.id();
            let guard = InFlightGuard::new(Arc::clone(&self.inner.in_flight));
            runner.submit(Box::pin(async move {
                let _guard = guard;
                entity.poll_now(true).await;
                debug!(entity = %id, "dispatched poll finished");
            }));

            self.inner.dispatched_polls.fetch_add(1, Ordering::Relaxed);
            dispatched += 1;
        }

        dispatched
    }

    // ── Poll loop ───────────────────────────────────────────────────

    /// Start the background poll loop. Idempotent: a live loop is left
    /// alone.
    pub async fn start(&self) {
        let mut slot = self.inner.loop_handle.lock().await;
        if let Some(handle) = slot.as_ref()
            && !handle.is_finished()
        {
            debug!("poll loop already running");
            return;
        }

        // send_replace updates the flag even while no receiver is
        // subscribed, unlike send.
        self.inner.shutdown_tx.send_replace(false);
        let scheduler = self.clone();
        *slot = Some(tokio::spawn(async move {
            scheduler.run_supervisor().await;
        }));
        info!(
            sweep_interval_ms = self.inner.config.sweep_interval.as_millis() as u64,
            "poll loop started"
        );
    }

    /// Request cooperative shutdown. In-flight polls are not interrupted
    /// and there is no termination handshake.
    pub fn stop(&self) {
        // The tick loop may not be subscribed yet (before its first poll
        // of the channel, or during a supervisor restart window), so the
        // flag must be written unconditionally.
        self.inner.shutdown_tx.send_replace(true);
        info!("poll loop shutdown requested");
    }

    /// Outer supervisory loop: keeps the tick loop alive across panics.
    async fn run_supervisor(self) {
        loop {
            let scheduler = self.clone();
            let inner_loop = tokio::spawn(async move {
                scheduler.run_tick_loop().await;
            });

            match inner_loop.await {
                // Clean exit: the tick loop observed shutdown.
                Ok(()) => break,
                Err(e) => {
                    if *self.inner.shutdown_tx.borrow() {
                        // Expected during shutdown; swallow.
                        break;
                    }
                    error!(error = %e, "poll loop crashed, restarting");
                    tokio::time::sleep(self.inner.config.restart_delay).await;
                }
            }
        }
        info!("poll loop stopped");
    }

    /// Inner loop: sweep, sleep, repeat until shutdown.
    async fn run_tick_loop(self) {
        let mut shutdown = self.inner.shutdown_tx.subscribe();
        // Shutdown may already have been requested while this loop was
        // being (re)spawned.
        if *shutdown.borrow() {
            return;
        }
        loop {
            tokio::select! {
                _ = tokio::time::sleep(self.inner.config.sweep_interval) => {
                    self.sweep_once().await;
                }
                _ = shutdown.changed() => {
                    if *shutdown.borrow() {
                        debug!("tick loop observed shutdown");
                        break;
                    }
                }
            }
        }
    }

    // ── On-demand polls ─────────────────────────────────────────────

    /// Poll a single entity (or one of its pollers) right now, awaited.
    ///
    /// The reserved [`CACHE_KIND`] kind routes `key` to the value cache
    /// as a purge. Unknown entities and pollers report `false`, never an
    /// error. With a poller id the returned flag is that poller's
    /// post-poll success; without one the result is `true` as soon as the
    /// entity's poll ran, regardless of per-poller outcomes.
    pub async fn poll_now(&self, kind: &str, key: &str, poller_id: Option<&str>) -> bool {
        if kind.eq_ignore_ascii_case(CACHE_KIND) {
            let purged = self.inner.cache.purge(key).await;
            debug!(key, purged, "cache purge via on-demand poll");
            return true;
        }

        let Some(entity) = self.inner.registry.lookup(kind, key).await else {
            debug!(kind, key, "on-demand poll for unknown entity");
            return false;
        };

        match poller_id {
            Some(poller_id) => {
                let Some(poller) = entity
                    .pollers()
                    .into_iter()
                    .find(|p| p.id() == poller_id)
                else {
                    debug!(entity = %entity.id(), poller_id, "on-demand poll for unknown poller");
                    return false;
                };

                if let Err(e) = poller.poll().await {
                    warn!(entity = %entity.id(), poller_id, error = %e, "on-demand poll failed");
                }
                poller.last_poll_succeeded()
            }
            None => {
                entity.poll_now(true).await;
                true
            }
        }
    }

    // ── Status ──────────────────────────────────────────────────────

    /// Point-in-time health summary.
    pub async fn status(&self) -> StatusSnapshot {
        let loop_alive = {
            let slot = self.inner.loop_handle.lock().await;
            slot.as_ref().is_some_and(|h| !h.is_finished())
        };

        let entities = self.inner.registry.snapshot().await;
        let (health, reason) = if !loop_alive {
            (Health::Critical, Some("loop thread dead".to_string()))
        } else if entities.is_empty() {
            (Health::Unknown, Some("no entities registered".to_string()))
        } else {
            (Health::Good, None)
        };

        let mut by_kind: HashMap<String, usize> = HashMap::new();
        let mut poller_count = 0;
        let mut rows = Vec::with_capacity(entities.len());
        for entity in &entities {
            *by_kind.entry(entity.id().kind).or_default() += 1;
            poller_count += entity.pollers().len();
            rows.push(EntityInfo::of(entity.as_ref()));
        }

        let last_sweep = self.inner.last_sweep_epoch.load(Ordering::Relaxed);
        StatusSnapshot {
            health,
            reason,
            started_at_epoch: self.inner.started_at_epoch,
            last_sweep_epoch: (last_sweep > 0).then_some(last_sweep),
            sweep_count: self.inner.sweep_count.load(Ordering::Relaxed),
            skipped_sweeps: self.inner.skipped_sweeps.load(Ordering::Relaxed),
            dispatched_polls: self.inner.dispatched_polls.load(Ordering::Relaxed),
            in_flight: self.inner.in_flight.load(Ordering::Relaxed),
            entity_count: entities.len(),
            poller_count,
            by_kind,
            entities: rows,
        }
    }
}

/// Holds the in-flight gauge up for the lifetime of one dispatched poll.
/// Decrements on drop, so a panicking poll cannot leak the gauge.
struct InFlightGuard(Arc<AtomicU64>);

impl InFlightGuard {
    fn new(gauge: Arc<AtomicU64>) -> Self {
        gauge.fetch_add(1, Ordering::Relaxed);
        Self(gauge)
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Current Unix epoch in seconds.
fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}
