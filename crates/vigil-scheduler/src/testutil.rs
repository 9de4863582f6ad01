//! Test doubles for the pollable contract.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use vigil_core::{EntityId, MetricPoller, PollError, Pollable};

/// Scriptable metric poller: configurable outcome and latency.
pub(crate) struct FakePoller {
    id: String,
    succeed_next: AtomicBool,
    last_ok: AtomicBool,
    poll_count: AtomicU64,
    delay: Duration,
}

impl FakePoller {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            succeed_next: AtomicBool::new(true),
            last_ok: AtomicBool::new(false),
            poll_count: AtomicU64::new(0),
            delay: Duration::ZERO,
        })
    }

    pub fn slow(id: &str, delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            succeed_next: AtomicBool::new(true),
            last_ok: AtomicBool::new(false),
            poll_count: AtomicU64::new(0),
            delay,
        })
    }

    pub fn set_succeed(&self, ok: bool) {
        self.succeed_next.store(ok, Ordering::SeqCst);
    }

    pub fn poll_count(&self) -> u64 {
        self.poll_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetricPoller for FakePoller {
    fn id(&self) -> String {
        self.id.clone()
    }

    fn last_poll_succeeded(&self) -> bool {
        self.last_ok.load(Ordering::SeqCst)
    }

    async fn poll(&self) -> Result<(), PollError> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.poll_count.fetch_add(1, Ordering::SeqCst);
        let ok = self.succeed_next.load(Ordering::SeqCst);
        self.last_ok.store(ok, Ordering::SeqCst);
        if ok {
            Ok(())
        } else {
            Err(PollError::Probe(format!("{} refused the probe", self.id)))
        }
    }
}

/// Pollable entity with externally controllable `due`/`in_progress` flags.
///
/// Maintains the contract's bookkeeping: `poll_now` raises `in_progress`,
/// polls each owned poller, clears `due`, then lowers `in_progress`.
pub(crate) struct FakeEntity {
    id: EntityId,
    due: AtomicBool,
    in_progress: AtomicBool,
    poll_runs: AtomicU64,
    pollers: Vec<Arc<FakePoller>>,
}

impl FakeEntity {
    pub fn new(kind: &str, key: &str) -> Arc<Self> {
        Self::with_poller_handles(kind, key, Vec::new())
    }

    pub fn with_pollers(kind: &str, key: &str, poller_ids: &[&str]) -> Arc<Self> {
        let pollers = poller_ids.iter().map(|id| FakePoller::new(id)).collect();
        Self::with_poller_handles(kind, key, pollers)
    }

    pub fn with_poller_handles(
        kind: &str,
        key: &str,
        pollers: Vec<Arc<FakePoller>>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId::new(kind, key),
            due: AtomicBool::new(false),
            in_progress: AtomicBool::new(false),
            poll_runs: AtomicU64::new(0),
            pollers,
        })
    }

    pub fn set_due(&self, due: bool) {
        self.due.store(due, Ordering::SeqCst);
    }

    pub fn set_in_progress(&self, in_progress: bool) {
        self.in_progress.store(in_progress, Ordering::SeqCst);
    }

    pub fn poll_runs(&self) -> u64 {
        self.poll_runs.load(Ordering::SeqCst)
    }

    pub fn poller(&self, index: usize) -> Arc<FakePoller> {
        Arc::clone(&self.pollers[index])
    }
}

#[async_trait]
impl Pollable for FakeEntity {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn is_due(&self) -> bool {
        self.due.load(Ordering::SeqCst)
    }

    fn in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    async fn poll_now(&self, force: bool) {
        if !force && !self.is_due() {
            return;
        }
        self.in_progress.store(true, Ordering::SeqCst);
        self.poll_runs.fetch_add(1, Ordering::SeqCst);
        for poller in &self.pollers {
            let _ = poller.poll().await;
        }
        self.due.store(false, Ordering::SeqCst);
        self.in_progress.store(false, Ordering::SeqCst);
    }

    fn pollers(&self) -> Vec<Arc<dyn MetricPoller>> {
        self.pollers
            .iter()
            .map(|p| Arc::clone(p) as Arc<dyn MetricPoller>)
            .collect()
    }
}

/// Entity whose poll panics mid-flight, for gauge accounting tests.
/// Always due, never in progress.
pub(crate) struct PanickingPollEntity {
    id: EntityId,
}

impl PanickingPollEntity {
    pub fn new(kind: &str, key: &str) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId::new(kind, key),
        })
    }
}

#[async_trait]
impl Pollable for PanickingPollEntity {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn is_due(&self) -> bool {
        true
    }

    fn in_progress(&self) -> bool {
        false
    }

    async fn poll_now(&self, _force: bool) {
        panic!("poll exploded");
    }

    fn pollers(&self) -> Vec<Arc<dyn MetricPoller>> {
        Vec::new()
    }
}

/// Entity whose first due-check panics, for sweep containment tests.
pub(crate) struct PanicOnceEntity {
    id: EntityId,
    fired: AtomicBool,
}

impl PanicOnceEntity {
    pub fn new(kind: &str, key: &str) -> Arc<Self> {
        Arc::new(Self {
            id: EntityId::new(kind, key),
            fired: AtomicBool::new(false),
        })
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Pollable for PanicOnceEntity {
    fn id(&self) -> EntityId {
        self.id.clone()
    }

    fn is_due(&self) -> bool {
        if !self.fired.swap(true, Ordering::SeqCst) {
            panic!("due-check exploded");
        }
        false
    }

    fn in_progress(&self) -> bool {
        false
    }

    async fn poll_now(&self, _force: bool) {}

    fn pollers(&self) -> Vec<Arc<dyn MetricPoller>> {
        Vec::new()
    }
}
