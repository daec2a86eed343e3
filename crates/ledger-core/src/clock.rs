use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Source of "now" for block timestamps and mining durations.
pub trait Clock: Send + Sync {
    /// Time elapsed since the unix epoch.
    fn now(&self) -> Duration;

    fn timestamp_millis(&self) -> u64 {
        self.now().as_millis() as u64
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    fn now(&self) -> Duration {
        (**self).now()
    }
}

/// Deterministic clock: every reading returns the current value and then moves
/// it forward by `step`, so a mining run measured with two readings takes
/// exactly one step.
#[derive(Debug)]
pub struct ManualClock {
    current_ms: AtomicU64,
    step_ms: AtomicU64,
}

impl ManualClock {
    pub fn new(start: Duration, step: Duration) -> Self {
        Self {
            current_ms: AtomicU64::new(start.as_millis() as u64),
            step_ms: AtomicU64::new(step.as_millis() as u64),
        }
    }

    pub fn set_step(&self, step: Duration) {
        self.step_ms.store(step.as_millis() as u64, Ordering::SeqCst);
    }

    pub fn advance(&self, by: Duration) {
        self.current_ms.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let step = self.step_ms.load(Ordering::SeqCst);
        Duration::from_millis(self.current_ms.fetch_add(step, Ordering::SeqCst))
    }
}
