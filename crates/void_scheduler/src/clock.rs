//! Time sources for slice deadlines

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// A monotonic clock measured from an arbitrary origin
pub trait Clock {
    /// Current time since the clock's origin
    fn now(&self) -> Duration;
}

/// Wall clock backed by [`Instant`]
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    /// Create a clock whose origin is now
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

struct ManualInner {
    now: Cell<Duration>,
    step: Cell<Duration>,
}

/// Deterministic clock for tests and headless hosts.
///
/// Clones share the same time. Every reading advances the clock by `step`
/// (zero by default), which lets tests model work that costs time.
#[derive(Clone)]
pub struct ManualClock {
    inner: Rc<ManualInner>,
}

impl ManualClock {
    /// Create a clock frozen at zero
    pub fn new() -> Self {
        Self::with_step(Duration::ZERO)
    }

    /// Create a clock that advances by `step` on every reading
    pub fn with_step(step: Duration) -> Self {
        Self {
            inner: Rc::new(ManualInner {
                now: Cell::new(Duration::ZERO),
                step: Cell::new(step),
            }),
        }
    }

    /// Move the clock forward
    pub fn advance(&self, by: Duration) {
        self.inner.now.set(self.inner.now.get() + by);
    }

    /// Change the per-reading step
    pub fn set_step(&self, step: Duration) {
        self.inner.step.set(step);
    }

    /// Current time without advancing
    pub fn peek(&self) -> Duration {
        self.inner.now.get()
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ManualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManualClock")
            .field("now", &self.inner.now.get())
            .field("step", &self.inner.step.get())
            .finish()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        let now = self.inner.now.get();
        self.inner.now.set(now + self.inner.step.get());
        now
    }
}
