use atomic_float::AtomicF64;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Instant;

/// Source of wall-clock time in seconds. Only differences between readings matter.
pub trait Clock {
    fn now(&self) -> f64;
}

/// Monotonic clock anchored at construction.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
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
    fn now(&self) -> f64 {
        self.origin.elapsed().as_secs_f64()
    }
}

/// Hand-driven clock. Clones share the same time source, so a driver (or test)
/// can keep one handle and advance it while the session holds another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Arc<AtomicF64>,
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            time: Arc::new(AtomicF64::new(start)),
        }
    }

    pub fn set(&self, time: f64) {
        self.time.store(time, Ordering::Release);
    }

    pub fn advance(&self, seconds: f64) {
        let current = self.time.load(Ordering::Acquire);
        self.time.store(current + seconds, Ordering::Release);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.load(Ordering::Acquire)
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> f64 {
        (**self).now()
    }
}
