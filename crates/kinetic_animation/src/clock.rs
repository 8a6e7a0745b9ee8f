//! Monotonic time sources
//!
//! Every timestamp handed to frame callbacks is milliseconds since the
//! clock's origin. Animations derive progress from elapsed time rather than
//! frame counts, so frame pacing never changes what they display.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A monotonic millisecond clock
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since the clock's origin
    fn now_ms(&self) -> f64;
}

/// Wall clock backed by `Instant`
#[derive(Clone, Copy, Debug)]
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
    fn now_ms(&self) -> f64 {
        self.origin.elapsed().as_secs_f64() * 1000.0
    }
}

/// Manually advanced clock for simulations and tests
///
/// Clones share the same time, so a test can hold one copy while the
/// scheduler owns another.
#[derive(Clone, Debug, Default)]
pub struct ManualClock {
    /// f64 bit pattern of the current time in ms
    now_bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start at a specific time
    pub fn starting_at(now_ms: f64) -> Self {
        let clock = Self::new();
        clock.set(now_ms);
        clock
    }

    /// Jump to an absolute time. Going backwards is ignored.
    pub fn set(&self, now_ms: f64) {
        self.update(|current| now_ms.max(current));
    }

    /// Move time forward by `delta_ms`
    pub fn advance(&self, delta_ms: f64) {
        self.update(|current| current + delta_ms.max(0.0));
    }

    /// Atomically replace the time with `next(current)`, never moving it back
    fn update(&self, next: impl Fn(f64) -> f64) {
        // None (time would not move forward) leaves the clock untouched
        let _ = self
            .now_bits
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |bits| {
                let current = f64::from_bits(bits);
                let next = next(current);
                (next > current).then(|| next.to_bits())
            });
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> f64 {
        f64::from_bits(self.now_bits.load(Ordering::Acquire))
    }
}
