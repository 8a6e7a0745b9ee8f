//! Frame scheduler
//!
//! A single frame-driven tick shared by every active animation. Consumers
//! subscribe a callback with [`SchedulerHandle::schedule`] and receive the
//! current clock time (ms) once per frame until they cancel or return
//! [`FrameAction::Finish`].
//!
//! The scheduler is an explicit object injected into progress sources via its
//! weak [`SchedulerHandle`]; there is no global instance. It only needs
//! ticking while at least one subscription is active, which is what
//! [`AnimationScheduler::tick`] reports.
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{AnimationScheduler, FrameAction, ManualClock};
//! use std::sync::Arc;
//!
//! let clock = ManualClock::new();
//! let scheduler = AnimationScheduler::new(Arc::new(clock.clone()));
//!
//! let frame = scheduler
//!     .handle()
//!     .schedule(|now_ms| {
//!         if now_ms >= 100.0 { FrameAction::Finish } else { FrameAction::Continue }
//!     })
//!     .unwrap();
//!
//! clock.advance(50.0);
//! assert!(scheduler.tick());
//! clock.advance(50.0);
//! assert!(!scheduler.tick());
//! assert!(!frame.is_active());
//! ```

use crate::clock::Clock;
use crate::error::{AnimationError, Result};
use slotmap::{new_key_type, SlotMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, TryLockError, Weak};
use std::thread;
use std::time::{Duration, Instant};

new_key_type! {
    /// Identifies one frame subscription
    pub struct FrameId;
}

/// What a frame callback wants after running
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameAction {
    /// Keep receiving frames
    Continue,
    /// Done; the subscription is cancelled and the callback dropped
    Finish,
}

/// Per-frame callback, given the current clock time in milliseconds
pub type TickCallback = Box<dyn FnMut(f64) -> FrameAction + Send>;

struct Subscription {
    callback: Arc<Mutex<TickCallback>>,
    cancelled: Arc<AtomicBool>,
}

/// Internal state of the scheduler
struct SchedulerInner {
    subscriptions: SlotMap<FrameId, Subscription>,
    /// False between `shutdown()` and `init()`
    running: bool,
    frame: u64,
}

fn lock_inner(inner: &Mutex<SchedulerInner>) -> MutexGuard<'_, SchedulerInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The scheduler that ticks all frame subscriptions
///
/// Held by whoever owns the frame loop; components receive a
/// [`SchedulerHandle`] instead.
pub struct AnimationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
    clock: Arc<dyn Clock>,
}

impl AnimationScheduler {
    /// Create a running scheduler driven by `clock`
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SchedulerInner {
                subscriptions: SlotMap::with_key(),
                running: true,
                frame: 0,
            })),
            clock,
        }
    }

    /// Accept subscriptions again after a `shutdown()`
    ///
    /// A freshly constructed scheduler is already initialized; calling this
    /// again is a no-op.
    pub fn init(&self) {
        let mut inner = lock_inner(&self.inner);
        if !inner.running {
            tracing::debug!("AnimationScheduler: init");
            inner.running = true;
        }
    }

    /// Cancel every subscription and refuse new ones until `init()`
    pub fn shutdown(&self) {
        let drained: Vec<Subscription> = {
            let mut inner = lock_inner(&self.inner);
            inner.running = false;
            inner.subscriptions.drain().map(|(_, sub)| sub).collect()
        };
        for sub in &drained {
            sub.cancelled.store(true, Ordering::Release);
        }
        tracing::debug!(cancelled = drained.len(), "AnimationScheduler: shutdown");
    }

    pub fn is_running(&self) -> bool {
        lock_inner(&self.inner).running
    }

    /// Get a handle to this scheduler for passing to components
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            inner: Arc::downgrade(&self.inner),
            clock: Arc::clone(&self.clock),
        }
    }

    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Run one frame
    ///
    /// Callbacks run against a snapshot of the subscriptions taken at the
    /// start of the frame, with the scheduler lock released, so callbacks may
    /// schedule or cancel freely. A subscription cancelled earlier in the same
    /// frame is skipped; one added during the frame first runs next frame.
    ///
    /// Returns true if any subscription is still active (needs another tick).
    pub fn tick(&self) -> bool {
        let now = self.clock.now_ms();

        let snapshot: Vec<(FrameId, Arc<Mutex<TickCallback>>, Arc<AtomicBool>)> = {
            let mut inner = lock_inner(&self.inner);
            if !inner.running {
                return false;
            }
            inner.frame += 1;
            inner
                .subscriptions
                .iter()
                .map(|(id, sub)| (id, Arc::clone(&sub.callback), Arc::clone(&sub.cancelled)))
                .collect()
        };

        tracing::trace!(now_ms = now, subscriptions = snapshot.len(), "tick");

        for (id, callback, cancelled) in snapshot {
            if cancelled.load(Ordering::Acquire) {
                continue;
            }

            let action = match callback.try_lock() {
                Ok(mut cb) => cb(now),
                Err(TryLockError::Poisoned(poisoned)) => {
                    let mut cb = poisoned.into_inner();
                    cb(now)
                }
                // Already running further up the stack (a callback ticked the
                // scheduler re-entrantly); skip it for this nested frame.
                Err(TryLockError::WouldBlock) => continue,
            };

            if action == FrameAction::Finish {
                cancelled.store(true, Ordering::Release);
                // Dropped outside the lock: the callback may own other handles
                let removed = lock_inner(&self.inner).subscriptions.remove(id);
                drop(removed);
                tracing::debug!(handle = ?id, "frame subscription finished");
            }
        }

        self.active_count() > 0
    }

    /// Tick on the caller's thread at `frame_interval` while subscriptions are active
    ///
    /// Returns the number of frames run. Stops early after `max_frames` if given.
    pub fn run_until_idle(&self, frame_interval: Duration, max_frames: Option<u64>) -> u64 {
        let mut frames = 0;

        while self.active_count() > 0 {
            if max_frames.is_some_and(|max| frames >= max) {
                break;
            }

            let start = Instant::now();
            let has_active = self.tick();
            frames += 1;

            if !has_active {
                break;
            }

            let elapsed = start.elapsed();
            if elapsed < frame_interval {
                thread::sleep(frame_interval - elapsed);
            }
        }

        frames
    }

    /// Number of live subscriptions
    pub fn active_count(&self) -> usize {
        lock_inner(&self.inner).subscriptions.len()
    }

    /// Frames ticked so far
    pub fn frame_count(&self) -> u64 {
        lock_inner(&self.inner).frame
    }
}

/// A weak handle to the scheduler
///
/// This is passed to components that need frame callbacks. It won't prevent
/// the scheduler from being dropped; scheduling through a dead handle fails
/// with [`AnimationError::SchedulerShutdown`].
#[derive(Clone)]
pub struct SchedulerHandle {
    inner: Weak<Mutex<SchedulerInner>>,
    clock: Arc<dyn Clock>,
}

impl SchedulerHandle {
    /// Subscribe `callback` to every frame
    pub fn schedule<F>(&self, callback: F) -> Result<FrameHandle>
    where
        F: FnMut(f64) -> FrameAction + Send + 'static,
    {
        let inner = self
            .inner
            .upgrade()
            .ok_or(AnimationError::SchedulerShutdown)?;

        let cancelled = Arc::new(AtomicBool::new(false));
        let id = {
            let mut guard = lock_inner(&inner);
            if !guard.running {
                return Err(AnimationError::SchedulerShutdown);
            }
            guard.subscriptions.insert(Subscription {
                callback: Arc::new(Mutex::new(Box::new(callback))),
                cancelled: Arc::clone(&cancelled),
            })
        };

        tracing::debug!(handle = ?id, "frame subscription scheduled");

        Ok(FrameHandle {
            id,
            cancelled,
            scheduler: self.inner.clone(),
        })
    }

    /// Current clock time in ms
    pub fn now_ms(&self) -> f64 {
        self.clock.now_ms()
    }

    /// Check if the scheduler is still alive
    pub fn is_alive(&self) -> bool {
        self.inner.strong_count() > 0
    }
}

/// Owner of one frame subscription
///
/// Cancelling is immediate and idempotent: once `cancel()` returns (or the
/// handle is dropped) the callback is never invoked again, even if the
/// cancellation happens inside a callback running in the current frame.
#[derive(Debug)]
pub struct FrameHandle {
    id: FrameId,
    cancelled: Arc<AtomicBool>,
    scheduler: Weak<Mutex<SchedulerInner>>,
}

impl FrameHandle {
    pub fn id(&self) -> FrameId {
        self.id
    }

    /// Stop further callbacks. Safe to call any number of times.
    pub fn cancel(&self) {
        if self.cancelled.swap(true, Ordering::AcqRel) {
            return;
        }
        if let Some(inner) = self.scheduler.upgrade() {
            let removed = lock_inner(&inner).subscriptions.remove(self.id);
            drop(removed);
        }
        tracing::debug!(handle = ?self.id, "frame subscription cancelled");
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::Acquire)
    }

    /// Still subscribed (not cancelled, finished, or shut down)
    pub fn is_active(&self) -> bool {
        !self.is_cancelled() && self.scheduler.strong_count() > 0
    }
}

impl Drop for FrameHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}
