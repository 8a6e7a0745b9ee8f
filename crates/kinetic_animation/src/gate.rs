//! Visibility gate
//!
//! Watches an element's intersection with its scroll container's viewport
//! (grown or shrunk by a root margin) and fires when the element first
//! satisfies the threshold. In one-shot mode the gate latches and
//! disconnects its frame observer after firing; in repeatable mode it keeps
//! observing and fires again on every re-entry.
//!
//! Consumers react through [`VisibilityGate::on_fire`] rather than polling
//! [`VisibilityGate::fired`]. Subscribing to a one-shot gate that has already
//! fired invokes the callback straight away, so an element that mounts while
//! visible is never missed.
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{AnimationScheduler, GateConfig, ManualClock, VisibilityGate};
//! use kinetic_core::{shared_layout, Bounds, LayoutTree};
//! use std::sync::Arc;
//!
//! let mut tree = LayoutTree::new();
//! let page = tree.add_container(Bounds::new(0.0, 0.0, 1000.0, 800.0), 3000.0);
//! let stats = tree.add_element(page, Bounds::new(0.0, 1200.0, 1000.0, 200.0)).unwrap();
//! let layout = shared_layout(tree);
//!
//! let clock = ManualClock::new();
//! let scheduler = AnimationScheduler::new(Arc::new(clock.clone()));
//! let gate = VisibilityGate::arm(&scheduler.handle(), layout.clone(), stats, GateConfig::new(-80.0, true)).unwrap();
//!
//! assert!(!gate.fired());
//! layout.lock().unwrap().set_scroll(page, 600.0).unwrap();
//! scheduler.tick();
//! assert!(gate.fired());
//! ```

use crate::error::Result;
use crate::scheduler::{FrameAction, FrameHandle, SchedulerHandle};
use kinetic_core::{lock_layout, Bounds, Edges, ElementId, SharedLayout};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Fire callback, given the clock time (ms) of the transition
pub type FireCallback = Box<dyn FnMut(f64) + Send>;

/// Intersection threshold and firing mode
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GateConfig {
    /// Root margin applied to the viewport; negative values shrink it
    pub margin: Edges,
    /// Fraction of the element's area that must be inside the margin box.
    /// Zero means any overlap.
    pub amount: f32,
    /// Latch after the first fire
    pub once: bool,
}

impl GateConfig {
    pub fn new(margin: impl Into<Edges>, once: bool) -> Self {
        Self {
            margin: margin.into(),
            amount: 0.0,
            once,
        }
    }

    pub fn with_amount(mut self, amount: f32) -> Self {
        self.amount = amount.clamp(0.0, 1.0);
        self
    }

    /// Whether `element` satisfies the threshold against `viewport`
    pub fn is_satisfied(&self, element: Bounds, viewport: Bounds) -> bool {
        let root = viewport.expand(self.margin);
        // Edge contact counts, so zero-size markers inside the root fire
        let Some(overlap) = element.intersection_inclusive(&root) else {
            return false;
        };
        if self.amount <= 0.0 {
            return true;
        }
        let area = element.area();
        let ratio = if area > 0.0 { overlap.area() / area } else { 1.0 };
        ratio >= self.amount
    }
}

impl Default for GateConfig {
    fn default() -> Self {
        Self::new(Edges::zero(), true)
    }
}

/// Observable gate state
///
/// `armed` tracks whether the threshold is currently satisfied (latched in
/// one-shot mode); `fired` becomes true on the first fire and stays true.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GateState {
    pub armed: bool,
    pub fired: bool,
}

struct GateShared {
    config: GateConfig,
    state: GateState,
    fire_count: u32,
    last_fire_ms: Option<f64>,
    subscribers: Vec<FireCallback>,
    observer: Option<FrameHandle>,
}

fn lock_shared(shared: &Mutex<GateShared>) -> MutexGuard<'_, GateShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A shared handle to one gate
///
/// Clones refer to the same gate. Dropping the last clone disconnects the
/// frame observer.
#[derive(Clone)]
pub struct VisibilityGate {
    shared: Arc<Mutex<GateShared>>,
}

impl VisibilityGate {
    /// A gate driven only by [`VisibilityGate::notify`]
    pub fn new(config: GateConfig) -> Self {
        Self {
            shared: Arc::new(Mutex::new(GateShared {
                config,
                state: GateState::default(),
                fire_count: 0,
                last_fire_ms: None,
                subscribers: Vec::new(),
                observer: None,
            })),
        }
    }

    /// Observe `element` in `layout` every frame
    ///
    /// The threshold is checked once immediately, so an element that is
    /// already visible fires during `arm`. A one-shot gate that fires here
    /// never subscribes to the scheduler.
    pub fn arm(
        scheduler: &SchedulerHandle,
        layout: SharedLayout,
        element: ElementId,
        config: GateConfig,
    ) -> Result<Self> {
        let gate = Self::new(config);

        if let Some(visible) = check(&layout, element, &config) {
            gate.notify_at(visible, scheduler.now_ms());
        }
        if config.once && gate.fired() {
            return Ok(gate);
        }

        let weak: Weak<Mutex<GateShared>> = Arc::downgrade(&gate.shared);
        let observer = scheduler.schedule(move |now_ms| {
            let Some(shared) = weak.upgrade() else {
                return FrameAction::Finish;
            };
            let gate = VisibilityGate { shared };

            // A removed element holds the current state
            if let Some(visible) = check(&layout, element, &config) {
                gate.notify_at(visible, now_ms);
            }

            if config.once && gate.fired() {
                tracing::debug!("visibility gate latched, disconnecting observer");
                FrameAction::Finish
            } else {
                FrameAction::Continue
            }
        })?;

        lock_shared(&gate.shared).observer = Some(observer);
        Ok(gate)
    }

    pub fn config(&self) -> GateConfig {
        lock_shared(&self.shared).config
    }

    pub fn state(&self) -> GateState {
        lock_shared(&self.shared).state
    }

    /// True once the gate has fired at least once
    pub fn fired(&self) -> bool {
        self.state().fired
    }

    pub fn is_armed(&self) -> bool {
        self.state().armed
    }

    /// Number of fire events so far (at most 1 in one-shot mode)
    pub fn fire_count(&self) -> u32 {
        lock_shared(&self.shared).fire_count
    }

    /// Whether a frame observer is still attached
    pub fn is_observing(&self) -> bool {
        lock_shared(&self.shared)
            .observer
            .as_ref()
            .is_some_and(FrameHandle::is_active)
    }

    /// Stop observing; the current state is kept
    pub fn disconnect(&self) {
        let observer = lock_shared(&self.shared).observer.take();
        drop(observer);
    }

    /// Run `callback` on every fire
    ///
    /// If the gate is currently armed (a one-shot gate that already fired, or
    /// a repeatable gate whose element is in view) the callback runs now with
    /// the time of the last fire.
    pub fn on_fire<F>(&self, callback: F)
    where
        F: FnMut(f64) + Send + 'static,
    {
        let mut callback: FireCallback = Box::new(callback);

        let replay = {
            let guard = lock_shared(&self.shared);
            if guard.state.armed {
                guard.last_fire_ms
            } else {
                None
            }
        };

        if let Some(at) = replay {
            callback(at);
        }

        let mut guard = lock_shared(&self.shared);
        // A latched one-shot gate will never fire again
        if guard.config.once && guard.state.fired {
            return;
        }
        guard.subscribers.push(callback);
    }

    /// Feed a raw intersection result, timestamped 0
    pub fn notify(&self, intersecting: bool) {
        self.notify_at(intersecting, 0.0);
    }

    /// Feed a raw intersection result observed at `now_ms`
    ///
    /// Fires on a false → true transition of `armed`. One-shot gates ignore
    /// everything after the first fire.
    pub fn notify_at(&self, intersecting: bool, now_ms: f64) {
        let mut callbacks = {
            let mut guard = lock_shared(&self.shared);
            let once = guard.config.once;

            if once && guard.state.fired {
                return;
            }
            if !intersecting {
                guard.state.armed = false;
                return;
            }
            if guard.state.armed {
                return;
            }

            guard.state.armed = true;
            guard.state.fired = true;
            guard.fire_count += 1;
            guard.last_fire_ms = Some(now_ms);
            tracing::debug!(fire_count = guard.fire_count, once, "visibility gate fired");
            std::mem::take(&mut guard.subscribers)
        };

        // Callbacks run unlocked so they may query or subscribe to the gate
        for callback in callbacks.iter_mut() {
            callback(now_ms);
        }

        let mut guard = lock_shared(&self.shared);
        if guard.config.once {
            drop(guard);
            drop(callbacks);
        } else {
            let added = std::mem::take(&mut guard.subscribers);
            callbacks.extend(added);
            guard.subscribers = callbacks;
        }
    }
}

impl std::fmt::Debug for VisibilityGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = lock_shared(&self.shared);
        f.debug_struct("VisibilityGate")
            .field("config", &guard.config)
            .field("state", &guard.state)
            .field("fire_count", &guard.fire_count)
            .finish()
    }
}

/// `None` when the element or its container is gone
fn check(layout: &SharedLayout, element: ElementId, config: &GateConfig) -> Option<bool> {
    let layout = lock_layout(layout);
    let container = layout.element_container(element)?;
    let viewport = layout.container(container)?.viewport;
    let bounds = layout.visible_bounds(element)?;
    Some(config.is_satisfied(bounds, viewport))
}
