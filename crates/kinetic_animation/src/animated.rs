//! Composed animations
//!
//! Ready-made pipelines wiring gates, progress sources, springs and mappers
//! together. Each owns exactly one frame subscription while active and
//! cancels it when dropped.
//!
//! - [`AnimatedCounter`]: gate → timed eased tween → formatted text
//! - [`ScrollLinked`]: scroll progress → optional spring → keyframe channels
//! - [`ScrollIndicator`]: container scroll progress → spring → `scale_x`
//! - [`Reveal`]: gate → delayed timed progress → from/to channels
//! - [`Ambient`]: looping timed progress → keyframe channels, from mount

use crate::easing::Easing;
use crate::error::Result;
use crate::gate::{GateConfig, VisibilityGate};
use crate::keyframe::{BreakpointTable, KeyframeMapper, MappedValues};
use crate::progress::{ProgressSource, Repeat, ScrollProgress, TimedProgress};
use crate::scheduler::{FrameAction, FrameHandle, SchedulerHandle};
use crate::spring::{SpringConfig, SpringSmoother};
use crate::tween::{CounterFormat, EasedTween, TweenState};
use kinetic_core::{ContainerId, ElementId, SharedLayout};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ============================================================================
// Counter
// ============================================================================

type CounterConsumer = Arc<Mutex<Box<dyn FnMut(f32, &str) + Send>>>;

/// Counter settings
#[derive(Clone, Debug, PartialEq)]
pub struct CounterConfig {
    pub value: f32,
    pub format: CounterFormat,
    pub duration_ms: f64,
    pub easing: Easing,
    pub gate: GateConfig,
}

impl CounterConfig {
    pub fn new(value: f32, format: CounterFormat) -> Self {
        Self {
            value,
            format,
            ..Self::default()
        }
    }
}

impl Default for CounterConfig {
    fn default() -> Self {
        Self {
            value: 0.0,
            format: CounterFormat::default(),
            duration_ms: 1400.0,
            easing: Easing::EaseOutCubic,
            gate: GateConfig::new(-80.0, true),
        }
    }
}

struct CounterInner {
    tween: EasedTween,
    format: CounterFormat,
    value: f32,
    frame: Option<FrameHandle>,
}

/// A number that counts up from 0 once its element scrolls into view
pub struct AnimatedCounter {
    gate: VisibilityGate,
    inner: Arc<Mutex<CounterInner>>,
}

impl AnimatedCounter {
    /// `consumer` receives `(value, text)` every frame while counting
    pub fn new<F>(
        scheduler: &SchedulerHandle,
        layout: SharedLayout,
        element: ElementId,
        config: CounterConfig,
        consumer: F,
    ) -> Result<Self>
    where
        F: FnMut(f32, &str) + Send + 'static,
    {
        let tween = EasedTween::new(config.value, config.duration_ms)?.with_easing(config.easing);
        let inner = Arc::new(Mutex::new(CounterInner {
            tween,
            format: config.format,
            value: 0.0,
            frame: None,
        }));
        let consumer: CounterConsumer = Arc::new(Mutex::new(Box::new(consumer)));

        let gate = VisibilityGate::arm(scheduler, layout, element, config.gate)?;

        let weak = Arc::downgrade(&inner);
        let scheduler = scheduler.clone();
        gate.on_fire(move |fired_at| {
            start_counter(&weak, &scheduler, &consumer, fired_at);
        });

        Ok(Self { gate, inner })
    }

    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    /// Most recently displayed value
    pub fn value(&self) -> f32 {
        lock(&self.inner).value
    }

    pub fn text(&self) -> String {
        let inner = lock(&self.inner);
        inner.format.format(inner.value)
    }

    pub fn state(&self) -> TweenState {
        lock(&self.inner).tween.state()
    }

    /// Stop counting and stop watching the element
    pub fn cancel(&self) {
        self.gate.disconnect();
        let frame = lock(&self.inner).frame.take();
        drop(frame);
    }
}

fn start_counter(
    weak: &Weak<Mutex<CounterInner>>,
    scheduler: &SchedulerHandle,
    consumer: &CounterConsumer,
    fired_at: f64,
) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    {
        let mut guard = lock(&inner);
        guard.tween.start(fired_at);
        guard.value = 0.0;
    }

    let frame_inner = Weak::clone(weak);
    let consumer = Arc::clone(consumer);
    let scheduled = scheduler.schedule(move |now_ms| {
        let Some(inner) = frame_inner.upgrade() else {
            return FrameAction::Finish;
        };
        let (value, text, settled) = {
            let mut guard = lock(&inner);
            let value = guard.tween.display(now_ms);
            guard.value = value;
            (value, guard.format.format(value), guard.tween.is_settled())
        };

        let mut render = lock(&consumer);
        (*render)(value, &text);

        if settled {
            FrameAction::Finish
        } else {
            FrameAction::Continue
        }
    });

    match scheduled {
        Ok(frame) => {
            // Restarting replaces (and cancels) the previous run
            let previous = lock(&inner).frame.replace(frame);
            drop(previous);
        }
        Err(e) => tracing::warn!(error = %e, "counter could not start"),
    }
}

// ============================================================================
// Scroll-linked
// ============================================================================

/// Scroll progress mapped through keyframe channels every frame
pub struct ScrollLinked {
    frame: FrameHandle,
    latest: Arc<Mutex<MappedValues>>,
}

impl ScrollLinked {
    /// `consumer` receives the channel values every frame until dropped
    ///
    /// With `spring` set, the raw progress is smoothed before mapping.
    pub fn new<F>(
        scheduler: &SchedulerHandle,
        mut source: ScrollProgress,
        spring: Option<SpringConfig>,
        mapper: KeyframeMapper,
        mut consumer: F,
    ) -> Result<Self>
    where
        F: FnMut(&MappedValues) + Send + 'static,
    {
        let initial = source.progress();
        let mut smoother = match spring {
            Some(config) => {
                config.validate()?;
                Some(SpringSmoother::new(config, initial))
            }
            None => None,
        };

        let latest = Arc::new(Mutex::new(mapper.evaluate(initial)));
        let sink = Arc::clone(&latest);

        let frame = scheduler.schedule(move |now_ms| {
            let raw = source.progress();
            let progress = match smoother.as_mut() {
                Some(spring) => spring.update(raw, now_ms),
                None => raw,
            };
            tracing::trace!(raw, progress, "scroll-linked frame");

            let values = mapper.evaluate(progress);
            consumer(&values);
            *lock(&sink) = values;
            FrameAction::Continue
        })?;

        Ok(Self { frame, latest })
    }

    /// Channel values from the last frame
    pub fn values(&self) -> MappedValues {
        lock(&self.latest).clone()
    }

    pub fn is_active(&self) -> bool {
        self.frame.is_active()
    }

    pub fn cancel(&self) {
        self.frame.cancel();
    }
}

/// Page scroll progress bar
///
/// Smooths the container's scroll progress with a spring and exposes it as
/// the bar's horizontal scale.
pub struct ScrollIndicator {
    linked: ScrollLinked,
}

impl ScrollIndicator {
    pub const CHANNEL: &'static str = "scale_x";

    pub fn new<F>(
        scheduler: &SchedulerHandle,
        layout: SharedLayout,
        container: ContainerId,
        spring: SpringConfig,
        mut consumer: F,
    ) -> Result<Self>
    where
        F: FnMut(f32) + Send + 'static,
    {
        // Identity mapping: the smoothed progress is the scale
        let mapper = KeyframeMapper::new().channel(
            Self::CHANNEL,
            BreakpointTable::from_to(0.0, 1.0)?.extrapolating(),
        );
        let source = ScrollProgress::container(layout, container);

        let linked = ScrollLinked::new(scheduler, source, Some(spring), mapper, move |values| {
            if let Some(scale) = values.get(Self::CHANNEL) {
                consumer(scale);
            }
        })?;

        Ok(Self { linked })
    }

    pub fn scale_x(&self) -> f32 {
        self.linked.values().get(Self::CHANNEL).unwrap_or_default()
    }

    pub fn is_active(&self) -> bool {
        self.linked.is_active()
    }

    pub fn cancel(&self) {
        self.linked.cancel();
    }
}

// ============================================================================
// Reveal
// ============================================================================

type RevealConsumer = Arc<Mutex<Box<dyn FnMut(&MappedValues) + Send>>>;

/// Reveal timing
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RevealConfig {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
    pub gate: GateConfig,
}

impl RevealConfig {
    /// Stagger the `index`-th item of a list by `step_ms`
    pub fn staggered(mut self, index: usize, step_ms: f64) -> Self {
        self.delay_ms = index as f64 * step_ms;
        self
    }
}

impl Default for RevealConfig {
    fn default() -> Self {
        Self {
            duration_ms: 350.0,
            delay_ms: 0.0,
            easing: Easing::EaseOut,
            gate: GateConfig::new(-80.0, true),
        }
    }
}

struct RevealInner {
    mapper: KeyframeMapper,
    easing: Easing,
    duration_ms: f64,
    delay_ms: f64,
    latest: MappedValues,
    complete: bool,
    frame: Option<FrameHandle>,
}

/// Channels (opacity, offset) animated from their initial to final values
/// once the element scrolls into view
pub struct Reveal {
    gate: VisibilityGate,
    inner: Arc<Mutex<RevealInner>>,
}

impl Reveal {
    /// `channels` maps eased progress in [0, 1] to channel values; `consumer`
    /// receives them now (initial state) and on every frame of the reveal
    pub fn new<F>(
        scheduler: &SchedulerHandle,
        layout: SharedLayout,
        element: ElementId,
        config: RevealConfig,
        channels: KeyframeMapper,
        consumer: F,
    ) -> Result<Self>
    where
        F: FnMut(&MappedValues) + Send + 'static,
    {
        // Validate timing up front rather than on first fire
        TimedProgress::new(config.duration_ms, 0.0)?.with_delay(config.delay_ms)?;

        let initial = channels.evaluate(0.0);
        let consumer: RevealConsumer = Arc::new(Mutex::new(Box::new(consumer)));
        {
            let mut render = lock(&consumer);
            (*render)(&initial);
        }

        let inner = Arc::new(Mutex::new(RevealInner {
            mapper: channels,
            easing: config.easing,
            duration_ms: config.duration_ms,
            delay_ms: config.delay_ms,
            latest: initial,
            complete: false,
            frame: None,
        }));

        let gate = VisibilityGate::arm(scheduler, layout, element, config.gate)?;

        let weak = Arc::downgrade(&inner);
        let scheduler = scheduler.clone();
        gate.on_fire(move |fired_at| {
            start_reveal(&weak, &scheduler, &consumer, fired_at);
        });

        Ok(Self { gate, inner })
    }

    pub fn gate(&self) -> &VisibilityGate {
        &self.gate
    }

    pub fn values(&self) -> MappedValues {
        lock(&self.inner).latest.clone()
    }

    /// True once the final values have been delivered
    pub fn is_complete(&self) -> bool {
        lock(&self.inner).complete
    }

    pub fn cancel(&self) {
        self.gate.disconnect();
        let frame = lock(&self.inner).frame.take();
        drop(frame);
    }
}

fn start_reveal(
    weak: &Weak<Mutex<RevealInner>>,
    scheduler: &SchedulerHandle,
    consumer: &RevealConsumer,
    fired_at: f64,
) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let timed = {
        let mut guard = lock(&inner);
        guard.complete = false;
        TimedProgress::new(guard.duration_ms, fired_at)
            .and_then(|timed| timed.with_delay(guard.delay_ms))
    };
    let timed = match timed {
        Ok(timed) => timed,
        Err(e) => {
            tracing::warn!(error = %e, "reveal could not start");
            return;
        }
    };

    let frame_inner = Weak::clone(weak);
    let consumer = Arc::clone(consumer);
    let scheduled = ProgressSource::from(timed).drive(scheduler, move |progress, _now_ms| {
        let Some(inner) = frame_inner.upgrade() else {
            return;
        };
        let values = {
            let mut guard = lock(&inner);
            let values = guard.mapper.evaluate(guard.easing.apply(progress));
            guard.latest = values.clone();
            guard.complete = progress >= 1.0;
            values
        };
        let mut render = lock(&consumer);
        (*render)(&values);
    });

    match scheduled {
        Ok(frame) => {
            let previous = lock(&inner).frame.replace(frame);
            drop(previous);
        }
        Err(e) => tracing::warn!(error = %e, "reveal could not start"),
    }
}

// ============================================================================
// Ambient loop
// ============================================================================

/// Loop timing for ambient motion
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LoopConfig {
    pub duration_ms: f64,
    pub delay_ms: f64,
    pub easing: Easing,
    pub repeat: Repeat,
    /// Play every other iteration backwards
    pub mirror: bool,
}

impl LoopConfig {
    pub fn new(duration_ms: f64) -> Self {
        Self {
            duration_ms,
            ..Self::default()
        }
    }
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            duration_ms: 1000.0,
            delay_ms: 0.0,
            easing: Easing::Linear,
            repeat: Repeat::Forever,
            mirror: false,
        }
    }
}

/// Keyframe channels played on a timer from mount (glows, lane markers,
/// pulsing indicators), independent of scroll and visibility
///
/// A `Repeat::Forever` loop runs until cancelled or dropped; a finite one
/// holds its final values and releases its frame subscription.
pub struct Ambient {
    latest: Arc<Mutex<MappedValues>>,
    frame: FrameHandle,
}

impl Ambient {
    /// `consumer` receives the initial values now and new values every frame
    pub fn new<F>(
        scheduler: &SchedulerHandle,
        config: LoopConfig,
        channels: KeyframeMapper,
        mut consumer: F,
    ) -> Result<Self>
    where
        F: FnMut(&MappedValues) + Send + 'static,
    {
        let timed = TimedProgress::new(config.duration_ms, scheduler.now_ms())?
            .with_delay(config.delay_ms)?
            .with_repeat(config.repeat)
            .mirrored(config.mirror);

        let initial = channels.evaluate(0.0);
        consumer(&initial);
        let latest = Arc::new(Mutex::new(initial));

        let weak = Arc::downgrade(&latest);
        let easing = config.easing;
        let frame = ProgressSource::from(timed).drive(scheduler, move |progress, _now_ms| {
            let Some(latest) = weak.upgrade() else {
                return;
            };
            let values = channels.evaluate(easing.apply(progress));
            *lock(&latest) = values.clone();
            consumer(&values);
        })?;

        tracing::debug!(
            duration_ms = config.duration_ms,
            repeat = ?config.repeat,
            mirror = config.mirror,
            "ambient loop started"
        );
        Ok(Self { latest, frame })
    }

    pub fn values(&self) -> MappedValues {
        lock(&self.latest).clone()
    }

    /// False once a finite loop has played out, or after `cancel`
    pub fn is_running(&self) -> bool {
        self.frame.is_active()
    }

    pub fn cancel(&self) {
        self.frame.cancel();
    }
}
