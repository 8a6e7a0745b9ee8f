//! Kinetic Animation Engine
//!
//! Scroll- and time-driven animation primitives, ticked by one shared frame
//! scheduler.
//!
//! # Features
//!
//! - **Scheduler**: one frame tick for every active animation, with
//!   immediate, idempotent cancellation and an explicit `init()`/`shutdown()`
//!   lifecycle
//! - **Progress Sources**: timed (duration, delay, repeat) or scroll-mapped
//!   (element travel through a viewport span, or whole-container progress)
//! - **Visibility Gates**: one-shot or repeatable intersection triggers with
//!   root margins
//! - **Keyframe Mapper**: piecewise-linear breakpoint tables, one per channel
//! - **Spring Smoother**: damped spring following a jittery target
//! - **Eased Tween**: 0 → target counters with cubic ease-out
//! - **Composed Animations**: counters, scroll-linked transforms, scroll
//!   indicators, reveals, and ambient loops
//!
//! Frame order within one tick: clock → progress source → spring → mapper
//! or tween → consumer callback.

pub mod animated;
pub mod clock;
pub mod easing;
pub mod error;
pub mod gate;
pub mod keyframe;
pub mod progress;
pub mod scheduler;
pub mod spring;
pub mod tween;

pub use animated::{
    Ambient, AnimatedCounter, CounterConfig, LoopConfig, Reveal, RevealConfig, ScrollIndicator,
    ScrollLinked,
};
pub use clock::{Clock, ManualClock, SystemClock};
pub use easing::{clamp01, ease_out_cubic, Easing};
pub use error::{AnimationError, Result};
pub use gate::{FireCallback, GateConfig, GateState, VisibilityGate};
pub use keyframe::{Breakpoint, BreakpointTable, Extrapolation, KeyframeMapper, MappedValues};
pub use progress::{
    Anchor, ProgressSource, Repeat, ScrollOffset, ScrollProgress, ScrollRange, ScrollTarget,
    TimedProgress,
};
pub use scheduler::{
    AnimationScheduler, FrameAction, FrameHandle, FrameId, SchedulerHandle, TickCallback,
};
pub use spring::{SpringConfig, SpringSmoother};
pub use tween::{CounterFormat, EasedTween, TweenState};
