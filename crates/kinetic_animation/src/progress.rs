//! Progress sources
//!
//! A progress source turns something that moves (elapsed time or a scroll
//! position) into a scalar progress value each frame:
//!
//! - [`TimedProgress`]: 0 → 1 over a fixed duration, optionally delayed and
//!   repeated. Clamped to [0, 1] and terminal once the final iteration ends.
//! - [`ScrollProgress`]: an element's travel through a span of a scroll
//!   container's viewport, or the container's own scroll position. Never
//!   terminal and not clamped; it is recomputed from the layout store every
//!   frame, so layout changes without a scroll event (resize) still show up.
//!
//! [`ProgressSource`] is the sum of both, and [`ProgressSource::drive`]
//! subscribes one to the scheduler.

use crate::easing::clamp01;
use crate::error::{AnimationError, Result};
use crate::scheduler::{FrameAction, FrameHandle, SchedulerHandle};
use kinetic_core::{lock_layout, Bounds, ContainerId, ElementId, SharedLayout};
use serde::{Deserialize, Serialize};

// ============================================================================
// Timed
// ============================================================================

/// How many times a timed source plays
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Repeat {
    #[default]
    Once,
    /// Play this many iterations in total
    Times(u32),
    Forever,
}

/// Progress over elapsed time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TimedProgress {
    duration_ms: f64,
    start_ms: f64,
    delay_ms: f64,
    repeat: Repeat,
    /// Reverse direction on every other iteration
    mirror: bool,
}

impl TimedProgress {
    /// Play once over `duration_ms`, starting at `start_ms`
    pub fn new(duration_ms: f64, start_ms: f64) -> Result<Self> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(AnimationError::InvalidDuration(duration_ms));
        }
        Ok(Self {
            duration_ms,
            start_ms,
            delay_ms: 0.0,
            repeat: Repeat::Once,
            mirror: false,
        })
    }

    /// Hold at 0 for `delay_ms` after the start time
    pub fn with_delay(mut self, delay_ms: f64) -> Result<Self> {
        if !delay_ms.is_finite() || delay_ms < 0.0 {
            return Err(AnimationError::InvalidDuration(delay_ms));
        }
        self.delay_ms = delay_ms;
        Ok(self)
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn mirrored(mut self, mirror: bool) -> Self {
        self.mirror = mirror;
        self
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn start_ms(&self) -> f64 {
        self.start_ms
    }

    /// Move the start time (restart from 0 at `start_ms`)
    pub fn restart_at(&mut self, start_ms: f64) {
        self.start_ms = start_ms;
    }

    /// Iterations elapsed, fractional; `None` before the delay ends
    fn iterations(&self, now_ms: f64) -> Option<f64> {
        let elapsed = now_ms - self.start_ms - self.delay_ms;
        if elapsed < 0.0 {
            return None;
        }
        if self.duration_ms == 0.0 {
            return Some(f64::INFINITY);
        }
        Some(elapsed / self.duration_ms)
    }

    fn total_iterations(&self) -> Option<f64> {
        match self.repeat {
            Repeat::Once => Some(1.0),
            Repeat::Times(n) => Some(n.max(1) as f64),
            Repeat::Forever => None,
        }
    }

    fn oriented(&self, iteration: f64, p: f32) -> f32 {
        if self.mirror && iteration % 2.0 == 1.0 {
            1.0 - p
        } else {
            p
        }
    }

    /// `clamp01((now - start - delay) / duration)` for the current iteration
    pub fn progress(&self, now_ms: f64) -> f32 {
        let Some(raw) = self.iterations(now_ms) else {
            return 0.0;
        };

        if let Some(total) = self.total_iterations() {
            if raw >= total {
                return self.oriented(total - 1.0, 1.0);
            }
        } else if raw.is_infinite() {
            // Zero-length forever loop: park at the end
            return 1.0;
        }

        let iteration = raw.floor();
        let p = clamp01((raw - iteration) as f32);
        self.oriented(iteration, p)
    }

    /// True once the final iteration has completed
    pub fn is_finished(&self, now_ms: f64) -> bool {
        match (self.iterations(now_ms), self.total_iterations()) {
            (Some(raw), Some(total)) => raw >= total,
            _ => false,
        }
    }
}

// ============================================================================
// Scroll-mapped
// ============================================================================

/// A point along an element's or viewport's height
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anchor {
    /// Fraction of the height (0 = top edge, 1 = bottom edge)
    pub fraction: f32,
    /// Additional pixel offset
    #[serde(default)]
    pub pixels: f32,
}

impl Anchor {
    pub const START: Anchor = Anchor {
        fraction: 0.0,
        pixels: 0.0,
    };
    pub const CENTER: Anchor = Anchor {
        fraction: 0.5,
        pixels: 0.0,
    };
    pub const END: Anchor = Anchor {
        fraction: 1.0,
        pixels: 0.0,
    };

    pub fn fraction(fraction: f32) -> Self {
        Self {
            fraction,
            pixels: 0.0,
        }
    }

    pub fn px(mut self, pixels: f32) -> Self {
        self.pixels = pixels;
        self
    }

    /// Parse `start`, `center`, `end`, or a number in [0, 1]
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim() {
            "start" | "top" => Some(Self::START),
            "center" => Some(Self::CENTER),
            "end" | "bottom" => Some(Self::END),
            other => other.parse::<f32>().ok().filter(|v| v.is_finite()).map(Self::fraction),
        }
    }

    fn resolve(&self, height: f32) -> f32 {
        self.fraction * height + self.pixels
    }
}

/// "When this point of the element meets this point of the viewport"
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollOffset {
    pub element: Anchor,
    pub viewport: Anchor,
}

impl ScrollOffset {
    pub fn new(element: Anchor, viewport: Anchor) -> Self {
        Self { element, viewport }
    }

    /// Element top edge meets viewport bottom edge (entering)
    pub fn entering() -> Self {
        Self::new(Anchor::START, Anchor::END)
    }

    /// Element bottom edge meets viewport top edge (leaving)
    pub fn leaving() -> Self {
        Self::new(Anchor::END, Anchor::START)
    }

    /// Element top relative to viewport top at the moment the anchors meet
    fn meeting_point(&self, element_height: f32, viewport_height: f32) -> f32 {
        self.viewport.resolve(viewport_height) - self.element.resolve(element_height)
    }
}

/// The span of travel mapped onto progress 0 → 1
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScrollRange {
    pub start: ScrollOffset,
    pub end: ScrollOffset,
}

impl ScrollRange {
    pub fn new(start: ScrollOffset, end: ScrollOffset) -> Self {
        Self { start, end }
    }

    /// From first entering the viewport until fully leaving it
    pub fn full_pass() -> Self {
        Self::new(ScrollOffset::entering(), ScrollOffset::leaving())
    }
}

impl Default for ScrollRange {
    fn default() -> Self {
        Self::full_pass()
    }
}

/// What a scroll source tracks
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ScrollTarget {
    /// The container's own scroll position over its scrollable height
    Container(ContainerId),
    /// An element's travel through `container`'s viewport
    Element {
        element: ElementId,
        container: ContainerId,
        range: ScrollRange,
    },
}

/// Progress over scroll position
#[derive(Clone, Debug)]
pub struct ScrollProgress {
    layout: SharedLayout,
    target: ScrollTarget,
    last: f32,
}

impl ScrollProgress {
    /// Whole-container progress
    pub fn container(layout: SharedLayout, container: ContainerId) -> Self {
        Self {
            layout,
            target: ScrollTarget::Container(container),
            last: 0.0,
        }
    }

    /// Element travel through `range` of `container`'s viewport
    pub fn element(
        layout: SharedLayout,
        element: ElementId,
        container: ContainerId,
        range: ScrollRange,
    ) -> Self {
        Self {
            layout,
            target: ScrollTarget::Element {
                element,
                container,
                range,
            },
            last: 0.0,
        }
    }

    pub fn target(&self) -> ScrollTarget {
        self.target
    }

    /// Value returned by the most recent `progress()` call
    pub fn last_value(&self) -> f32 {
        self.last
    }

    /// Recompute from the layout store
    ///
    /// Unclamped: values fall below 0 or above 1 while the element is outside
    /// the range. A removed element or container yields the last known value.
    pub fn progress(&mut self) -> f32 {
        if let Some(value) = self.compute() {
            self.last = value;
        }
        self.last
    }

    fn compute(&self) -> Option<f32> {
        let layout = lock_layout(&self.layout);

        match self.target {
            ScrollTarget::Container(id) => {
                let container = layout.container(id)?;
                let max_scroll = container.max_scroll();
                if max_scroll <= 0.0 {
                    return Some(0.0);
                }
                Some(container.scroll_y / max_scroll)
            }
            ScrollTarget::Element {
                element,
                container,
                range,
            } => {
                let viewport = layout.container(container)?.viewport;
                let bounds = layout.visible_bounds(element)?;
                Some(element_progress(bounds, viewport, range))
            }
        }
    }
}

fn element_progress(element: Bounds, viewport: Bounds, range: ScrollRange) -> f32 {
    let relative_top = element.y - viewport.y;
    let start = range.start.meeting_point(element.height, viewport.height);
    let end = range.end.meeting_point(element.height, viewport.height);

    // Scrolling down moves the element up, so travel runs from `start`
    // towards the smaller `end`
    let span = start - end;
    if span == 0.0 {
        return if relative_top > start { 0.0 } else { 1.0 };
    }
    (start - relative_top) / span
}

// ============================================================================
// Progress source
// ============================================================================

/// A timed or scroll-mapped progress source
#[derive(Clone, Debug)]
pub enum ProgressSource {
    Timed(TimedProgress),
    ScrollMapped(ScrollProgress),
}

impl ProgressSource {
    /// Play once over `duration_ms`, starting at `start_ms`
    pub fn timed(duration_ms: f64, start_ms: f64) -> Result<Self> {
        Ok(ProgressSource::Timed(TimedProgress::new(
            duration_ms,
            start_ms,
        )?))
    }

    /// Current progress at `now_ms`
    pub fn progress(&mut self, now_ms: f64) -> f32 {
        match self {
            ProgressSource::Timed(timed) => timed.progress(now_ms),
            ProgressSource::ScrollMapped(scroll) => scroll.progress(),
        }
    }

    /// Whether the source will never change again
    pub fn is_terminal(&self, now_ms: f64) -> bool {
        match self {
            ProgressSource::Timed(timed) => timed.is_finished(now_ms),
            ProgressSource::ScrollMapped(_) => false,
        }
    }

    /// Subscribe to the scheduler, feeding `(progress, now_ms)` to `consumer`
    /// every frame
    ///
    /// A timed source delivers its final value and then finishes its
    /// subscription; a scroll source runs until the handle is cancelled.
    pub fn drive<F>(mut self, scheduler: &SchedulerHandle, mut consumer: F) -> Result<FrameHandle>
    where
        F: FnMut(f32, f64) + Send + 'static,
    {
        scheduler.schedule(move |now_ms| {
            let progress = self.progress(now_ms);
            consumer(progress, now_ms);
            if self.is_terminal(now_ms) {
                FrameAction::Finish
            } else {
                FrameAction::Continue
            }
        })
    }
}

impl From<TimedProgress> for ProgressSource {
    fn from(timed: TimedProgress) -> Self {
        ProgressSource::Timed(timed)
    }
}

impl From<ScrollProgress> for ProgressSource {
    fn from(scroll: ScrollProgress) -> Self {
        ProgressSource::ScrollMapped(scroll)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::scheduler::AnimationScheduler;
    use kinetic_core::{shared_layout, LayoutTree};
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_timed_progress() {
        let timed = TimedProgress::new(1000.0, 500.0).unwrap();

        assert_eq!(timed.progress(0.0), 0.0);
        assert_eq!(timed.progress(500.0), 0.0);
        assert_eq!(timed.progress(750.0), 0.25);
        assert_eq!(timed.progress(1500.0), 1.0);
        assert_eq!(timed.progress(9000.0), 1.0);

        assert!(!timed.is_finished(1499.0));
        assert!(timed.is_finished(1500.0));
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let timed = TimedProgress::new(0.0, 100.0).unwrap();
        assert_eq!(timed.progress(99.0), 0.0);
        assert_eq!(timed.progress(100.0), 1.0);
        assert!(timed.is_finished(100.0));
    }

    #[test]
    fn test_invalid_duration() {
        assert!(TimedProgress::new(-1.0, 0.0).is_err());
        assert!(TimedProgress::new(f64::NAN, 0.0).is_err());
        assert!(TimedProgress::new(100.0, 0.0)
            .unwrap()
            .with_delay(-5.0)
            .is_err());
    }

    #[test]
    fn test_delay() {
        let timed = TimedProgress::new(100.0, 0.0)
            .unwrap()
            .with_delay(50.0)
            .unwrap();
        assert_eq!(timed.progress(40.0), 0.0);
        assert_eq!(timed.progress(100.0), 0.5);
        assert!(timed.is_finished(150.0));
    }

    #[test]
    fn test_repeat_and_mirror() {
        let looping = TimedProgress::new(100.0, 0.0)
            .unwrap()
            .with_repeat(Repeat::Times(3))
            .mirrored(true);

        assert_eq!(looping.progress(25.0), 0.25);
        assert_eq!(looping.progress(125.0), 0.75);
        assert_eq!(looping.progress(225.0), 0.25);
        assert!(!looping.is_finished(299.0));
        // Third iteration runs forward, so it ends at 1
        assert_eq!(looping.progress(300.0), 1.0);
        assert!(looping.is_finished(300.0));

        let forever = TimedProgress::new(100.0, 0.0)
            .unwrap()
            .with_repeat(Repeat::Forever);
        assert_eq!(forever.progress(1_000_050.0), 0.5);
        assert!(!forever.is_finished(f64::MAX));
    }

    fn page_with_card() -> (SharedLayout, ContainerId, ElementId) {
        let mut layout = LayoutTree::new();
        let page = layout.add_container(Bounds::new(0.0, 0.0, 1000.0, 800.0), 5000.0);
        let card = layout
            .add_element(page, Bounds::new(0.0, 1000.0, 500.0, 400.0))
            .unwrap();
        (shared_layout(layout), page, card)
    }

    #[test]
    fn test_element_full_pass() {
        let (layout, page, card) = page_with_card();
        let mut source = ScrollProgress::element(layout.clone(), card, page, ScrollRange::full_pass());

        // Card top at 1000, viewport 800: enters at scroll 200, leaves at 1400
        let mut at = |scroll: f32| {
            lock_layout(&layout).set_scroll(page, scroll).unwrap();
            source.progress()
        };

        assert_eq!(at(200.0), 0.0);
        assert_eq!(at(800.0), 0.5);
        assert_eq!(at(1400.0), 1.0);
        // Unclamped outside the range
        assert_eq!(at(0.0), -1.0 / 6.0);
        assert_eq!(at(2000.0), 1.5);
    }

    #[test]
    fn test_element_progress_reverses() {
        let (layout, page, card) = page_with_card();
        let mut source = ScrollProgress::element(layout.clone(), card, page, ScrollRange::full_pass());

        lock_layout(&layout).set_scroll(page, 1100.0).unwrap();
        let down = source.progress();
        lock_layout(&layout).set_scroll(page, 500.0).unwrap();
        let up = source.progress();

        assert!(up < down);
    }

    #[test]
    fn test_resize_changes_progress_without_scrolling() {
        let (layout, page, card) = page_with_card();
        let mut source = ScrollProgress::element(layout.clone(), card, page, ScrollRange::full_pass());

        lock_layout(&layout).set_scroll(page, 800.0).unwrap();
        let before = source.progress();

        lock_layout(&layout)
            .set_viewport(page, Bounds::new(0.0, 0.0, 1000.0, 400.0))
            .unwrap();
        let after = source.progress();

        assert_ne!(before, after);
    }

    #[test]
    fn test_removed_element_keeps_last_value() {
        let (layout, page, card) = page_with_card();
        let mut source = ScrollProgress::element(layout.clone(), card, page, ScrollRange::full_pass());

        lock_layout(&layout).set_scroll(page, 800.0).unwrap();
        assert_eq!(source.progress(), 0.5);

        lock_layout(&layout).remove_element(card);
        lock_layout(&layout).set_scroll(page, 1400.0).unwrap();
        assert_eq!(source.progress(), 0.5);
        assert_eq!(source.last_value(), 0.5);
    }

    #[test]
    fn test_container_progress() {
        let (layout, page, _card) = page_with_card();
        let mut source = ScrollProgress::container(layout.clone(), page);

        assert_eq!(source.progress(), 0.0);
        lock_layout(&layout).set_scroll(page, 2100.0).unwrap();
        assert_eq!(source.progress(), 0.5);

        lock_layout(&layout).remove_container(page);
        assert_eq!(source.progress(), 0.5);
    }

    #[test]
    fn test_container_without_overflow() {
        let mut tree = LayoutTree::new();
        let short = tree.add_container(Bounds::new(0.0, 0.0, 100.0, 800.0), 300.0);
        let mut source = ScrollProgress::container(shared_layout(tree), short);
        assert_eq!(source.progress(), 0.0);
    }

    #[test]
    fn test_custom_offsets() {
        let (layout, page, card) = page_with_card();
        // Element center (1200) crosses viewport center (400) at scroll 800
        let center = ScrollOffset::new(Anchor::CENTER, Anchor::CENTER);
        let range = ScrollRange::new(ScrollOffset::entering(), center);
        let mut source = ScrollProgress::element(layout.clone(), card, page, range);

        lock_layout(&layout).set_scroll(page, 800.0).unwrap();
        assert_eq!(source.progress(), 1.0);
    }

    #[test]
    fn test_anchor_parse() {
        assert_eq!(Anchor::parse("start"), Some(Anchor::START));
        assert_eq!(Anchor::parse(" end "), Some(Anchor::END));
        assert_eq!(Anchor::parse("0.25"), Some(Anchor::fraction(0.25)));
        assert_eq!(Anchor::parse("middle"), None);
    }

    #[test]
    fn test_drive_timed_finishes() {
        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::new(Arc::new(clock.clone()));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);

        let frame = ProgressSource::timed(100.0, 0.0)
            .unwrap()
            .drive(&scheduler.handle(), move |p, _| sink.lock().unwrap().push(p))
            .unwrap();

        for _ in 0..5 {
            clock.advance(40.0);
            scheduler.tick();
        }

        assert_eq!(*seen.lock().unwrap(), vec![0.4, 0.8, 1.0]);
        assert!(frame.is_cancelled());
        assert_eq!(scheduler.active_count(), 0);
    }
}
