//! End-to-end frame pipeline tests: scheduler, sources, gates, springs,
//! mappers and tweens driven together by a manual clock.

use kinetic_animation::{
    AnimatedCounter, AnimationScheduler, BreakpointTable, CounterConfig, CounterFormat,
    EasedTween, FrameAction, GateConfig, KeyframeMapper, ManualClock, ProgressSource,
    ScrollIndicator, ScrollLinked, ScrollProgress, ScrollRange, SpringConfig, TimedProgress,
    VisibilityGate,
};
use kinetic_core::{lock_layout, shared_layout, Bounds, ContainerId, ElementId, LayoutTree, SharedLayout};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

struct Landing {
    layout: SharedLayout,
    page: ContainerId,
    stats: ElementId,
    battery: ElementId,
    clock: ManualClock,
    scheduler: AnimationScheduler,
}

impl Landing {
    fn new() -> Self {
        let mut tree = LayoutTree::new();
        let page = tree.add_container(Bounds::new(0.0, 0.0, 1280.0, 800.0), 4800.0);
        let stats = tree
            .add_element(page, Bounds::new(0.0, 1100.0, 1280.0, 240.0))
            .unwrap();
        let battery = tree
            .add_element(page, Bounds::new(640.0, 2000.0, 480.0, 520.0))
            .unwrap();

        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::new(Arc::new(clock.clone()));
        Self {
            layout: shared_layout(tree),
            page,
            stats,
            battery,
            clock,
            scheduler,
        }
    }

    fn scroll_to(&self, y: f32) {
        lock_layout(&self.layout).set_scroll(self.page, y).unwrap();
    }

    fn frame(&self, interval_ms: f64) -> bool {
        self.clock.advance(interval_ms);
        self.scheduler.tick()
    }

    fn frames(&self, count: usize, interval_ms: f64) {
        for _ in 0..count {
            self.frame(interval_ms);
        }
    }
}

#[test]
fn test_cancel_mid_sequence_stops_callbacks() {
    let landing = Landing::new();
    let calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&calls);

    let source = ProgressSource::timed(10_000.0, 0.0).unwrap();
    let frame = source
        .drive(&landing.scheduler.handle(), move |_, _| {
            sink.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();

    landing.frames(5, 16.0);
    assert_eq!(calls.load(Ordering::SeqCst), 5);

    frame.cancel();
    frame.cancel();
    landing.frames(10, 16.0);

    assert_eq!(calls.load(Ordering::SeqCst), 5);
    assert!(!landing.scheduler.tick());
}

#[test]
fn test_cancel_from_sibling_callback_in_same_frame() {
    let landing = Landing::new();
    let handle = landing.scheduler.handle();
    let victim_calls = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&victim_calls);

    let victim = Arc::new(Mutex::new(None));
    let killer_slot = Arc::clone(&victim);

    // Subscribed first, so it runs before the victim within a frame
    let _killer = handle
        .schedule(move |now_ms| {
            if now_ms >= 48.0 {
                killer_slot.lock().unwrap().take();
                return FrameAction::Finish;
            }
            FrameAction::Continue
        })
        .unwrap();

    *victim.lock().unwrap() = Some(
        handle
            .schedule(move |_| {
                sink.fetch_add(1, Ordering::SeqCst);
                FrameAction::Continue
            })
            .unwrap(),
    );

    landing.frames(13, 16.0);
    assert_eq!(victim_calls.load(Ordering::SeqCst), 2);
    assert_eq!(landing.scheduler.active_count(), 0);
}

#[test]
fn test_timed_source_releases_subscription_at_completion() {
    let landing = Landing::new();
    let last = Arc::new(Mutex::new(0.0f32));
    let sink = Arc::clone(&last);

    let timed = TimedProgress::new(100.0, 0.0).unwrap();
    let frame = ProgressSource::from(timed)
        .drive(&landing.scheduler.handle(), move |p, _| *sink.lock().unwrap() = p)
        .unwrap();

    // Variable frame pacing: progress follows wall time, not tick count
    for interval in [7.0, 33.0, 5.0, 41.0, 16.0] {
        landing.frame(interval);
    }

    assert_eq!(*last.lock().unwrap(), 1.0);
    assert!(!frame.is_active());
    assert_eq!(landing.scheduler.active_count(), 0);
}

#[test]
fn test_one_shot_gate_fires_once_across_many_passes() {
    let landing = Landing::new();
    let gate = VisibilityGate::arm(
        &landing.scheduler.handle(),
        landing.layout.clone(),
        landing.stats,
        GateConfig::new(-80.0, true),
    )
    .unwrap();

    let fires = Arc::new(AtomicUsize::new(0));
    let sink = Arc::clone(&fires);
    gate.on_fire(move |_| {
        sink.fetch_add(1, Ordering::SeqCst);
    });

    for pass in 0..5 {
        landing.scroll_to(if pass % 2 == 0 { 900.0 } else { 0.0 });
        landing.frames(3, 16.0);
    }

    assert_eq!(fires.load(Ordering::SeqCst), 1);
    assert!(gate.fired());
}

#[test]
fn test_stats_counters_count_up_together() {
    let landing = Landing::new();
    let handle = landing.scheduler.handle();

    let presets = [
        (1280.0, CounterFormat::new(0, "+")),
        (96.4, CounterFormat::new(1, "%")),
        (98.7, CounterFormat::new(1, "%")),
        (18420.0, CounterFormat::new(0, "+")),
    ];
    let counters: Vec<AnimatedCounter> = presets
        .into_iter()
        .map(|(value, format)| {
            AnimatedCounter::new(
                &handle,
                landing.layout.clone(),
                landing.stats,
                CounterConfig::new(value, format),
                |_, _| {},
            )
            .unwrap()
        })
        .collect();

    landing.frames(5, 16.0);
    assert!(counters.iter().all(|c| c.value() == 0.0));

    landing.scroll_to(700.0);
    landing.frames(100, 16.0);

    let texts: Vec<String> = counters.iter().map(AnimatedCounter::text).collect();
    assert_eq!(texts, vec!["1280+", "96.4%", "98.7%", "18420+"]);
    assert_eq!(landing.scheduler.active_count(), 0);
}

#[test]
fn test_eased_tween_scenario() {
    let mut tween = EasedTween::new(100.0, 1000.0).unwrap();
    tween.start(0.0);
    assert_eq!(tween.display(0.0), 0.0);
    assert_eq!(tween.display(500.0), 87.5);
    assert_eq!(tween.display(1000.0), 100.0);
}

#[test]
fn test_breakpoint_scenario() {
    let table = BreakpointTable::new([(0.0, 14.0), (0.5, 0.0), (1.0, -10.0)]).unwrap();
    assert_eq!(table.sample(0.25), 7.0);
    assert_eq!(table.sample(1.5), -10.0);
    assert_eq!(table.sample(-1.0), 14.0);
}

#[test]
fn test_battery_parallax_follows_scroll_both_ways() {
    let landing = Landing::new();
    let mapper = KeyframeMapper::new()
        .try_channel("rotate_x", [(0.0, 14.0), (0.5, 0.0), (1.0, -10.0)])
        .unwrap()
        .try_channel(
            "fill_scale",
            [(0.0, 0.35), (0.3, 0.58), (0.7, 0.82), (1.0, 0.92)],
        )
        .unwrap();

    let source = ScrollProgress::element(
        landing.layout.clone(),
        landing.battery,
        landing.page,
        ScrollRange::full_pass(),
    );
    let linked =
        ScrollLinked::new(&landing.scheduler.handle(), source, None, mapper, |_| {}).unwrap();

    // Battery top 2000, height 520, viewport 800: pass spans scroll 1200..2520
    let sample = |scroll: f32| {
        landing.scroll_to(scroll);
        landing.frame(16.0);
        linked.values()
    };

    let entering = sample(1200.0);
    assert_eq!(entering.get("rotate_x"), Some(14.0));
    assert_eq!(entering.get("fill_scale"), Some(0.35));

    let middle = sample(1860.0);
    assert_eq!(middle.get("rotate_x"), Some(0.0));

    let leaving = sample(2520.0);
    assert_eq!(leaving.get("rotate_x"), Some(-10.0));
    assert_eq!(leaving.get("fill_scale"), Some(0.92));

    // Scrolling back up reverses the transform
    let back = sample(1860.0);
    assert_eq!(back.get("rotate_x"), Some(0.0));

    // Removing the element holds the last values
    lock_layout(&landing.layout).remove_element(landing.battery);
    let held = sample(0.0);
    assert_eq!(held.get("rotate_x"), Some(0.0));
}

#[test]
fn test_indicator_spring_is_frame_rate_independent() {
    let run = |interval_ms: f64, frames: usize| {
        let landing = Landing::new();
        let indicator = ScrollIndicator::new(
            &landing.scheduler.handle(),
            landing.layout.clone(),
            landing.page,
            SpringConfig::indicator(),
            |_| {},
        )
        .unwrap();
        landing.frame(interval_ms);
        landing.scroll_to(2000.0);
        landing.frames(frames, interval_ms);
        indicator.scale_x()
    };

    // 400ms of smoothing at 120fps vs 30fps
    let fast = run(1000.0 / 120.0, 48);
    let slow = run(1000.0 / 30.0, 12);
    assert!(fast > 0.0 && fast < 0.5);
    assert!((fast - slow).abs() < 0.02);
}

#[test]
fn test_shutdown_cancels_everything() {
    let landing = Landing::new();
    let handle = landing.scheduler.handle();

    let source = ScrollProgress::container(landing.layout.clone(), landing.page);
    let mapper = KeyframeMapper::new().channel("scale_x", BreakpointTable::from_to(0.0, 1.0).unwrap());
    let linked = ScrollLinked::new(&handle, source, None, mapper, |_| {}).unwrap();

    landing.scheduler.shutdown();
    assert!(!linked.is_active());
    assert!(!landing.frame(16.0));
    assert!(handle.schedule(|_| FrameAction::Continue).is_err());

    landing.scheduler.init();
    assert!(handle.schedule(|_| FrameAction::Continue).is_ok());
}
