//! Headless frame simulation
//!
//! Lays out the configured page, attaches every animation to one scheduler
//! driven by a manual clock, then scrolls down at a fixed speed while
//! ticking frames. The resulting [`SimulationReport`] is what a renderer
//! would have drawn on the last frame.

use crate::config::KineticConfig;
use anyhow::{Context, Result};
use indexmap::IndexMap;
use kinetic_animation::{
    Ambient, AnimatedCounter, AnimationScheduler, ManualClock, MappedValues, Reveal,
    ScrollIndicator, ScrollLinked, ScrollProgress, TweenState,
};
use kinetic_core::{lock_layout, shared_layout, Bounds, ContainerId, LayoutTree, SharedLayout};
use kinetic_services::{available_actions, StaticIdentity};
use serde::Serialize;
use std::sync::Arc;

/// How long and how fast to scroll
#[derive(Clone, Copy, Debug)]
pub struct SimulationOptions {
    pub frames: u64,
    pub fps: u32,
    /// Pixels scrolled per frame
    pub scroll_speed: f32,
}

#[derive(Debug, Serialize)]
pub struct CounterReport {
    pub label: String,
    pub text: String,
    pub settled: bool,
}

#[derive(Debug, Serialize)]
pub struct RevealReport {
    pub name: String,
    pub complete: usize,
    pub total: usize,
    /// Channel values of the last item
    pub values: IndexMap<String, f32>,
}

#[derive(Debug, Serialize)]
pub struct LoopReport {
    pub name: String,
    pub running: bool,
    pub values: IndexMap<String, f32>,
}

#[derive(Debug, Serialize)]
pub struct SimulationReport {
    pub frames: u64,
    pub elapsed_ms: f64,
    pub scroll_y: f32,
    pub indicator: f32,
    pub counters: Vec<CounterReport>,
    pub parallax: IndexMap<String, IndexMap<String, f32>>,
    pub reveals: Vec<RevealReport>,
    pub loops: Vec<LoopReport>,
    pub active_subscriptions: usize,
    pub auth_actions: Vec<&'static str>,
}

fn channel_map(values: &MappedValues) -> IndexMap<String, f32> {
    values
        .iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
}

pub struct Simulation {
    layout: SharedLayout,
    page: ContainerId,
    clock: ManualClock,
    scheduler: AnimationScheduler,
    indicator: ScrollIndicator,
    counters: Vec<(String, AnimatedCounter)>,
    parallax: Vec<(String, ScrollLinked)>,
    reveals: Vec<(String, Vec<Reveal>)>,
    loops: Vec<(String, Ambient)>,
    identity: StaticIdentity,
    frames: u64,
}

impl Simulation {
    /// Lay out the page and attach every configured animation
    pub fn build(config: &KineticConfig) -> Result<Self> {
        config.validate()?;

        let page_config = &config.page;
        let width = page_config.viewport_width;
        let mut tree = LayoutTree::new();
        let page = tree.add_container(
            Bounds::new(0.0, 0.0, width, page_config.viewport_height),
            page_config.content_height,
        );
        let layout = shared_layout(tree);

        let clock = ManualClock::new();
        let scheduler = AnimationScheduler::new(Arc::new(clock.clone()));
        let handle = scheduler.handle();

        let indicator = ScrollIndicator::new(
            &handle,
            layout.clone(),
            page,
            config.indicator.spring()?,
            |_| {},
        )?;

        // Counters share one row, split evenly across the viewport
        let column = width / config.counters.len().max(1) as f32;
        let mut counters = Vec::with_capacity(config.counters.len());
        for (index, entry) in config.counters.iter().enumerate() {
            let placement = entry.placement;
            let element = lock_layout(&layout).add_element(
                page,
                Bounds::new(index as f32 * column, placement.top, column, placement.height),
            )?;
            let counter = AnimatedCounter::new(
                &handle,
                layout.clone(),
                element,
                entry.to_config()?,
                |_, _| {},
            )
            .with_context(|| format!("Counter '{}'", entry.label))?;
            counters.push((entry.label.clone(), counter));
        }

        let mut parallax = Vec::with_capacity(config.parallax.len());
        for entry in &config.parallax {
            let placement = entry.placement;
            let element = lock_layout(&layout).add_element(
                page,
                Bounds::new(0.0, placement.top, width, placement.height),
            )?;
            let source = ScrollProgress::element(layout.clone(), element, page, entry.range()?);
            let linked = ScrollLinked::new(&handle, source, entry.spring()?, entry.mapper()?, |_| {})
                .with_context(|| format!("Parallax '{}'", entry.name))?;
            parallax.push((entry.name.clone(), linked));
        }

        let mut reveals = Vec::with_capacity(config.reveals.len());
        for entry in &config.reveals {
            let mapper = entry.mapper()?;
            let mut items = Vec::with_capacity(entry.count);
            for index in 0..entry.count {
                let element = lock_layout(&layout).add_element(
                    page,
                    Bounds::new(0.0, entry.item_top(index), width, entry.item_height),
                )?;
                let reveal = Reveal::new(
                    &handle,
                    layout.clone(),
                    element,
                    entry.config(index)?,
                    mapper.clone(),
                    |_| {},
                )
                .with_context(|| format!("Reveal '{}' item {index}", entry.name))?;
                items.push(reveal);
            }
            reveals.push((entry.name.clone(), items));
        }

        let mut loops = Vec::with_capacity(config.loops.len());
        for entry in &config.loops {
            let ambient = Ambient::new(&handle, entry.config()?, entry.mapper()?, |_| {})
                .with_context(|| format!("Loop '{}'", entry.name))?;
            loops.push((entry.name.clone(), ambient));
        }

        tracing::debug!(
            counters = counters.len(),
            parallax = parallax.len(),
            reveals = reveals.len(),
            loops = loops.len(),
            active = scheduler.active_count(),
            "simulation ready"
        );

        Ok(Self {
            layout,
            page,
            clock,
            scheduler,
            indicator,
            counters,
            parallax,
            reveals,
            loops,
            identity: StaticIdentity::new(config.identity.signed_in),
            frames: 0,
        })
    }

    /// Current scroll offset
    pub fn scroll_y(&self) -> f32 {
        lock_layout(&self.layout)
            .container(self.page)
            .map(|c| c.scroll_y)
            .unwrap_or(0.0)
    }

    /// Scroll by `delta` (clamped to the scrollable range), then tick one frame
    pub fn step(&mut self, delta: f32, interval_ms: f64) -> Result<bool> {
        {
            let mut tree = lock_layout(&self.layout);
            let max_scroll = tree
                .container(self.page)
                .map(|c| c.max_scroll())
                .context("Page container missing")?;
            let current = tree.container(self.page).map_or(0.0, |c| c.scroll_y);
            tree.set_scroll(self.page, (current + delta).clamp(0.0, max_scroll))?;
        }
        self.clock.advance(interval_ms);
        self.frames += 1;
        Ok(self.scheduler.tick())
    }

    /// Run the configured number of frames and report the final state
    pub fn run(&mut self, options: SimulationOptions) -> Result<SimulationReport> {
        if options.fps == 0 {
            anyhow::bail!("fps must be positive");
        }
        let interval_ms = 1000.0 / options.fps as f64;

        for _ in 0..options.frames {
            self.step(options.scroll_speed, interval_ms)?;
        }

        tracing::info!(
            frames = self.frames,
            scroll_y = self.scroll_y(),
            active = self.scheduler.active_count(),
            "simulation finished"
        );
        Ok(self.report())
    }

    pub fn report(&self) -> SimulationReport {
        SimulationReport {
            frames: self.frames,
            elapsed_ms: self.scheduler.now_ms(),
            scroll_y: self.scroll_y(),
            indicator: self.indicator.scale_x(),
            counters: self
                .counters
                .iter()
                .map(|(label, counter)| CounterReport {
                    label: label.clone(),
                    text: counter.text(),
                    settled: counter.state() == TweenState::Settled,
                })
                .collect(),
            parallax: self
                .parallax
                .iter()
                .map(|(name, linked)| (name.clone(), channel_map(&linked.values())))
                .collect(),
            reveals: self
                .reveals
                .iter()
                .map(|(name, items)| RevealReport {
                    name: name.clone(),
                    complete: items.iter().filter(|r| r.is_complete()).count(),
                    total: items.len(),
                    values: items
                        .last()
                        .map(|r| channel_map(&r.values()))
                        .unwrap_or_default(),
                })
                .collect(),
            loops: self
                .loops
                .iter()
                .map(|(name, ambient)| LoopReport {
                    name: name.clone(),
                    running: ambient.is_running(),
                    values: channel_map(&ambient.values()),
                })
                .collect(),
            active_subscriptions: self.scheduler.active_count(),
            auth_actions: available_actions(&self.identity)
                .into_iter()
                .map(|action| action.label())
                .collect(),
        }
    }
}
