//! Kinetic configuration file handling
//!
//! `kinetic.toml` describes the page layout and every animation on it. All
//! sections are optional; an absent file yields the built-in landing page:
//!
//! - `[page]` - viewport and content size
//! - `[scheduler]` - simulation frame rate
//! - `[indicator]` - scroll progress bar spring
//! - `[[counters]]` - stat counters that count up when scrolled into view
//! - `[[parallax]]` - scroll-linked keyframe cards
//! - `[[reveals]]` - staggered lists that fade in when scrolled into view
//! - `[[loops]]` - ambient keyframe loops that play from page load
//! - `[prediction]` - prediction service endpoint and retry policy
//! - `[identity]` - initial signed-in state

use anyhow::{Context, Result};
use indexmap::IndexMap;
use kinetic_animation::{
    Anchor, BreakpointTable, CounterConfig, CounterFormat, Easing, GateConfig, KeyframeMapper,
    LoopConfig, Repeat, RevealConfig, ScrollOffset, ScrollRange, SpringConfig,
};
use kinetic_services::RetryPolicy;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Default config file name, looked up in the current directory
pub const CONFIG_FILE: &str = "kinetic.toml";

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct KineticConfig {
    pub page: PageConfig,
    pub scheduler: SchedulerConfig,
    pub indicator: IndicatorConfig,
    pub counters: Vec<CounterEntry>,
    pub parallax: Vec<ParallaxEntry>,
    pub reveals: Vec<RevealEntry>,
    pub loops: Vec<LoopEntry>,
    pub prediction: PredictionSettings,
    pub identity: IdentitySettings,
}

impl Default for KineticConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            scheduler: SchedulerConfig::default(),
            indicator: IndicatorConfig::default(),
            counters: default_counters(),
            parallax: default_parallax(),
            reveals: default_reveals(),
            loops: default_loops(),
            prediction: PredictionSettings::default(),
            identity: IdentitySettings::default(),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// Scroll container size
#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PageConfig {
    pub viewport_width: f32,
    pub viewport_height: f32,
    pub content_height: f32,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            viewport_width: 1280.0,
            viewport_height: 800.0,
            content_height: 5600.0,
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Simulated frames per second
    pub fps: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self { fps: 60 }
    }
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct IndicatorConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub rest_delta: f32,
}

impl Default for IndicatorConfig {
    fn default() -> Self {
        let spring = SpringConfig::indicator();
        Self {
            stiffness: spring.stiffness,
            damping: spring.damping,
            rest_delta: spring.rest_delta,
        }
    }
}

impl IndicatorConfig {
    pub fn spring(&self) -> Result<SpringConfig> {
        let spring = SpringConfig::new(self.stiffness, self.damping, 1.0)
            .with_rest_delta(self.rest_delta);
        spring.validate().context("Invalid [indicator] spring")?;
        Ok(spring)
    }
}

/// Element placement within the page content
#[derive(Debug, Clone, Copy, Deserialize, Serialize)]
pub struct Placement {
    pub top: f32,
    pub height: f32,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CounterEntry {
    pub label: String,
    pub value: f32,
    #[serde(default)]
    pub suffix: String,
    #[serde(default)]
    pub decimals: usize,
    #[serde(default = "default_counter_duration")]
    pub duration_ms: f64,
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_once")]
    pub once: bool,
    #[serde(default = "default_stats_placement")]
    pub placement: Placement,
}

fn default_counter_duration() -> f64 {
    1400.0
}

fn default_margin() -> f32 {
    -80.0
}

fn default_once() -> bool {
    true
}

fn default_stats_placement() -> Placement {
    Placement {
        top: 900.0,
        height: 160.0,
    }
}

impl CounterEntry {
    fn new(label: &str, value: f32, suffix: &str, decimals: usize) -> Self {
        Self {
            label: label.to_string(),
            value,
            suffix: suffix.to_string(),
            decimals,
            duration_ms: default_counter_duration(),
            margin: default_margin(),
            once: default_once(),
            placement: default_stats_placement(),
        }
    }

    pub fn to_config(&self) -> Result<CounterConfig> {
        if !self.value.is_finite() {
            anyhow::bail!("Counter '{}': value must be finite, got {}", self.label, self.value);
        }
        if !self.duration_ms.is_finite() || self.duration_ms < 0.0 {
            anyhow::bail!("Counter '{}': invalid duration {}ms", self.label, self.duration_ms);
        }
        Ok(CounterConfig {
            duration_ms: self.duration_ms,
            gate: GateConfig::new(self.margin, self.once),
            ..CounterConfig::new(self.value, CounterFormat::new(self.decimals, &self.suffix))
        })
    }
}

fn default_counters() -> Vec<CounterEntry> {
    vec![
        CounterEntry::new("Battery packs calibrated", 1280.0, "+", 0),
        CounterEntry::new("Forecast accuracy", 96.4, "%", 1),
        CounterEntry::new("Mode detection precision", 98.7, "%", 1),
        CounterEntry::new("Cycles analyzed", 18420.0, "+", 0),
    ]
}

/// Scroll-linked card: `channels` maps channel name to `[input, output]` pairs
#[derive(Debug, Deserialize, Serialize)]
pub struct ParallaxEntry {
    pub name: String,
    /// `[element anchor, viewport anchor]`, e.g. `["start", "end"]`
    #[serde(default = "default_parallax_start")]
    pub start: [String; 2],
    #[serde(default = "default_parallax_end")]
    pub end: [String; 2],
    /// Smooth progress with this spring before mapping
    #[serde(default)]
    pub spring: Option<SpringConfig>,
    pub placement: Placement,
    pub channels: IndexMap<String, Vec<[f32; 2]>>,
}

fn default_parallax_start() -> [String; 2] {
    ["start".to_string(), "end".to_string()]
}

fn default_parallax_end() -> [String; 2] {
    ["end".to_string(), "start".to_string()]
}

fn parse_offset(pair: &[String; 2], what: &str) -> Result<ScrollOffset> {
    let anchor = |name: &str| {
        Anchor::parse(name).with_context(|| format!("Invalid {what} anchor '{name}'"))
    };
    Ok(ScrollOffset::new(anchor(&pair[0])?, anchor(&pair[1])?))
}

impl ParallaxEntry {
    pub fn range(&self) -> Result<ScrollRange> {
        Ok(ScrollRange::new(
            parse_offset(&self.start, "start")?,
            parse_offset(&self.end, "end")?,
        ))
    }

    pub fn mapper(&self) -> Result<KeyframeMapper> {
        let mut mapper = KeyframeMapper::new();
        for (channel, points) in &self.channels {
            let table = BreakpointTable::new(points.iter().map(|[input, output]| (*input, *output)))
                .with_context(|| format!("Parallax '{}': channel '{channel}'", self.name))?;
            mapper.insert(channel.as_str(), table);
        }
        Ok(mapper)
    }

    pub fn spring(&self) -> Result<Option<SpringConfig>> {
        if let Some(spring) = self.spring {
            spring
                .validate()
                .with_context(|| format!("Parallax '{}': invalid spring", self.name))?;
        }
        Ok(self.spring)
    }
}

fn default_parallax() -> Vec<ParallaxEntry> {
    let channels: IndexMap<String, Vec<[f32; 2]>> = [
        ("rotate_x", vec![[0.0, 14.0], [0.5, 0.0], [1.0, -10.0]]),
        ("rotate_y", vec![[0.0, -12.0], [0.5, 0.0], [1.0, 10.0]]),
        ("y", vec![[0.0, 40.0], [0.5, 0.0], [1.0, -35.0]]),
        ("scale", vec![[0.0, 0.95], [0.5, 1.02], [1.0, 0.97]]),
        (
            "fill_scale",
            vec![[0.0, 0.35], [0.3, 0.58], [0.7, 0.82], [1.0, 0.92]],
        ),
        ("glow_opacity", vec![[0.0, 0.2], [0.5, 0.6], [1.0, 0.35]]),
    ]
    .into_iter()
    .map(|(name, points)| (name.to_string(), points))
    .collect();

    vec![ParallaxEntry {
        name: "battery".to_string(),
        start: default_parallax_start(),
        end: default_parallax_end(),
        spring: None,
        placement: Placement {
            top: 1500.0,
            height: 520.0,
        },
        channels,
    }]
}

/// A list of `count` items revealed one after another
#[derive(Debug, Deserialize, Serialize)]
pub struct RevealEntry {
    pub name: String,
    #[serde(default = "default_reveal_count")]
    pub count: usize,
    /// Top of the first item
    pub top: f32,
    #[serde(default = "default_item_height")]
    pub item_height: f32,
    #[serde(default = "default_item_gap")]
    pub gap: f32,
    #[serde(default = "default_reveal_duration")]
    pub duration_ms: f64,
    #[serde(default)]
    pub delay_ms: f64,
    /// Extra delay per item index
    #[serde(default)]
    pub stagger_ms: f64,
    #[serde(default = "default_margin")]
    pub margin: f32,
    #[serde(default = "default_once")]
    pub once: bool,
    pub from: IndexMap<String, f32>,
    pub to: IndexMap<String, f32>,
}

fn default_reveal_count() -> usize {
    1
}

fn default_item_height() -> f32 {
    88.0
}

fn default_item_gap() -> f32 {
    12.0
}

fn default_reveal_duration() -> f64 {
    350.0
}

impl RevealEntry {
    fn list(name: &str, count: usize, top: f32, stagger_ms: f64, from: &[(&str, f32)]) -> Self {
        Self {
            name: name.to_string(),
            count,
            top,
            item_height: default_item_height(),
            gap: default_item_gap(),
            duration_ms: default_reveal_duration(),
            delay_ms: 0.0,
            stagger_ms,
            margin: default_margin(),
            once: default_once(),
            from: from.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            to: from
                .iter()
                .map(|(k, _)| (k.to_string(), if *k == "opacity" { 1.0 } else { 0.0 }))
                .collect(),
        }
    }

    /// Top edge of item `index`
    pub fn item_top(&self, index: usize) -> f32 {
        self.top + index as f32 * (self.item_height + self.gap)
    }

    pub fn config(&self, index: usize) -> Result<RevealConfig> {
        for (what, value) in [
            ("duration", self.duration_ms),
            ("delay", self.delay_ms),
            ("stagger", self.stagger_ms),
        ] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Reveal '{}': invalid {what} {value}ms", self.name);
            }
        }
        Ok(RevealConfig {
            duration_ms: self.duration_ms,
            delay_ms: self.delay_ms + index as f64 * self.stagger_ms,
            gate: GateConfig::new(self.margin, self.once),
            ..RevealConfig::default()
        })
    }

    /// One `from -> to` table per channel; both maps must name the same channels
    pub fn mapper(&self) -> Result<KeyframeMapper> {
        let mut mapper = KeyframeMapper::new();
        for (channel, from) in &self.from {
            let to = self
                .to
                .get(channel)
                .with_context(|| format!("Reveal '{}': channel '{channel}' has no `to` value", self.name))?;
            let table = BreakpointTable::from_to(*from, *to)
                .with_context(|| format!("Reveal '{}': channel '{channel}'", self.name))?;
            mapper.insert(channel.as_str(), table);
        }
        if let Some(extra) = self.to.keys().find(|channel| !self.from.contains_key(*channel)) {
            anyhow::bail!("Reveal '{}': channel '{extra}' has no `from` value", self.name);
        }
        Ok(mapper)
    }
}

fn default_reveals() -> Vec<RevealEntry> {
    vec![
        RevealEntry::list("features", 4, 2300.0, 50.0, &[("opacity", 0.0), ("y", 10.0)]),
        RevealEntry::list("pipeline", 5, 2900.0, 40.0, &[("opacity", 0.0), ("x", -8.0)]),
        RevealEntry::list("roadmap", 4, 3700.0, 50.0, &[("opacity", 0.0), ("y", 10.0)]),
        RevealEntry::list("testimonials", 3, 4500.0, 50.0, &[("opacity", 0.0), ("y", 12.0)]),
    ]
}

/// Ambient loop: each channel lists keyframe values spread evenly over one
/// iteration, e.g. `x = [0.0, 260.0, 0.0]`
#[derive(Debug, Deserialize, Serialize)]
pub struct LoopEntry {
    pub name: String,
    pub duration_ms: f64,
    #[serde(default)]
    pub delay_ms: f64,
    #[serde(default)]
    pub easing: Easing,
    #[serde(default = "default_loop_repeat")]
    pub repeat: Repeat,
    #[serde(default)]
    pub mirror: bool,
    pub channels: IndexMap<String, Vec<f32>>,
}

fn default_loop_repeat() -> Repeat {
    Repeat::Forever
}

impl LoopEntry {
    fn forever(name: &str, duration_ms: f64, easing: Easing, channels: &[(&str, &[f32])]) -> Self {
        Self {
            name: name.to_string(),
            duration_ms,
            delay_ms: 0.0,
            easing,
            repeat: Repeat::Forever,
            mirror: false,
            channels: channels
                .iter()
                .map(|(channel, values)| (channel.to_string(), values.to_vec()))
                .collect(),
        }
    }

    pub fn config(&self) -> Result<LoopConfig> {
        for (what, value) in [("duration", self.duration_ms), ("delay", self.delay_ms)] {
            if !value.is_finite() || value < 0.0 {
                anyhow::bail!("Loop '{}': invalid {what} {value}ms", self.name);
            }
        }
        Ok(LoopConfig {
            duration_ms: self.duration_ms,
            delay_ms: self.delay_ms,
            easing: self.easing,
            repeat: self.repeat,
            mirror: self.mirror,
        })
    }

    pub fn mapper(&self) -> Result<KeyframeMapper> {
        let mut mapper = KeyframeMapper::new();
        for (channel, values) in &self.channels {
            if values.len() < 2 {
                anyhow::bail!(
                    "Loop '{}': channel '{channel}' needs at least two keyframes",
                    self.name
                );
            }
            let last = (values.len() - 1) as f32;
            let points = values
                .iter()
                .enumerate()
                .map(|(index, value)| (index as f32 / last, *value));
            let table = BreakpointTable::new(points)
                .with_context(|| format!("Loop '{}': channel '{channel}'", self.name))?;
            mapper.insert(channel.as_str(), table);
        }
        Ok(mapper)
    }
}

fn default_loops() -> Vec<LoopEntry> {
    vec![
        LoopEntry::forever(
            "glow_left",
            7000.0,
            Easing::EaseInOut,
            &[("x", &[0.0, 260.0, 0.0]), ("opacity", &[0.15, 0.45, 0.15])],
        ),
        LoopEntry::forever(
            "glow_right",
            8000.0,
            Easing::EaseInOut,
            &[("x", &[0.0, -140.0, 0.0]), ("opacity", &[0.1, 0.35, 0.1])],
        ),
        LoopEntry::forever("lane_markers", 5200.0, Easing::Linear, &[("x", &[0.0, -1900.0])]),
        LoopEntry::forever(
            "car",
            5200.0,
            Easing::EaseInOut,
            &[("y", &[0.0, -3.0, 0.0]), ("x", &[-18.0, 10.0, -18.0])],
        ),
        LoopEntry::forever("wheel", 1400.0, Easing::Linear, &[("rotate", &[0.0, 360.0])]),
        LoopEntry::forever("tail_light", 1400.0, Easing::EaseInOut, &[("opacity", &[0.3, 1.0, 0.3])]),
    ]
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct PredictionSettings {
    pub endpoint: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

impl Default for PredictionSettings {
    fn default() -> Self {
        Self {
            endpoint: kinetic_services::DEFAULT_ENDPOINT.to_string(),
            timeout_ms: kinetic_services::DEFAULT_TIMEOUT.as_millis() as u64,
            max_retries: 1,
            retry_delay_ms: 200,
        }
    }
}

impl PredictionSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn retry(&self) -> RetryPolicy {
        RetryPolicy {
            max_retries: self.max_retries,
            base_delay: Duration::from_millis(self.retry_delay_ms),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentitySettings {
    pub signed_in: bool,
}

// =============================================================================
// Loading and validation
// =============================================================================

impl KineticConfig {
    /// Load `path`, or `kinetic.toml` in the current directory if present,
    /// or the built-in defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_file(path),
            None if Path::new(CONFIG_FILE).exists() => Self::load_file(Path::new(CONFIG_FILE)),
            None => {
                tracing::debug!("No {} found, using built-in landing page", CONFIG_FILE);
                Ok(Self::default())
            }
        }
    }

    pub fn load_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Build every library type the config describes, reporting the first
    /// invalid entry
    pub fn validate(&self) -> Result<()> {
        if self.scheduler.fps == 0 {
            anyhow::bail!("[scheduler] fps must be positive");
        }
        let page = &self.page;
        if !(page.viewport_width > 0.0 && page.viewport_height > 0.0 && page.content_height >= 0.0)
        {
            anyhow::bail!("[page] sizes must be positive");
        }

        if self.prediction.timeout_ms == 0 {
            anyhow::bail!("[prediction] timeout_ms must be positive");
        }

        self.indicator.spring()?;
        for counter in &self.counters {
            counter.to_config()?;
        }
        for parallax in &self.parallax {
            parallax.range()?;
            parallax.mapper()?;
            parallax.spring()?;
        }
        for reveal in &self.reveals {
            reveal.mapper()?;
            for index in 0..reveal.count {
                reveal.config(index)?;
            }
        }
        for entry in &self.loops {
            entry.config()?;
            entry.mapper()?;
        }
        Ok(())
    }

    /// Number of animations the config creates
    pub fn animation_count(&self) -> usize {
        1 + self.counters.len()
            + self.parallax.len()
            + self.reveals.iter().map(|r| r.count).sum::<usize>()
            + self.loops.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = KineticConfig::default();
        config.validate().unwrap();

        assert_eq!(config.counters.len(), 4);
        assert_eq!(config.counters[1].decimals, 1);
        assert_eq!(config.parallax[0].channels.len(), 6);
        assert_eq!(config.animation_count(), 1 + 4 + 1 + 16 + 6);
    }

    #[test]
    fn test_empty_file_yields_defaults() {
        let config = KineticConfig::parse("").unwrap();
        assert_eq!(config.scheduler.fps, 60);
        assert_eq!(config.indicator.stiffness, 100.0);
        assert_eq!(config.prediction.max_retries, 1);
        assert!(!config.identity.signed_in);
    }

    #[test]
    fn test_parse_custom_sections() {
        let config = KineticConfig::parse(
            r#"
            [scheduler]
            fps = 120

            [[counters]]
            label = "Uptime"
            value = 99.9
            suffix = "%"
            decimals = 1

            [[parallax]]
            name = "hero"
            start = ["start", "end"]
            end = ["center", "center"]
            placement = { top = 400.0, height = 300.0 }
            channels = { opacity = [[0.0, 0.0], [1.0, 1.0]] }

            [prediction]
            endpoint = "http://localhost:9000/predict"
            "#,
        )
        .unwrap();

        config.validate().unwrap();
        assert_eq!(config.counters.len(), 1);
        assert_eq!(config.counters[0].duration_ms, 1400.0);
        assert_eq!(config.counters[0].margin, -80.0);
        assert_eq!(
            config.parallax[0].range().unwrap().end,
            ScrollOffset::new(Anchor::CENTER, Anchor::CENTER)
        );
        // Unlisted arrays keep their defaults
        assert_eq!(config.reveals.len(), 4);
        assert_eq!(config.prediction.timeout_ms, 10_000);
    }

    #[test]
    fn test_rejects_non_increasing_breakpoints() {
        let config = KineticConfig::parse(
            r#"
            [[parallax]]
            name = "broken"
            placement = { top = 0.0, height = 100.0 }
            channels = { y = [[0.0, 1.0], [0.0, 2.0]] }
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(format!("{err:#}").contains("broken"));
    }

    #[test]
    fn test_rejects_zero_prediction_timeout() {
        let config = KineticConfig::parse(
            r#"
            [prediction]
            timeout_ms = 0
            "#,
        )
        .unwrap();

        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("timeout_ms"));
    }

    #[test]
    fn test_rejects_non_finite_counter_value() {
        for value in ["nan", "inf", "-inf"] {
            let config = KineticConfig::parse(&format!(
                r#"
                [[counters]]
                label = "Broken"
                value = {value}
                "#
            ))
            .unwrap();

            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("Broken"), "{value}");
        }
    }

    #[test]
    fn test_parse_loops() {
        let config = KineticConfig::parse(
            r#"
            [[loops]]
            name = "pulse"
            duration_ms = 1400.0
            easing = "ease_in_out"
            channels = { opacity = [0.3, 1.0, 0.3] }

            [[loops]]
            name = "nudge"
            duration_ms = 300.0
            repeat = { times = 3 }
            mirror = true
            channels = { x = [0.0, 12.0] }
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        let pulse = &config.loops[0];
        assert_eq!(pulse.repeat, Repeat::Forever);
        assert_eq!(pulse.config().unwrap().easing, Easing::EaseInOut);
        let mapper = pulse.mapper().unwrap();
        assert_eq!(mapper.evaluate(0.5).get("opacity"), Some(1.0));
        assert_eq!(mapper.evaluate(1.0).get("opacity"), Some(0.3));

        let nudge = config.loops[1].config().unwrap();
        assert_eq!(nudge.repeat, Repeat::Times(3));
        assert!(nudge.mirror);
    }

    #[test]
    fn test_loop_needs_two_keyframes() {
        let config = KineticConfig::parse(
            r#"
            [[loops]]
            name = "still"
            duration_ms = 1000.0
            channels = { x = [5.0] }
            "#,
        )
        .unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("still"));
    }

    #[test]
    fn test_rejects_bad_anchor() {
        let config = KineticConfig::parse(
            r#"
            [[parallax]]
            name = "hero"
            start = ["middle", "end"]
            placement = { top = 0.0, height = 100.0 }
            channels = { y = [[0.0, 1.0], [1.0, 2.0]] }
            "#,
        )
        .unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_reveal_channels_must_match() {
        let mut reveal = RevealEntry::list("x", 1, 0.0, 0.0, &[("opacity", 0.0)]);
        reveal.to.insert("scale".to_string(), 1.0);
        assert!(reveal.mapper().is_err());
    }

    #[test]
    fn test_reveal_stagger() {
        let reveal = RevealEntry::list("features", 4, 2300.0, 50.0, &[("opacity", 0.0)]);
        assert_eq!(reveal.config(3).unwrap().delay_ms, 150.0);
        assert_eq!(reveal.item_top(2), 2300.0 + 2.0 * 100.0);
        assert_eq!(reveal.to["opacity"], 1.0);
    }
}
