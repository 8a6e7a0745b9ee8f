//! Spring smoothing
//!
//! Damped-spring follower that turns a raw, possibly jittery signal (scroll
//! progress) into a continuously smoothed one. Integration uses the
//! semi-implicit Euler update
//!
//! ```text
//! velocity += ((target - position) * stiffness - velocity * damping) / mass * dt
//! position += velocity * dt
//! ```
//!
//! with long frames split into fixed substeps so a dropped frame cannot blow
//! the integration up. Gaps longer than a second (a backgrounded tab, a
//! suspended process) are integrated as one second.

use crate::error::{AnimationError, Result};
use serde::{Deserialize, Serialize};

/// Largest integration step in seconds
const MAX_SUBSTEP_SECS: f64 = 1.0 / 120.0;

/// Longest frame gap integrated in one step
const MAX_FRAME_GAP_SECS: f64 = 1.0;

/// Configuration for a spring
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpringConfig {
    pub stiffness: f32,
    pub damping: f32,
    pub mass: f32,
    /// Distance to target below which the spring may come to rest
    pub rest_delta: f32,
    /// Speed below which the spring may come to rest
    pub rest_speed: f32,
}

impl SpringConfig {
    /// Create a new spring configuration with default rest thresholds
    pub fn new(stiffness: f32, damping: f32, mass: f32) -> Self {
        Self {
            stiffness,
            damping,
            mass,
            ..Self::default()
        }
    }

    pub fn with_rest_delta(mut self, rest_delta: f32) -> Self {
        self.rest_delta = rest_delta;
        self
    }

    pub fn with_rest_speed(mut self, rest_speed: f32) -> Self {
        self.rest_speed = rest_speed;
        self
    }

    /// A gentle, slow spring
    pub fn gentle() -> Self {
        Self::new(120.0, 14.0, 1.0)
    }

    /// A wobbly spring with overshoot
    pub fn wobbly() -> Self {
        Self::new(180.0, 12.0, 1.0)
    }

    /// A stiff, snappy spring
    pub fn stiff() -> Self {
        Self::new(400.0, 30.0, 1.0)
    }

    /// A slow spring with no overshoot
    pub fn molasses() -> Self {
        Self::new(100.0, 20.0, 1.0)
    }

    /// Scroll progress bar smoothing (stiffness 100, damping 30, rest delta 0.001)
    pub fn indicator() -> Self {
        Self::new(100.0, 30.0, 1.0).with_rest_delta(0.001)
    }

    /// Calculate critical damping for this spring's stiffness and mass
    pub fn critical_damping(&self) -> f32 {
        2.0 * (self.stiffness * self.mass).sqrt()
    }

    /// Check if the spring is underdamped (will oscillate)
    pub fn is_underdamped(&self) -> bool {
        self.damping < self.critical_damping()
    }

    /// Check if the spring is critically damped (no oscillation, fastest settling)
    pub fn is_critically_damped(&self) -> bool {
        (self.damping - self.critical_damping()).abs() < 0.01
    }

    /// Check if the spring is overdamped (slow settling, no oscillation)
    pub fn is_overdamped(&self) -> bool {
        self.damping > self.critical_damping()
    }

    /// Reject parameters that cannot converge
    pub fn validate(&self) -> Result<()> {
        let finite = [
            self.stiffness,
            self.damping,
            self.mass,
            self.rest_delta,
            self.rest_speed,
        ]
        .iter()
        .all(|v| v.is_finite());

        if !finite {
            return Err(AnimationError::InvalidSpring(
                "parameters must be finite".into(),
            ));
        }
        if self.stiffness <= 0.0 {
            return Err(AnimationError::InvalidSpring(format!(
                "stiffness must be positive, got {}",
                self.stiffness
            )));
        }
        if self.damping < 0.0 {
            return Err(AnimationError::InvalidSpring(format!(
                "damping must be non-negative, got {}",
                self.damping
            )));
        }
        if self.mass <= 0.0 {
            return Err(AnimationError::InvalidSpring(format!(
                "mass must be positive, got {}",
                self.mass
            )));
        }
        if self.rest_delta <= 0.0 || self.rest_speed <= 0.0 {
            return Err(AnimationError::InvalidSpring(
                "rest thresholds must be positive".into(),
            ));
        }
        Ok(())
    }
}

impl Default for SpringConfig {
    fn default() -> Self {
        Self {
            stiffness: 400.0,
            damping: 30.0,
            mass: 1.0,
            rest_delta: 0.01,
            rest_speed: 0.01,
        }
    }
}

/// A spring that follows a moving target
///
/// The (position, velocity) state is owned by this instance and only reset
/// through [`SpringSmoother::reset`].
#[derive(Clone, Copy, Debug)]
pub struct SpringSmoother {
    config: SpringConfig,
    position: f32,
    velocity: f32,
    target: f32,
    last_time_ms: Option<f64>,
    resting: bool,
    skip_when_resting: bool,
}

impl SpringSmoother {
    /// Start at rest on `initial`
    pub fn new(config: SpringConfig, initial: f32) -> Self {
        Self {
            config,
            position: initial,
            velocity: 0.0,
            target: initial,
            last_time_ms: None,
            resting: true,
            skip_when_resting: true,
        }
    }

    /// Disable the idle shortcut; output is identical either way
    pub fn without_idle_skip(mut self) -> Self {
        self.skip_when_resting = false;
        self
    }

    pub fn config(&self) -> SpringConfig {
        self.config
    }

    pub fn value(&self) -> f32 {
        self.position
    }

    pub fn velocity(&self) -> f32 {
        self.velocity
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    /// True while the spring sits on its target with no velocity
    pub fn is_settled(&self) -> bool {
        self.resting
    }

    /// Re-initialize at rest on `value`, forgetting frame timing
    pub fn reset(&mut self, value: f32) {
        self.position = value;
        self.velocity = 0.0;
        self.target = value;
        self.last_time_ms = None;
        self.resting = true;
    }

    pub fn set_target(&mut self, target: f32) {
        if target != self.target {
            self.target = target;
            self.resting = false;
        }
    }

    /// Frame-driven update: follow `target` using the wall time since the
    /// previous call. The first call only records the time.
    pub fn update(&mut self, target: f32, now_ms: f64) -> f32 {
        self.set_target(target);

        let dt_secs = match self.last_time_ms {
            Some(last) => ((now_ms - last) / 1000.0).max(0.0),
            None => 0.0,
        };
        self.last_time_ms = Some(now_ms);

        self.step(dt_secs)
    }

    /// Advance the simulation by `dt_secs`
    pub fn step(&mut self, dt_secs: f64) -> f32 {
        if self.resting && self.skip_when_resting {
            return self.position;
        }
        if dt_secs <= 0.0 {
            return self.position;
        }
        let dt_secs = dt_secs.min(MAX_FRAME_GAP_SECS);

        let substeps = (dt_secs / MAX_SUBSTEP_SECS).ceil().max(1.0) as u32;
        let h = (dt_secs / substeps as f64) as f32;

        for _ in 0..substeps {
            self.integrate(h);
            if self.try_rest() {
                break;
            }
        }

        self.position
    }

    fn integrate(&mut self, h: f32) {
        let SpringConfig {
            stiffness,
            damping,
            mass,
            ..
        } = self.config;

        let acceleration =
            ((self.target - self.position) * stiffness - self.velocity * damping) / mass;
        self.velocity += acceleration * h;
        self.position += self.velocity * h;
    }

    /// Snap onto the target once inside the rest thresholds. After snapping,
    /// further integration is a no-op, which keeps the idle skip invisible.
    fn try_rest(&mut self) -> bool {
        if (self.target - self.position).abs() < self.config.rest_delta
            && self.velocity.abs() < self.config.rest_speed
        {
            self.position = self.target;
            self.velocity = 0.0;
            self.resting = true;
        }
        self.resting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spring_settles_to_target() {
        let mut spring = SpringSmoother::new(SpringConfig::stiff(), 0.0);
        spring.set_target(100.0);

        // Simulate for 2 seconds at 60fps
        for _ in 0..120 {
            spring.step(1.0 / 60.0);
        }

        assert!(spring.is_settled());
        assert_eq!(spring.value(), 100.0);
    }

    #[test]
    fn test_spring_inherits_velocity() {
        let mut spring = SpringSmoother::new(SpringConfig::wobbly(), 0.0);
        spring.set_target(100.0);

        for _ in 0..10 {
            spring.step(1.0 / 60.0);
        }

        let velocity = spring.velocity();
        assert!(velocity > 0.0);

        // Change target mid-flight - velocity should continue
        spring.set_target(50.0);
        assert_eq!(spring.velocity(), velocity);
    }

    #[test]
    fn test_spring_presets() {
        assert!(SpringConfig::wobbly().is_underdamped());
        assert!(SpringConfig::gentle().is_underdamped());
        assert!(SpringConfig::stiff().is_underdamped());
        assert!(SpringConfig::indicator().is_overdamped());
        assert!(SpringConfig::new(100.0, 20.0, 1.0).is_critically_damped());
    }

    #[test]
    fn test_large_frame_gap_is_stable() {
        let mut spring = SpringSmoother::new(SpringConfig::stiff(), 0.0);
        spring.set_target(1000.0);

        // Large time steps that would diverge with a single Euler step
        for _ in 0..100 {
            spring.step(0.25);
            assert!(spring.value() < 2000.0);
            assert!(spring.value() > -500.0);
        }
        assert_eq!(spring.value(), 1000.0);
    }

    #[test]
    fn test_long_gap_is_capped() {
        // Undamped: never rests, so every substep would run
        let config = SpringConfig::new(100.0, 0.0, 1.0);
        config.validate().unwrap();

        let mut day = SpringSmoother::new(config, 0.0);
        let mut second = SpringSmoother::new(config, 0.0);
        day.set_target(1.0);
        second.set_target(1.0);

        assert_eq!(day.step(86_400.0), second.step(1.0));
        assert_eq!(day.velocity(), second.velocity());
    }

    #[test]
    fn test_overdamped_does_not_overshoot() {
        let mut spring = SpringSmoother::new(SpringConfig::indicator(), 0.0);
        spring.set_target(1.0);

        for _ in 0..600 {
            spring.step(1.0 / 60.0);
            assert!(spring.value() <= 1.0);
        }
        assert!(spring.is_settled());
    }

    #[test]
    fn test_update_uses_wall_time() {
        // Same elapsed time, different frame rates, near-identical output
        let mut fast = SpringSmoother::new(SpringConfig::indicator(), 0.0);
        let mut slow = SpringSmoother::new(SpringConfig::indicator(), 0.0);

        fast.update(1.0, 0.0);
        slow.update(1.0, 0.0);

        for frame in 1..=24 {
            fast.update(1.0, frame as f64 * (500.0 / 24.0));
        }
        for frame in 1..=6 {
            slow.update(1.0, frame as f64 * (500.0 / 6.0));
        }

        assert!((fast.value() - slow.value()).abs() < 0.02);
    }

    #[test]
    fn test_first_update_only_records_time() {
        let mut spring = SpringSmoother::new(SpringConfig::indicator(), 0.0);
        assert_eq!(spring.update(1.0, 5_000.0), 0.0);
        assert!(!spring.is_settled());
        assert!(spring.update(1.0, 5_016.0) > 0.0);
    }

    #[test]
    fn test_idle_skip_is_unobservable() {
        let mut skipping = SpringSmoother::new(SpringConfig::indicator(), 0.0);
        let mut computing = SpringSmoother::new(SpringConfig::indicator(), 0.0).without_idle_skip();

        let targets = [0.2, 0.2, 0.5, 0.5, 0.5, 0.1, 0.1, 0.9];
        let mut now = 0.0;
        for target in targets {
            for _ in 0..90 {
                now += 16.0;
                assert_eq!(skipping.update(target, now), computing.update(target, now));
            }
        }
        assert_eq!(skipping.velocity(), computing.velocity());
    }

    #[test]
    fn test_reset() {
        let mut spring = SpringSmoother::new(SpringConfig::gentle(), 0.0);
        spring.set_target(10.0);
        spring.step(0.1);

        spring.reset(3.0);
        assert_eq!(spring.value(), 3.0);
        assert_eq!(spring.velocity(), 0.0);
        assert!(spring.is_settled());
    }

    #[test]
    fn test_validate() {
        assert!(SpringConfig::indicator().validate().is_ok());
        assert!(SpringConfig::new(0.0, 10.0, 1.0).validate().is_err());
        assert!(SpringConfig::new(100.0, -1.0, 1.0).validate().is_err());
        assert!(SpringConfig::new(100.0, 10.0, 0.0).validate().is_err());
        assert!(SpringConfig::stiff().with_rest_delta(0.0).validate().is_err());
    }
}
