//! Eased tween
//!
//! Drives one displayed number from 0 to a target over a fixed duration:
//!
//! ```text
//! display = target * easing(clamp01((now - start) / duration))
//! ```
//!
//! with cubic ease-out by default. The lifecycle is
//! `Idle -> Running -> Settled`; starting again from any state restarts at 0.

use crate::easing::{clamp01, Easing};
use crate::error::{AnimationError, Result};

/// Tween lifecycle
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TweenState {
    /// Not started; displays 0
    Idle,
    Running { start_ms: f64 },
    /// Reached the target; displays it exactly
    Settled,
}

/// A 0 → target tween
#[derive(Clone, Copy, Debug)]
pub struct EasedTween {
    target: f32,
    duration_ms: f64,
    easing: Easing,
    state: TweenState,
}

impl EasedTween {
    pub fn new(target: f32, duration_ms: f64) -> Result<Self> {
        if !duration_ms.is_finite() || duration_ms < 0.0 {
            return Err(AnimationError::InvalidDuration(duration_ms));
        }
        Ok(Self {
            target,
            duration_ms,
            easing: Easing::EaseOutCubic,
            state: TweenState::Idle,
        })
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn duration_ms(&self) -> f64 {
        self.duration_ms
    }

    pub fn state(&self) -> TweenState {
        self.state
    }

    pub fn is_settled(&self) -> bool {
        self.state == TweenState::Settled
    }

    /// Begin (or restart from 0) at `now_ms`
    pub fn start(&mut self, now_ms: f64) {
        self.state = TweenState::Running { start_ms: now_ms };
    }

    /// Linear progress at `now_ms`
    pub fn progress(&self, now_ms: f64) -> f32 {
        match self.state {
            TweenState::Idle => 0.0,
            TweenState::Settled => 1.0,
            TweenState::Running { start_ms } => {
                if self.duration_ms == 0.0 {
                    return 1.0;
                }
                clamp01(((now_ms - start_ms) / self.duration_ms) as f32)
            }
        }
    }

    /// Displayed value at `now_ms` without changing state
    pub fn value_at(&self, now_ms: f64) -> f32 {
        let p = self.progress(now_ms);
        if p >= 1.0 {
            return self.target;
        }
        self.target * self.easing.apply(p)
    }

    /// Displayed value at `now_ms`, settling once progress reaches 1
    pub fn display(&mut self, now_ms: f64) -> f32 {
        let value = self.value_at(now_ms);
        if matches!(self.state, TweenState::Running { .. }) && self.progress(now_ms) >= 1.0 {
            self.state = TweenState::Settled;
            tracing::debug!(target = self.target, "tween settled");
        }
        value
    }
}

/// Counter text: fixed decimals plus a suffix
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CounterFormat {
    pub decimals: usize,
    pub suffix: String,
}

impl CounterFormat {
    pub fn new(decimals: usize, suffix: impl Into<String>) -> Self {
        Self {
            decimals,
            suffix: suffix.into(),
        }
    }

    pub fn format(&self, value: f32) -> String {
        format!("{:.*}{}", self.decimals, value, self.suffix)
    }
}
