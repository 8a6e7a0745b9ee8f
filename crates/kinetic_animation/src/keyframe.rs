//! Breakpoint tables and the keyframe mapper
//!
//! A [`BreakpointTable`] maps a scalar progress value through ordered
//! `(input, output)` pairs with piecewise-linear interpolation. A
//! [`KeyframeMapper`] holds one table per named channel so a single progress
//! value can drive several properties (rotation, translation, opacity, scale)
//! along independent curves.
//!
//! # Example
//!
//! ```rust
//! use kinetic_animation::{BreakpointTable, KeyframeMapper};
//!
//! let mapper = KeyframeMapper::new()
//!     .channel("rotate_x", BreakpointTable::new([(0.0, 14.0), (0.5, 0.0), (1.0, -10.0)]).unwrap())
//!     .channel("opacity", BreakpointTable::new([(0.0, 0.2), (0.5, 0.6), (1.0, 0.35)]).unwrap());
//!
//! let frame = mapper.evaluate(0.25);
//! assert_eq!(frame.get("rotate_x"), Some(7.0));
//! ```

use crate::error::{AnimationError, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::sync::Arc;

/// One `(input, output)` pair
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Breakpoint {
    pub input: f32,
    pub output: f32,
}

impl From<(f32, f32)> for Breakpoint {
    fn from((input, output): (f32, f32)) -> Self {
        Breakpoint { input, output }
    }
}

/// Behaviour for inputs outside the table's input range
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Extrapolation {
    /// Hold the nearest endpoint's output
    #[default]
    Clamp,
    /// Continue the first / last segment's slope
    Extend,
}

/// Strictly increasing breakpoints for one output channel
///
/// Construction rejects tables with fewer than two entries, non-finite
/// values, or inputs that do not strictly increase, so sampling never divides
/// by zero.
#[derive(Clone, Debug, PartialEq)]
pub struct BreakpointTable {
    points: SmallVec<[Breakpoint; 4]>,
    extrapolation: Extrapolation,
}

impl BreakpointTable {
    /// Build a clamping table
    pub fn new<I, P>(points: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Breakpoint>,
    {
        let points: SmallVec<[Breakpoint; 4]> = points.into_iter().map(Into::into).collect();

        if points.len() < 2 {
            return Err(AnimationError::TooFewBreakpoints(points.len()));
        }

        for (index, point) in points.iter().enumerate() {
            if !point.input.is_finite() || !point.output.is_finite() {
                return Err(AnimationError::NonFiniteBreakpoint(index));
            }
        }

        for (index, pair) in points.windows(2).enumerate() {
            if pair[1].input <= pair[0].input {
                return Err(AnimationError::NonIncreasingInput {
                    index: index + 1,
                    previous: pair[0].input,
                    next: pair[1].input,
                });
            }
        }

        Ok(Self {
            points,
            extrapolation: Extrapolation::Clamp,
        })
    }

    /// Shorthand for a two-point `from -> to` table over [0, 1]
    pub fn from_to(from: f32, to: f32) -> Result<Self> {
        Self::new([(0.0, from), (1.0, to)])
    }

    pub fn with_extrapolation(mut self, extrapolation: Extrapolation) -> Self {
        self.extrapolation = extrapolation;
        self
    }

    /// Continue the end segments' slopes past the input range
    pub fn extrapolating(self) -> Self {
        self.with_extrapolation(Extrapolation::Extend)
    }

    pub fn extrapolation(&self) -> Extrapolation {
        self.extrapolation
    }

    pub fn points(&self) -> &[Breakpoint] {
        &self.points
    }

    /// `(first input, last input)`
    pub fn input_range(&self) -> (f32, f32) {
        (self.first().input, self.last().input)
    }

    fn first(&self) -> Breakpoint {
        self.points[0]
    }

    fn last(&self) -> Breakpoint {
        self.points[self.points.len() - 1]
    }

    /// Interpolated output at `p`
    ///
    /// Exact breakpoint inputs return their outputs exactly. NaN samples as
    /// the first output.
    pub fn sample(&self, p: f32) -> f32 {
        let first = self.first();
        let last = self.last();

        if p.is_nan() {
            return first.output;
        }

        if p <= first.input {
            return match self.extrapolation {
                Extrapolation::Extend if p < first.input => self.segment(0, p),
                _ => first.output,
            };
        }

        if p >= last.input {
            return match self.extrapolation {
                Extrapolation::Extend if p > last.input => self.segment(self.points.len() - 2, p),
                _ => last.output,
            };
        }

        // first.input < p < last.input, so 1 <= count < len
        let k = self.points.partition_point(|b| b.input <= p) - 1;
        self.segment(k, p)
    }

    fn segment(&self, k: usize, p: f32) -> f32 {
        let a = self.points[k];
        let b = self.points[k + 1];
        a.output + (b.output - a.output) * (p - a.input) / (b.input - a.input)
    }
}

/// Channel values produced by one mapper evaluation, in channel order
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MappedValues {
    values: SmallVec<[(Arc<str>, f32); 8]>,
}

impl MappedValues {
    pub fn get(&self, channel: &str) -> Option<f32> {
        self.values
            .iter()
            .find(|(name, _)| &**name == channel)
            .map(|(_, value)| *value)
    }

    /// Like `get`, but an unknown channel is an error
    pub fn require(&self, channel: &str) -> Result<f32> {
        self.get(channel)
            .ok_or_else(|| AnimationError::UnknownChannel(channel.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f32)> {
        self.values.iter().map(|(name, value)| (&**name, *value))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Named breakpoint tables sharing one progress input
#[derive(Clone, Debug, Default)]
pub struct KeyframeMapper {
    channels: IndexMap<Arc<str>, BreakpointTable>,
}

impl KeyframeMapper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a channel
    pub fn channel(mut self, name: impl Into<Arc<str>>, table: BreakpointTable) -> Self {
        self.insert(name, table);
        self
    }

    /// Add a channel from raw points, validating them
    pub fn try_channel<I, P>(self, name: impl Into<Arc<str>>, points: I) -> Result<Self>
    where
        I: IntoIterator<Item = P>,
        P: Into<Breakpoint>,
    {
        Ok(self.channel(name, BreakpointTable::new(points)?))
    }

    pub fn insert(&mut self, name: impl Into<Arc<str>>, table: BreakpointTable) {
        self.channels.insert(name.into(), table);
    }

    pub fn table(&self, name: &str) -> Option<&BreakpointTable> {
        self.channels.get(name)
    }

    pub fn channel_names(&self) -> impl Iterator<Item = &str> {
        self.channels.keys().map(|name| &**name)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Sample one channel
    pub fn sample(&self, name: &str, p: f32) -> Result<f32> {
        self.channels
            .get(name)
            .map(|table| table.sample(p))
            .ok_or_else(|| AnimationError::UnknownChannel(name.to_string()))
    }

    /// Sample every channel at `p`
    pub fn evaluate(&self, p: f32) -> MappedValues {
        MappedValues {
            values: self
                .channels
                .iter()
                .map(|(name, table)| (Arc::clone(name), table.sample(p)))
                .collect(),
        }
    }
}
