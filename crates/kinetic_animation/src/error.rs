//! Animation error types

use thiserror::Error;

/// Errors raised while building or scheduling animations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnimationError {
    /// A breakpoint table needs at least two entries
    #[error("Breakpoint table needs at least 2 entries, got {0}")]
    TooFewBreakpoints(usize),

    /// Breakpoint inputs must be strictly increasing
    #[error("Breakpoint inputs must be strictly increasing: input {next} at index {index} follows {previous}")]
    NonIncreasingInput {
        index: usize,
        previous: f32,
        next: f32,
    },

    /// Breakpoint input or output is NaN or infinite
    #[error("Breakpoint at index {0} is not finite")]
    NonFiniteBreakpoint(usize),

    /// Durations must be finite and non-negative
    #[error("Invalid duration: {0}ms")]
    InvalidDuration(f64),

    /// Spring parameters out of range
    #[error("Invalid spring configuration: {0}")]
    InvalidSpring(String),

    /// The scheduler was shut down or dropped
    #[error("Animation scheduler is shut down")]
    SchedulerShutdown,

    /// A keyframe channel name that the mapper does not define
    #[error("Unknown channel: {0}")]
    UnknownChannel(String),
}

/// Result type for animation operations
pub type Result<T> = std::result::Result<T, AnimationError>;
