//! Service error types

use std::time::Duration;
use thiserror::Error;

/// Prediction service failures
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PredictionError {
    /// No response within the request timeout
    #[error("Prediction request timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or protocol failure before a response arrived
    #[error("Prediction request failed: {0}")]
    Transport(String),

    /// The service answered with a non-success status
    #[error("Prediction service returned HTTP {status}")]
    Status { status: u16 },

    /// The response body was not `{"prediction": <number>}`
    #[error("Failed to decode prediction response: {0}")]
    Decode(String),

    /// A record field is NaN or infinite
    #[error("Invalid prediction record: {0} is not a finite number")]
    InvalidRecord(&'static str),
}

impl PredictionError {
    /// Timeouts, transport failures and 5xx responses may succeed on retry
    pub fn is_retryable(&self) -> bool {
        match self {
            PredictionError::Timeout(_) | PredictionError::Transport(_) => true,
            PredictionError::Status { status } => *status >= 500,
            PredictionError::Decode(_) | PredictionError::InvalidRecord(_) => false,
        }
    }
}

/// Identity provider failures
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    /// Sign-in or sign-up requested while already authenticated
    #[error("Already signed in")]
    AlreadySignedIn,

    /// The provider could not start the flow
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Result type for prediction calls
pub type Result<T> = std::result::Result<T, PredictionError>;
