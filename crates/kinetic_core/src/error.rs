//! Layout error types

use thiserror::Error;

/// Layout store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LayoutError {
    /// The element id is not (or no longer) registered
    #[error("Unknown element: {0}")]
    UnknownElement(String),

    /// The scroll container id is not (or no longer) registered
    #[error("Unknown scroll container: {0}")]
    UnknownContainer(String),

    /// Bounds with negative or non-finite extents
    #[error("Invalid bounds: {0}")]
    InvalidBounds(String),
}

/// Result type for layout operations
pub type Result<T> = std::result::Result<T, LayoutError>;
