//! Kinetic Core
//!
//! Foundational types shared by the Kinetic animation crates:
//!
//! - **Geometry**: `Bounds` rectangles and root-margin `Edges`
//! - **Layout Store**: element bounds and scroll containers that progress
//!   sources and visibility gates read every frame
//!
//! # Example
//!
//! ```rust
//! use kinetic_core::{Bounds, LayoutTree};
//!
//! let mut layout = LayoutTree::new();
//! let page = layout.add_container(Bounds::new(0.0, 0.0, 1280.0, 800.0), 4000.0);
//! let card = layout.add_element(page, Bounds::new(0.0, 1200.0, 600.0, 400.0)).unwrap();
//!
//! layout.set_scroll(page, 600.0).unwrap();
//! let visible = layout.visible_bounds(card).unwrap();
//! assert_eq!(visible.y, 600.0);
//! ```

pub mod error;
pub mod geometry;
pub mod layout;

pub use error::{LayoutError, Result};
pub use geometry::{Bounds, Edges};
pub use layout::{
    lock_layout, shared_layout, ContainerId, ElementId, LayoutTree, ScrollContainer,
    SharedLayout,
};
