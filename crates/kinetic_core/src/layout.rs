//! Layout store
//!
//! Holds the geometry that animations observe: scroll containers (a viewport
//! rectangle plus a vertical scroll offset over some content height) and the
//! elements laid out inside them. Element bounds are stored in the content
//! coordinates of their container; `visible_bounds` projects them into the
//! window coordinate space the viewport rectangle lives in.
//!
//! The store is written by whoever owns layout (resize, scroll events) and
//! read every frame by progress sources and visibility gates through a
//! [`SharedLayout`].

use std::sync::{Arc, Mutex, MutexGuard};

use slotmap::{new_key_type, SlotMap};

use crate::error::{LayoutError, Result};
use crate::geometry::Bounds;

new_key_type! {
    /// Handle to an element registered in the layout store
    pub struct ElementId;
    /// Handle to a scroll container registered in the layout store
    pub struct ContainerId;
}

/// A vertically scrolling viewport
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScrollContainer {
    /// Visible rectangle in window coordinates
    pub viewport: Bounds,
    /// Total height of the scrollable content
    pub content_height: f32,
    /// Current scroll offset (0 = top; may overshoot during bounce)
    pub scroll_y: f32,
}

impl ScrollContainer {
    /// Largest resting scroll offset
    pub fn max_scroll(&self) -> f32 {
        (self.content_height - self.viewport.height).max(0.0)
    }
}

#[derive(Clone, Copy, Debug)]
struct ElementEntry {
    container: ContainerId,
    bounds: Bounds,
}

/// Element and scroll-container geometry
#[derive(Debug, Default)]
pub struct LayoutTree {
    containers: SlotMap<ContainerId, ScrollContainer>,
    elements: SlotMap<ElementId, ElementEntry>,
}

/// Layout store shared between the layout owner and animations
pub type SharedLayout = Arc<Mutex<LayoutTree>>;

/// Wrap a layout tree for sharing
pub fn shared_layout(tree: LayoutTree) -> SharedLayout {
    Arc::new(Mutex::new(tree))
}

/// Lock a shared layout, recovering the data from a poisoned lock
pub fn lock_layout(layout: &SharedLayout) -> MutexGuard<'_, LayoutTree> {
    layout.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl LayoutTree {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Containers
    // =========================================================================

    /// Register a scroll container scrolled to the top
    pub fn add_container(&mut self, viewport: Bounds, content_height: f32) -> ContainerId {
        self.containers.insert(ScrollContainer {
            viewport,
            content_height,
            scroll_y: 0.0,
        })
    }

    /// Remove a container together with every element inside it
    pub fn remove_container(&mut self, id: ContainerId) -> Option<ScrollContainer> {
        let removed = self.containers.remove(id)?;
        self.elements.retain(|_, entry| entry.container != id);
        tracing::debug!(container = ?id, "layout: removed container");
        Some(removed)
    }

    pub fn container(&self, id: ContainerId) -> Option<&ScrollContainer> {
        self.containers.get(id)
    }

    pub fn set_scroll(&mut self, id: ContainerId, scroll_y: f32) -> Result<()> {
        let container = self.container_mut(id)?;
        container.scroll_y = scroll_y;
        Ok(())
    }

    pub fn scroll_by(&mut self, id: ContainerId, delta_y: f32) -> Result<f32> {
        let container = self.container_mut(id)?;
        container.scroll_y += delta_y;
        Ok(container.scroll_y)
    }

    /// Replace the viewport rectangle (window resize)
    pub fn set_viewport(&mut self, id: ContainerId, viewport: Bounds) -> Result<()> {
        if !viewport.is_valid() {
            return Err(LayoutError::InvalidBounds(format!("{viewport:?}")));
        }
        self.container_mut(id)?.viewport = viewport;
        Ok(())
    }

    pub fn set_content_height(&mut self, id: ContainerId, content_height: f32) -> Result<()> {
        self.container_mut(id)?.content_height = content_height;
        Ok(())
    }

    fn container_mut(&mut self, id: ContainerId) -> Result<&mut ScrollContainer> {
        self.containers
            .get_mut(id)
            .ok_or_else(|| LayoutError::UnknownContainer(format!("{id:?}")))
    }

    // =========================================================================
    // Elements
    // =========================================================================

    /// Register an element at `bounds` (content coordinates of `container`)
    pub fn add_element(&mut self, container: ContainerId, bounds: Bounds) -> Result<ElementId> {
        if !self.containers.contains_key(container) {
            return Err(LayoutError::UnknownContainer(format!("{container:?}")));
        }
        if !bounds.is_valid() {
            return Err(LayoutError::InvalidBounds(format!("{bounds:?}")));
        }
        Ok(self.elements.insert(ElementEntry { container, bounds }))
    }

    /// Unmount an element. Observers degrade to their last known value.
    pub fn remove_element(&mut self, id: ElementId) -> Option<Bounds> {
        self.elements.remove(id).map(|entry| entry.bounds)
    }

    pub fn set_element_bounds(&mut self, id: ElementId, bounds: Bounds) -> Result<()> {
        if !bounds.is_valid() {
            return Err(LayoutError::InvalidBounds(format!("{bounds:?}")));
        }
        let entry = self
            .elements
            .get_mut(id)
            .ok_or_else(|| LayoutError::UnknownElement(format!("{id:?}")))?;
        entry.bounds = bounds;
        Ok(())
    }

    pub fn contains_element(&self, id: ElementId) -> bool {
        self.elements.contains_key(id)
    }

    /// Element bounds in its container's content coordinates
    pub fn element_bounds(&self, id: ElementId) -> Option<Bounds> {
        self.elements.get(id).map(|entry| entry.bounds)
    }

    /// Container an element lives in
    pub fn element_container(&self, id: ElementId) -> Option<ContainerId> {
        self.elements.get(id).map(|entry| entry.container)
    }

    /// Element bounds projected into window coordinates at the current scroll
    pub fn visible_bounds(&self, id: ElementId) -> Option<Bounds> {
        let entry = self.elements.get(id)?;
        let container = self.containers.get(entry.container)?;
        Some(
            entry
                .bounds
                .offset_y(container.viewport.y - container.scroll_y),
        )
    }

    pub fn element_count(&self) -> usize {
        self.elements.len()
    }
}
