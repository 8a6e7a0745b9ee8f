//! Geometry primitives

/// Axis-aligned rectangle in logical pixels
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Bounds {
    /// X position
    pub x: f32,
    /// Y position
    pub y: f32,
    /// Width
    pub width: f32,
    /// Height
    pub height: f32,
}

impl Bounds {
    /// Create new bounds
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn top(&self) -> f32 {
        self.y
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    pub fn left(&self) -> f32 {
        self.x
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn area(&self) -> f32 {
        self.width.max(0.0) * self.height.max(0.0)
    }

    /// True when every component is finite and extents are non-negative
    pub fn is_valid(&self) -> bool {
        self.x.is_finite()
            && self.y.is_finite()
            && self.width.is_finite()
            && self.height.is_finite()
            && self.width >= 0.0
            && self.height >= 0.0
    }

    /// Check if a point is inside the bounds
    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    /// Check if bounds intersect with another bounds
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.right()
            && self.right() > other.x
            && self.y < other.bottom()
            && self.bottom() > other.y
    }

    /// Overlapping region, if any
    pub fn intersection(&self, other: &Bounds) -> Option<Bounds> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right > left && bottom > top {
            Some(Bounds::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Overlapping region with inclusive edges
    ///
    /// Rectangles that only touch, and zero-area rectangles lying on or
    /// inside `other`, yield a zero-area overlap instead of `None`.
    pub fn intersection_inclusive(&self, other: &Bounds) -> Option<Bounds> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());

        if right >= left && bottom >= top {
            Some(Bounds::new(left, top, right - left, bottom - top))
        } else {
            None
        }
    }

    /// Grow the rectangle outward by `edges` (negative values shrink it)
    ///
    /// Shrinking past zero collapses to an empty rectangle centered on the
    /// original rather than producing negative extents.
    pub fn expand(&self, edges: Edges) -> Bounds {
        let x = self.x - edges.left;
        let y = self.y - edges.top;
        let width = self.width + edges.left + edges.right;
        let height = self.height + edges.top + edges.bottom;

        Bounds::new(
            if width < 0.0 { self.x + self.width / 2.0 } else { x },
            if height < 0.0 { self.y + self.height / 2.0 } else { y },
            width.max(0.0),
            height.max(0.0),
        )
    }

    /// Same rectangle shifted vertically
    pub fn offset_y(&self, dy: f32) -> Bounds {
        Bounds::new(self.x, self.y + dy, self.width, self.height)
    }
}

/// Per-side insets, used for viewport root margins
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Edges {
    pub top: f32,
    pub right: f32,
    pub bottom: f32,
    pub left: f32,
}

impl Edges {
    pub fn new(top: f32, right: f32, bottom: f32, left: f32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    /// Same inset on every side
    pub fn all(value: f32) -> Self {
        Self::new(value, value, value, value)
    }

    pub fn zero() -> Self {
        Self::default()
    }
}

impl From<f32> for Edges {
    fn from(value: f32) -> Self {
        Edges::all(value)
    }
}
