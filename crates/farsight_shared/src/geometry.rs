//! Integer geometry used by values and by the layout engine.
//!
//! All coordinates are screen pixels. Sizes are signed so layout arithmetic
//! can go negative before being clamped; the wire encodes them unsigned.

use serde::{Deserialize, Serialize};

/// A point in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: i32,
    /// Y coordinate.
    pub y: i32,
}

impl Point {
    /// Creates a new point.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// A width/height pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Size {
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Size {
    /// A zero-sized box.
    pub const ZERO: Self = Self { width: 0, height: 0 };

    /// Creates a new size.
    #[must_use]
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }

    /// Component-wise maximum.
    #[must_use]
    pub fn max(self, other: Self) -> Self {
        Self::new(self.width.max(other.width), self.height.max(other.height))
    }
}

/// Spacing on the four sides of a box.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Margins {
    /// Left edge.
    pub left: i32,
    /// Top edge.
    pub top: i32,
    /// Right edge.
    pub right: i32,
    /// Bottom edge.
    pub bottom: i32,
}

impl Margins {
    /// Creates margins from the four sides.
    #[must_use]
    pub const fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self { left, top, right, bottom }
    }

    /// The same spacing on every side.
    #[must_use]
    pub const fn uniform(n: i32) -> Self {
        Self::new(n, n, n, n)
    }

    /// Left plus right.
    #[inline]
    #[must_use]
    pub const fn total_horizontal(&self) -> i32 {
        self.left + self.right
    }

    /// Top plus bottom.
    #[inline]
    #[must_use]
    pub const fn total_vertical(&self) -> i32 {
        self.top + self.bottom
    }
}

/// An RGBA color.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Creates a new color.
    #[must_use]
    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }
}

/// A rectangle in screen coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    /// X position (left edge).
    pub x: i32,
    /// Y position (top edge).
    pub y: i32,
    /// Width.
    pub width: i32,
    /// Height.
    pub height: i32,
}

impl Rect {
    /// A zero-sized rect at the origin.
    pub const ZERO: Self = Self::new(0, 0, 0, 0);

    /// Creates a new rectangle.
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    /// Creates a rectangle from position and size.
    #[must_use]
    pub const fn from_pos_size(pos: Point, size: Size) -> Self {
        Self::new(pos.x, pos.y, size.width, size.height)
    }

    /// Returns the right edge.
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    /// Returns the bottom edge.
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    /// Returns the size of the rectangle.
    #[must_use]
    pub const fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Returns true if the rectangle covers no pixels.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Returns true if the point is inside the rectangle.
    #[must_use]
    pub const fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Returns the overlap of two rectangles.
    ///
    /// Disjoint rectangles yield an empty rect anchored at the overlap origin.
    #[must_use]
    pub fn intersect(&self, other: &Self) -> Self {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            Self::new(left, top, 0, 0)
        } else {
            Self::new(left, top, right - left, bottom - top)
        }
    }

    /// Removes the given spacing from each side.
    ///
    /// Width and height never drop below zero.
    #[must_use]
    pub fn shrink(&self, margins: Margins) -> Self {
        Self::new(
            self.x + margins.left,
            self.y + margins.top,
            (self.width - margins.total_horizontal()).max(0),
            (self.height - margins.total_vertical()).max(0),
        )
    }

    /// Adds the given spacing to each side.
    #[must_use]
    pub const fn grow(&self, margins: Margins) -> Self {
        Self::new(
            self.x - margins.left,
            self.y - margins.top,
            self.width + margins.total_horizontal(),
            self.height + margins.total_vertical(),
        )
    }
}
