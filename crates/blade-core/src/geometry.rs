#![forbid(unsafe_code)]

//! Geometric primitives in logical pixels.
//!
//! Blades slide in from the right edge and are shifted left when stacked, so
//! rectangles use signed origins: a fanned-out blade can start left of the
//! viewport.

/// A rectangle for layout bounds and hit testing.
///
/// Origin at the top-left of the viewport; `x`/`y` may be negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    /// Left edge (inclusive).
    pub x: i32,
    /// Top edge (inclusive).
    pub y: i32,
    /// Width in logical pixels.
    pub width: u32,
    /// Height in logical pixels.
    pub height: u32,
}

impl Rect {
    /// Create a new rectangle.
    #[inline]
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right edge (exclusive).
    #[inline]
    pub const fn right(&self) -> i64 {
        self.x as i64 + self.width as i64
    }

    /// Bottom edge (exclusive).
    #[inline]
    pub const fn bottom(&self) -> i64 {
        self.y as i64 + self.height as i64
    }

    /// True if the rectangle covers no area.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// True if `(px, py)` lies inside the rectangle.
    #[inline]
    pub const fn contains(&self, px: i32, py: i32) -> bool {
        let px = px as i64;
        let py = py as i64;
        px >= self.x as i64 && px < self.right() && py >= self.y as i64 && py < self.bottom()
    }

    /// The same rectangle moved horizontally by `dx`.
    #[inline]
    #[must_use]
    pub const fn shifted_x(self, dx: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            ..self
        }
    }
}

/// The visible drawing surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Viewport {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// The full viewport as a rectangle at the origin.
    #[inline]
    pub const fn bounds(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }

    /// A full-height rectangle of `width` anchored to the right edge.
    pub fn right_anchored(&self, width: u32) -> Rect {
        let width = width.min(self.width);
        let x = (self.width - width) as i32;
        Rect::new(x, 0, width, self.height)
    }
}

impl Default for Viewport {
    fn default() -> Self {
        Self::new(1920, 1080)
    }
}
