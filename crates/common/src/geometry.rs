//! Integer pixel geometry shared by detection, checks and rendering

use serde::{Deserialize, Serialize};

/// A point in frame coordinates (sub-pixel precision as reported by detectors)
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned rectangle in pixel coordinates.
///
/// `x`/`y` is the top-left corner; the right and bottom edges are exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    #[must_use]
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Smallest rectangle enclosing every point (min/max of x and y)
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn from_points(points: &[Point]) -> Self {
        if points.is_empty() {
            return Self::default();
        }
        let min_x = points.iter().map(|p| p.x).fold(f32::INFINITY, f32::min);
        let max_x = points.iter().map(|p| p.x).fold(f32::NEG_INFINITY, f32::max);
        let min_y = points.iter().map(|p| p.y).fold(f32::INFINITY, f32::min);
        let max_y = points.iter().map(|p| p.y).fold(f32::NEG_INFINITY, f32::max);

        let x = min_x.floor() as i32;
        let y = min_y.floor() as i32;
        Self::new(x, y, max_x.ceil() as i32 - x, max_y.ceil() as i32 - y)
    }

    #[inline]
    #[must_use]
    pub const fn right(&self) -> i32 {
        self.x + self.width
    }

    #[inline]
    #[must_use]
    pub const fn bottom(&self) -> i32 {
        self.y + self.height
    }

    #[inline]
    #[must_use]
    pub const fn area(&self) -> i64 {
        self.width as i64 * self.height as i64
    }

    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    /// Centre of the rectangle
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn center(&self) -> (f32, f32) {
        (
            self.x as f32 + self.width as f32 / 2.0,
            self.y as f32 + self.height as f32 / 2.0,
        )
    }

    /// Intersection of two rectangles, `None` when they do not overlap
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        let rect = Rect::new(x, y, right - x, bottom - y);
        (!rect.is_empty()).then_some(rect)
    }

    /// Bounding rectangle of both rectangles
    #[must_use]
    pub fn union(&self, other: &Rect) -> Rect {
        let x = self.x.min(other.x);
        let y = self.y.min(other.y);
        let right = self.right().max(other.right());
        let bottom = self.bottom().max(other.bottom());
        Rect::new(x, y, right - x, bottom - y)
    }

    #[must_use]
    pub fn contains_point(&self, x: f32, y: f32) -> bool {
        #[allow(clippy::cast_precision_loss)]
        let (left, top, right, bottom) = (
            self.x as f32,
            self.y as f32,
            self.right() as f32,
            self.bottom() as f32,
        );
        x >= left && x < right && y >= top && y < bottom
    }

    #[must_use]
    pub fn contains_rect(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Clamp the rectangle to `[0, width) x [0, height)`
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn clamp_to(&self, width: u32, height: u32) -> Rect {
        let x = self.x.clamp(0, width as i32);
        let y = self.y.clamp(0, height as i32);
        let right = self.right().clamp(0, width as i32);
        let bottom = self.bottom().clamp(0, height as i32);
        Rect::new(x, y, (right - x).max(0), (bottom - y).max(0))
    }

    /// Grow the rectangle by `dx`/`dy` on every side
    #[must_use]
    pub const fn inflate(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(
            self.x - dx,
            self.y - dy,
            self.width + 2 * dx,
            self.height + 2 * dy,
        )
    }

    /// Translate by an offset
    #[must_use]
    pub const fn offset(&self, dx: i32, dy: i32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.width, self.height)
    }
}
