//! Geometric types for frame coordinates and selection regions

use serde::{Deserialize, Serialize};

/// A position in frame pixel coordinates
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Translate the point by the given offset
    pub fn translate(self, dx: i32, dy: i32) -> Point {
        Point {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

/// Axis-aligned rectangle, always normalized so `left <= right` and `top <= bottom`
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

impl Rect {
    /// Create a rectangle from edge coordinates, normalizing swapped edges
    pub fn new(left: i32, top: i32, right: i32, bottom: i32) -> Self {
        Self {
            left: left.min(right),
            top: top.min(bottom),
            right: left.max(right),
            bottom: top.max(bottom),
        }
    }

    /// Rectangle spanned by two arbitrary corner points
    pub fn from_points(a: Point, b: Point) -> Self {
        Self::new(a.x, a.y, b.x, b.y)
    }

    /// Rectangle with the given origin and size
    pub fn from_xywh(x: i32, y: i32, width: u32, height: u32) -> Self {
        let right = x.saturating_add(i32::try_from(width).unwrap_or(i32::MAX));
        let bottom = y.saturating_add(i32::try_from(height).unwrap_or(i32::MAX));
        Self::new(x, y, right, bottom)
    }

    /// Calculate the intersection of two rectangles
    pub fn intersect(&self, other: Rect) -> Option<Rect> {
        let left = self.left.max(other.left);
        let top = self.top.max(other.top);
        let right = self.right.min(other.right);
        let bottom = self.bottom.min(other.bottom);
        if left < right && top < bottom {
            Some(Rect {
                left,
                top,
                right,
                bottom,
            })
        } else {
            None
        }
    }

    /// Smallest rectangle containing both rectangles
    pub fn union(&self, other: Rect) -> Rect {
        Rect {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Translate the rectangle by the given offset
    pub fn translate(&self, x: i32, y: i32) -> Rect {
        Rect {
            left: self.left.saturating_add(x),
            top: self.top.saturating_add(y),
            right: self.right.saturating_add(x),
            bottom: self.bottom.saturating_add(y),
        }
    }

    /// Grow the rectangle by `amount` on every side
    pub fn inflate(&self, amount: i32) -> Rect {
        Rect {
            left: self.left.saturating_sub(amount),
            top: self.top.saturating_sub(amount),
            right: self.right.saturating_add(amount),
            bottom: self.bottom.saturating_add(amount),
        }
    }

    /// Get the width of the rectangle
    pub fn width(&self) -> i32 {
        self.right - self.left
    }

    /// Get the height of the rectangle
    pub fn height(&self) -> i32 {
        self.bottom - self.top
    }

    pub fn top_left(&self) -> Point {
        Point::new(self.left, self.top)
    }

    /// True when the rectangle covers no pixels
    pub fn is_empty(&self) -> bool {
        self.width() <= 0 || self.height() <= 0
    }

    /// Check if this rectangle contains a point (right and bottom edges exclusive)
    pub fn contains_point(&self, point: Point) -> bool {
        point.x >= self.left && point.x < self.right && point.y >= self.top && point.y < self.bottom
    }

    /// Bounding box of a set of points, `None` for an empty set
    pub fn bounding(points: &[Point]) -> Option<Rect> {
        let first = points.first()?;
        let mut rect = Rect::new(first.x, first.y, first.x, first.y);
        for p in &points[1..] {
            rect.left = rect.left.min(p.x);
            rect.top = rect.top.min(p.y);
            rect.right = rect.right.max(p.x);
            rect.bottom = rect.bottom.max(p.y);
        }
        Some(rect)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalizes_swapped_edges() {
        let rect = Rect::new(50, 40, 10, 20);
        assert_eq!(rect, Rect::new(10, 20, 50, 40));
        assert_eq!(rect.left, 10);
        assert_eq!(rect.bottom, 40);
        assert_eq!(rect.width(), 40);
        assert_eq!(rect.height(), 20);
    }

    #[test]
    fn intersect_clips_to_overlap() {
        let frame = Rect::new(0, 0, 100, 80);
        let region = Rect::new(-10, -10, 110, 90);
        assert_eq!(region.intersect(frame), Some(frame));
        assert_eq!(Rect::new(100, 0, 120, 10).intersect(frame), None);
    }

    #[test]
    fn contains_point_is_half_open() {
        let rect = Rect::new(10, 10, 20, 20);
        assert!(rect.contains_point(Point::new(10, 10)));
        assert!(rect.contains_point(Point::new(19, 19)));
        assert!(!rect.contains_point(Point::new(20, 15)));
        assert!(!rect.contains_point(Point::new(9, 15)));
    }

    #[test]
    fn bounding_covers_all_points() {
        let points = [Point::new(5, 9), Point::new(-2, 3), Point::new(7, 1)];
        assert_eq!(Rect::bounding(&points), Some(Rect::new(-2, 1, 7, 9)));
        assert_eq!(Rect::bounding(&[]), None);
    }
}
