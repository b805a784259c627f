//! Axis-aligned rectangles in screen space.

use super::vec2::Vec2;

/// Closed rectangle `[min.x, max.x] × [min.y, max.y]`.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub min: Vec2,
    pub max: Vec2,
}

impl Rect {
    pub const fn new(min: Vec2, max: Vec2) -> Self {
        Self { min, max }
    }

    /// The pixel-index rectangle `[0, width-1] × [0, height-1]`.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(
            Vec2::ZERO,
            Vec2::new(width as f32 - 1.0, height as f32 - 1.0),
        )
    }

    /// Smallest rectangle containing all `points`.
    pub fn from_points(points: &[Vec2]) -> Self {
        let mut min = Vec2::new(f32::INFINITY, f32::INFINITY);
        let mut max = Vec2::new(f32::NEG_INFINITY, f32::NEG_INFINITY);
        for p in points {
            min = Vec2::new(min.x.min(p.x), min.y.min(p.y));
            max = Vec2::new(max.x.max(p.x), max.y.max(p.y));
        }
        Self { min, max }
    }

    pub fn width(&self) -> f32 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f32 {
        self.max.y - self.min.y
    }

    /// True when no point satisfies both bounds.
    pub fn is_empty(&self) -> bool {
        !(self.min.x <= self.max.x && self.min.y <= self.max.y)
    }

    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        !self.clamp_to(other).is_empty()
    }

    /// Intersection of the two rectangles (possibly empty).
    pub fn clamp_to(&self, bounds: &Rect) -> Rect {
        Rect {
            min: Vec2::new(self.min.x.max(bounds.min.x), self.min.y.max(bounds.min.y)),
            max: Vec2::new(self.max.x.min(bounds.max.x), self.max.y.min(bounds.max.y)),
        }
    }
}
