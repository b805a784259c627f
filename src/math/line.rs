//! Line segments.

use super::vec2::Vec2;
use super::vec3::Vec3;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line2 {
    pub a: Vec2,
    pub b: Vec2,
}

impl Line2 {
    pub const fn new(a: Vec2, b: Vec2) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    pub fn reversed(self) -> Self {
        Self::new(self.b, self.a)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Line3 {
    pub a: Vec3,
    pub b: Vec3,
}

impl Line3 {
    pub const fn new(a: Vec3, b: Vec3) -> Self {
        Self { a, b }
    }

    pub fn length(&self) -> f32 {
        (self.b - self.a).length()
    }

    pub fn midpoint(&self) -> Vec3 {
        self.a.lerp(self.b, 0.5)
    }
}
