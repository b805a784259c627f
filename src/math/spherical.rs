//! Spherical coordinates, the canonical orbit-camera representation.
//!
//! - `phi`: polar angle measured from +Y, in `[0, π]`
//! - `theta`: azimuth around +Y, measured from +Z toward +X
//! - `radius`: distance from the origin

use std::f32::consts::PI;

use super::rotator::Rotator;
use super::vec3::Vec3;

/// Margin kept between `phi` and the poles so the view basis never degenerates.
pub const POLAR_EPSILON: f32 = 0.000_001;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Spherical {
    pub radius: f32,
    pub theta: f32,
    pub phi: f32,
}

impl Spherical {
    pub const fn new(radius: f32, theta: f32, phi: f32) -> Self {
        Self { radius, theta, phi }
    }

    pub fn from_cartesian(v: Vec3) -> Self {
        let radius = v.length();
        if radius <= f32::EPSILON {
            return Self::default();
        }
        Self {
            radius,
            theta: v.x.atan2(v.z),
            phi: (v.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    pub fn to_cartesian(&self) -> Vec3 {
        let (sin_phi, cos_phi) = self.phi.sin_cos();
        let (sin_theta, cos_theta) = self.theta.sin_cos();
        Vec3::new(
            self.radius * sin_phi * sin_theta,
            self.radius * cos_phi,
            self.radius * sin_phi * cos_theta,
        )
    }

    /// Keep `phi` strictly away from the poles.
    pub fn make_safe(&mut self) {
        self.phi = self.phi.clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    }

    /// Orientation that looks from this point back toward the origin.
    ///
    /// Its forward vector is `-self.to_cartesian().normalize()`.
    pub fn facing_rotator(&self) -> Rotator {
        Rotator::new(
            90.0 - self.phi.to_degrees(),
            self.theta.to_degrees() + 180.0,
            0.0,
        )
        .normalized()
    }
}
