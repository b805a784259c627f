//! Euler orientation in degrees.
//!
//! Uses the same **left-handed** frame as the rest of the crate:
//! - **Yaw**: rotation around +Y (positive turns +Z toward +X)
//! - **Pitch**: rotation around the local +X (positive looks down)
//! - **Roll**: rotation around the local +Z

use super::quat::Quat;
use super::vec3::Vec3;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rotator {
    pub pitch: f32,
    pub yaw: f32,
    pub roll: f32,
}

/// Orthonormal frame derived from a [`Rotator`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Basis {
    pub forward: Vec3,
    pub right: Vec3,
    pub up: Vec3,
}

impl Default for Basis {
    fn default() -> Self {
        Self {
            forward: Vec3::FORWARD,
            right: Vec3::RIGHT,
            up: Vec3::UP,
        }
    }
}

impl Rotator {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(pitch: f32, yaw: f32, roll: f32) -> Self {
        Self { pitch, yaw, roll }
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_rotator(self)
    }

    /// The frame this rotation turns the world axes into.
    pub fn basis(self) -> Basis {
        let q = self.to_quat();
        Basis {
            forward: q.rotate(Vec3::FORWARD).normalize(),
            right: q.rotate(Vec3::RIGHT).normalize(),
            up: q.rotate(Vec3::UP).normalize(),
        }
    }

    /// Wrap every angle into `(-180, 180]`.
    pub fn normalized(self) -> Self {
        fn wrap(angle: f32) -> f32 {
            let a = angle.rem_euclid(360.0);
            if a > 180.0 {
                a - 360.0
            } else {
                a
            }
        }
        Self::new(wrap(self.pitch), wrap(self.yaw), wrap(self.roll))
    }
}
