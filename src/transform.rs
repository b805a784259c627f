//! World transform shared by meshes and the camera.
//!
//! Provides a [`Transform`] with a fluent API over translation, rotation
//! ([`Rotator`], degrees) and scale.

use crate::math::{Basis, Mat4, Rotator, Vec3};

/// Translation, rotation and scale, applied as `T * R * S`.
///
/// Mutating methods return `&mut Self` for chaining:
///
/// ```
/// use softraster::transform::Transform;
/// use softraster::math::Vec3;
///
/// let mut t = Transform::new();
/// t.set_translation(Vec3::new(5.0, 2.0, 0.0))
///     .rotate_yaw(30.0)
///     .set_scale_uniform(2.0);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    translation: Vec3,
    rotation: Rotator,
    scale: Vec3,
    basis: Basis,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            translation: Vec3::ZERO,
            rotation: Rotator::ZERO,
            scale: Vec3::ONE,
            basis: Basis::default(),
        }
    }
}

impl Transform {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(translation: Vec3, rotation: Rotator, scale: Vec3) -> Self {
        Self {
            translation,
            rotation,
            scale,
            basis: rotation.basis(),
        }
    }

    // ============ Translation ============

    pub fn translation(&self) -> Vec3 {
        self.translation
    }

    pub fn set_translation(&mut self, translation: Vec3) -> &mut Self {
        self.translation = translation;
        self
    }

    pub fn translate(&mut self, delta: Vec3) -> &mut Self {
        self.translation += delta;
        self
    }

    // ============ Rotation ============

    pub fn rotation(&self) -> Rotator {
        self.rotation
    }

    /// Replace the rotation and recompute the basis.
    pub fn set_rotation(&mut self, rotation: Rotator) -> &mut Self {
        self.rotation = rotation;
        self.basis = rotation.basis();
        self
    }

    pub fn rotate_yaw(&mut self, degrees: f32) -> &mut Self {
        let mut r = self.rotation;
        r.yaw += degrees;
        self.set_rotation(r)
    }

    pub fn rotate_pitch(&mut self, degrees: f32) -> &mut Self {
        let mut r = self.rotation;
        r.pitch += degrees;
        self.set_rotation(r)
    }

    // ============ Scale ============

    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Vec3) -> &mut Self {
        self.scale = scale;
        self
    }

    pub fn set_scale_uniform(&mut self, s: f32) -> &mut Self {
        self.scale = Vec3::splat(s);
        self
    }

    // ============ Basis ============

    pub fn basis(&self) -> Basis {
        self.basis
    }

    pub fn forward(&self) -> Vec3 {
        self.basis.forward
    }

    pub fn right(&self) -> Vec3 {
        self.basis.right
    }

    pub fn up(&self) -> Vec3 {
        self.basis.up
    }

    // ============ Matrices ============

    /// `Translation * Rotation * Scale`.
    pub fn to_matrix(&self) -> Mat4 {
        Mat4::from_trs(self.translation, self.rotation.to_quat(), self.scale)
    }

    /// Inverse transpose of the upper 3x3, for transforming normals.
    pub fn normal_matrix(&self) -> Mat4 {
        let rotation_scale = Mat4::from_trs(Vec3::ZERO, self.rotation.to_quat(), self.scale);
        rotation_scale
            .inverse()
            .unwrap_or_else(Mat4::identity)
            .transpose()
    }

    /// Matrix of `self` applied after `inner` (right-to-left composition).
    pub fn compose(&self, inner: &Transform) -> Mat4 {
        self.to_matrix() * inner.to_matrix()
    }
}
