//! Lighting types for the renderer.

use crate::math::Vec3;

/// A directional light that illuminates the scene uniformly from a direction.
///
/// Directional lights are ideal for simulating distant light sources like the sun,
/// where all rays are effectively parallel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DirectionalLight {
    /// The normalized direction the light is pointing (not where it comes from).
    pub direction: Vec3,
}

impl Default for DirectionalLight {
    fn default() -> Self {
        Self::new(Vec3::new(0.0, -1.0, -1.0))
    }
}

impl DirectionalLight {
    /// Create a new directional light pointing in the given direction.
    /// The direction will be normalized automatically.
    pub fn new(direction: Vec3) -> Self {
        DirectionalLight {
            direction: direction.normalize(),
        }
    }

    /// Unit vector from a surface toward the light.
    pub fn to_light(&self) -> Vec3 {
        -self.direction
    }

    /// Lambert term `max(0, n̂ · l̂)` in `[0, 1]`.
    pub fn intensity(&self, normal: Vec3) -> f32 {
        self.to_light().dot(normal.normalize()).max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn direct_illumination() {
        // Light pointing toward -Z, normal facing +Z (toward the light)
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(light.intensity(Vec3::FORWARD), 1.0, epsilon = 1e-6);
    }

    #[test]
    fn surfaces_facing_away_are_unlit() {
        let light = DirectionalLight::new(Vec3::new(0.0, 0.0, -1.0));
        assert_eq!(light.intensity(Vec3::new(0.0, 0.0, -1.0)), 0.0);
    }

    #[test]
    fn default_light_reaches_faces_toward_the_camera() {
        // The default camera looks down -Z, so its visible faces point +Z.
        let light = DirectionalLight::default();
        assert_relative_eq!(light.intensity(Vec3::FORWARD), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-5);
        assert!(light.intensity(Vec3::UP) > 0.0);
        assert_eq!(light.intensity(-Vec3::FORWARD), 0.0);
    }

    #[test]
    fn angled_illumination() {
        // Light pointing straight down (-Y), normal at 45 degrees
        let light = DirectionalLight::new(Vec3::new(0.0, -1.0, 0.0));
        let normal = Vec3::new(0.0, 1.0, 1.0);
        assert_relative_eq!(light.intensity(normal), std::f32::consts::FRAC_1_SQRT_2, epsilon = 1e-5);
    }
}
