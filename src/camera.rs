//! Orbit camera
//!
//! # Coordinate System
//!
//! Uses a **left-handed** coordinate system:
//! - X: positive right
//! - Y: positive up
//! - Z: positive forward (into screen)
//!
//! # Orbit model
//!
//! The camera sits on a sphere around `target`. Input callbacks only record
//! intent (`spherical_delta`, `pan_offset`, `zoom`); [`update`] folds that intent
//! into the transform once per tick and recomputes the matrices.

use std::f32::consts::PI;

use serde::Deserialize;

use crate::math::spherical::POLAR_EPSILON;
use crate::math::{Mat4, Spherical, Vec3, Vec4};
use crate::transform::Transform;

const PAN_SPEED: f32 = 0.001;

/// Camera parameters that can come from configuration.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CameraSettings {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub min_fov: f32,
    pub max_fov: f32,
    pub near: f32,
    pub far: f32,
    /// Initial orbit radius.
    pub distance: f32,
    pub min_zoom: f32,
    pub max_zoom: f32,
    /// Polar limits in radians, measured from +Y.
    pub min_polar_angle: f32,
    pub max_polar_angle: f32,
    /// Initial azimuth in degrees.
    pub theta: f32,
    /// Initial polar angle in degrees.
    pub phi: f32,
}

impl Default for CameraSettings {
    fn default() -> Self {
        Self {
            fov: 60.0,
            min_fov: 10.0,
            max_fov: 120.0,
            near: 0.1,
            far: 100.0,
            distance: 5.0,
            min_zoom: 0.5,
            max_zoom: 50.0,
            min_polar_angle: 0.0,
            max_polar_angle: PI,
            theta: 0.0,
            phi: 90.0,
        }
    }
}

/// Camera data the shaders consume each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewData {
    pub view_projection: Mat4,
    pub inv_view_projection: Mat4,
    pub view_position: Vec3,
    pub width: u32,
    pub height: u32,
}

#[derive(Clone, Debug)]
pub struct Camera {
    pub transform: Transform,
    fov: f32,
    min_fov: f32,
    max_fov: f32,
    near: f32,
    far: f32,
    zoom: f32,
    min_zoom: f32,
    max_zoom: f32,
    min_polar_angle: f32,
    max_polar_angle: f32,

    target: Vec3,
    spherical: Spherical,
    spherical_delta: Spherical,
    pan_offset: Vec3,

    view: Mat4,
    projection: Mat4,
    view_projection: Mat4,
    inv_view_projection: Mat4,
    width: u32,
    height: u32,

    home: Spherical,
    home_target: Vec3,
}

impl Camera {
    pub fn new(settings: &CameraSettings, width: u32, height: u32) -> Self {
        let min_zoom = settings.min_zoom.min(settings.max_zoom);
        let max_zoom = settings.max_zoom.max(settings.min_zoom);
        let mut home = Spherical::new(
            settings.distance.clamp(min_zoom, max_zoom),
            settings.theta.to_radians(),
            settings.phi.to_radians(),
        );
        home.make_safe();

        let mut camera = Self {
            transform: Transform::new(),
            fov: settings.fov.clamp(settings.min_fov, settings.max_fov),
            min_fov: settings.min_fov,
            max_fov: settings.max_fov,
            near: settings.near,
            far: settings.far,
            zoom: home.radius,
            min_zoom,
            max_zoom,
            min_polar_angle: settings.min_polar_angle,
            max_polar_angle: settings.max_polar_angle,
            target: Vec3::ZERO,
            spherical: home,
            spherical_delta: Spherical::default(),
            pan_offset: Vec3::ZERO,
            view: Mat4::identity(),
            projection: Mat4::identity(),
            view_projection: Mat4::identity(),
            inv_view_projection: Mat4::identity(),
            width: width.max(1),
            height: height.max(1),
            home,
            home_target: Vec3::ZERO,
        };
        camera.place_on_sphere();
        camera.compute_view_projection_matrix();
        camera
    }

    // =========================================================================
    // Controls
    // =========================================================================

    /// Record an orbit step in degrees. Not additive: the last call before
    /// [`update`] wins.
    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.spherical_delta.theta = dx * PI / 180.0;
        self.spherical_delta.phi = dy * PI / 180.0;
    }

    /// Accumulate a pan along the camera's up and right axes.
    pub fn pan(&mut self, dx: f32, dy: f32) {
        let offset = self.transform.up() * (dx * PAN_SPEED) + self.transform.right() * (dy * PAN_SPEED);
        self.pan_offset += offset;
    }

    /// Move toward (positive `v`) or away from the target.
    pub fn zoom(&mut self, v: f32) {
        self.zoom = (self.spherical.radius - v).clamp(self.min_zoom, self.max_zoom);
    }

    /// Restore the initial target, distance and orbit angles.
    pub fn reset_view(&mut self) {
        self.target = self.home_target;
        self.spherical = self.home;
        self.zoom = self.home.radius;
        self.spherical_delta = Spherical::default();
        self.pan_offset = Vec3::ZERO;
        self.place_on_sphere();
        self.compute_view_projection_matrix();
    }

    pub fn set_viewport(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.compute_view_projection_matrix();
    }

    /// Set the vertical field of view in degrees, clamped to the allowed range.
    pub fn set_fov(&mut self, degrees: f32) {
        self.fov = degrees.clamp(self.min_fov, self.max_fov);
        self.compute_view_projection_matrix();
    }

    /// Re-centre the orbit on `target`, keeping the current offset.
    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
        self.home_target = target;
        self.place_on_sphere();
        self.compute_view_projection_matrix();
    }

    // =========================================================================
    // Matrices
    // =========================================================================

    pub fn compute_view_projection_matrix(&mut self) {
        let aspect = self.width as f32 / self.height as f32;
        self.view = Mat4::look_at_lh(
            self.transform.translation(),
            self.target + Vec3::splat(POLAR_EPSILON),
            Vec3::UP,
        );
        self.projection = Mat4::perspective_fov_lh(self.fov.to_radians(), aspect, self.near, self.far);
        self.view_projection = self.projection * self.view;
        self.inv_view_projection = match self.view_projection.inverse() {
            Some(inv) => inv,
            None => {
                log::warn!("view-projection matrix is singular; using identity inverse");
                Mat4::identity()
            }
        };
    }

    pub fn view_data(&self) -> ViewData {
        ViewData {
            view_projection: self.view_projection,
            inv_view_projection: self.inv_view_projection,
            view_position: self.transform.translation(),
            width: self.width,
            height: self.height,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn position(&self) -> Vec3 {
        self.transform.translation()
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn spherical(&self) -> Spherical {
        self.spherical
    }

    pub fn fov(&self) -> f32 {
        self.fov
    }

    pub fn near(&self) -> f32 {
        self.near
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    pub fn current_zoom(&self) -> f32 {
        self.zoom
    }

    pub fn view_matrix(&self) -> Mat4 {
        self.view
    }

    pub fn projection_matrix(&self) -> Mat4 {
        self.projection
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.view_projection
    }

    pub fn inv_view_projection_matrix(&self) -> Mat4 {
        self.inv_view_projection
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    fn place_on_sphere(&mut self) {
        self.transform.set_rotation(self.spherical.facing_rotator());
        self.transform
            .set_translation(self.target + self.spherical.to_cartesian());
    }
}

/// Fold one tick of orbit, zoom and pan input into the camera.
pub fn update(camera: &mut Camera, _dt: f32) {
    let mut spherical = Spherical::from_cartesian(camera.transform.translation() - camera.target);
    spherical.radius = camera.zoom;
    spherical.theta += camera.spherical_delta.theta;
    spherical.phi += camera.spherical_delta.phi;

    let (lo, hi) = (camera.min_polar_angle, camera.max_polar_angle);
    spherical.phi = spherical.phi.clamp(lo.min(hi), hi.max(lo));
    spherical.make_safe();
    camera.spherical = spherical;

    camera.target += camera.pan_offset;
    camera.place_on_sphere();

    camera.spherical_delta = Spherical::default();
    camera.pan_offset = Vec3::ZERO;
    camera.compute_view_projection_matrix();
}

/// Project a world-space point to screen space.
///
/// Returns `(x, y, depth)` with `depth ∈ [0, 1]` inside the frustum, or `None`
/// when the point is behind the eye.
pub fn project_world_to_screen(p: Vec3, view_projection: &Mat4, width: u32, height: u32) -> Option<Vec3> {
    let q: Vec4 = view_projection.transform_point4(p);
    if q.w <= 0.0 {
        return None;
    }
    let ndc = q.project();
    Some(Vec3::new(
        (ndc.x / 2.0 + 0.5) * width as f32,
        (ndc.y / 2.0 + 0.5) * height as f32,
        (ndc.z + 1.0) / 2.0,
    ))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn camera() -> Camera {
        Camera::new(&CameraSettings::default(), 800, 600)
    }

    #[test]
    fn default_camera_sits_on_positive_z() {
        let camera = camera();
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(camera.transform.forward(), Vec3::new(0.0, 0.0, -1.0), epsilon = 1e-5);
    }

    #[test]
    fn target_projects_to_screen_centre() {
        let camera = camera();
        let s = project_world_to_screen(Vec3::ZERO, &camera.view_projection_matrix(), 800, 600)
            .expect("target is in front of the camera");
        assert_relative_eq!(s.x, 400.0, epsilon = 1e-2);
        assert_relative_eq!(s.y, 300.0, epsilon = 1e-2);
        assert!(s.z > 0.0 && s.z < 1.0);
    }

    #[test]
    fn points_behind_the_eye_are_not_visible() {
        let camera = camera();
        let vp = camera.view_projection_matrix();
        assert!(project_world_to_screen(Vec3::new(0.0, 0.0, 10.0), &vp, 800, 600).is_none());
    }

    #[test]
    fn orbit_is_consumed_by_update() {
        let mut camera = camera();
        camera.orbit(90.0, 0.0);
        update(&mut camera, 0.016);
        assert_relative_eq!(camera.position(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-4);

        update(&mut camera, 0.016);
        assert_relative_eq!(camera.position(), Vec3::new(5.0, 0.0, 0.0), epsilon = 1e-4);
    }

    #[test]
    fn orbit_is_not_additive() {
        let mut camera = camera();
        camera.orbit(30.0, 0.0);
        camera.orbit(90.0, 0.0);
        update(&mut camera, 0.016);
        assert_relative_eq!(camera.spherical().theta, PI / 2.0, epsilon = 1e-5);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut camera = camera();
        camera.zoom(100.0);
        update(&mut camera, 0.016);
        assert_relative_eq!(camera.spherical().radius, 0.5);

        camera.zoom(-1000.0);
        update(&mut camera, 0.016);
        assert_relative_eq!(camera.spherical().radius, 50.0);
    }

    #[test]
    fn pan_moves_target_and_eye_together() {
        let mut camera = camera();
        let before = camera.position() - camera.target();
        camera.pan(1000.0, 0.0);
        update(&mut camera, 0.016);
        assert_relative_eq!(camera.target(), Vec3::new(0.0, 1.0, 0.0), epsilon = 1e-5);
        assert_relative_eq!(camera.position() - camera.target(), before, epsilon = 1e-4);
    }

    #[test]
    fn reset_view_restores_home() {
        let mut camera = camera();
        camera.orbit(45.0, 20.0);
        camera.pan(300.0, -200.0);
        camera.zoom(2.0);
        update(&mut camera, 0.016);
        camera.reset_view();
        assert_relative_eq!(camera.position(), Vec3::new(0.0, 0.0, 5.0), epsilon = 1e-5);
        assert_relative_eq!(camera.target(), Vec3::ZERO);
    }

    #[test]
    fn collapsed_camera_still_produces_finite_matrices() {
        let mut camera = camera();
        camera.transform.set_translation(Vec3::ZERO);
        update(&mut camera, 0.016);
        assert!(camera.position().is_finite());
        assert!(camera.spherical().phi >= POLAR_EPSILON);
    }

    proptest! {
        #[test]
        fn view_projection_times_inverse_is_identity(
            dx in -180.0f32..180.0,
            dy in -90.0f32..90.0,
            zoom in -4.0f32..15.0,
            w in 64u32..1920,
            h in 64u32..1080,
        ) {
            let mut camera = camera();
            camera.set_viewport(w, h);
            camera.orbit(dx, dy);
            camera.zoom(zoom);
            update(&mut camera, 0.016);

            let product = camera.view_projection_matrix() * camera.inv_view_projection_matrix();
            prop_assert!(approx::abs_diff_eq!(product, Mat4::identity(), epsilon = 1e-4));
        }

        #[test]
        fn polar_angle_stays_off_the_poles(
            steps in proptest::collection::vec((-360.0f32..360.0, -360.0f32..360.0), 1..8),
        ) {
            let mut camera = camera();
            for (dx, dy) in steps {
                camera.orbit(dx, dy);
                update(&mut camera, 0.016);
                let phi = camera.spherical().phi;
                prop_assert!(phi >= POLAR_EPSILON && phi <= PI - POLAR_EPSILON);
            }
        }
    }
}
