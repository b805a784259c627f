//! 4x4 transformation matrix using column-vector convention.
//!
//! # Convention
//! - Vectors are **column vectors** on the right: `Mat4 * Vec`
//! - Translation is stored in the **last column**
//! - Transforms chain **right-to-left**: `A * B * v` applies B first, then A
//!
//! The combined camera matrix is therefore `projection * view`.

use std::ops::Mul;

use approx::{AbsDiffEq, RelativeEq};

use super::quat::Quat;
use super::vec3::Vec3;
use super::vec4::Vec4;

/// 4x4 matrix stored as `data[row][col]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat4 {
    data: [[f32; 4]; 4],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::identity()
    }
}

impl Mat4 {
    pub const fn new(data: [[f32; 4]; 4]) -> Self {
        Mat4 { data }
    }

    pub const fn identity() -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, 0.0],
            [0.0, 1.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn translation(t: Vec3) -> Self {
        Mat4::new([
            [1.0, 0.0, 0.0, t.x],
            [0.0, 1.0, 0.0, t.y],
            [0.0, 0.0, 1.0, t.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn scaling(s: Vec3) -> Self {
        Mat4::new([
            [s.x, 0.0, 0.0, 0.0],
            [0.0, s.y, 0.0, 0.0],
            [0.0, 0.0, s.z, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Rotation matrix of a unit quaternion.
    pub fn from_quat(q: Quat) -> Self {
        let Quat { x, y, z, w } = q;
        let (xx, yy, zz) = (x * x, y * y, z * z);
        let (xy, xz, yz) = (x * y, x * z, y * z);
        let (wx, wy, wz) = (w * x, w * y, w * z);
        Mat4::new([
            [1.0 - 2.0 * (yy + zz), 2.0 * (xy - wz), 2.0 * (xz + wy), 0.0],
            [2.0 * (xy + wz), 1.0 - 2.0 * (xx + zz), 2.0 * (yz - wx), 0.0],
            [2.0 * (xz - wy), 2.0 * (yz + wx), 1.0 - 2.0 * (xx + yy), 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Translation * Rotation * Scale.
    pub fn from_trs(translation: Vec3, rotation: Quat, scale: Vec3) -> Self {
        Self::translation(translation) * Self::from_quat(rotation) * Self::scaling(scale)
    }

    /// Left-handed perspective projection with an OpenGL-style depth range.
    ///
    /// View-space `z = near` maps to NDC `z = -1`, `z = far` to `+1`, and clip
    /// `w` equals view-space depth.
    pub fn perspective_fov_lh(fov_y: f32, aspect_ratio: f32, near: f32, far: f32) -> Self {
        let focal = 1.0 / (fov_y / 2.0).tan();
        let range = far - near;
        Mat4::new([
            [focal / aspect_ratio, 0.0, 0.0, 0.0],
            [0.0, focal, 0.0, 0.0],
            [0.0, 0.0, (far + near) / range, -2.0 * far * near / range],
            [0.0, 0.0, 1.0, 0.0],
        ])
    }

    /// Creates a view matrix with left-handed coordinate system.
    ///
    /// The rows are the camera basis (right, up, forward) so that a point in
    /// front of the eye ends up with positive view-space z.
    pub fn look_at_lh(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let forward = (target - eye).normalize();
        let right = up.cross(forward).normalize();
        let up = forward.cross(right);

        Self::new([
            [right.x, right.y, right.z, -right.dot(eye)],
            [up.x, up.y, up.z, -up.dot(eye)],
            [forward.x, forward.y, forward.z, -forward.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn transpose(&self) -> Self {
        let mut out = [[0.0f32; 4]; 4];
        for (row, values) in self.data.iter().enumerate() {
            for (col, value) in values.iter().enumerate() {
                out[col][row] = *value;
            }
        }
        Mat4::new(out)
    }

    pub fn determinant(&self) -> f32 {
        let (s, c) = self.minor_pairs();
        s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1] + s[5] * c[0]
    }

    /// Computes the inverse of the matrix, if it exists.
    /// Returns `None` if the matrix is singular.
    pub fn inverse(&self) -> Option<Mat4> {
        let m = &self.data;
        let (s, c) = self.minor_pairs();

        let det = s[0] * c[5] - s[1] * c[4] + s[2] * c[3] + s[3] * c[2] - s[4] * c[1]
            + s[5] * c[0];
        if det.abs() <= f32::MIN_POSITIVE {
            return None;
        }
        let inv_det = 1.0 / det;

        let inv = [
            [
                (m[1][1] * c[5] - m[1][2] * c[4] + m[1][3] * c[3]) * inv_det,
                (-m[0][1] * c[5] + m[0][2] * c[4] - m[0][3] * c[3]) * inv_det,
                (m[3][1] * s[5] - m[3][2] * s[4] + m[3][3] * s[3]) * inv_det,
                (-m[2][1] * s[5] + m[2][2] * s[4] - m[2][3] * s[3]) * inv_det,
            ],
            [
                (-m[1][0] * c[5] + m[1][2] * c[2] - m[1][3] * c[1]) * inv_det,
                (m[0][0] * c[5] - m[0][2] * c[2] + m[0][3] * c[1]) * inv_det,
                (-m[3][0] * s[5] + m[3][2] * s[2] - m[3][3] * s[1]) * inv_det,
                (m[2][0] * s[5] - m[2][2] * s[2] + m[2][3] * s[1]) * inv_det,
            ],
            [
                (m[1][0] * c[4] - m[1][1] * c[2] + m[1][3] * c[0]) * inv_det,
                (-m[0][0] * c[4] + m[0][1] * c[2] - m[0][3] * c[0]) * inv_det,
                (m[3][0] * s[4] - m[3][1] * s[2] + m[3][3] * s[0]) * inv_det,
                (-m[2][0] * s[4] + m[2][1] * s[2] - m[2][3] * s[0]) * inv_det,
            ],
            [
                (-m[1][0] * c[3] + m[1][1] * c[1] - m[1][2] * c[0]) * inv_det,
                (m[0][0] * c[3] - m[0][1] * c[1] + m[0][2] * c[0]) * inv_det,
                (-m[3][0] * s[3] + m[3][1] * s[1] - m[3][2] * s[0]) * inv_det,
                (m[2][0] * s[3] - m[2][1] * s[1] + m[2][2] * s[0]) * inv_det,
            ],
        ];

        Some(Mat4::new(inv))
    }

    /// 2x2 minors of the top two rows (`s`) and bottom two rows (`c`),
    /// the building blocks of the Laplace expansion used by `inverse`.
    fn minor_pairs(&self) -> ([f32; 6], [f32; 6]) {
        let m = &self.data;
        let s = [
            m[0][0] * m[1][1] - m[1][0] * m[0][1],
            m[0][0] * m[1][2] - m[1][0] * m[0][2],
            m[0][0] * m[1][3] - m[1][0] * m[0][3],
            m[0][1] * m[1][2] - m[1][1] * m[0][2],
            m[0][1] * m[1][3] - m[1][1] * m[0][3],
            m[0][2] * m[1][3] - m[1][2] * m[0][3],
        ];
        let c = [
            m[2][0] * m[3][1] - m[3][0] * m[2][1],
            m[2][0] * m[3][2] - m[3][0] * m[2][2],
            m[2][0] * m[3][3] - m[3][0] * m[2][3],
            m[2][1] * m[3][2] - m[3][1] * m[2][2],
            m[2][1] * m[3][3] - m[3][1] * m[2][3],
            m[2][2] * m[3][3] - m[3][2] * m[2][3],
        ];
        (s, c)
    }

    /// Transform a point (w=1) without the perspective divide.
    #[inline]
    pub fn transform_point4(&self, p: Vec3) -> Vec4 {
        *self * Vec4::point(p)
    }

    /// Transform a point (w=1), dividing by w when it is neither 0 nor 1.
    #[inline]
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let q = self.transform_point4(p);
        if q.w != 0.0 && q.w != 1.0 {
            q.project()
        } else {
            q.xyz()
        }
    }

    /// Transform a direction (w=0); translation is ignored.
    #[inline]
    pub fn transform_vector(&self, v: Vec3) -> Vec3 {
        (*self * Vec4::direction(v)).xyz()
    }

    /// The translation stored in the last column.
    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(self.data[0][3], self.data[1][3], self.data[2][3])
    }

    /// Per-axis scale, the lengths of the first three columns.
    pub fn scale_part(&self) -> Vec3 {
        let column = |c: usize| Vec3::new(self.data[0][c], self.data[1][c], self.data[2][c]);
        Vec3::new(column(0).length(), column(1).length(), column(2).length())
    }

    /// Access element at [row][col].
    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f32 {
        self.data[row][col]
    }

    /// Set element at [row][col].
    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f32) {
        self.data[row][col] = value;
    }
}

/// Matrix multiplication: Mat4 * Mat4.
impl Mul<Mat4> for Mat4 {
    type Output = Mat4;

    fn mul(self, rhs: Mat4) -> Mat4 {
        let mut result = [[0.0f32; 4]; 4];
        for (row, out) in result.iter_mut().enumerate() {
            for (col, value) in out.iter_mut().enumerate() {
                *value = (0..4).map(|k| self.data[row][k] * rhs.data[k][col]).sum();
            }
        }
        Mat4::new(result)
    }
}

/// Transform a Vec4 by a matrix: Mat4 * Vec4 (column vector).
impl Mul<Vec4> for Mat4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Vec4 {
        let row = |r: usize| Vec4::new(self.data[r][0], self.data[r][1], self.data[r][2], self.data[r][3]);
        Vec4::new(row(0).dot(v), row(1).dot(v), row(2).dot(v), row(3).dot(v))
    }
}

impl AbsDiffEq for Mat4 {
    type Epsilon = f32;

    fn default_epsilon() -> f32 {
        f32::EPSILON
    }

    fn abs_diff_eq(&self, other: &Self, epsilon: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.abs_diff_eq(b, epsilon))
    }
}

impl RelativeEq for Mat4 {
    fn default_max_relative() -> f32 {
        f32::EPSILON
    }

    fn relative_eq(&self, other: &Self, epsilon: f32, max_relative: f32) -> bool {
        self.data
            .iter()
            .flatten()
            .zip(other.data.iter().flatten())
            .all(|(a, b)| a.relative_eq(b, epsilon, max_relative))
    }
}
