//! Vector, matrix and orientation primitives.

pub mod line;
pub mod mat4;
pub mod quat;
pub mod rect;
pub mod rotator;
pub mod spherical;
pub mod vec2;
pub mod vec3;
pub mod vec4;

pub use line::{Line2, Line3};
pub use mat4::Mat4;
pub use quat::Quat;
pub use rect::Rect;
pub use rotator::{Basis, Rotator};
pub use spherical::Spherical;
pub use vec2::{Vec2, Vec2i};
pub use vec3::Vec3;
pub use vec4::Vec4;
