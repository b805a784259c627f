//! A CPU-based software-rendered 3D graphics engine.
//!
//! Meshes go through a vertex shader into screen space, are filled by an
//! edge-function rasterizer with a depth test, and are shaded per pixel,
//! optionally sampling textures decoded by the crate's own PNG/zlib decoder.
//! SDL2 is used only by the `viewer` feature, for window management and
//! display.
//!
//! # Quick Start
//!
//! ```no_run
//! use softraster::prelude::*;
//!
//! let mut engine = Engine::new(800, 600);
//! engine.add_mesh(Mesh::cube());
//! engine.tick(1.0 / 60.0);
//! let stats = engine.render();
//! let bytes = engine.frame().as_bytes();
//! # let _ = (stats, bytes);
//! ```

// Public API - exposed to library consumers
pub mod camera;
pub mod colors;
pub mod config;
pub mod engine;
pub mod error;
pub mod grid;
pub mod input;
pub mod light;
pub mod math;
pub mod mesh;
pub mod png;
pub mod render;
pub mod texture;
pub mod transform;
pub mod triangulate;
pub mod zlib;

#[cfg(feature = "viewer")]
pub mod window;

// Re-export commonly needed types at crate root for convenience
pub use engine::{Engine, MeshId};
pub use error::{ChunkError, ConfigError, DecodeError, InflateError, LoadError, TriangulateError};
pub use mesh::Mesh;
pub use transform::Transform;

/// Prelude module for convenient imports.
///
/// # Example
/// ```
/// use softraster::prelude::*;
/// ```
pub mod prelude {
    // Camera
    pub use crate::camera::{Camera, CameraSettings};

    // Engine
    pub use crate::config::ViewerConfig;
    pub use crate::engine::{Engine, MeshId};
    pub use crate::input::{EventKind, InputEvent};

    // Scene
    pub use crate::colors::Color;
    pub use crate::light::DirectionalLight;
    pub use crate::mesh::Mesh;
    pub use crate::texture::{Texture, TextureId, TextureRegistry};
    pub use crate::transform::Transform;

    // Math
    pub use crate::math::{Mat4, Rotator, Vec2, Vec3, Vec4};

    // Rendering
    pub use crate::render::{ByteOrder, RenderFlags, Renderer, Shader};

    // Window & Input
    #[cfg(feature = "viewer")]
    pub use crate::window::{FrameLimiter, Window, WindowEvent};
}
