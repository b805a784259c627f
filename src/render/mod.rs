//! The rasterization pipeline.
//!
//! [`Renderer`] owns the colour and depth buffers and drives one frame:
//! clear, grid, then every mesh triangle through [`rasterizer::draw_triangle`]
//! with the active [`Shader`].

pub mod framebuffer;
pub mod line;
pub mod rasterizer;
pub mod renderer;
pub mod shader;

pub use framebuffer::{ByteOrder, ColorBuffer, DepthBuffer, FrameBuffer};
pub use rasterizer::{draw_triangle, edge_fn, rasterize_triangle};
pub use renderer::{FrameStats, Renderer};
pub use shader::{Shader, ShaderContext};

use serde::Deserialize;

bitflags::bitflags! {
    /// What the renderer draws for each triangle.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        const WIREFRAME = 1 << 0;
        const SHADED = 1 << 1;
        const DEPTH = 1 << 2;
        const NORMALS = 1 << 3;
        const VERTEX_NORMALS = 1 << 4;
    }
}

impl Default for RenderFlags {
    fn default() -> Self {
        RenderFlags::SHADED | RenderFlags::DEPTH
    }
}

/// Initial render flags as they appear in configuration files.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub wireframe: bool,
    pub shaded: bool,
    pub depth: bool,
    pub normals: bool,
    pub vertex_normals: bool,
    pub backface_culling: bool,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            wireframe: false,
            shaded: true,
            depth: true,
            normals: false,
            vertex_normals: false,
            backface_culling: false,
        }
    }
}

impl RenderSettings {
    pub fn flags(&self) -> RenderFlags {
        let mut flags = RenderFlags::empty();
        flags.set(RenderFlags::WIREFRAME, self.wireframe);
        flags.set(RenderFlags::SHADED, self.shaded);
        flags.set(RenderFlags::DEPTH, self.depth);
        flags.set(RenderFlags::NORMALS, self.normals);
        flags.set(RenderFlags::VERTEX_NORMALS, self.vertex_normals);
        flags
    }
}
