//! Frame driver.
//!
//! Provides the [`Renderer`] struct which owns the colour and depth buffers
//! and draws one frame: clear, world grid, then every mesh in order.

use log::trace;

use super::framebuffer::{ByteOrder, ColorBuffer, DepthBuffer};
use super::line::draw_line;
use super::rasterizer::draw_triangle;
use super::shader::{default_shader, Shader, ShaderContext};
use super::RenderFlags;
use crate::camera::{Camera, ViewData};
use crate::colors::{self, Color};
use crate::grid::Grid;
use crate::light::DirectionalLight;
use crate::math::{Line3, Mat4, Vec2, Vec4};
use crate::mesh::Mesh;
use crate::texture::TextureRegistry;

/// Clip-space `w` below which a grid endpoint counts as behind the eye.
const NEAR_W: f32 = 1e-4;

/// Per-frame counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FrameStats {
    pub triangles: usize,
    pub drawn: usize,
    pub pixels: usize,
}

pub struct Renderer {
    color: ColorBuffer,
    depth: DepthBuffer,
    flags: RenderFlags,
    grid: Option<Grid>,
    light: DirectionalLight,
    clear_color: Color,
    surface_color: Color,
    shader: Shader,
    backface_culling: bool,
}

impl Renderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            color: ColorBuffer::new(width, height, colors::BACKGROUND),
            depth: DepthBuffer::new(width, height, f32::INFINITY),
            flags: RenderFlags::default(),
            grid: Some(Grid::default()),
            light: DirectionalLight::default(),
            clear_color: colors::BACKGROUND,
            surface_color: colors::FILL,
            shader: default_shader(),
            backface_culling: false,
        }
    }

    pub fn with_byte_order(mut self, byte_order: ByteOrder) -> Self {
        self.color = self.color.with_byte_order(byte_order);
        self
    }

    /// Reallocate both buffers.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.color.resize(width, height, self.clear_color);
        self.depth.resize(width, height, f32::INFINITY);
    }

    pub fn width(&self) -> u32 {
        self.color.width()
    }

    pub fn height(&self) -> u32 {
        self.color.height()
    }

    /// Clear colour to the background and depth to `+∞`.
    pub fn clear(&mut self) {
        self.color.fill(self.clear_color);
        self.depth.fill(f32::INFINITY);
    }

    /// Draw one frame.
    pub fn draw(&mut self, camera: &Camera, meshes: &[Mesh], textures: &TextureRegistry) -> FrameStats {
        self.clear();
        let view = camera.view_data();
        self.draw_grid(&view);

        let mut stats = FrameStats::default();
        for mesh in meshes {
            let texture = mesh.texture.and_then(|id| textures.get(id));
            let mut ctx = ShaderContext::new(view)
                .with_model(mesh.transform.to_matrix())
                .with_light(self.light)
                .with_base_color(self.surface_color)
                .with_texture(texture)
                .with_backface_culling(self.backface_culling);

            for triangle in mesh.triangles() {
                stats.triangles += 1;
                if let Some(pixels) = draw_triangle(
                    &self.shader,
                    &mut ctx,
                    &triangle.vertices,
                    self.flags,
                    &mut self.color,
                    &mut self.depth,
                ) {
                    stats.drawn += 1;
                    stats.pixels += pixels;
                }
            }
        }

        trace!(
            "frame: {}/{} triangles drawn, {} pixels",
            stats.drawn,
            stats.triangles,
            stats.pixels
        );
        stats
    }

    fn draw_grid(&mut self, view: &ViewData) {
        let Some(grid) = &self.grid else {
            return;
        };
        for line in grid.lines() {
            if let Some((a, b)) = project_segment(line, &view.view_projection, view.width, view.height) {
                draw_line(&mut self.color, a, b, colors::GRID);
            }
        }
    }

    // ============ Settings ============

    pub fn flags(&self) -> RenderFlags {
        self.flags
    }

    pub fn set_flags(&mut self, flags: RenderFlags) {
        self.flags = flags;
    }

    pub fn toggle(&mut self, flags: RenderFlags) {
        self.flags.toggle(flags);
    }

    pub fn set_grid(&mut self, grid: Option<Grid>) {
        self.grid = grid;
    }

    pub fn light(&self) -> DirectionalLight {
        self.light
    }

    pub fn set_light(&mut self, light: DirectionalLight) {
        self.light = light;
    }

    pub fn set_clear_color(&mut self, color: Color) {
        self.clear_color = color;
    }

    /// Colour of untextured surfaces.
    pub fn set_surface_color(&mut self, color: Color) {
        self.surface_color = color;
    }

    pub fn set_shader(&mut self, shader: Shader) {
        self.shader = shader;
    }

    pub fn set_backface_culling(&mut self, enabled: bool) {
        self.backface_culling = enabled;
    }

    // ============ Output ============

    pub fn color_buffer(&self) -> &ColorBuffer {
        &self.color
    }

    pub fn depth_buffer(&self) -> &DepthBuffer {
        &self.depth
    }

    pub fn byte_order(&self) -> ByteOrder {
        self.color.byte_order()
    }
}

/// Project a world-space segment to screen space, first cutting it at the
/// near side of the eye (`w = NEAR_W`) so a line passing behind the camera
/// still draws its visible part.
pub fn project_segment(line: &Line3, view_projection: &Mat4, width: u32, height: u32) -> Option<(Vec2, Vec2)> {
    let mut a = view_projection.transform_point4(line.a);
    let mut b = view_projection.transform_point4(line.b);

    match (a.w >= NEAR_W, b.w >= NEAR_W) {
        (false, false) => return None,
        (true, false) => b = a.lerp(b, (NEAR_W - a.w) / (b.w - a.w)),
        (false, true) => a = b.lerp(a, (NEAR_W - b.w) / (a.w - b.w)),
        (true, true) => {}
    }

    let to_screen = |q: Vec4| {
        let ndc = q.project();
        Vec2::new((ndc.x / 2.0 + 0.5) * width as f32, (ndc.y / 2.0 + 0.5) * height as f32)
    };
    Some((to_screen(a), to_screen(b)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera::CameraSettings;
    use crate::colors::RED;
    use crate::math::Vec3;
    use crate::texture::Texture;
    use approx::assert_relative_eq;

    fn camera(width: u32, height: u32) -> Camera {
        Camera::new(&CameraSettings::default(), width, height)
    }

    #[test]
    fn empty_scene_is_background_and_grid() {
        let mut renderer = Renderer::new(120, 80);
        let stats = renderer.draw(&camera(120, 80), &[], &TextureRegistry::new());
        assert_eq!(stats, FrameStats::default());

        let pixels = renderer.color_buffer().pixels();
        assert!(pixels.iter().any(|&c| c == colors::GRID));
        assert!(pixels.iter().any(|&c| c == colors::BACKGROUND));
        assert!(renderer.depth_buffer().pixels().iter().all(|d| d.is_infinite()));
    }

    #[test]
    fn clear_to_black() {
        let mut renderer = Renderer::new(800, 600);
        renderer.set_clear_color(colors::BLACK);
        renderer.clear();
        assert!(renderer
            .color_buffer()
            .pixels()
            .iter()
            .all(|&c| c == Color::new(0, 0, 0, 255)));
        assert!(renderer
            .depth_buffer()
            .pixels()
            .iter()
            .all(|d| d.to_bits() == f32::INFINITY.to_bits()));
    }

    #[test]
    fn textured_cube_fills_pixels_and_depth() {
        let mut textures = TextureRegistry::new();
        let mut cube = Mesh::cube();
        cube.texture = Some(textures.insert(Texture::solid(RED)));

        let mut renderer = Renderer::new(100, 100);
        renderer.set_grid(None);
        let stats = renderer.draw(&camera(100, 100), std::slice::from_ref(&cube), &textures);

        assert_eq!(stats.triangles, 12);
        assert!(stats.drawn >= 2);
        assert!(stats.pixels > 0);
        let depth = renderer.depth_buffer();
        assert!(depth.pixels().iter().any(|d| d.is_finite()));
        // The cube covers the centre of the view.
        assert_ne!(renderer.color_buffer().get(50, 50), Some(colors::BACKGROUND));
    }

    #[test]
    fn missing_texture_falls_back_to_surface_color() {
        let mut quad = Mesh::quad();
        quad.texture = Some(crate::texture::TextureId(3));

        let mut renderer = Renderer::new(64, 64);
        renderer.set_grid(None);
        renderer.set_shader(crate::render::shader::flat_shader());
        renderer.set_surface_color(RED);
        renderer.draw(&camera(64, 64), std::slice::from_ref(&quad), &TextureRegistry::new());
        assert_eq!(renderer.color_buffer().get(32, 32), Some(RED));
    }

    #[test]
    fn toggling_flags() {
        let mut renderer = Renderer::new(8, 8);
        renderer.toggle(RenderFlags::WIREFRAME);
        assert!(renderer.flags().contains(RenderFlags::WIREFRAME | RenderFlags::SHADED));
        renderer.toggle(RenderFlags::WIREFRAME | RenderFlags::DEPTH);
        assert_eq!(renderer.flags(), RenderFlags::SHADED);
    }

    #[test]
    fn resize_reallocates_buffers() {
        let mut renderer = Renderer::new(8, 8).with_byte_order(ByteOrder::Bgra);
        renderer.resize(20, 10);
        assert_eq!((renderer.width(), renderer.height()), (20, 10));
        assert_eq!(renderer.depth_buffer().pixels().len(), 200);
        assert_eq!(renderer.byte_order(), ByteOrder::Bgra);
    }

    #[test]
    fn segments_behind_the_eye() {
        let cam = camera(100, 100);
        let vp = cam.view_projection_matrix();
        // Entirely behind the camera at z = 5.
        let behind = Line3::new(Vec3::new(-1.0, 0.0, 6.0), Vec3::new(1.0, 0.0, 7.0));
        assert!(project_segment(&behind, &vp, 100, 100).is_none());

        // Through the eye plane: the front part survives.
        let through = Line3::new(Vec3::new(0.0, -1.0, 0.0), Vec3::new(0.0, -1.0, 10.0));
        let (a, b) = project_segment(&through, &vp, 100, 100).unwrap();
        assert!(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite());

        // Fully visible: the origin maps to the centre.
        let visible = Line3::new(Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0));
        let (a, _) = project_segment(&visible, &vp, 100, 100).unwrap();
        assert_relative_eq!(a.x, 50.0, epsilon = 1e-3);
        assert_relative_eq!(a.y, 50.0, epsilon = 1e-3);
    }
}
