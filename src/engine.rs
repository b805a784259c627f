//! Core rendering engine.
//!
//! The [`Engine`] struct is the main entry point for the viewer. It owns the
//! mesh pool, the texture registry and the [`Viewport`] (camera plus
//! renderer), and routes input events to the viewport through a callback
//! [`Dispatcher`].

use std::path::Path;

use log::{error, info};

use crate::camera::{self, Camera};
use crate::config::ViewerConfig;
use crate::error::LoadError;
use crate::grid::Grid;
use crate::input::{Dispatcher, EventKind, InputEvent};
use crate::mesh::Mesh;
use crate::render::{ColorBuffer, FrameStats, Renderer};
use crate::texture::{TextureId, TextureRegistry};

/// Stable index of a mesh inside the engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// What input callbacks act on.
pub struct Viewport {
    pub camera: Camera,
    pub renderer: Renderer,
}

pub struct Engine {
    meshes: Vec<Mesh>,
    textures: TextureRegistry,
    viewport: Viewport,
    controls: Dispatcher<Viewport>,
    flip_normals: bool,
    last_frame: FrameStats,
}

impl Engine {
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_config(&ViewerConfig {
            width,
            height,
            ..ViewerConfig::default()
        })
    }

    pub fn from_config(config: &ViewerConfig) -> Self {
        let camera = Camera::new(&config.camera, config.width, config.height);
        let mut renderer = Renderer::new(config.width, config.height).with_byte_order(config.byte_order);
        renderer.set_flags(config.render.flags());
        renderer.set_backface_culling(config.render.backface_culling);
        renderer.set_light(config.light());
        renderer.set_grid(config.grid.map(Grid::new));

        Self {
            meshes: Vec::new(),
            textures: TextureRegistry::new(),
            viewport: Viewport { camera, renderer },
            controls: default_controls(),
            flip_normals: config.flip_normals,
            last_frame: FrameStats::default(),
        }
    }

    // ============ Scene ============

    pub fn add_mesh(&mut self, mesh: Mesh) -> MeshId {
        self.meshes.push(mesh);
        MeshId(self.meshes.len() - 1)
    }

    pub fn mesh(&self, id: MeshId) -> Option<&Mesh> {
        self.meshes.get(id.0)
    }

    pub fn mesh_mut(&mut self, id: MeshId) -> Option<&mut Mesh> {
        self.meshes.get_mut(id.0)
    }

    pub fn meshes(&self) -> &[Mesh] {
        &self.meshes
    }

    pub fn clear_meshes(&mut self) {
        self.meshes.clear();
    }

    /// Replace the scene with the objects of an OBJ file.
    pub fn load_model(&mut self, path: impl AsRef<Path>) -> Result<Vec<MeshId>, LoadError> {
        let path = path.as_ref();
        let meshes = Mesh::load_obj(path, self.flip_normals).inspect_err(|e| {
            error!("failed to load model {}: {e}", path.display());
        })?;

        self.meshes.clear();
        let ids = meshes.into_iter().map(|mesh| self.add_mesh(mesh)).collect::<Vec<_>>();
        info!("scene now holds {} meshes from {}", ids.len(), path.display());
        Ok(ids)
    }

    /// Load a texture and bind it to every mesh in the scene. On failure the
    /// meshes keep their current binding.
    pub fn load_texture(&mut self, path: impl AsRef<Path>) -> Result<TextureId, LoadError> {
        let path = path.as_ref();
        let id = self.textures.load(path).inspect_err(|e| {
            error!("failed to load texture {}: {e}", path.display());
        })?;
        for mesh in &mut self.meshes {
            mesh.texture = Some(id);
        }
        Ok(id)
    }

    pub fn textures(&self) -> &TextureRegistry {
        &self.textures
    }

    pub fn textures_mut(&mut self) -> &mut TextureRegistry {
        &mut self.textures
    }

    // ============ Frame ============

    /// Route an event to its callbacks. Returns `false` when nothing handled it.
    pub fn handle_event(&mut self, event: &InputEvent) -> bool {
        self.controls.dispatch(&mut self.viewport, event) > 0
    }

    pub fn controls_mut(&mut self) -> &mut Dispatcher<Viewport> {
        &mut self.controls
    }

    /// Apply the input accumulated since the last tick.
    pub fn tick(&mut self, dt: f32) {
        camera::update(&mut self.viewport.camera, dt);
    }

    pub fn render(&mut self) -> FrameStats {
        let Viewport { camera, renderer } = &mut self.viewport;
        self.last_frame = renderer.draw(camera, &self.meshes, &self.textures);
        self.last_frame
    }

    pub fn last_frame(&self) -> FrameStats {
        self.last_frame
    }

    pub fn frame(&self) -> &ColorBuffer {
        self.viewport.renderer.color_buffer()
    }

    pub fn camera(&self) -> &Camera {
        &self.viewport.camera
    }

    pub fn camera_mut(&mut self) -> &mut Camera {
        &mut self.viewport.camera
    }

    pub fn renderer(&self) -> &Renderer {
        &self.viewport.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut Renderer {
        &mut self.viewport.renderer
    }
}

/// Camera controls, flag toggles and resize handling.
pub fn default_controls() -> Dispatcher<Viewport> {
    let mut controls = Dispatcher::new();
    controls.register(EventKind::Orbit, on_orbit);
    controls.register(EventKind::Pan, on_pan);
    controls.register(EventKind::Zoom, on_zoom);
    controls.register(EventKind::ResetView, on_reset_view);
    controls.register(EventKind::Toggle, on_toggle);
    controls.register(EventKind::Resize, on_resize);
    controls
}

fn on_orbit(viewport: &mut Viewport, event: &InputEvent) {
    if let InputEvent::Orbit { dx, dy } = *event {
        viewport.camera.orbit(dx, dy);
    }
}

fn on_pan(viewport: &mut Viewport, event: &InputEvent) {
    if let InputEvent::Pan { dx, dy } = *event {
        viewport.camera.pan(dx, dy);
    }
}

fn on_zoom(viewport: &mut Viewport, event: &InputEvent) {
    if let InputEvent::Zoom(v) = *event {
        viewport.camera.zoom(v);
    }
}

fn on_reset_view(viewport: &mut Viewport, _: &InputEvent) {
    viewport.camera.reset_view();
}

fn on_toggle(viewport: &mut Viewport, event: &InputEvent) {
    if let InputEvent::Toggle(flags) = *event {
        viewport.renderer.toggle(flags);
    }
}

fn on_resize(viewport: &mut Viewport, event: &InputEvent) {
    if let InputEvent::Resize { width, height } = *event {
        viewport.camera.set_viewport(width, height);
        viewport.renderer.resize(width.max(1), height.max(1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RenderFlags;
    use crate::texture::Texture;
    use crate::colors;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn zoom_applies_on_tick() {
        let mut engine = Engine::new(64, 64);
        let start = engine.camera().current_zoom();
        assert!(engine.handle_event(&InputEvent::Zoom(1.0)));
        engine.tick(1.0 / 60.0);
        assert_relative_eq!(engine.camera().position().length(), start - 1.0, epsilon = 1e-4);
    }

    #[test]
    fn reset_view_restores_home() {
        let mut engine = Engine::new(64, 64);
        let home = engine.camera().position();
        engine.handle_event(&InputEvent::Orbit { dx: 30.0, dy: 10.0 });
        engine.tick(0.0);
        assert!((engine.camera().position() - home).length() > 0.1);

        engine.handle_event(&InputEvent::ResetView);
        assert_relative_eq!(engine.camera().position().x, home.x, epsilon = 1e-5);
        assert_relative_eq!(engine.camera().position().z, home.z, epsilon = 1e-5);
    }

    #[test]
    fn toggle_and_resize_reach_renderer() {
        let mut engine = Engine::new(64, 64);
        engine.handle_event(&InputEvent::Toggle(RenderFlags::WIREFRAME));
        assert!(engine.renderer().flags().contains(RenderFlags::WIREFRAME));

        engine.handle_event(&InputEvent::Resize {
            width: 32,
            height: 16,
        });
        assert_eq!((engine.frame().width(), engine.frame().height()), (32, 16));
        assert_eq!((engine.camera().width(), engine.camera().height()), (32, 16));
    }

    #[test]
    fn cleared_controls_ignore_events() {
        let mut engine = Engine::new(16, 16);
        engine.controls_mut().clear(EventKind::Zoom);
        assert!(!engine.handle_event(&InputEvent::Zoom(1.0)));
    }

    #[test]
    fn render_counts_scene_triangles() {
        let mut engine = Engine::new(80, 60);
        let cube = engine.add_mesh(Mesh::cube());
        let quad = engine.add_mesh(Mesh::quad());
        assert_eq!(engine.mesh(cube).map(Mesh::triangle_count), Some(12));
        assert_eq!(engine.mesh(quad).map(Mesh::triangle_count), Some(2));

        let stats = engine.render();
        assert_eq!(stats.triangles, 14);
        assert_eq!(engine.last_frame(), stats);
    }

    #[test]
    fn failed_texture_keeps_binding() {
        let mut engine = Engine::new(16, 16);
        let id = engine.add_mesh(Mesh::quad());
        let solid = engine.textures_mut().insert(Texture::solid(colors::RED));
        engine.mesh_mut(id).unwrap().texture = Some(solid);

        assert!(engine.load_texture("missing/texture.png").is_err());
        assert_eq!(engine.mesh(id).unwrap().texture, Some(solid));
    }

    #[test]
    fn load_model_replaces_scene() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        writeln!(file, "v 0 0 0\nv 1 0 0\nv 0 1 0\nf 1 2 3").unwrap();

        let mut engine = Engine::new(16, 16);
        engine.add_mesh(Mesh::cube());
        let ids = engine.load_model(file.path()).unwrap();
        assert_eq!(ids, [MeshId(0)]);
        assert_eq!(engine.meshes().len(), 1);
        assert_eq!(engine.meshes()[0].triangle_count(), 1);

        assert!(engine.load_model("missing/model.obj").is_err());
        assert_eq!(engine.meshes().len(), 1);
    }
}
