//! Viewer configuration loaded from an optional TOML file.
//!
//! Every field has a default, so an empty file (or none at all) yields a
//! working 800×600 viewer.

use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::camera::CameraSettings;
use crate::error::ConfigError;
use crate::grid::GridSettings;
use crate::light::DirectionalLight;
use crate::math::Vec3;
use crate::mesh::DEFAULT_FLIP_NORMALS;
use crate::render::{ByteOrder, RenderSettings};

pub const DEFAULT_WIDTH: u32 = 800;
pub const DEFAULT_HEIGHT: u32 = 600;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub width: u32,
    pub height: u32,
    pub byte_order: ByteOrder,
    pub render: RenderSettings,
    pub camera: CameraSettings,
    /// Direction the light travels, not where it comes from.
    pub light_direction: [f32; 3],
    /// `None` hides the grid.
    pub grid: Option<GridSettings>,
    /// Negate imported normals (inward-facing source convention).
    pub flip_normals: bool,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            byte_order: ByteOrder::default(),
            render: RenderSettings::default(),
            camera: CameraSettings::default(),
            light_direction: [0.0, -1.0, -1.0],
            grid: Some(GridSettings::default()),
            flip_normals: DEFAULT_FLIP_NORMALS,
        }
    }
}

impl ViewerConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config: Self = toml::from_str(&text).map_err(|source| ConfigError::Toml {
            path: path.to_path_buf(),
            source,
        })?;
        config.grid = config.grid.map(GridSettings::clamped);
        Ok(config)
    }

    pub fn light(&self) -> DirectionalLight {
        let [x, y, z] = self.light_direction;
        DirectionalLight::new(Vec3::new(x, y, z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::MAX_SUBDIVISIONS;
    use std::io::Write;

    #[test]
    fn empty_document_is_default() {
        let config: ViewerConfig = toml::from_str("").unwrap();
        assert_eq!(config, ViewerConfig::default());
    }

    #[test]
    fn partial_tables_keep_remaining_defaults() {
        let config: ViewerConfig = toml::from_str(
            r#"
            width = 1024
            byte_order = "bgra"

            [render]
            wireframe = true

            [camera]
            fov = 45.0

            [grid]
            subdivisions = 20
            "#,
        )
        .unwrap();

        assert_eq!((config.width, config.height), (1024, DEFAULT_HEIGHT));
        assert_eq!(config.byte_order, ByteOrder::Bgra);
        assert!(config.render.wireframe && config.render.shaded);
        assert_eq!(config.camera.fov, 45.0);
        assert_eq!(config.camera.near, CameraSettings::default().near);
        let grid = config.grid.unwrap();
        assert_eq!((grid.subdivisions, grid.spacing), (20, 1.0));
    }

    #[test]
    fn load_reports_path_on_errors() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "width = \"wide\"").unwrap();
        let err = ViewerConfig::load(file.path()).unwrap_err();
        assert!(matches!(err, ConfigError::Toml { .. }));

        let err = ViewerConfig::load("does/not/exist.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn load_caps_grid_subdivisions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[grid]\nsubdivisions = 4000000000").unwrap();
        let config = ViewerConfig::load(file.path()).unwrap();
        assert_eq!(config.grid.unwrap().subdivisions, MAX_SUBDIVISIONS);
    }

    #[test]
    fn light_direction_is_normalized() {
        let config = ViewerConfig {
            light_direction: [0.0, 0.0, 3.0],
            ..ViewerConfig::default()
        };
        assert_eq!(config.light().direction, Vec3::new(0.0, 0.0, 1.0));
    }
}
