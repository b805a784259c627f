//! The ground grid drawn under every scene.

use serde::Deserialize;

use crate::math::{Line3, Vec3};

/// Upper bound on cells per side.
pub const MAX_SUBDIVISIONS: u32 = 1024;

#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct GridSettings {
    pub subdivisions: u32,
    pub spacing: f32,
}

impl GridSettings {
    /// Copy with `subdivisions` capped at [`MAX_SUBDIVISIONS`].
    pub fn clamped(self) -> Self {
        if self.subdivisions > MAX_SUBDIVISIONS {
            log::warn!(
                "grid subdivisions {} exceed {MAX_SUBDIVISIONS}, clamping",
                self.subdivisions
            );
        }
        Self {
            subdivisions: self.subdivisions.min(MAX_SUBDIVISIONS),
            ..self
        }
    }
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            subdivisions: 10,
            spacing: 1.0,
        }
    }
}

/// A square of `subdivisions × subdivisions` cells centred on the origin in
/// the XZ plane.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    settings: GridSettings,
    lines: Vec<Line3>,
}

impl Grid {
    pub fn new(settings: GridSettings) -> Self {
        let settings = settings.clamped();
        let n = settings.subdivisions;
        let extent = n as f32 * settings.spacing / 2.0;
        let mut lines = Vec::with_capacity(2 * (n as usize + 1));
        for i in 0..=n {
            let offset = -extent + i as f32 * settings.spacing;
            lines.push(Line3::new(
                Vec3::new(offset, 0.0, -extent),
                Vec3::new(offset, 0.0, extent),
            ));
            lines.push(Line3::new(
                Vec3::new(-extent, 0.0, offset),
                Vec3::new(extent, 0.0, offset),
            ));
        }
        Self { settings, lines }
    }

    pub fn settings(&self) -> GridSettings {
        self.settings
    }

    pub fn lines(&self) -> &[Line3] {
        &self.lines
    }
}

impl Default for Grid {
    fn default() -> Self {
        Self::new(GridSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn huge_subdivision_counts_are_capped() {
        let grid = Grid::new(GridSettings {
            subdivisions: u32::MAX,
            spacing: 1.0,
        });
        assert_eq!(grid.settings().subdivisions, MAX_SUBDIVISIONS);
        assert_eq!(grid.lines().len(), 2 * (MAX_SUBDIVISIONS as usize + 1));
    }

    #[test]
    fn line_count_and_extent() {
        let grid = Grid::new(GridSettings {
            subdivisions: 4,
            spacing: 0.5,
        });
        assert_eq!(grid.lines().len(), 10);
        for line in grid.lines() {
            assert_relative_eq!(line.length(), 2.0, epsilon = 1e-6);
            assert_eq!(line.a.y, 0.0);
            assert!(line.a.x.abs() <= 1.0 && line.b.z.abs() <= 1.0);
        }
    }

    #[test]
    fn zero_subdivisions_is_a_single_cross() {
        let grid = Grid::new(GridSettings {
            subdivisions: 0,
            spacing: 1.0,
        });
        assert_eq!(grid.lines().len(), 2);
    }
}
