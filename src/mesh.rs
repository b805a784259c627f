//! Triangle meshes: indexed attribute pools plus denormalised triangles.
//!
//! A [`Mesh`] keeps the position/normal/texcoord pools it was built from and a
//! list of [`Triangle`]s indexing into them. [`Mesh::process_triangles`]
//! copies the indexed attributes into each triangle's vertices, which is what
//! the renderer reads. OBJ files are imported through `tobj`; polygonal faces
//! are triangulated with [`crate::triangulate`].

use std::cell::OnceCell;
use std::path::Path;

use log::{debug, info, warn};

use crate::error::{LoadError, TriangulateError};
use crate::math::{Vec2, Vec2i, Vec3};
use crate::texture::TextureId;
use crate::transform::Transform;
use crate::triangulate::{fan, triangulate};

/// Stored normals are negated on import unless told otherwise.
pub const DEFAULT_FLIP_NORMALS: bool = true;

/// Floats per vertex in [`Mesh::vertex_buffer`]: position, normal, uv.
pub const VERTEX_STRIDE: usize = 8;

/// Scale applied before rounding polygon coordinates for the triangulator.
const QUANTISE_SCALE: f32 = 4096.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tex_coord: Vec2,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
    pub position_indices: [usize; 3],
    pub normal_indices: Option<[usize; 3]>,
    pub tex_coord_indices: Option<[usize; 3]>,
}

impl Triangle {
    /// Unnormalised `(b - a) × (c - a)` of the vertex positions.
    pub fn face_normal(&self) -> Vec3 {
        let [a, b, c] = self.vertices.map(|v| v.position);
        (b - a).cross(c - a)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Mesh {
    name: String,
    positions: Vec<Vec3>,
    normals: Vec<Vec3>,
    tex_coords: Vec<Vec2>,
    triangles: Vec<Triangle>,
    packed: OnceCell<Vec<f32>>,
    pub transform: Transform,
    pub texture: Option<TextureId>,
}

impl Mesh {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Build from pools and per-triangle index triples, then denormalise.
    /// Triangles referencing missing pool entries are skipped.
    pub fn from_indexed(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        normals: Vec<Vec3>,
        tex_coords: Vec<Vec2>,
        faces: &[([usize; 3], Option<[usize; 3]>, Option<[usize; 3]>)],
        flip_normals: bool,
    ) -> Self {
        let mut mesh = Self {
            name: name.into(),
            positions,
            normals,
            tex_coords,
            ..Self::default()
        };
        for &(p, n, t) in faces {
            mesh.add_triangle(p, n, t);
        }
        mesh.process_triangles(flip_normals);
        mesh
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn normals(&self) -> &[Vec3] {
        &self.normals
    }

    pub fn tex_coords(&self) -> &[Vec2] {
        &self.tex_coords
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    pub fn push_position(&mut self, p: Vec3) -> usize {
        self.positions.push(p);
        self.positions.len() - 1
    }

    pub fn push_normal(&mut self, n: Vec3) -> usize {
        self.normals.push(n);
        self.normals.len() - 1
    }

    pub fn push_tex_coord(&mut self, uv: Vec2) -> usize {
        self.tex_coords.push(uv);
        self.tex_coords.len() - 1
    }

    /// Append a triangle. Returns its index, or `None` (with a warning) when
    /// an index is outside its pool. Call [`Mesh::process_triangles`] before
    /// rendering.
    pub fn add_triangle(
        &mut self,
        positions: [usize; 3],
        normals: Option<[usize; 3]>,
        tex_coords: Option<[usize; 3]>,
    ) -> Option<usize> {
        let in_range = |indices: Option<[usize; 3]>, len: usize| {
            indices.map_or(true, |idx| idx.iter().all(|&i| i < len))
        };
        if !in_range(Some(positions), self.positions.len())
            || !in_range(normals, self.normals.len())
            || !in_range(tex_coords, self.tex_coords.len())
        {
            warn!("{}: triangle {positions:?} references a missing vertex attribute", self.name);
            return None;
        }

        self.triangles.push(Triangle {
            vertices: [Vertex::default(); 3],
            position_indices: positions,
            normal_indices: normals,
            tex_coord_indices: tex_coords,
        });
        self.packed.take();
        Some(self.triangles.len() - 1)
    }

    /// Copy pooled attributes into every triangle's vertices.
    ///
    /// With `flip_normals`, stored normals are negated. Triangles without
    /// normal indices get their geometric normal `(b - a) × (c - a)`.
    pub fn process_triangles(&mut self, flip_normals: bool) {
        let sign = if flip_normals { -1.0 } else { 1.0 };
        for tri in &mut self.triangles {
            for (k, vertex) in tri.vertices.iter_mut().enumerate() {
                vertex.position = self.positions[tri.position_indices[k]];
                vertex.tex_coord = tri
                    .tex_coord_indices
                    .map_or(Vec2::ZERO, |t| self.tex_coords[t[k]]);
            }
            match tri.normal_indices {
                Some(n) => {
                    for (k, vertex) in tri.vertices.iter_mut().enumerate() {
                        vertex.normal = self.normals[n[k]] * sign;
                    }
                }
                None => {
                    let normal = tri.face_normal().normalize();
                    for vertex in &mut tri.vertices {
                        vertex.normal = normal;
                    }
                }
            }
        }
        self.packed.take();
    }

    /// Packed `(px, py, pz, nx, ny, nz, u, v)` stream, three vertices per
    /// triangle. Built on first use after any change.
    pub fn vertex_buffer(&self) -> &[f32] {
        self.packed.get_or_init(|| {
            let mut out = Vec::with_capacity(self.triangles.len() * 3 * VERTEX_STRIDE);
            for v in self.triangles.iter().flat_map(|t| t.vertices.iter()) {
                out.extend_from_slice(&[
                    v.position.x,
                    v.position.y,
                    v.position.z,
                    v.normal.x,
                    v.normal.y,
                    v.normal.z,
                    v.tex_coord.x,
                    v.tex_coord.y,
                ]);
            }
            out
        })
    }

    /// A 2×2×2 cube centred on the origin, one normal per face. The pool
    /// stores inward normals, so processing yields outward ones.
    pub fn cube() -> Self {
        let positions = vec![
            Vec3::new(-1.0, -1.0, -1.0),
            Vec3::new(1.0, -1.0, -1.0),
            Vec3::new(1.0, 1.0, -1.0),
            Vec3::new(-1.0, 1.0, -1.0),
            Vec3::new(-1.0, -1.0, 1.0),
            Vec3::new(1.0, -1.0, 1.0),
            Vec3::new(1.0, 1.0, 1.0),
            Vec3::new(-1.0, 1.0, 1.0),
        ];
        let normals = vec![
            Vec3::new(0.0, 0.0, -1.0),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(-1.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 1.0, 0.0),
        ];
        let tex_coords = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];

        // Quads wound counter-clockwise seen from outside.
        let quads: [([usize; 4], usize); 6] = [
            ([4, 5, 6, 7], 0),
            ([1, 0, 3, 2], 1),
            ([5, 1, 2, 6], 2),
            ([0, 4, 7, 3], 3),
            ([7, 6, 2, 3], 4),
            ([0, 1, 5, 4], 5),
        ];
        let faces: Vec<_> = quads
            .iter()
            .flat_map(|&([a, b, c, d], n)| {
                [
                    ([a, b, c], Some([n; 3]), Some([0, 1, 2])),
                    ([a, c, d], Some([n; 3]), Some([0, 2, 3])),
                ]
            })
            .collect();

        Self::from_indexed("cube", positions, normals, tex_coords, &faces, DEFAULT_FLIP_NORMALS)
    }

    /// A unit quad in the XY plane facing +Z (stored normal `-Z`, inward).
    pub fn quad() -> Self {
        let positions = vec![
            Vec3::new(-1.0, -1.0, 0.0),
            Vec3::new(1.0, -1.0, 0.0),
            Vec3::new(1.0, 1.0, 0.0),
            Vec3::new(-1.0, 1.0, 0.0),
        ];
        let tex_coords = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(0.0, 1.0),
        ];
        let faces = [
            ([0, 1, 2], Some([0; 3]), Some([0, 1, 2])),
            ([0, 2, 3], Some([0; 3]), Some([0, 2, 3])),
        ];
        Self::from_indexed(
            "quad",
            positions,
            vec![-Vec3::FORWARD],
            tex_coords,
            &faces,
            DEFAULT_FLIP_NORMALS,
        )
    }

    /// Load every object/group of an OBJ file as a separate mesh.
    pub fn load_obj(path: impl AsRef<Path>, flip_normals: bool) -> Result<Vec<Mesh>, LoadError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(LoadError::FileNotFound(path.to_path_buf()));
        }

        let options = tobj::LoadOptions {
            single_index: false,
            triangulate: false,
            ignore_points: true,
            ignore_lines: true,
            ..Default::default()
        };
        let (models, materials) = tobj::load_obj(path, &options)?;
        if let Err(err) = materials {
            debug!("{}: materials not loaded: {err}", path.display());
        }

        let meshes: Vec<Mesh> = models
            .iter()
            .map(|model| Mesh::from_tobj(&model.name, &model.mesh, flip_normals))
            .filter(|mesh| mesh.triangle_count() > 0)
            .collect();
        if meshes.is_empty() {
            return Err(LoadError::EmptyModel(path.to_path_buf()));
        }

        info!(
            "loaded {} ({} meshes, {} triangles)",
            path.display(),
            meshes.len(),
            meshes.iter().map(Mesh::triangle_count).sum::<usize>()
        );
        Ok(meshes)
    }

    /// Convert one `tobj` mesh (loaded with `single_index: false`).
    pub fn from_tobj(name: &str, source: &tobj::Mesh, flip_normals: bool) -> Self {
        let vec3s = |data: &[f32]| -> Vec<Vec3> {
            data.chunks_exact(3)
                .map(|c| Vec3::new(c[0], c[1], c[2]))
                .collect()
        };
        let mut mesh = Mesh::new(name);
        mesh.positions = vec3s(&source.positions);
        mesh.normals = vec3s(&source.normals);
        mesh.tex_coords = source
            .texcoords
            .chunks_exact(2)
            .map(|c| Vec2::new(c[0], c[1]))
            .collect();

        let has_normals = !source.normal_indices.is_empty();
        let has_tex_coords = !source.texcoord_indices.is_empty();

        // Empty arities mean every face is a triangle.
        let arities: Vec<usize> = if source.face_arities.is_empty() {
            vec![3; source.indices.len() / 3]
        } else {
            source.face_arities.iter().map(|&a| a as usize).collect()
        };

        let mut offset = 0;
        for arity in arities {
            let corners = offset..offset + arity;
            offset += arity;
            let Some(face) = source.indices.get(corners.clone()) else {
                warn!("{name}: face list is shorter than its arities");
                break;
            };
            let face: Vec<usize> = face.iter().map(|&i| i as usize).collect();
            let polygon: Vec<Vec3> = face
                .iter()
                .map(|&i| mesh.positions.get(i).copied().unwrap_or_default())
                .collect();

            for [a, b, c] in triangulate_face(name, &polygon) {
                let pick = |indices: &[u32]| -> Option<[usize; 3]> {
                    let corner = |k: usize| indices.get(corners.start + k).map(|&i| i as usize);
                    Some([corner(a)?, corner(b)?, corner(c)?])
                };
                mesh.add_triangle(
                    [face[a], face[b], face[c]],
                    if has_normals { pick(&source.normal_indices) } else { None },
                    if has_tex_coords { pick(&source.texcoord_indices) } else { None },
                );
            }
        }

        mesh.process_triangles(flip_normals);
        mesh
    }
}

/// Split one polygonal face into corner-index triples.
///
/// The face is projected onto the plane its Newell normal is most aligned
/// with and quantised to integers for the ear clipper. If no ear can be found
/// the unclipped residue is fanned.
fn triangulate_face(mesh_name: &str, polygon: &[Vec3]) -> Vec<[usize; 3]> {
    let n = polygon.len();
    if n == 3 {
        return vec![[0, 1, 2]];
    }

    let mut normal = Vec3::ZERO;
    for (i, cur) in polygon.iter().enumerate() {
        let next = polygon[(i + 1) % n];
        normal.x += (cur.y - next.y) * (cur.z + next.z);
        normal.y += (cur.z - next.z) * (cur.x + next.x);
        normal.z += (cur.x - next.x) * (cur.y + next.y);
    }
    let (ax, ay, az) = (normal.x.abs(), normal.y.abs(), normal.z.abs());
    let project = |p: Vec3| -> (f32, f32) {
        if ax >= ay && ax >= az {
            (p.y, p.z)
        } else if ay >= az {
            (p.z, p.x)
        } else {
            (p.x, p.y)
        }
    };

    let origin = project(polygon.first().copied().unwrap_or_default());
    let projected: Vec<Vec2i> = polygon
        .iter()
        .map(|&p| {
            let (u, v) = project(p);
            Vec2i::new(
                ((u - origin.0) * QUANTISE_SCALE).round() as i32,
                ((v - origin.1) * QUANTISE_SCALE).round() as i32,
            )
        })
        .collect();

    match triangulate(&projected) {
        Ok(triangles) => triangles,
        Err(TriangulateError::TooFewVertices(count)) => {
            warn!("{mesh_name}: skipping face with {count} vertices");
            Vec::new()
        }
        Err(TriangulateError::Degenerate {
            mut triangles,
            remaining,
        }) => {
            warn!(
                "{mesh_name}: degenerate {n}-gon, fanning the last {} vertices",
                remaining.len()
            );
            triangles.extend(
                fan(remaining.len())
                    .into_iter()
                    .map(|[a, b, c]| [remaining[a], remaining[b], remaining[c]]),
            );
            triangles
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;

    #[test]
    fn cube_has_twelve_triangles() {
        let cube = Mesh::cube();
        assert_eq!(cube.triangle_count(), 12);
        assert_eq!(cube.vertex_buffer().len(), 12 * 3 * VERTEX_STRIDE);
    }

    #[test]
    fn cube_normals_point_outward() {
        let cube = Mesh::cube();
        for tri in cube.triangles() {
            let geometric = tri.face_normal().normalize();
            let centre = tri.vertices.iter().fold(Vec3::ZERO, |acc, v| acc + v.position) / 3.0;
            for v in tri.vertices {
                assert_relative_eq!(v.normal, geometric, epsilon = 1e-6);
                assert!(v.normal.dot(centre) > 0.0, "{:?} at {centre:?}", v.normal);
            }
        }
    }

    #[test]
    fn quad_normal_faces_the_default_camera() {
        let quad = Mesh::quad();
        assert_eq!(quad.normals(), [Vec3::new(0.0, 0.0, -1.0)]);
        for tri in quad.triangles() {
            for v in tri.vertices {
                assert_eq!(v.normal, Vec3::FORWARD);
            }
        }
    }

    #[test]
    fn processing_copies_indexed_attributes() {
        let mut mesh = Mesh::new("tri");
        let a = mesh.push_position(Vec3::new(0.0, 0.0, 0.0));
        let b = mesh.push_position(Vec3::new(1.0, 0.0, 0.0));
        let c = mesh.push_position(Vec3::new(0.0, 1.0, 0.0));
        let n = mesh.push_normal(Vec3::new(0.0, 0.0, 1.0));
        let t = mesh.push_tex_coord(Vec2::new(0.5, 0.25));
        mesh.add_triangle([a, b, c], Some([n; 3]), Some([t; 3])).unwrap();

        mesh.process_triangles(false);
        let tri = mesh.triangles()[0];
        assert_eq!(tri.vertices[1].position, Vec3::new(1.0, 0.0, 0.0));
        assert_eq!(tri.vertices[2].normal, Vec3::new(0.0, 0.0, 1.0));
        assert_eq!(tri.vertices[0].tex_coord, Vec2::new(0.5, 0.25));

        mesh.process_triangles(true);
        assert_eq!(mesh.triangles()[0].vertices[0].normal, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn missing_normals_use_geometry() {
        let mesh = Mesh::from_indexed(
            "tri",
            vec![Vec3::ZERO, Vec3::RIGHT, Vec3::UP],
            Vec::new(),
            Vec::new(),
            &[([0, 1, 2], None, None)],
            true,
        );
        assert_eq!(mesh.triangles()[0].vertices[0].normal, Vec3::FORWARD);
        assert_eq!(mesh.triangles()[0].vertices[2].tex_coord, Vec2::ZERO);
    }

    #[test]
    fn out_of_range_indices_are_rejected() {
        let mut mesh = Mesh::new("bad");
        mesh.push_position(Vec3::ZERO);
        assert_eq!(mesh.add_triangle([0, 0, 3], None, None), None);
        assert_eq!(mesh.add_triangle([0, 0, 0], Some([0; 3]), None), None);
        assert_eq!(mesh.triangle_count(), 0);
    }

    #[test]
    fn vertex_buffer_is_rebuilt_after_changes() {
        let mut mesh = Mesh::quad();
        assert_eq!(mesh.vertex_buffer().len(), 2 * 3 * VERTEX_STRIDE);
        let p = mesh.push_position(Vec3::new(0.0, 0.0, 1.0));
        mesh.add_triangle([0, 1, p], None, None).unwrap();
        mesh.process_triangles(false);
        assert_eq!(mesh.vertex_buffer().len(), 3 * 3 * VERTEX_STRIDE);
        // Last vertex position is the new point.
        let buffer = mesh.vertex_buffer();
        let last = &buffer[buffer.len() - VERTEX_STRIDE..];
        assert_eq!(&last[..3], &[0.0, 0.0, 1.0]);
    }

    #[test]
    fn concave_face_is_ear_clipped() {
        // L-shape in the XZ plane.
        let polygon = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 1.0),
            Vec3::new(1.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, 2.0),
        ];
        let triangles = triangulate_face("l", &polygon);
        assert_eq!(triangles.len(), 4);
        let area: f32 = triangles
            .iter()
            .map(|&[a, b, c]| {
                (polygon[b] - polygon[a]).cross(polygon[c] - polygon[a]).length() / 2.0
            })
            .sum();
        assert_relative_eq!(area, 3.0, epsilon = 1e-5);
    }

    #[test]
    fn collinear_face_falls_back_to_fan() {
        let polygon = [
            Vec3::new(0.0, 0.0, 0.0),
            Vec3::new(1.0, 0.0, 0.0),
            Vec3::new(2.0, 0.0, 0.0),
            Vec3::new(3.0, 0.0, 0.0),
        ];
        assert_eq!(triangulate_face("line", &polygon).len(), 2);
    }

    #[test]
    fn loads_obj_with_quads_and_groups() {
        let mut file = tempfile::Builder::new().suffix(".obj").tempfile().unwrap();
        write!(
            file,
            "o first\n\
             v 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\n\
             vn 0 0 -1\n\
             vt 0 0\nvt 1 0\nvt 1 1\nvt 0 1\n\
             f 1/1/1 2/2/1 3/3/1 4/4/1\n\
             o second\n\
             v 0 0 1\nv 1 0 1\nv 0 1 1\n\
             f 5 6 7\n"
        )
        .unwrap();

        let meshes = Mesh::load_obj(file.path(), true).unwrap();
        assert_eq!(meshes.len(), 2);
        assert_eq!(meshes[0].name(), "first");
        assert_eq!(meshes[0].triangle_count(), 2);
        for tri in meshes[0].triangles() {
            assert!(tri.tex_coord_indices.is_some());
            for v in tri.vertices {
                assert_eq!(v.normal, Vec3::FORWARD);
            }
        }
        assert_eq!(meshes[1].triangle_count(), 1);
        assert!(meshes[1].triangles()[0].normal_indices.is_none());
    }

    #[test]
    fn missing_obj_file() {
        assert!(matches!(
            Mesh::load_obj("nope/missing.obj", true),
            Err(LoadError::FileNotFound(_))
        ));
    }
}
