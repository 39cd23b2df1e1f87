//! Triangle mesh value type
//!
//! [`Mesh`] holds double-precision geometry for the geometry operations.
//! [`MeshBuffers`] is the flat single-precision form handed to a renderer.

mod colors;

pub use colors::{mean_color, MeshColor};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::point::Point;

/// Triangle mesh with optional per-vertex normals and colors
///
/// Every triangle index is `< vertex_count()`; [`Mesh::new`] checks this
/// and [`Mesh::validate`] re-checks it after direct field edits. Triangle
/// winding gives the outward normal direction via the right-hand rule.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    /// Vertex positions
    pub vertices: Vec<Point>,
    /// Triangles as 0-based vertex indices
    pub triangles: Vec<[u32; 3]>,
    /// Per-vertex unit normals
    pub normals: Option<Vec<Point>>,
    /// Per-vertex RGBA colors
    pub colors: Option<Vec<MeshColor>>,
}

impl Mesh {
    /// Build a mesh, checking every triangle index
    ///
    /// # Example
    ///
    /// ```
    /// use molgeom::{Mesh, Point};
    ///
    /// let mesh = Mesh::new(
    ///     vec![Point::ZERO, Point::X, Point::Y],
    ///     vec![[0, 1, 2]],
    /// )
    /// .unwrap();
    /// assert_eq!(mesh.triangle_area(0), 0.5);
    ///
    /// assert!(Mesh::new(vec![Point::ZERO], vec![[0, 1, 2]]).is_err());
    /// ```
    pub fn new(vertices: Vec<Point>, triangles: Vec<[u32; 3]>) -> Result<Self> {
        let mesh = Self {
            vertices,
            triangles,
            normals: None,
            colors: None,
        };
        mesh.validate()?;
        Ok(mesh)
    }

    /// Check triangle indices and per-vertex attribute lengths
    pub fn validate(&self) -> Result<()> {
        self.check_indices()?;
        let vertex_count = self.vertices.len();
        if let Some(normals) = &self.normals {
            check_len("normals", vertex_count, normals.len())?;
        }
        if let Some(colors) = &self.colors {
            check_len("colors", vertex_count, colors.len())?;
        }
        Ok(())
    }

    /// Check that every triangle refers to existing vertices
    pub(crate) fn check_indices(&self) -> Result<()> {
        let vertex_count = self.vertices.len();
        for (triangle, tri) in self.triangles.iter().enumerate() {
            if let Some(&index) = tri.iter().find(|&&v| v as usize >= vertex_count) {
                return Err(GeometryError::InvalidTriangle {
                    triangle,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Corner positions of a triangle
    ///
    /// # Panics
    ///
    /// Panics if `triangle` is out of range or the triangle refers to a
    /// missing vertex. Meshes built with [`Mesh::new`] never do the latter.
    #[inline]
    pub fn corners(&self, triangle: usize) -> [Point; 3] {
        let [a, b, c] = self.triangles[triangle];
        [
            self.vertices[a as usize],
            self.vertices[b as usize],
            self.vertices[c as usize],
        ]
    }

    /// Unnormalized face normal, length twice the triangle area
    ///
    /// # Panics
    ///
    /// Same conditions as [`Mesh::corners`].
    #[inline]
    pub fn triangle_normal(&self, triangle: usize) -> Point {
        let [v0, v1, v2] = self.corners(triangle);
        (v1 - v0).cross(v2 - v0)
    }

    /// # Panics
    ///
    /// Same conditions as [`Mesh::corners`].
    #[inline]
    pub fn triangle_area(&self, triangle: usize) -> f64 {
        0.5 * self.triangle_normal(triangle).length()
    }

    /// Area attributed to each vertex
    ///
    /// A vertex gets one third of the area of every incident triangle.
    /// When `active` is given only triangles marked `true` contribute.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `active` is not one flag per triangle
    /// and `InvalidTriangle` if a triangle refers to a missing vertex.
    pub fn vertex_areas(&self, active: Option<&[bool]>) -> Result<Vec<f64>> {
        self.check_indices()?;
        if let Some(mask) = active {
            check_len("triangle mask", self.triangles.len(), mask.len())?;
        }
        let mut areas = vec![0.0; self.vertices.len()];
        for (t, tri) in self.triangles.iter().enumerate() {
            if active.is_some_and(|mask| !mask[t]) {
                continue;
            }
            let third = self.triangle_area(t) / 3.0;
            for &v in tri {
                areas[v as usize] += third;
            }
        }
        Ok(areas)
    }

    /// Set per-vertex normals from the adjacent faces
    ///
    /// Each vertex normal is the sum of the unnormalized normals of its
    /// triangles, scaled to unit length. Vertices without a usable face get
    /// a zero normal.
    ///
    /// # Panics
    ///
    /// Panics if a triangle refers to a missing vertex; see [`Mesh::validate`].
    pub fn compute_vertex_normals(&mut self) {
        let mut normals = vec![Point::ZERO; self.vertices.len()];
        for t in 0..self.triangles.len() {
            let face = self.triangle_normal(t);
            for &v in &self.triangles[t] {
                normals[v as usize] += face;
            }
        }
        for normal in &mut normals {
            *normal = normal.normalize_or_zero();
        }
        self.normals = Some(normals);
    }

    /// Color every vertex the same
    pub fn with_uniform_color(mut self, color: MeshColor) -> Self {
        self.colors = Some(vec![color; self.vertices.len()]);
        self
    }

    /// Flatten into single-precision render buffers
    ///
    /// Missing normals or colors come out as empty vectors.
    pub fn to_buffers(&self) -> MeshBuffers {
        let to_f32 = |p: &Point| p.as_vec3().to_array();
        MeshBuffers {
            positions: self.vertices.iter().map(to_f32).collect(),
            normals: self
                .normals
                .as_ref()
                .map(|n| n.iter().map(to_f32).collect())
                .unwrap_or_default(),
            colors: self.colors.clone().unwrap_or_default(),
            indices: self.triangles.iter().flatten().copied().collect(),
        }
    }
}

fn check_len(what: &'static str, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(GeometryError::DimensionMismatch {
            what,
            expected,
            actual,
        });
    }
    Ok(())
}

/// Engine-agnostic mesh buffers
///
/// Raw vertex data suitable for any renderer:
/// - wgpu / OpenGL: upload directly as vertex and index buffers
/// - Bevy: insert as `Mesh` attributes
#[derive(Debug, Clone, Default)]
pub struct MeshBuffers {
    /// Vertex positions
    pub positions: Vec<[f32; 3]>,
    /// Vertex normals (empty if the mesh had none)
    pub normals: Vec<[f32; 3]>,
    /// Vertex colors (empty if the mesh had none)
    pub colors: Vec<MeshColor>,
    /// Triangle indices, three per triangle
    pub indices: Vec<u32>,
}

impl MeshBuffers {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}

/// Closed tetrahedron surface used across the unit tests
#[cfg(test)]
pub(crate) fn test_tetrahedron() -> Mesh {
    Mesh::new(
        vec![
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.0, 0.0, 0.0),
            Point::new(0.0, 1.0, 0.0),
            Point::new(0.0, 0.0, 1.0),
        ],
        vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
    )
    .unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_triangle_rejected() {
        let err = Mesh::new(vec![Point::ZERO, Point::X, Point::Y], vec![[0, 1, 3]]).unwrap_err();
        assert_eq!(
            err,
            GeometryError::InvalidTriangle {
                triangle: 0,
                index: 3,
                vertex_count: 3,
            }
        );
    }

    #[test]
    fn test_validate_attribute_lengths() {
        let mut mesh = test_tetrahedron();
        mesh.colors = Some(vec![[1.0; 4]; 2]);
        assert!(matches!(
            mesh.validate(),
            Err(GeometryError::DimensionMismatch { what: "colors", .. })
        ));
    }

    #[test]
    fn test_vertex_areas_sum_to_surface_area() {
        let mesh = test_tetrahedron();
        let areas = mesh.vertex_areas(None).unwrap();

        let total: f64 = (0..mesh.triangle_count()).map(|t| mesh.triangle_area(t)).sum();
        assert_relative_eq!(areas.iter().sum::<f64>(), total, epsilon = 1e-12);
        // Three right triangles of area 0.5 plus the sqrt(3)/2 face.
        assert_relative_eq!(total, 1.5 + 3.0_f64.sqrt() / 2.0, epsilon = 1e-12);
    }

    #[test]
    fn test_vertex_areas_with_mask() {
        let mesh = test_tetrahedron();
        let areas = mesh
            .vertex_areas(Some(&[true, false, false, false]))
            .unwrap();

        assert_relative_eq!(areas[0], 0.5 / 3.0, epsilon = 1e-12);
        assert_eq!(areas[3], 0.0);

        assert!(mesh.vertex_areas(Some(&[true])).is_err());
    }

    #[test]
    fn test_vertex_normals_point_outward() {
        let mut mesh = test_tetrahedron();
        mesh.compute_vertex_normals();

        let normals = mesh.normals.as_ref().unwrap();
        let center = Point::splat(0.25);
        for (vertex, normal) in mesh.vertices.iter().zip(normals) {
            assert_relative_eq!(normal.length(), 1.0, epsilon = 1e-12);
            assert!(normal.dot(*vertex - center) > 0.0);
        }
    }

    #[test]
    fn test_to_buffers() {
        let mut mesh = test_tetrahedron().with_uniform_color([1.0, 0.0, 0.0, 1.0]);
        let buffers = mesh.to_buffers();
        assert_eq!(buffers.vertex_count(), 4);
        assert_eq!(buffers.triangle_count(), 4);
        assert!(buffers.normals.is_empty());
        assert_eq!(buffers.colors.len(), 4);
        assert_eq!(&buffers.indices[..3], &[0, 2, 1]);

        mesh.compute_vertex_normals();
        assert_eq!(mesh.to_buffers().normals.len(), 4);
    }

    #[test]
    #[should_panic]
    fn test_corners_out_of_range_panics() {
        let mesh = test_tetrahedron();
        mesh.corners(mesh.triangle_count());
    }
}
