//! Convex hull surfaces
//!
//! Builds a closed, outward-wound triangle surface around a point set.
//! The hull itself comes from parry3d's quickhull; facets are then mapped
//! back onto the caller's exact input coordinates, re-wound relative to the
//! point-set centroid and given vertex normals for lighting.

mod orient;

use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;

use parry3d::math::Point as ParryPoint;
use parry3d::transformation;
use tracing::{debug, warn};

use crate::error::{GeometryError, Result};
use crate::mesh::{mean_color, Mesh, MeshColor};
use crate::point::{Point, PointSet};
use crate::spatial::PointIndex;

use orient::{check_spans_3d, orient_facets, unshare_vertices};

/// Largest relative gap tolerated when matching hull vertices to inputs
const MATCH_TOLERANCE: f64 = 1e-4;

/// A hull surface ready to hand to a renderer
#[derive(Debug, Clone)]
pub struct HullSurface {
    /// Display name
    pub name: String,
    /// Outward-wound triangles with vertex normals (and colors, if set)
    pub mesh: Mesh,
    /// Input index of every mesh vertex
    pub source_indices: Vec<usize>,
}

/// Convex hull builder
///
/// # Example
///
/// ```
/// use molgeom::{ConvexHullBuilder, PointSet};
///
/// let points = PointSet::from_coords(&[
///     [0.0, 0.0, 0.0],
///     [1.0, 0.0, 0.0],
///     [0.0, 1.0, 0.0],
///     [0.0, 0.0, 1.0],
///     [0.1, 0.1, 0.1],
/// ]);
///
/// let hull = ConvexHullBuilder::new().build(&points).unwrap();
/// assert_eq!(hull.mesh.triangle_count(), 4);
/// assert_eq!(hull.name, "Convex hull of 5 points");
///
/// let sharp = ConvexHullBuilder::new().sharp(true).build(&points).unwrap();
/// assert_eq!(sharp.mesh.vertex_count(), 12);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ConvexHullBuilder {
    sharp: bool,
    color: Option<MeshColor>,
    name: Option<String>,
}

impl ConvexHullBuilder {
    /// Smooth-shaded, uncolored, default-named hulls
    pub fn new() -> Self {
        Self::default()
    }

    /// Duplicate vertices per triangle for flat shading
    pub fn sharp(mut self, sharp: bool) -> Self {
        self.sharp = sharp;
        self
    }

    /// Color every vertex of the surface
    pub fn color(mut self, color: MeshColor) -> Self {
        self.color = Some(color);
        self
    }

    /// Surface name; defaults to `Convex hull of N points`
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Build the hull of one point set
    ///
    /// # Errors
    ///
    /// Returns `DegenerateInput` for fewer than 4 points, non-finite
    /// coordinates, or points that are coincident, collinear or coplanar.
    pub fn build<I>(&self, points: &PointSet<I>) -> Result<HullSurface> {
        let coords = points.points();
        check_spans_3d(coords)?;
        let center = points.centroid()?;

        // Centering first keeps the f32 round-off relative to the cloud size.
        let parry_points: Vec<ParryPoint<f32>> = coords
            .iter()
            .map(|&p| {
                let v = (p - center).as_vec3();
                ParryPoint::new(v.x, v.y, v.z)
            })
            .collect();
        let (hull_vertices, hull_triangles) = transformation::try_convex_hull(&parry_points)
            .map_err(|err| {
                GeometryError::DegenerateInput(format!("convex hull failed: {:?}", err))
            })?;
        debug!(
            input = coords.len(),
            hull_vertices = hull_vertices.len(),
            facets = hull_triangles.len(),
            "computed convex hull"
        );

        let (mut source_indices, mut triangles) =
            match_input_points(coords, center, &hull_vertices, &hull_triangles)?;
        let mut vertices: Vec<Point> = source_indices.iter().map(|&i| coords[i]).collect();
        orient_facets(&vertices, &mut triangles, center);

        if self.sharp {
            (vertices, triangles, source_indices) =
                unshare_vertices(&vertices, &triangles, &source_indices);
        }

        let mut mesh = Mesh::new(vertices, triangles)?;
        mesh.compute_vertex_normals();
        if let Some(color) = self.color {
            mesh = mesh.with_uniform_color(color);
        }

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| format!("Convex hull of {} points", points.len()));

        Ok(HullSurface {
            name,
            mesh,
            source_indices,
        })
    }

    /// Build one hull per group of points
    ///
    /// `keys[i]` names the group of point `i` (a chain id, say). Groups come
    /// out in order of first appearance and each surface is named after its
    /// key; `source_indices` refer to `points`. Without an explicit color,
    /// a group whose `point_colors` are given is colored with the mean of
    /// its points' colors.
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `keys` or `point_colors` is not one
    /// entry per point, and `DegenerateInput` naming the group if any
    /// group cannot form a hull.
    pub fn build_groups<I, K>(
        &self,
        points: &PointSet<I>,
        keys: &[K],
        point_colors: Option<&[MeshColor]>,
    ) -> Result<Vec<(K, HullSurface)>>
    where
        I: Clone,
        K: Eq + Hash + Clone + Display,
    {
        if keys.len() != points.len() {
            return Err(GeometryError::DimensionMismatch {
                what: "group keys",
                expected: points.len(),
                actual: keys.len(),
            });
        }
        if let Some(colors) = point_colors {
            if colors.len() != points.len() {
                return Err(GeometryError::DimensionMismatch {
                    what: "point colors",
                    expected: points.len(),
                    actual: colors.len(),
                });
            }
        }

        let mut order: Vec<K> = Vec::new();
        let mut members: HashMap<K, Vec<usize>> = HashMap::new();
        for (i, key) in keys.iter().enumerate() {
            members
                .entry(key.clone())
                .or_insert_with(|| {
                    order.push(key.clone());
                    Vec::new()
                })
                .push(i);
        }

        let mut surfaces = Vec::with_capacity(order.len());
        for key in order {
            let indices = &members[&key];
            let mut builder = self.clone().name(key.to_string());
            if builder.color.is_none() {
                builder.color = point_colors
                    .and_then(|colors| mean_color(indices.iter().map(|&i| colors[i])));
            }

            let mut surface = builder.build(&points.subset(indices)).map_err(|err| match err {
                GeometryError::DegenerateInput(msg) => {
                    GeometryError::DegenerateInput(format!("group {}: {}", key, msg))
                }
                other => other,
            })?;
            for source in &mut surface.source_indices {
                *source = indices[*source];
            }
            surfaces.push((key, surface));
        }

        debug!(groups = surfaces.len(), "built grouped convex hulls");
        Ok(surfaces)
    }
}

/// Map parry's hull vertices onto input point indices
///
/// Returns the input index of every mesh vertex and the triangles in
/// mesh-vertex indices. Hull vertices no facet uses are left out, and
/// triangles that collapse when two hull vertices land on the same input
/// point are dropped.
fn match_input_points(
    coords: &[Point],
    center: Point,
    hull_vertices: &[ParryPoint<f32>],
    hull_triangles: &[[u32; 3]],
) -> Result<(Vec<usize>, Vec<[u32; 3]>)> {
    let index = PointIndex::new(coords);
    let radius = coords
        .iter()
        .map(|p| p.distance(center))
        .fold(0.0_f64, f64::max);

    let mut source_indices: Vec<usize> = Vec::new();
    let mut mesh_index: HashMap<usize, u32> = HashMap::new();
    let mut remap: Vec<Option<u32>> = vec![None; hull_vertices.len()];
    let mut triangles = Vec::with_capacity(hull_triangles.len());

    for tri in hull_triangles {
        let mut corners = [0u32; 3];
        for (corner, &v) in corners.iter_mut().zip(tri) {
            let v = v as usize;
            if let Some(slot) = remap[v] {
                *corner = slot;
                continue;
            }

            let hull_vertex = hull_vertices[v];
            let position = Point::new(
                hull_vertex.x.into(),
                hull_vertex.y.into(),
                hull_vertex.z.into(),
            ) + center;
            let input = index
                .find_nearest(position)
                .ok_or(GeometryError::EmptyInput("convex hull of zero points"))?;

            let gap = position.distance(coords[input]);
            if gap > MATCH_TOLERANCE * radius {
                warn!(input, gap, "hull vertex does not coincide with an input point");
            }

            let next = source_indices.len() as u32;
            let slot = *mesh_index.entry(input).or_insert(next);
            if slot == next {
                source_indices.push(input);
            }
            remap[v] = Some(slot);
            *corner = slot;
        }

        let [a, b, c] = corners;
        if a != b && b != c && a != c {
            triangles.push(corners);
        }
    }

    Ok((source_indices, triangles))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn unit_tetrahedron() -> PointSet {
        PointSet::from_coords(&[
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ])
    }

    /// Every input point lies on the inner side of every facet
    fn assert_contains_all(mesh: &Mesh, points: &[Point], tolerance: f64) {
        for t in 0..mesh.triangle_count() {
            let normal = mesh.triangle_normal(t).normalize();
            let v0 = mesh.corners(t)[0];
            for p in points {
                let height = (*p - v0).dot(normal);
                assert!(height <= tolerance, "point {p} is {height} outside facet {t}");
            }
        }
    }

    #[test]
    fn test_unit_tetrahedron_is_outward() {
        let points = unit_tetrahedron();
        let hull = ConvexHullBuilder::new().build(&points).unwrap();
        let center = points.centroid().unwrap();

        assert_eq!(hull.mesh.triangle_count(), 4);
        assert_eq!(hull.mesh.vertex_count(), 4);
        for t in 0..hull.mesh.triangle_count() {
            let [v0, v1, v2] = hull.mesh.corners(t);
            assert!((v0 - center).dot((v1 - v0).cross(v2 - v0)) > 0.0);
        }
    }

    #[test]
    fn test_vertices_are_exact_inputs() {
        let points = PointSet::from_coords(&[
            [10.123456789, 0.0, 0.0],
            [0.0, 10.987654321, 0.0],
            [0.0, 0.0, 10.5],
            [0.0, 0.0, 0.0],
            [1.0, 1.0, 1.0],
        ]);
        let hull = ConvexHullBuilder::new().build(&points).unwrap();

        let mut sources = hull.source_indices.clone();
        sources.sort_unstable();
        assert_eq!(sources, vec![0, 1, 2, 3]);
        for (vertex, &source) in hull.mesh.vertices.iter().zip(&hull.source_indices) {
            assert_eq!(*vertex, points.points()[source]);
        }
    }

    #[test]
    fn test_cube_with_interior_points() {
        let mut coords = Vec::new();
        for x in [0.0, 2.0] {
            for y in [0.0, 2.0] {
                for z in [0.0, 2.0] {
                    coords.push([x, y, z]);
                }
            }
        }
        coords.push([1.0, 1.0, 1.0]);
        coords.push([0.4, 1.4, 0.8]);
        let points = PointSet::from_coords(&coords);

        let hull = ConvexHullBuilder::new().build(&points).unwrap();
        assert_eq!(hull.mesh.vertex_count(), 8);
        assert_eq!(hull.mesh.triangle_count(), 12);
        assert!(hull.source_indices.iter().all(|&i| i < 8));
        assert_contains_all(&hull.mesh, points.points(), 1e-9);
    }

    #[test]
    fn test_random_cloud_is_contained() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let coords: Vec<Point> = (0..300)
            .map(|_| {
                Point::new(
                    rng.gen_range(-20.0..20.0),
                    rng.gen_range(-5.0..5.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect();
        let points = PointSet::from_points(coords);

        let hull = ConvexHullBuilder::new().build(&points).unwrap();
        assert!(hull.mesh.triangle_count() >= 4);
        assert_contains_all(&hull.mesh, points.points(), 1e-3);

        let center = points.centroid().unwrap();
        for t in 0..hull.mesh.triangle_count() {
            let [v0, _, _] = hull.mesh.corners(t);
            assert!((v0 - center).dot(hull.mesh.triangle_normal(t)) > 0.0);
        }
    }

    #[test]
    fn test_degenerate_input() {
        let three = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]);
        assert!(matches!(
            ConvexHullBuilder::new().build(&three),
            Err(GeometryError::DegenerateInput(_))
        ));

        let flat = PointSet::from_coords(&[
            [0.0, 0.0, 1.0],
            [1.0, 0.0, 1.0],
            [0.0, 1.0, 1.0],
            [1.0, 1.0, 1.0],
        ]);
        assert!(matches!(
            ConvexHullBuilder::new().build(&flat),
            Err(GeometryError::DegenerateInput(_))
        ));
    }

    #[test]
    fn test_sharp_mode_duplicates_vertices() {
        let points = unit_tetrahedron();
        let hull = ConvexHullBuilder::new().sharp(true).build(&points).unwrap();
        let mesh = &hull.mesh;

        assert_eq!(mesh.triangle_count(), 4);
        assert_eq!(mesh.vertex_count(), 12);
        assert_eq!(hull.source_indices.len(), 12);

        let normals = mesh.normals.as_ref().unwrap();
        for (k, tri) in mesh.triangles.iter().enumerate() {
            let k = k as u32;
            assert_eq!(*tri, [3 * k, 3 * k + 1, 3 * k + 2]);
            let face = mesh.triangle_normal(k as usize).normalize();
            for &v in tri {
                assert!((normals[v as usize] - face).length() < 1e-12);
            }
        }
    }

    #[test]
    fn test_smooth_normals_are_unit_and_outward() {
        let points = unit_tetrahedron();
        let hull = ConvexHullBuilder::new().build(&points).unwrap();
        let center = points.centroid().unwrap();

        let normals = hull.mesh.normals.as_ref().unwrap();
        assert_eq!(normals.len(), hull.mesh.vertex_count());
        for (vertex, normal) in hull.mesh.vertices.iter().zip(normals) {
            assert!((normal.length() - 1.0).abs() < 1e-12);
            assert!(normal.dot(*vertex - center) > 0.0);
        }
    }

    #[test]
    fn test_color_and_name() {
        let hull = ConvexHullBuilder::new()
            .color([1.0, 0.5, 0.0, 1.0])
            .name("pocket")
            .build(&unit_tetrahedron())
            .unwrap();

        assert_eq!(hull.name, "pocket");
        assert_eq!(hull.mesh.colors, Some(vec![[1.0, 0.5, 0.0, 1.0]; 4]));
    }

    #[test]
    fn test_build_groups() {
        let mut coords = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let shifted: Vec<[f64; 3]> = coords.iter().map(|&[x, y, z]| [x + 10.0, y, z]).collect();
        coords.extend(shifted);
        let points = PointSet::from_coords(&coords);
        let keys = ["B", "B", "B", "B", "A", "A", "A", "A"];
        let red = [1.0, 0.0, 0.0, 1.0];
        let blue = [0.0, 0.0, 1.0, 1.0];
        let colors = [red, red, blue, red, blue, blue, blue, blue];

        let surfaces = ConvexHullBuilder::new()
            .build_groups(&points, &keys, Some(&colors))
            .unwrap();
        assert_eq!(surfaces.len(), 2);
        assert_eq!(surfaces[0].0, "B");
        assert_eq!(surfaces[0].1.name, "B");
        assert_eq!(surfaces[1].0, "A");
        assert_eq!(surfaces[0].1.mesh.triangle_count(), 4);
        assert_eq!(surfaces[0].1.source_indices.len(), 4);
        assert!(surfaces[1].1.source_indices.iter().all(|&i| i >= 4));
        assert_eq!(
            surfaces[0].1.mesh.colors.as_ref().unwrap()[0],
            [0.75, 0.0, 0.25, 1.0]
        );

        let explicit = ConvexHullBuilder::new()
            .color(red)
            .build_groups(&points, &keys, Some(&colors))
            .unwrap();
        assert!(explicit
            .iter()
            .all(|(_, s)| s.mesh.colors.as_ref().unwrap()[0] == red));
    }

    #[test]
    fn test_build_groups_errors() {
        let points = unit_tetrahedron();
        let builder = ConvexHullBuilder::new();

        assert!(matches!(
            builder.build_groups(&points, &[1, 1, 1], None),
            Err(GeometryError::DimensionMismatch { what: "group keys", .. })
        ));

        match builder.build_groups(&points, &[1, 1, 1, 2], None) {
            Err(GeometryError::DegenerateInput(msg)) => assert!(msg.starts_with("group 1:")),
            other => panic!("expected degenerate group, got {other:?}"),
        }
    }
}
