//! Connected surface pieces and their centers
//!
//! Splits the active triangles of a mesh into pieces connected through
//! shared edges, and finds an area-weighted center for each piece.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, info};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};
use crate::mesh::Mesh;
use crate::point::Point;

/// One connected piece of a mesh
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Component {
    /// Vertex indices used by the piece, ascending
    pub vertices: Vec<usize>,
    /// Triangle indices in the piece, ascending
    pub triangles: Vec<usize>,
}

/// Split the active triangles of `mesh` into edge-connected pieces
///
/// Two triangles are connected when they share an edge (two vertex
/// indices); touching at a single vertex does not connect them. Edges
/// shared by more than two triangles connect all of them. `active` masks
/// triangles in or out; `None` uses every triangle. Connectivity follows
/// vertex indices, so a mesh with unshared vertices (a sharp hull) splits
/// into single triangles.
///
/// Pieces are ordered by their lowest triangle index.
///
/// # Errors
///
/// Returns `DimensionMismatch` if `active` is not one flag per triangle,
/// or an index error if the mesh itself is invalid.
///
/// # Example
///
/// ```
/// use molgeom::{components, Mesh, Point};
///
/// // Two triangles sharing the edge 1-2, plus a separate one.
/// let mesh = Mesh::new(
///     vec![
///         Point::new(0.0, 0.0, 0.0),
///         Point::new(1.0, 0.0, 0.0),
///         Point::new(0.0, 1.0, 0.0),
///         Point::new(1.0, 1.0, 0.0),
///         Point::new(5.0, 0.0, 0.0),
///         Point::new(6.0, 0.0, 0.0),
///         Point::new(5.0, 1.0, 0.0),
///     ],
///     vec![[0, 1, 2], [4, 5, 6], [1, 3, 2]],
/// )
/// .unwrap();
///
/// let pieces = components(&mesh, None).unwrap();
/// assert_eq!(pieces.len(), 2);
/// assert_eq!(pieces[0].triangles, vec![0, 2]);
/// assert_eq!(pieces[1].vertices, vec![4, 5, 6]);
/// ```
pub fn components(mesh: &Mesh, active: Option<&[bool]>) -> Result<Vec<Component>> {
    mesh.validate()?;
    if let Some(mask) = active {
        if mask.len() != mesh.triangle_count() {
            return Err(GeometryError::DimensionMismatch {
                what: "triangle mask",
                expected: mesh.triangle_count(),
                actual: mask.len(),
            });
        }
    }
    let is_active = |t: usize| active.map_or(true, |mask| mask[t]);

    let adjacency = edge_adjacency(mesh, &is_active);
    let mut visited = vec![false; mesh.triangle_count()];
    let mut pieces = Vec::new();

    for start in 0..mesh.triangle_count() {
        if visited[start] || !is_active(start) {
            continue;
        }

        let mut triangles = Vec::new();
        let mut stack = vec![start];
        visited[start] = true;
        while let Some(t) = stack.pop() {
            triangles.push(t);
            for &neighbor in &adjacency[t] {
                if !visited[neighbor] {
                    visited[neighbor] = true;
                    stack.push(neighbor);
                }
            }
        }
        triangles.sort_unstable();

        let mut vertices: Vec<usize> = triangles
            .iter()
            .flat_map(|&t| mesh.triangles[t])
            .map(|v| v as usize)
            .collect();
        vertices.sort_unstable();
        vertices.dedup();

        pieces.push(Component {
            vertices,
            triangles,
        });
    }

    debug!(
        triangles = mesh.triangle_count(),
        pieces = pieces.len(),
        "split mesh into connected pieces"
    );
    Ok(pieces)
}

/// Triangle-to-triangle adjacency through shared edges
fn edge_adjacency(mesh: &Mesh, is_active: &impl Fn(usize) -> bool) -> Vec<Vec<usize>> {
    let mut edge_to_faces: HashMap<(u32, u32), Vec<usize>> = HashMap::new();

    for (t, tri) in mesh.triangles.iter().enumerate() {
        if !is_active(t) {
            continue;
        }
        for i in 0..3 {
            let (v0, v1) = (tri[i], tri[(i + 1) % 3]);
            let edge = if v0 < v1 { (v0, v1) } else { (v1, v0) };
            edge_to_faces.entry(edge).or_default().push(t);
        }
    }

    let mut adjacent: Vec<Vec<usize>> = vec![Vec::new(); mesh.triangle_count()];
    for faces in edge_to_faces.values() {
        // A star through the first face is enough for connectivity.
        if let Some((&first, rest)) = faces.split_first() {
            for &other in rest {
                if other != first {
                    adjacent[first].push(other);
                    adjacent[other].push(first);
                }
            }
        }
    }
    adjacent
}

/// Area-weighted center of one piece
///
/// Each vertex is weighted by one third of the summed area of the piece's
/// triangles that use it, so densely tessellated patches do not pull the
/// center toward themselves.
///
/// # Errors
///
/// Returns `EmptyInput` for a piece without triangles, `DegenerateInput`
/// when its total area is zero, `TriangleOutOfRange` if the piece refers
/// to a triangle `mesh` does not have, and `InvalidTriangle` if one of its
/// triangles uses a missing vertex.
pub fn centroid(component: &Component, mesh: &Mesh) -> Result<Point> {
    if component.triangles.is_empty() {
        return Err(GeometryError::EmptyInput("component without triangles"));
    }

    let mut weights: BTreeMap<u32, f64> = BTreeMap::new();
    for &t in &component.triangles {
        let tri = mesh
            .triangles
            .get(t)
            .ok_or(GeometryError::TriangleOutOfRange {
                triangle: t,
                triangle_count: mesh.triangle_count(),
            })?;
        let vertex_count = mesh.vertex_count();
        if let Some(&index) = tri.iter().find(|&&v| v as usize >= vertex_count) {
            return Err(GeometryError::InvalidTriangle {
                triangle: t,
                index,
                vertex_count,
            });
        }
        let third = mesh.triangle_area(t) / 3.0;
        for &v in tri {
            *weights.entry(v).or_insert(0.0) += third;
        }
    }

    let total: f64 = weights.values().sum();
    if total <= 0.0 {
        return Err(GeometryError::DegenerateInput(
            "component has zero area".to_string(),
        ));
    }

    let weighted: Point = weights
        .iter()
        .map(|(&v, &w)| mesh.vertices[v as usize] * w)
        .sum();
    Ok(weighted / total)
}

/// Center of every connected piece of the active triangles
///
/// Centers are in the mesh's own coordinates, ordered like [`components`].
pub fn blob_centers(mesh: &Mesh, active: Option<&[bool]>) -> Result<Vec<Point>> {
    let pieces = components(mesh, active)?;
    let centers = pieces
        .iter()
        .map(|piece| centroid(piece, mesh))
        .collect::<Result<Vec<_>>>()?;
    info!("Found {} connected surface pieces", centers.len());
    Ok(centers)
}
