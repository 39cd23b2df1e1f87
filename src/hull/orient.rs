//! Hull input checks and facet post-processing

use crate::error::{GeometryError, Result};
use crate::point::Point;

/// Relative thickness below which a point cloud counts as flat.
///
/// Kept well above single-precision round-off because the hull itself is
/// computed in `f32`.
const FLATNESS_TOLERANCE: f64 = 1e-6;

/// Check that the points span three dimensions
///
/// Picks a far point, then the point farthest from that line, then the
/// point farthest from that plane, and rejects the cloud if any of the
/// three spans is negligible relative to the cloud size.
pub(crate) fn check_spans_3d(points: &[Point]) -> Result<()> {
    if points.len() < 4 {
        return Err(GeometryError::DegenerateInput(format!(
            "convex hull needs at least 4 points, got {}",
            points.len()
        )));
    }
    if let Some(i) = points.iter().position(|p| !p.is_finite()) {
        return Err(GeometryError::DegenerateInput(format!(
            "point {} has a non-finite coordinate",
            i
        )));
    }

    let origin = points[0];
    let (far, size) = farthest(points, |p| p.distance(origin));
    if size <= f64::MIN_POSITIVE {
        return Err(GeometryError::DegenerateInput(
            "all points coincide".to_string(),
        ));
    }
    let tolerance = size * FLATNESS_TOLERANCE;

    let axis = (far - origin) / size;
    let (side, off_line) = farthest(points, |p| (p - origin).cross(axis).length());
    if off_line <= tolerance {
        return Err(GeometryError::DegenerateInput(
            "points are collinear".to_string(),
        ));
    }

    let normal = axis.cross(side - origin).normalize();
    let (_, off_plane) = farthest(points, |p| (p - origin).dot(normal).abs());
    if off_plane <= tolerance {
        return Err(GeometryError::DegenerateInput(
            "points are coplanar".to_string(),
        ));
    }

    Ok(())
}

fn farthest(points: &[Point], measure: impl Fn(Point) -> f64) -> (Point, f64) {
    points
        .iter()
        .map(|&p| (p, measure(p)))
        .fold((points[0], 0.0), |best, candidate| {
            if candidate.1 > best.1 {
                candidate
            } else {
                best
            }
        })
}

/// Wind every triangle so its normal points away from `center`
///
/// A triangle whose normal faces the center has its first two vertices
/// swapped.
pub(crate) fn orient_facets(vertices: &[Point], triangles: &mut [[u32; 3]], center: Point) {
    for tri in triangles.iter_mut() {
        let v0 = vertices[tri[0] as usize];
        let v1 = vertices[tri[1] as usize];
        let v2 = vertices[tri[2] as usize];
        if (v0 - center).dot((v1 - v0).cross(v2 - v0)) < 0.0 {
            tri.swap(0, 1);
        }
    }
}

/// Give every triangle its own three vertices
///
/// Triangle `k` becomes `[3k, 3k + 1, 3k + 2]`, so per-vertex normals
/// equal face normals and render flat shaded. `source` is carried along
/// per vertex.
pub(crate) fn unshare_vertices(
    vertices: &[Point],
    triangles: &[[u32; 3]],
    source: &[usize],
) -> (Vec<Point>, Vec<[u32; 3]>, Vec<usize>) {
    let corners = triangles.iter().flatten().map(|&v| v as usize);
    let split_vertices = corners.clone().map(|v| vertices[v]).collect();
    let split_source = corners.map(|v| source[v]).collect();
    let split_triangles = (0..triangles.len() as u32)
        .map(|k| [3 * k, 3 * k + 1, 3 * k + 2])
        .collect();
    (split_vertices, split_triangles, split_source)
}
