//! Point and point set value types
//!
//! Host object graphs (atoms, residues, structures) are flattened into a
//! coordinate array plus one opaque identifier per point. Results refer to
//! points by index; [`PointSet::id`] maps an index back to the caller's id.

use glam::DVec3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// A position in the caller's common coordinate frame
pub type Point = DVec3;

/// Ordered points with one identifier per point
///
/// Insertion order is preserved and is what every index in a result refers
/// to. The identifier type defaults to `usize`, in which case
/// [`PointSet::from_points`] assigns each point its input index.
///
/// # Example
///
/// ```
/// use molgeom::{Point, PointSet};
///
/// let set = PointSet::new(
///     vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)],
///     vec!["/A LYS 45 NZ", "/B ASP 522 OD1"],
/// )
/// .unwrap();
///
/// assert_eq!(set.len(), 2);
/// assert_eq!(set.id(1), Some(&"/B ASP 522 OD1"));
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct PointSet<I = usize> {
    points: Vec<Point>,
    ids: Vec<I>,
}

impl PointSet<usize> {
    /// Build a set whose identifiers are the input indices
    pub fn from_points(points: Vec<Point>) -> Self {
        let ids = (0..points.len()).collect();
        Self { points, ids }
    }

    /// Build a set from raw coordinate triples
    pub fn from_coords(coords: &[[f64; 3]]) -> Self {
        Self::from_points(coords.iter().map(|&c| Point::from_array(c)).collect())
    }
}

impl<I> PointSet<I> {
    /// Build a set from parallel point and identifier vectors
    ///
    /// # Errors
    ///
    /// Returns `DimensionMismatch` if `ids` and `points` differ in length.
    pub fn new(points: Vec<Point>, ids: Vec<I>) -> Result<Self> {
        if points.len() != ids.len() {
            return Err(GeometryError::DimensionMismatch {
                what: "point ids",
                expected: points.len(),
                actual: ids.len(),
            });
        }
        Ok(Self { points, ids })
    }

    /// An empty set
    pub fn empty() -> Self {
        Self {
            points: Vec::new(),
            ids: Vec::new(),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Coordinates in input order
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Identifiers in input order
    #[inline]
    pub fn ids(&self) -> &[I] {
        &self.ids
    }

    #[inline]
    pub fn point(&self, index: usize) -> Option<Point> {
        self.points.get(index).copied()
    }

    #[inline]
    pub fn id(&self, index: usize) -> Option<&I> {
        self.ids.get(index)
    }

    /// Iterate over `(point, id)` pairs in input order
    pub fn iter(&self) -> impl Iterator<Item = (Point, &I)> + '_ {
        self.points.iter().copied().zip(self.ids.iter())
    }

    /// Unweighted mean of all points
    ///
    /// # Errors
    ///
    /// Returns `EmptyInput` for an empty set.
    pub fn centroid(&self) -> Result<Point> {
        mean_point(&self.points)
    }

    /// Keep only the points at `indices`, in the given order
    ///
    /// Indices past the end are skipped.
    pub fn subset(&self, indices: &[usize]) -> Self
    where
        I: Clone,
    {
        let (points, ids) = indices
            .iter()
            .filter_map(|&i| Some((self.point(i)?, self.id(i)?.clone())))
            .unzip();
        Self { points, ids }
    }
}

impl<I> Default for PointSet<I> {
    fn default() -> Self {
        Self::empty()
    }
}

/// Mean of a slice of points
pub(crate) fn mean_point(points: &[Point]) -> Result<Point> {
    if points.is_empty() {
        return Err(GeometryError::EmptyInput("centroid of zero points"));
    }
    let sum: Point = points.iter().copied().sum();
    Ok(sum / points.len() as f64)
}
