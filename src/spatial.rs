//! Spatial indexing for radius and closest-pair queries
//!
//! With the `spatial-index` feature (default) lookups go through an
//! immutable KD-tree. Without it the same API falls back to a linear scan,
//! which is fine for the few hundred points a typical selection holds.

#[cfg(feature = "spatial-index")]
use kiddo::immutable::float::kdtree::ImmutableKdTree;
#[cfg(feature = "spatial-index")]
use kiddo::SquaredEuclidean;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::point::{Point, PointSet};

/// Relative slack added to tree searches; hits are re-checked exactly.
#[cfg(feature = "spatial-index")]
const SEARCH_SLACK: f64 = 1e-9;

/// Index over a fixed set of points
///
/// # Performance
///
/// - Construction: O(n log n) with the KD-tree
/// - `query_radius`: O(log n + k) for k hits on clustered input
/// - `find_nearest`: O(log n)
#[derive(Clone)]
pub struct PointIndex {
    points: Vec<Point>,
    #[cfg(feature = "spatial-index")]
    tree: Option<ImmutableKdTree<f64, usize, 3, 32>>,
}

impl PointIndex {
    /// Build an index over `points`
    ///
    /// An empty slice gives an index that answers every query with nothing.
    ///
    /// # Example
    ///
    /// ```
    /// use molgeom::{Point, PointIndex};
    ///
    /// let index = PointIndex::new(&[
    ///     Point::new(1.0, 0.0, 0.0),
    ///     Point::new(0.0, 1.0, 0.0),
    ///     Point::new(0.0, 0.0, 1.0),
    /// ]);
    ///
    /// assert_eq!(index.find_nearest(Point::new(1.0, 0.1, 0.0)), Some(0));
    /// assert_eq!(index.query_radius(Point::ZERO, 1.0), vec![0, 1, 2]);
    /// ```
    pub fn new(points: &[Point]) -> Self {
        #[cfg(feature = "spatial-index")]
        let tree = if points.is_empty() {
            None
        } else {
            let coords: Vec<[f64; 3]> = points.iter().map(|p| p.to_array()).collect();
            Some(ImmutableKdTree::new_from_slice(&coords))
        };

        Self {
            points: points.to_vec(),
            #[cfg(feature = "spatial-index")]
            tree,
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

    /// Indexed points in input order
    #[inline]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// All indices within `radius` of `point`, inclusive, ascending
    ///
    /// A zero radius returns exact coincidences. Negative or NaN radii
    /// return nothing.
    pub fn query_radius(&self, point: Point, radius: f64) -> Vec<usize> {
        if self.points.is_empty() || radius.is_nan() || radius < 0.0 {
            return Vec::new();
        }
        if radius.is_infinite() {
            return (0..self.points.len()).collect();
        }

        let radius_sq = radius * radius;
        let mut hits: Vec<usize> = self
            .candidates(point, radius)
            .into_iter()
            .filter(|&i| self.points[i].distance_squared(point) <= radius_sq)
            .collect();
        hits.sort_unstable();
        hits
    }

    /// Index of the point closest to `position`, `None` when empty
    pub fn find_nearest(&self, position: Point) -> Option<usize> {
        #[cfg(feature = "spatial-index")]
        {
            let tree = self.tree.as_ref()?;
            let result = tree.nearest_one::<SquaredEuclidean>(&position.to_array());
            Some(result.item as usize)
        }

        #[cfg(not(feature = "spatial-index"))]
        {
            self.points
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.distance_squared(position)
                        .total_cmp(&b.distance_squared(position))
                })
                .map(|(i, _)| i)
        }
    }

    /// Superset of the points within `radius`
    #[cfg(feature = "spatial-index")]
    fn candidates(&self, point: Point, radius: f64) -> Vec<usize> {
        let Some(tree) = self.tree.as_ref() else {
            return Vec::new();
        };
        let reach = radius * (1.0 + SEARCH_SLACK) + SEARCH_SLACK;
        tree.within::<SquaredEuclidean>(&point.to_array(), reach * reach)
            .into_iter()
            .map(|neighbour| neighbour.item as usize)
            .collect()
    }

    #[cfg(not(feature = "spatial-index"))]
    fn candidates(&self, _point: Point, _radius: f64) -> Vec<usize> {
        (0..self.points.len()).collect()
    }
}

impl std::fmt::Debug for PointIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PointIndex")
            .field("len", &self.points.len())
            .finish()
    }
}

/// The closest pair found between two point sets
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClosestPair {
    /// Index into the first set
    pub index_a: usize,
    /// Index into the second set
    pub index_b: usize,
    /// Euclidean distance between the two points
    pub distance: f64,
}

/// Find the closest pair with one point from each set
///
/// Only pairs within `max_distance` (inclusive) are candidates. Ties are
/// broken by the lowest `(index_a, index_b)`. Empty sets and a
/// non-positive `max_distance` give `None`.
///
/// When the two sets are equal (same points and ids, whether or not they
/// are the same value in memory), a point is never paired with itself, as
/// in [`closest_pair_within`].
///
/// # Example
///
/// ```
/// use molgeom::{closest_pair, PointSet};
///
/// let a = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
/// let b = PointSet::from_coords(&[[3.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);
///
/// let pair = closest_pair(&a, &b, 5.0).unwrap();
/// assert_eq!((pair.index_a, pair.index_b), (0, 1));
/// assert_eq!(pair.distance, 1.0);
/// ```
pub fn closest_pair<I: PartialEq>(
    set_a: &PointSet<I>,
    set_b: &PointSet<I>,
    max_distance: f64,
) -> Option<ClosestPair> {
    let same_set = std::ptr::eq(set_a, set_b) || set_a == set_b;
    search_closest(set_a.points(), set_b.points(), max_distance, same_set)
}

/// Closest pair of distinct points within one set
///
/// The result always has `index_a < index_b`; the distance is zero only
/// when the set contains coincident points.
pub fn closest_pair_within<I>(set: &PointSet<I>, max_distance: f64) -> Option<ClosestPair> {
    search_closest(set.points(), set.points(), max_distance, true)
}

fn search_closest(
    points_a: &[Point],
    points_b: &[Point],
    max_distance: f64,
    skip_self: bool,
) -> Option<ClosestPair> {
    if points_a.is_empty() || points_b.is_empty() || max_distance.is_nan() || max_distance <= 0.0 {
        return None;
    }

    let index = PointIndex::new(points_b);
    let mut best: Option<(f64, usize, usize)> = None;

    for (index_a, &pa) in points_a.iter().enumerate() {
        // Shrink the search to the best distance seen so far.
        let reach = match best {
            Some((best_sq, _, _)) => max_distance.min(best_sq.sqrt() * (1.0 + 1e-12)),
            None => max_distance,
        };

        for index_b in index.query_radius(pa, reach) {
            if skip_self && index_b <= index_a {
                continue;
            }
            let dist_sq = pa.distance_squared(points_b[index_b]);
            if best.map_or(true, |(best_sq, _, _)| dist_sq < best_sq) {
                best = Some((dist_sq, index_a, index_b));
            }
        }
    }

    best.map(|(dist_sq, index_a, index_b)| ClosestPair {
        index_a,
        index_b,
        distance: dist_sq.sqrt(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn random_cloud(count: usize, seed: u64) -> Vec<Point> {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        (0..count)
            .map(|_| {
                Point::new(
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                    rng.gen_range(-10.0..10.0),
                )
            })
            .collect()
    }

    #[test]
    fn test_find_nearest_backbone_atom() {
        // N, CA, C, O of one residue
        let backbone = vec![
            Point::new(-0.525, 1.363, 0.0),
            Point::new(0.0, 0.0, 0.0),
            Point::new(1.526, 0.0, 0.0),
            Point::new(2.153, -1.062, 0.0),
        ];
        let index = PointIndex::new(&backbone);

        for (i, &atom) in backbone.iter().enumerate() {
            assert_eq!(index.find_nearest(atom), Some(i));
        }
        // A point just past the carbonyl oxygen resolves to O, not C.
        assert_eq!(index.find_nearest(Point::new(2.4, -1.9, 0.3)), Some(3));
    }

    #[test]
    fn test_find_nearest_matches_linear_scan() {
        let atoms = random_cloud(400, 21);
        let index = PointIndex::new(&atoms);

        for query in random_cloud(30, 22) {
            let expected = atoms
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.distance_squared(query).total_cmp(&b.distance_squared(query))
                })
                .map(|(i, _)| i);
            assert_eq!(index.find_nearest(query), expected);
        }
    }

    #[test]
    fn test_empty_index() {
        let index = PointIndex::new(&[]);
        assert!(index.is_empty());
        assert_eq!(index.find_nearest(Point::ZERO), None);
        assert!(index.query_radius(Point::ZERO, 100.0).is_empty());
    }

    #[test]
    fn test_query_radius_is_inclusive() {
        let index = PointIndex::new(&[
            Point::new(0.0, 0.0, 0.0),
            Point::new(2.0, 0.0, 0.0),
            Point::new(2.5, 0.0, 0.0),
        ]);

        assert_eq!(index.query_radius(Point::ZERO, 2.0), vec![0, 1]);
        assert_eq!(index.query_radius(Point::ZERO, 1.99), vec![0]);
    }

    #[test]
    fn test_query_radius_zero_and_negative() {
        let index = PointIndex::new(&[Point::X, Point::Y, Point::X]);

        assert_eq!(index.query_radius(Point::X, 0.0), vec![0, 2]);
        assert!(index.query_radius(Point::new(0.5, 0.0, 0.0), 0.0).is_empty());
        assert!(index.query_radius(Point::X, -1.0).is_empty());
        assert!(index.query_radius(Point::X, f64::NAN).is_empty());
    }

    #[test]
    fn test_query_radius_matches_linear_scan() {
        let points = random_cloud(500, 11);
        let index = PointIndex::new(&points);

        for query in random_cloud(20, 12) {
            let expected: Vec<usize> = points
                .iter()
                .enumerate()
                .filter(|(_, p)| p.distance_squared(query) <= 9.0)
                .map(|(i, _)| i)
                .collect();
            assert_eq!(index.query_radius(query, 3.0), expected);
        }
    }

    #[test]
    fn test_closest_pair_scenario() {
        let a = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
        let b = PointSet::from_coords(&[[3.0, 0.0, 0.0], [1.0, 0.0, 0.0]]);

        let pair = closest_pair(&a, &b, 5.0).unwrap();
        assert_eq!(pair.index_a, 0);
        assert_eq!(pair.index_b, 1);
        assert_eq!(pair.distance, 1.0);
    }

    #[test]
    fn test_closest_pair_out_of_range() {
        let a = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
        let b = PointSet::from_coords(&[[3.0, 0.0, 0.0]]);

        assert!(closest_pair(&a, &b, 2.9).is_none());
        assert!(closest_pair(&a, &b, 3.0).is_some());
        assert!(closest_pair(&a, &b, 0.0).is_none());
        assert!(closest_pair(&a, &b, -1.0).is_none());
        assert!(closest_pair(&a, &PointSet::empty(), 10.0).is_none());
    }

    #[test]
    fn test_closest_pair_tie_breaks_on_lowest_indices() {
        let a = PointSet::from_coords(&[[5.0, 0.0, 0.0], [0.0, 0.0, 0.0]]);
        let b = PointSet::from_coords(&[[-1.0, 0.0, 0.0], [1.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);

        // (0, 2) and (1, 0) and (1, 1) are all at distance 1.
        let pair = closest_pair(&a, &b, 10.0).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (0, 2));
    }

    #[test]
    fn test_closest_pair_same_set_skips_self() {
        let set = PointSet::from_coords(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0], [1.5, 0.0, 0.0]]);

        let pair = closest_pair(&set, &set, f64::INFINITY).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (0, 2));
        assert_eq!(pair.distance, 1.5);

        let single = PointSet::from_coords(&[[1.0, 1.0, 1.0]]);
        assert!(closest_pair(&single, &single, f64::INFINITY).is_none());
    }

    #[test]
    fn test_closest_pair_equal_copies_skip_self() {
        let a = PointSet::from_coords(&[[0.0, 0.0, 0.0], [4.0, 0.0, 0.0]]);
        let b = a.clone();

        let pair = closest_pair(&a, &b, f64::INFINITY).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (0, 1));
        assert_eq!(pair.distance, 4.0);

        // Same coordinates under different ids are different atoms.
        let relabeled = PointSet::new(a.points().to_vec(), vec![7, 8]).unwrap();
        let pair = closest_pair(&a, &relabeled, f64::INFINITY).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (0, 0));
        assert_eq!(pair.distance, 0.0);
    }

    #[test]
    fn test_closest_pair_within_finds_duplicates() {
        let set = PointSet::from_coords(&[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [2.0, 0.0, 0.0]]);

        let pair = closest_pair_within(&set, f64::INFINITY).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (1, 2));
        assert_eq!(pair.distance, 0.0);
    }

    #[test]
    fn test_closest_pair_matches_brute_force() {
        let a = PointSet::from_points(random_cloud(200, 1));
        let b = PointSet::from_points(random_cloud(300, 2));

        let mut expected: Option<(f64, usize, usize)> = None;
        for (ia, pa) in a.points().iter().enumerate() {
            for (ib, pb) in b.points().iter().enumerate() {
                let d = pa.distance(*pb);
                if d <= 4.0 && expected.map_or(true, |(bd, _, _)| d < bd) {
                    expected = Some((d, ia, ib));
                }
            }
        }

        let (d, ia, ib) = expected.unwrap();
        let pair = closest_pair(&a, &b, 4.0).unwrap();
        assert_eq!((pair.index_a, pair.index_b), (ia, ib));
        assert!((pair.distance - d).abs() < 1e-12);
    }
}
