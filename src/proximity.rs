//! Proximity operations built on [`PointIndex`]
//!
//! - [`find_overlaps`]: flag points that sit on top of an earlier point
//! - [`connect_within_distance`]: enumerate pairs close enough to connect
//! - [`closest_between`]: closest pair with a printable report
//!
//! [`ProximityOps`] wraps the three with configured distances and logs a
//! status line for each call.

use std::fmt;

use tracing::{debug, info};

use crate::config::ProximityConfig;
use crate::point::PointSet;
use crate::spatial::{closest_pair, ClosestPair, PointIndex};

/// Flag points that overlap an earlier, unflagged point
///
/// Points are visited in input order. A point that is not yet flagged
/// flags every other point within `tolerance` of it (inclusive); flagged
/// points are skipped. The first point of a coincident cluster therefore
/// stays unflagged and the rest are flagged.
///
/// The result depends on input order and is not symmetric clustering:
/// in a chain `a - b - c` where only neighbours are within tolerance, `a`
/// flags `b`, `b` is skipped, and `c` survives. The unflagged points are
/// always pairwise farther apart than `tolerance`.
///
/// Returns the flagged indices in ascending order.
///
/// # Example
///
/// ```
/// use molgeom::{find_overlaps, PointSet};
///
/// let points = PointSet::from_coords(&[
///     [0.0, 0.0, 0.0],
///     [0.0, 0.0, 0.05],
///     [5.0, 5.0, 5.0],
/// ]);
/// assert_eq!(find_overlaps(&points, 0.1), vec![1]);
/// ```
pub fn find_overlaps<I>(points: &PointSet<I>, tolerance: f64) -> Vec<usize> {
    let index = PointIndex::new(points.points());
    let mut flagged = vec![false; points.len()];

    for (i, &point) in points.points().iter().enumerate() {
        if flagged[i] {
            continue;
        }
        for j in index.query_radius(point, tolerance) {
            if j != i {
                flagged[j] = true;
            }
        }
    }

    let overlapped: Vec<usize> = flagged
        .iter()
        .enumerate()
        .filter_map(|(i, &f)| f.then_some(i))
        .collect();
    debug!(
        total = points.len(),
        overlapped = overlapped.len(),
        tolerance,
        "overlap sweep done"
    );
    overlapped
}

/// Enumerate cross-set pairs within `distance`
///
/// Pairs come out ordered by `index_a`, then `index_b`. A pair is skipped
/// when `is_connected(id_a, id_b)` reports it as already connected.
///
/// When both sets are equal (same points and ids), a point is never
/// paired with itself and each unordered pair is reported once as `(i, j)` with
/// `i < j`; see [`connect_within`].
///
/// # Example
///
/// ```
/// use molgeom::{connect_within_distance, PointSet};
///
/// let a = PointSet::from_coords(&[[0.0, 0.0, 0.0]]);
/// let b = PointSet::from_coords(&[[1.0, 0.0, 0.0], [5.0, 0.0, 0.0], [0.0, 2.0, 0.0]]);
///
/// let pairs = connect_within_distance(&a, &b, 2.2, |_, _| false);
/// assert_eq!(pairs, vec![(0, 0), (0, 2)]);
/// ```
pub fn connect_within_distance<I, F>(
    set_a: &PointSet<I>,
    set_b: &PointSet<I>,
    distance: f64,
    is_connected: F,
) -> Vec<(usize, usize)>
where
    I: PartialEq,
    F: FnMut(&I, &I) -> bool,
{
    let same_set = std::ptr::eq(set_a, set_b) || set_a == set_b;
    pairs_within(set_a, set_b, distance, same_set, is_connected)
}

/// Enumerate pairs of distinct points of one set within `distance`
///
/// Each unordered pair appears once as `(i, j)` with `i < j`.
pub fn connect_within<I, F>(set: &PointSet<I>, distance: f64, is_connected: F) -> Vec<(usize, usize)>
where
    F: FnMut(&I, &I) -> bool,
{
    pairs_within(set, set, distance, true, is_connected)
}

fn pairs_within<I, F>(
    set_a: &PointSet<I>,
    set_b: &PointSet<I>,
    distance: f64,
    same_set: bool,
    mut is_connected: F,
) -> Vec<(usize, usize)>
where
    F: FnMut(&I, &I) -> bool,
{
    let index = PointIndex::new(set_b.points());
    let mut pairs = Vec::new();

    for (index_a, (point, id_a)) in set_a.iter().enumerate() {
        for index_b in index.query_radius(point, distance) {
            // Pairs with a lower index_b were reported when index_b was visited.
            if same_set && index_b <= index_a {
                continue;
            }
            if is_connected(id_a, &set_b.ids()[index_b]) {
                continue;
            }
            pairs.push((index_a, index_b));
        }
    }

    debug!(pairs = pairs.len(), distance, same_set, "connect pass done");
    pairs
}

/// Outcome of a closest-pair search
///
/// `Display` renders the status message a host shows to its user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClosestReport<'a, I> {
    /// A pair was found within range
    Found {
        index_a: usize,
        index_b: usize,
        id_a: &'a I,
        id_b: &'a I,
        /// Exact double-precision distance
        distance: f64,
    },
    /// No pair lies within `max_distance`
    NotFound { max_distance: f64 },
}

impl<'a, I> ClosestReport<'a, I> {
    pub fn is_found(&self) -> bool {
        matches!(self, ClosestReport::Found { .. })
    }

    pub fn distance(&self) -> Option<f64> {
        match self {
            ClosestReport::Found { distance, .. } => Some(*distance),
            ClosestReport::NotFound { .. } => None,
        }
    }

    /// The pair as plain indices
    pub fn pair(&self) -> Option<ClosestPair> {
        match *self {
            ClosestReport::Found {
                index_a,
                index_b,
                distance,
                ..
            } => Some(ClosestPair {
                index_a,
                index_b,
                distance,
            }),
            ClosestReport::NotFound { .. } => None,
        }
    }
}

impl<I: fmt::Display> fmt::Display for ClosestReport<'_, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClosestReport::Found {
                id_a,
                id_b,
                distance,
                ..
            } => write!(f, "Minimum distance {:.2} between {} and {}", distance, id_a, id_b),
            ClosestReport::NotFound { max_distance } => {
                write!(
                    f,
                    "No pairs within distance {} of each other",
                    significant(*max_distance)
                )
            }
        }
    }
}

/// Three significant digits, trailing zeros dropped (`10`, `0.123`,
/// `1.23e+04`)
fn significant(value: f64) -> String {
    if !value.is_finite() || value == 0.0 {
        return value.to_string();
    }
    // Round first so 999.7 picks the exponent of 1.00e3.
    let rounded = format!("{:.2e}", value);
    let (mantissa, exponent) = rounded.split_once('e').unwrap_or((rounded.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if !(-4..3).contains(&exponent) {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (2 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}

/// Closest pair between two sets, reported with the caller's ids
///
/// Same search and tie-breaking as [`closest_pair`]; a missing pair is a
/// normal outcome, not an error.
///
/// # Example
///
/// ```
/// use molgeom::{closest_between, Point, PointSet};
///
/// let a = PointSet::new(vec![Point::ZERO], vec!["/A LYS 45 NZ"]).unwrap();
/// let b = PointSet::new(vec![Point::new(2.27, 0.0, 0.0)], vec!["/B ASP 522 OD1"]).unwrap();
///
/// let report = closest_between(&a, &b, 10.0);
/// assert_eq!(
///     report.to_string(),
///     "Minimum distance 2.27 between /A LYS 45 NZ and /B ASP 522 OD1"
/// );
/// ```
pub fn closest_between<'a, I: PartialEq>(
    set_a: &'a PointSet<I>,
    set_b: &'a PointSet<I>,
    max_distance: f64,
) -> ClosestReport<'a, I> {
    let found = closest_pair(set_a, set_b, max_distance).and_then(|pair| {
        Some(ClosestReport::Found {
            index_a: pair.index_a,
            index_b: pair.index_b,
            id_a: set_a.id(pair.index_a)?,
            id_b: set_b.id(pair.index_b)?,
            distance: pair.distance,
        })
    });
    found.unwrap_or(ClosestReport::NotFound { max_distance })
}

/// Proximity operations with configured distances
///
/// # Example
///
/// ```
/// use molgeom::*;
///
/// let ops = ProximityOps::new(ProximityConfig::default());
/// let atoms = PointSet::from_coords(&[[0.0, 0.0, 0.0], [1.5, 0.0, 0.0], [9.0, 0.0, 0.0]]);
///
/// let bonds = ops.connect(&atoms, &atoms, |_, _| false);
/// assert_eq!(bonds, vec![(0, 1)]);
/// ```
#[derive(Debug, Clone, Default)]
pub struct ProximityOps {
    config: ProximityConfig,
}

impl ProximityOps {
    pub fn new(config: ProximityConfig) -> Self {
        Self { config }
    }

    #[inline]
    pub fn config(&self) -> &ProximityConfig {
        &self.config
    }

    /// [`find_overlaps`] with the configured tolerance
    pub fn find_overlaps<I>(&self, points: &PointSet<I>) -> Vec<usize> {
        let overlapped = find_overlaps(points, self.config.overlap_tolerance);
        info!("{} overlapped points", overlapped.len());
        overlapped
    }

    /// [`connect_within_distance`] with the configured distance
    pub fn connect<I, F>(
        &self,
        set_a: &PointSet<I>,
        set_b: &PointSet<I>,
        is_connected: F,
    ) -> Vec<(usize, usize)>
    where
        I: PartialEq,
        F: FnMut(&I, &I) -> bool,
    {
        let pairs = connect_within_distance(set_a, set_b, self.config.connect_distance, is_connected);
        info!(
            "Made {} connections between {} and {} points",
            pairs.len(),
            set_a.len(),
            set_b.len()
        );
        pairs
    }

    /// [`closest_between`] with the configured cutoff
    pub fn closest<'a, I: fmt::Display + PartialEq>(
        &self,
        set_a: &'a PointSet<I>,
        set_b: &'a PointSet<I>,
    ) -> ClosestReport<'a, I> {
        let report = closest_between(set_a, set_b, self.config.closest_max_distance);
        info!("{}", report);
        report
    }
}
