//! Proximity configuration and builder
//!
//! Default distances for the [`crate::ProximityOps`] facade. The free
//! functions in [`crate::proximity`] take every distance explicitly.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::{GeometryError, Result};

/// Distance defaults for overlap, connect and closest-pair queries
///
/// All distances are in the caller's coordinate units (Ångströms for
/// atomic coordinates).
///
/// # Example
///
/// ```rust
/// use molgeom::*;
///
/// let config = ProximityConfigBuilder::new()
///     .overlap_tolerance(0.3)
///     .unwrap()
///     .build();
///
/// assert_eq!(config.overlap_tolerance, 0.3);
/// assert_eq!(config.connect_distance, 2.2);
/// ```
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProximityConfig {
    /// Points closer than this to an earlier point count as overlapped
    pub overlap_tolerance: f64,

    /// Pairs within this distance get connected
    pub connect_distance: f64,

    /// Closest-pair searches ignore pairs farther apart than this
    ///
    /// May be infinite to search without a cutoff.
    pub closest_max_distance: f64,
}

impl Default for ProximityConfig {
    fn default() -> Self {
        ProximityConfigBuilder::new().build()
    }
}

/// Builder for [`ProximityConfig`] with validation
///
/// # Example
///
/// ```rust
/// use molgeom::*;
///
/// let config = ProximityConfigBuilder::new()
///     .connect_distance(1.8)
///     .unwrap()
///     .closest_max_distance(f64::INFINITY)
///     .unwrap()
///     .build();
///
/// assert!(ProximityConfigBuilder::new().overlap_tolerance(-0.1).is_err());
/// ```
#[derive(Debug, Clone)]
pub struct ProximityConfigBuilder {
    overlap_tolerance: f64,
    connect_distance: f64,
    closest_max_distance: f64,
}

impl ProximityConfigBuilder {
    /// Create a new builder with default values
    ///
    /// Defaults:
    /// - overlap_tolerance: 0.1
    /// - connect_distance: 2.2 (a generous covalent bond length)
    /// - closest_max_distance: 10.0
    pub fn new() -> Self {
        Self {
            overlap_tolerance: 0.1,
            connect_distance: 2.2,
            closest_max_distance: 10.0,
        }
    }

    /// Set the overlap tolerance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the tolerance is negative or not a number.
    /// Zero is allowed and flags only exact coincidences.
    pub fn overlap_tolerance(mut self, tolerance: f64) -> Result<Self> {
        if tolerance.is_nan() || tolerance < 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "overlap tolerance must be >= 0 (got {})",
                tolerance
            )));
        }
        self.overlap_tolerance = tolerance;
        Ok(self)
    }

    /// Set the connect distance
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` unless the distance is positive and finite.
    pub fn connect_distance(mut self, distance: f64) -> Result<Self> {
        if !distance.is_finite() || distance <= 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "connect distance must be positive and finite (got {})",
                distance
            )));
        }
        self.connect_distance = distance;
        Ok(self)
    }

    /// Set the closest-pair cutoff
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if the distance is not positive.
    pub fn closest_max_distance(mut self, distance: f64) -> Result<Self> {
        if distance.is_nan() || distance <= 0.0 {
            return Err(GeometryError::InvalidConfig(format!(
                "closest-pair max distance must be positive (got {})",
                distance
            )));
        }
        self.closest_max_distance = distance;
        Ok(self)
    }

    /// Build the configuration
    pub fn build(self) -> ProximityConfig {
        ProximityConfig {
            overlap_tolerance: self.overlap_tolerance,
            connect_distance: self.connect_distance,
            closest_max_distance: self.closest_max_distance,
        }
    }
}

impl Default for ProximityConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
