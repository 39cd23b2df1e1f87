//! Proximity queries and surface geometry for molecular point sets
//!
//! A host-independent library for the geometric work behind a handful of
//! molecular-visualization commands: finding the closest pair of atoms
//! between two selections, connecting atoms within bonding distance,
//! flagging overlapped atoms, wrapping a selection in a convex hull
//! surface, and locating the connected pieces of a surface.
//!
//! The host flattens its atoms into a [`PointSet`] (coordinates plus one
//! opaque id per atom) or its surface into a [`Mesh`]; every operation is a
//! pure function returning indices, points or new geometry.
//!
//! # Quick Start
//!
//! ```rust
//! use molgeom::*;
//!
//! let atoms = PointSet::from_coords(&[
//!     [0.0, 0.0, 0.0],
//!     [1.5, 0.0, 0.0],
//!     [0.0, 1.5, 0.0],
//!     [0.0, 0.0, 1.5],
//!     [0.0, 0.0, 0.05],
//! ]);
//!
//! // Overlapped atoms and bonds
//! assert_eq!(find_overlaps(&atoms, 0.1), vec![4]);
//! let bonds = connect_within(&atoms, 1.6, |_, _| false);
//! assert!(bonds.contains(&(0, 1)));
//!
//! // Convex hull surface and its connected pieces
//! let hull = ConvexHullBuilder::new().build(&atoms).unwrap();
//! let centers = blob_centers(&hull.mesh, None).unwrap();
//! assert_eq!(centers.len(), 1);
//! ```
//!
//! # Features
//!
//! - `spatial-index` (default): KD-tree backed [`PointIndex`]; without it
//!   queries fall back to a linear scan
//! - `serde`: serialization for configuration and value types

// Modules
pub mod error;
pub mod config;
pub mod point;
pub mod spatial;
pub mod proximity;
pub mod mesh;
pub mod hull;
pub mod components;

// Re-export core types for convenience
pub use error::{GeometryError, Result};
pub use config::{ProximityConfig, ProximityConfigBuilder};
pub use point::{Point, PointSet};
pub use spatial::{closest_pair, closest_pair_within, ClosestPair, PointIndex};
pub use proximity::{
    closest_between, connect_within, connect_within_distance, find_overlaps, ClosestReport,
    ProximityOps,
};
pub use mesh::{mean_color, Mesh, MeshBuffers, MeshColor};
pub use hull::{ConvexHullBuilder, HullSurface};
pub use components::{blob_centers, centroid, components, Component};

// Re-export glam::DVec3 for convenience
pub use glam::DVec3;
