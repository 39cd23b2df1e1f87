//! Error types for geometry operations

use thiserror::Error;

/// Errors raised by the geometry core
///
/// "Nothing found" outcomes (no pair in range, no overlaps) are not errors;
/// they come back as `None`, empty vectors or [`crate::ClosestReport::NotFound`].
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Too few points, or points that span less than three dimensions
    #[error("degenerate input: {0}")]
    DegenerateInput(String),

    /// Paired inputs have different lengths
    #[error("{what} length mismatch: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Which input was mismatched
        what: &'static str,
        /// Length the operation required
        expected: usize,
        /// Length actually supplied
        actual: usize,
    },

    /// Operation needs at least one point
    #[error("empty input: {0}")]
    EmptyInput(&'static str),

    /// A triangle refers to a vertex that does not exist
    #[error("triangle {triangle} uses vertex {index} (mesh has {vertex_count} vertices)")]
    InvalidTriangle {
        /// Triangle position in the triangle list
        triangle: usize,
        /// Offending vertex index
        index: u32,
        /// Number of vertices in the mesh
        vertex_count: usize,
    },

    /// A triangle index past the end of the mesh triangle list
    #[error("triangle {triangle} out of range (mesh has {triangle_count} triangles)")]
    TriangleOutOfRange {
        /// Offending triangle index
        triangle: usize,
        /// Number of triangles in the mesh
        triangle_count: usize,
    },

    /// Configuration validation failed
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type alias for geometry operations
pub type Result<T> = std::result::Result<T, GeometryError>;
