//! Spatial-subsystem error type.

use thiserror::Error;

use ev_core::IntersectionId;

/// Errors produced by `ev-spatial`.
#[derive(Debug, Error)]
pub enum SpatialError {
    #[error("no route from {from} to {to}")]
    NoRoute { from: IntersectionId, to: IntersectionId },

    #[error("intersection {0} not found in road graph")]
    IntersectionNotFound(IntersectionId),

    #[error("road graph has no intersections")]
    EmptyGraph,

    #[error("road graph parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type SpatialResult<T> = Result<T, SpatialError>;
