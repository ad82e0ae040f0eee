//! Error types for fftindex-core.

use std::fmt;
use thiserror::Error;

/// Result type alias for fftindex operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Pipeline stage that produced a non-finite value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Mapping reciprocal vectors onto the voxel grid.
    Mapping,
    /// Forward 3D transform and intensity reduction.
    Transform,
    /// Intensity statistics and flood fill.
    PeakSearch,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Mapping => "grid mapping",
            Stage::Transform => "transform",
            Stage::PeakSearch => "peak search",
        };
        f.write_str(name)
    }
}

/// Core error types for fftindex operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error.
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// A NaN or infinite value was produced from the given input.
    ///
    /// `index` is the input vector index for [`Stage::Mapping`] and the
    /// flat voxel index otherwise.
    #[error("non-finite value during {stage} at index {index}")]
    NonFinite { stage: Stage, index: usize },

    /// Grid side length whose cube does not fit in memory addressing.
    #[error("grid of {n_points}^3 voxels is too large")]
    GridTooLarge { n_points: usize },

    /// Grid buffer does not match the expected geometry.
    #[error("grid length mismatch: expected {expected} voxels, found {found}")]
    GridMismatch { expected: usize, found: usize },

    /// Worker thread pool could not be created.
    #[error("thread pool error: {0}")]
    ThreadPool(String),
}
