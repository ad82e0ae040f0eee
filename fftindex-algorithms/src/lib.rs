//! fftindex-algorithms: Candidate lattice vector search on a reciprocal grid.
//!
//! The pipeline stages, in order:
//! - **Mapping** - B-factor weighted reciprocal vectors on an `N³` grid
//! - **Transform** - separable 3D FFT, reduced to `Re(F)²`
//! - **Flood fill** - 6-connected, periodic peak search above `μ + kσ`
//! - **Filter** - relative peak-volume cutoff
//! - **Vectors** - real-space candidates, deduplicated and ranked
//!
//! [`Indexer`] runs all five stages.
//!
#![warn(missing_docs)]

mod filter;
mod flood_fill;
mod grid;
mod mapping;
mod pipeline;
mod transform;
pub mod vectors;

pub use filter::filter_peaks;
pub use flood_fill::{
    flood_fill, flood_fill_with_state, FloodFillState, IntensityStatistics, PeakSearch,
};
pub use grid::{IntensityVolume, VoxelGrid};
pub use mapping::{map_to_grid, GridMapping};
pub use pipeline::{
    index_reciprocal_vectors, Indexer, IndexingReport, StageTimings, MIN_TRIAL_CELL_VECTORS,
};
pub use transform::{fft3d, square_real, with_thread_pool, Fft3d};
pub use vectors::peaks_to_vectors;

// Re-export core types used in the public API
pub use fftindex_core::{
    CandidateVector, Error, GridGeometry, IndexingConfig, Peak, ReciprocalVector, Result, Stage,
};
