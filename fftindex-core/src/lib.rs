//! fftindex-core: Core types for FFT-based lattice vector search.
//!
//! This crate provides the configuration, grid geometry, peak and
//! candidate vector types shared by the indexing pipeline stages.
//!

pub mod config;
pub mod error;
pub mod geometry;
pub mod lattice;
pub mod peak;

pub use config::{default_b_iso, IndexingConfig};
pub use error::{Error, Result, Stage};
pub use geometry::GridGeometry;
pub use lattice::{CandidateVector, ReciprocalVector};
pub use peak::Peak;
