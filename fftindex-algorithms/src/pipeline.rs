//! End-to-end candidate vector search.

use crate::filter::filter_peaks;
use crate::flood_fill::{flood_fill, IntensityStatistics};
use crate::mapping::map_to_grid;
use crate::transform::fft3d;
use crate::vectors::peaks_to_vectors;
use fftindex_core::{CandidateVector, GridGeometry, IndexingConfig, ReciprocalVector, Result};
use std::time::{Duration, Instant};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Number of candidates needed to build a trial cell.
pub const MIN_TRIAL_CELL_VECTORS: usize = 3;

/// Wall-clock time spent in each stage.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct StageTimings {
    /// Gridding reciprocal vectors.
    pub mapping: Duration,
    /// 3D transform and squaring.
    pub transform: Duration,
    /// Statistics, flood fill and volume filter.
    pub peak_search: Duration,
    /// Centroid to vector conversion and ranking.
    pub vectors: Duration,
}

impl StageTimings {
    /// Sum over all stages.
    #[must_use]
    pub fn total(&self) -> Duration {
        self.mapping + self.transform + self.peak_search + self.vectors
    }
}

/// Candidates plus the diagnostics gathered on the way.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct IndexingReport {
    /// Candidate vectors, strongest peak first.
    pub candidates: Vec<CandidateVector>,
    /// Per input vector: true if it was written to the grid.
    pub used_in_indexing: Vec<bool>,
    /// Number of input vectors written to the grid.
    pub points_used: usize,
    /// Number of distinct grid voxels populated.
    pub voxels_populated: usize,
    /// Peaks found by the flood fill.
    pub peaks_found: usize,
    /// Peaks surviving the volume filter.
    pub peaks_kept: usize,
    /// B-factor applied during gridding.
    pub b_iso: f64,
    /// Intensity statistics; `None` when nothing was gridded.
    pub statistics: Option<IntensityStatistics>,
    /// Per-stage timings.
    pub timings: StageTimings,
}

impl IndexingReport {
    /// True when no candidate vectors were found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    /// True when there are enough candidates to try a trial cell.
    #[must_use]
    pub fn has_trial_cell(&self) -> bool {
        self.candidates.len() >= MIN_TRIAL_CELL_VECTORS
    }
}

/// Runs grid mapping, transform, peak search and vector generation.
#[derive(Debug, Clone)]
pub struct Indexer {
    config: IndexingConfig,
    geometry: GridGeometry,
}

impl Indexer {
    /// Validates the configuration and prepares the grid geometry.
    ///
    /// # Errors
    /// Returns the validation error before anything is allocated.
    pub fn new(config: IndexingConfig) -> Result<Self> {
        config.validate()?;
        let geometry = GridGeometry::new(config.d_min, config.n_points)?;
        if !config.n_points.is_power_of_two() {
            log::warn!(
                "n_points = {} is not a power of two; the transform will be slower",
                config.n_points
            );
        }
        Ok(Self { config, geometry })
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &IndexingConfig {
        &self.config
    }

    /// Grid geometry derived from the configuration.
    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Searches for candidate lattice vectors.
    ///
    /// An input with nothing inside the resolution limit and grid yields an
    /// empty report rather than an error.
    ///
    /// # Errors
    /// Returns [`fftindex_core::Error::NonFinite`] for degenerate inputs or
    /// non-finite intermediate values, and
    /// [`fftindex_core::Error::ThreadPool`] if the transform pool fails.
    pub fn run(&self, vectors: &[ReciprocalVector]) -> Result<IndexingReport> {
        let config = &self.config;
        let b_iso = config.effective_b_iso();
        let mut timings = StageTimings::default();

        let start = Instant::now();
        let mapping = map_to_grid(vectors, self.geometry, b_iso)?;
        timings.mapping = start.elapsed();
        let points_used = mapping.points_used();
        let voxels_populated = mapping.voxels_populated;
        log::info!(
            "gridded {points_used} of {} reciprocal vectors (b_iso = {b_iso:.3})",
            vectors.len()
        );

        let mut report = IndexingReport {
            used_in_indexing: mapping.used,
            points_used,
            voxels_populated,
            b_iso,
            ..IndexingReport::default()
        };

        if voxels_populated == 0 {
            // All-zero grid transforms to all-zero intensity: nothing to find.
            report.timings = timings;
            log::info!("no reciprocal vectors gridded; no candidates found");
            return Ok(report);
        }

        let start = Instant::now();
        let volume = fft3d(mapping.grid, config.threads)?;
        timings.transform = start.elapsed();

        let start = Instant::now();
        let search = flood_fill(&volume, config.rmsd_cutoff)?;
        drop(volume);
        let kept = filter_peaks(&search.peaks, config.peak_volume_cutoff);
        timings.peak_search = start.elapsed();

        let start = Instant::now();
        let candidates = peaks_to_vectors(&kept, &self.geometry, config.min_cell, config.max_cell);
        timings.vectors = start.elapsed();

        log::debug!(
            "timings: map {:?}, transform {:?}, peaks {:?}, vectors {:?}",
            timings.mapping,
            timings.transform,
            timings.peak_search,
            timings.vectors
        );
        log::info!(
            "{} peaks found, {} kept, {} candidate vectors",
            search.peaks.len(),
            kept.len(),
            candidates.len()
        );
        if candidates.len() < MIN_TRIAL_CELL_VECTORS {
            log::warn!(
                "only {} candidate vectors; insufficient to form a trial cell",
                candidates.len()
            );
        }

        report.peaks_found = search.peaks.len();
        report.peaks_kept = kept.len();
        report.statistics = Some(search.statistics);
        report.candidates = candidates;
        report.timings = timings;
        Ok(report)
    }
}

/// Validates `config` and runs the full search once.
///
/// # Errors
/// See [`Indexer::new`] and [`Indexer::run`].
pub fn index_reciprocal_vectors(
    vectors: &[ReciprocalVector],
    config: IndexingConfig,
) -> Result<IndexingReport> {
    Indexer::new(config)?.run(vectors)
}
