//! Indexing configuration.

use crate::error::{Error, Result};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Default FFT grid side length.
pub const DEFAULT_N_POINTS: usize = 256;
/// Default minimum cell length (Å).
pub const DEFAULT_MIN_CELL: f64 = 3.0;
/// Default peak threshold in standard deviations above the mean.
pub const DEFAULT_RMSD_CUTOFF: f64 = 15.0;
/// Default fraction of the largest peak volume a peak must reach.
pub const DEFAULT_PEAK_VOLUME_CUTOFF: f64 = 0.15;

/// Isotropic B-factor that damps spots at `d_min` to 5% of full weight.
#[must_use]
pub fn default_b_iso(d_min: f64) -> f64 {
    -4.0 * d_min * d_min * 0.05_f64.ln()
}

/// Configuration for the reciprocal grid search.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct IndexingConfig {
    /// Resolution limit (Å). Spots with d-spacing below this are not gridded.
    pub d_min: f64,
    /// Isotropic B-factor weight. `None` derives it from `d_min`, `Some(0.0)` disables weighting.
    pub b_iso: Option<f64>,
    /// Grid side length. Powers of two transform fastest.
    pub n_points: usize,
    /// Shortest candidate vector to keep (Å).
    pub min_cell: f64,
    /// Longest candidate vector to keep (Å).
    pub max_cell: f64,
    /// Peak threshold in standard deviations above the mean intensity.
    pub rmsd_cutoff: f64,
    /// Fraction of the largest peak volume below which peaks are dropped.
    pub peak_volume_cutoff: f64,
    /// Worker threads for the transform. `None` uses available parallelism.
    pub threads: Option<usize>,
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            d_min: 2.0,
            b_iso: None,
            n_points: DEFAULT_N_POINTS,
            min_cell: DEFAULT_MIN_CELL,
            max_cell: 100.0,
            rmsd_cutoff: DEFAULT_RMSD_CUTOFF,
            peak_volume_cutoff: DEFAULT_PEAK_VOLUME_CUTOFF,
            threads: None,
        }
    }
}

impl IndexingConfig {
    /// Creates a configuration for the given resolution limit and maximum cell.
    #[must_use]
    pub fn new(d_min: f64, max_cell: f64) -> Self {
        Self {
            d_min,
            max_cell,
            ..Self::default()
        }
    }

    /// Set the resolution limit.
    #[must_use]
    pub fn with_d_min(mut self, d_min: f64) -> Self {
        self.d_min = d_min;
        self
    }

    /// Set an explicit B-factor (`0.0` disables weighting).
    #[must_use]
    pub fn with_b_iso(mut self, b_iso: f64) -> Self {
        self.b_iso = Some(b_iso);
        self
    }

    /// Set the grid side length.
    #[must_use]
    pub fn with_n_points(mut self, n_points: usize) -> Self {
        self.n_points = n_points;
        self
    }

    /// Set the minimum cell length.
    #[must_use]
    pub fn with_min_cell(mut self, min_cell: f64) -> Self {
        self.min_cell = min_cell;
        self
    }

    /// Set the maximum cell length.
    #[must_use]
    pub fn with_max_cell(mut self, max_cell: f64) -> Self {
        self.max_cell = max_cell;
        self
    }

    /// Set the peak threshold multiplier.
    #[must_use]
    pub fn with_rmsd_cutoff(mut self, cutoff: f64) -> Self {
        self.rmsd_cutoff = cutoff;
        self
    }

    /// Set the relative peak volume cutoff.
    #[must_use]
    pub fn with_peak_volume_cutoff(mut self, cutoff: f64) -> Self {
        self.peak_volume_cutoff = cutoff;
        self
    }

    /// Set the transform worker thread count.
    #[must_use]
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    /// B-factor actually applied when gridding.
    #[must_use]
    pub fn effective_b_iso(&self) -> f64 {
        self.b_iso.unwrap_or_else(|| default_b_iso(self.d_min))
    }

    /// Total number of voxels in the grid, if it fits in `usize`.
    #[must_use]
    pub fn voxel_count(&self) -> Option<usize> {
        self.n_points
            .checked_mul(self.n_points)
            .and_then(|sq| sq.checked_mul(self.n_points))
    }

    /// Checks every parameter before any buffer is allocated.
    ///
    /// # Errors
    /// Returns [`Error::ConfigError`] for out-of-domain parameters and
    /// [`Error::GridTooLarge`] when `n_points³` overflows.
    pub fn validate(&self) -> Result<()> {
        if self.n_points < 2 {
            return Err(Error::ConfigError(format!(
                "n_points must be at least 2, got {}",
                self.n_points
            )));
        }
        // Complex grid plus transpose buffer, 16 bytes per element each.
        if self
            .voxel_count()
            .and_then(|n| n.checked_mul(32))
            .is_none()
        {
            return Err(Error::GridTooLarge {
                n_points: self.n_points,
            });
        }
        if !(self.d_min.is_finite() && self.d_min > 0.0) {
            return Err(Error::ConfigError(format!(
                "d_min must be positive and finite, got {}",
                self.d_min
            )));
        }
        if let Some(b_iso) = self.b_iso {
            if !b_iso.is_finite() {
                return Err(Error::ConfigError(format!("b_iso must be finite, got {b_iso}")));
            }
        }
        if !(self.min_cell.is_finite() && self.min_cell > 0.0) {
            return Err(Error::ConfigError(format!(
                "min_cell must be positive and finite, got {}",
                self.min_cell
            )));
        }
        if !(self.max_cell.is_finite() && self.max_cell > 0.0) {
            return Err(Error::ConfigError(format!(
                "max_cell must be positive and finite, got {}",
                self.max_cell
            )));
        }
        if self.min_cell > self.max_cell {
            return Err(Error::ConfigError(format!(
                "min_cell ({}) exceeds max_cell ({})",
                self.min_cell, self.max_cell
            )));
        }
        if !(self.rmsd_cutoff.is_finite() && self.rmsd_cutoff >= 0.0) {
            return Err(Error::ConfigError(format!(
                "rmsd_cutoff must be non-negative and finite, got {}",
                self.rmsd_cutoff
            )));
        }
        if !(0.0..=1.0).contains(&self.peak_volume_cutoff) {
            return Err(Error::ConfigError(format!(
                "peak_volume_cutoff must be in [0, 1], got {}",
                self.peak_volume_cutoff
            )));
        }
        if self.threads == Some(0) {
            return Err(Error::ConfigError("threads must be at least 1".to_string()));
        }
        Ok(())
    }
}
