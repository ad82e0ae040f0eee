//! Flood-fill peak search on the periodic intensity volume.
//!
//! Voxels above `mean + rmsd_cutoff * rmsd` are grouped into 6-connected
//! regions. Adjacency wraps on every axis, so a region crossing index
//! `N-1 -> 0` is one peak. While filling, each voxel carries the unwrapped
//! integer position reached from the seed; centroids are taken over those
//! positions and only then folded back into `[0, 1)`.

use crate::grid::IntensityVolume;
use fftindex_core::{Error, Peak, Result, Stage};
use nalgebra::Vector3;
use rayon::prelude::*;

// Fixed reduction blocks keep the statistics bit-identical across thread counts.
const STATS_BLOCK: usize = 1 << 16;

const NEIGHBOUR_STEPS: [(usize, i64); 6] = [(0, -1), (0, 1), (1, -1), (1, 1), (2, -1), (2, 1)];

/// Mean, standard deviation and derived threshold of an intensity volume.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IntensityStatistics {
    /// Mean intensity over all voxels.
    pub mean: f64,
    /// Population standard deviation over all voxels.
    pub rmsd: f64,
    /// Voxels strictly above this value belong to peaks.
    pub threshold: f64,
}

impl IntensityStatistics {
    /// Computes the statistics and `threshold = mean + rmsd_cutoff * rmsd`.
    ///
    /// # Errors
    /// Returns [`Error::NonFinite`] if the volume holds NaN/infinite values
    /// or the sums overflow.
    #[allow(clippy::cast_precision_loss)]
    pub fn compute(volume: &IntensityVolume, rmsd_cutoff: f64) -> Result<Self> {
        let values = volume.values();
        if let Some(index) = values.par_iter().position_first(|v| !v.is_finite()) {
            return Err(Error::NonFinite {
                stage: Stage::PeakSearch,
                index,
            });
        }
        let count = values.len() as f64;
        let mean = block_sum(values, |v| v) / count;
        let variance = block_sum(values, |v| (v - mean) * (v - mean)) / count;
        let rmsd = variance.sqrt();
        let threshold = mean + rmsd_cutoff * rmsd;
        if !threshold.is_finite() {
            return Err(Error::NonFinite {
                stage: Stage::PeakSearch,
                index: 0,
            });
        }
        Ok(Self {
            mean,
            rmsd,
            threshold,
        })
    }
}

fn block_sum<F>(values: &[f64], f: F) -> f64
where
    F: Fn(f64) -> f64 + Sync,
{
    let partials: Vec<f64> = values
        .par_chunks(STATS_BLOCK)
        .map(|block| block.iter().map(|&v| f(v)).sum::<f64>())
        .collect();
    partials.iter().sum()
}

/// Reusable buffers for [`flood_fill`].
#[derive(Debug, Default)]
pub struct FloodFillState {
    visited: Vec<bool>,
    stack: Vec<(usize, [i64; 3])>,
}

impl FloodFillState {
    /// Creates empty buffers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn reset(&mut self, len: usize) {
        self.visited.clear();
        self.visited.resize(len, false);
        self.stack.clear();
    }
}

/// Result of a flood-fill peak search.
#[derive(Debug, Clone, PartialEq)]
pub struct PeakSearch {
    /// Peaks in discovery order (ascending flat index of each seed voxel).
    pub peaks: Vec<Peak>,
    /// Statistics used to threshold the volume.
    pub statistics: IntensityStatistics,
}

/// Finds peaks in the volume.
///
/// Centroids are weighted by `intensity - threshold`, which is strictly
/// positive for every member voxel. An empty result is not an error.
///
/// # Errors
/// Returns [`Error::NonFinite`] if the volume statistics are not finite.
pub fn flood_fill(volume: &IntensityVolume, rmsd_cutoff: f64) -> Result<PeakSearch> {
    let mut state = FloodFillState::new();
    flood_fill_with_state(volume, rmsd_cutoff, &mut state)
}

/// [`flood_fill`] reusing caller-owned buffers.
///
/// # Errors
/// Returns [`Error::NonFinite`] if the volume statistics are not finite.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_possible_wrap,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
pub fn flood_fill_with_state(
    volume: &IntensityVolume,
    rmsd_cutoff: f64,
    state: &mut FloodFillState,
) -> Result<PeakSearch> {
    let statistics = IntensityStatistics::compute(volume, rmsd_cutoff)?;
    let threshold = statistics.threshold;
    let values = volume.values();
    let n = volume.n_points();
    let n_i = n as i64;
    let index_of = |pos: [i64; 3]| -> usize {
        let x = pos[0].rem_euclid(n_i) as usize;
        let y = pos[1].rem_euclid(n_i) as usize;
        let z = pos[2].rem_euclid(n_i) as usize;
        z + n * y + n * n * x
    };

    state.reset(values.len());
    let mut peaks = Vec::new();

    for seed in 0..values.len() {
        if state.visited[seed] || values[seed] <= threshold {
            continue;
        }
        let seed_pos = [
            (seed / (n * n)) as i64,
            ((seed / n) % n) as i64,
            (seed % n) as i64,
        ];
        state.visited[seed] = true;
        state.stack.push((seed, seed_pos));

        let mut voxel_count = 0usize;
        let mut weight_sum = 0.0;
        let mut weighted = Vector3::<f64>::zeros();

        while let Some((index, pos)) = state.stack.pop() {
            let weight = values[index] - threshold;
            voxel_count += 1;
            weight_sum += weight;
            weighted += Vector3::new(pos[0] as f64, pos[1] as f64, pos[2] as f64) * weight;

            for &(axis, step) in &NEIGHBOUR_STEPS {
                let mut next = pos;
                next[axis] += step;
                let next_index = index_of(next);
                if !state.visited[next_index] && values[next_index] > threshold {
                    state.visited[next_index] = true;
                    state.stack.push((next_index, next));
                }
            }
        }

        let centroid = (weighted / weight_sum / n as f64).map(wrap_unit);
        peaks.push(Peak::new(voxel_count, centroid));
    }

    log::debug!(
        "flood fill: mean {:.4e}, rmsd {:.4e}, threshold {:.4e}, {} peaks",
        statistics.mean,
        statistics.rmsd,
        threshold,
        peaks.len()
    );

    Ok(PeakSearch { peaks, statistics })
}

// Folds into [0, 1); rem_euclid can round tiny negatives up to exactly 1.0.
fn wrap_unit(value: f64) -> f64 {
    let wrapped = value.rem_euclid(1.0);
    if wrapped >= 1.0 {
        0.0
    } else {
        wrapped
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::cast_precision_loss)]
    use super::*;
    use approx::assert_abs_diff_eq;

    fn volume_with(n: usize, spots: &[([usize; 3], f64)]) -> IntensityVolume {
        let mut values = vec![0.0; n * n * n];
        for &(coord, value) in spots {
            values[coord[2] + n * coord[1] + n * n * coord[0]] = value;
        }
        IntensityVolume::from_values(n, values).unwrap()
    }

    #[test]
    fn test_statistics() {
        let volume = IntensityVolume::from_values(2, vec![1.0, 1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0])
            .unwrap();
        let stats = IntensityStatistics::compute(&volume, 2.0).unwrap();
        assert_abs_diff_eq!(stats.mean, 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.rmsd, 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(stats.threshold, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn test_flat_volume_has_no_peaks() {
        let volume = IntensityVolume::from_values(4, vec![0.0; 64]).unwrap();
        let search = flood_fill(&volume, 15.0).unwrap();
        assert!(search.peaks.is_empty());
    }

    #[test]
    fn test_single_voxel_peak() {
        let n = 8;
        let volume = volume_with(n, &[([2, 3, 4], 100.0)]);
        let search = flood_fill(&volume, 3.0).unwrap();

        assert_eq!(search.peaks.len(), 1);
        let peak = search.peaks[0];
        assert_eq!(peak.voxel_count, 1);
        assert_abs_diff_eq!(peak.centroid_frac.x, 2.0 / 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(peak.centroid_frac.y, 3.0 / 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(peak.centroid_frac.z, 4.0 / 8.0, epsilon = 1e-12);
    }

    #[test]
    fn test_separate_regions() {
        let n = 16;
        let volume = volume_with(
            n,
            &[
                ([4, 4, 4], 100.0),
                ([4, 4, 5], 100.0),
                ([10, 10, 10], 100.0),
                // diagonal neighbour only: not 6-connected
                ([11, 11, 11], 100.0),
            ],
        );
        let search = flood_fill(&volume, 3.0).unwrap();

        let mut counts: Vec<usize> = search.peaks.iter().map(|p| p.voxel_count).collect();
        counts.sort_unstable();
        assert_eq!(counts, vec![1, 1, 2]);
    }

    #[test]
    fn test_weighted_centroid() {
        let n = 16;
        let volume = volume_with(n, &[([5, 5, 5], 300.0), ([5, 5, 6], 100.0)]);
        let search = flood_fill(&volume, 3.0).unwrap();
        let threshold = search.statistics.threshold;

        assert_eq!(search.peaks.len(), 1);
        let w0 = 300.0 - threshold;
        let w1 = 100.0 - threshold;
        let expected_z = (5.0 * w0 + 6.0 * w1) / (w0 + w1) / 16.0;
        assert_abs_diff_eq!(search.peaks[0].centroid_frac.z, expected_z, epsilon = 1e-12);
        assert_abs_diff_eq!(search.peaks[0].centroid_frac.x, 5.0 / 16.0, epsilon = 1e-12);
    }

    #[test]
    fn test_peak_straddling_boundary() {
        let n = 16;
        // Symmetric peak centred on the 15|0 boundary of the first axis.
        let volume = volume_with(
            n,
            &[
                ([15, 8, 8], 100.0),
                ([0, 8, 8], 100.0),
                ([14, 8, 8], 60.0),
                ([1, 8, 8], 60.0),
            ],
        );
        let search = flood_fill(&volume, 3.0).unwrap();

        assert_eq!(search.peaks.len(), 1);
        let peak = search.peaks[0];
        assert_eq!(peak.voxel_count, 4);
        // Unwrapped centre is 15.5 (== -0.5), not the naive mean 7.5.
        assert_abs_diff_eq!(peak.centroid_frac.x, 15.5 / 16.0, epsilon = 1e-12);
        assert_abs_diff_eq!(peak.centroid_frac.y, 0.5, epsilon = 1e-12);
        assert!(peak.centroid_frac.iter().all(|&c| (0.0..1.0).contains(&c)));
    }

    #[test]
    fn test_peak_wrapping_every_axis() {
        let n = 8;
        let mut spots = Vec::new();
        for &x in &[7, 0] {
            for &y in &[7, 0] {
                for &z in &[7, 0] {
                    spots.push(([x, y, z], 50.0));
                }
            }
        }
        let volume = volume_with(n, &spots);
        let search = flood_fill(&volume, 3.0).unwrap();

        assert_eq!(search.peaks.len(), 1);
        assert_eq!(search.peaks[0].voxel_count, 8);
        for &c in search.peaks[0].centroid_frac.iter() {
            assert_abs_diff_eq!(c, 7.5 / 8.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_non_finite_volume() {
        let mut values = vec![0.0; 8];
        values[3] = f64::NAN;
        let volume = IntensityVolume::from_values(2, values).unwrap();
        assert!(matches!(
            flood_fill(&volume, 15.0),
            Err(Error::NonFinite {
                stage: Stage::PeakSearch,
                index: 3
            })
        ));
    }

    #[test]
    fn test_state_reuse() {
        let n = 8;
        let mut state = FloodFillState::new();
        let first = volume_with(n, &[([1, 1, 1], 100.0)]);
        let second = volume_with(n, &[([6, 6, 6], 100.0), ([2, 2, 2], 100.0)]);

        let a = flood_fill_with_state(&first, 3.0, &mut state).unwrap();
        let b = flood_fill_with_state(&second, 3.0, &mut state).unwrap();
        assert_eq!(a.peaks.len(), 1);
        assert_eq!(b.peaks.len(), 2);
    }

    #[test]
    fn test_wrap_unit() {
        assert_abs_diff_eq!(wrap_unit(1.25), 0.25);
        assert_abs_diff_eq!(wrap_unit(-0.25), 0.75);
        assert!(wrap_unit(-1e-18) < 1.0);
    }
}
