//! Relative peak-volume filter.

use fftindex_core::Peak;

/// Keeps peaks whose voxel count reaches `cutoff` times the largest count.
///
/// Order is preserved. A cutoff of zero keeps every peak.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn filter_peaks(peaks: &[Peak], cutoff: f64) -> Vec<Peak> {
    let Some(max_count) = peaks.iter().map(|p| p.voxel_count).max() else {
        return Vec::new();
    };
    let min_count = cutoff * max_count as f64;
    peaks
        .iter()
        .filter(|p| p.voxel_count as f64 >= min_count)
        .copied()
        .collect()
}
