//! Peaks found in the transformed intensity volume.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A connected region of above-threshold voxels.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Peak {
    /// Number of voxels in the region (at least 1).
    pub voxel_count: usize,
    /// Intensity-weighted centroid as a fraction of the grid, each axis in `[0, 1)`.
    pub centroid_frac: Vector3<f64>,
}

impl Peak {
    /// Creates a new peak.
    #[must_use]
    pub fn new(voxel_count: usize, centroid_frac: Vector3<f64>) -> Self {
        Self {
            voxel_count,
            centroid_frac,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(feature = "serde")]
    #[test]
    fn test_peak_serde_roundtrip() {
        let peak = Peak::new(42, Vector3::new(0.125, 0.5, 0.875));
        let json = serde_json::to_string(&peak).unwrap();
        let back: Peak = serde_json::from_str(&json).unwrap();
        assert_eq!(back, peak);
    }

    #[test]
    fn test_peak_new() {
        let peak = Peak::new(3, Vector3::new(0.25, 0.0, 0.75));
        assert_eq!(peak.voxel_count, 3);
        assert_eq!(peak.centroid_frac, Vector3::new(0.25, 0.0, 0.75));
    }
}
