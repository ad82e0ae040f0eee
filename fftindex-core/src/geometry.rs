//! Voxel grid geometry shared by the mapper and the vector generator.

use crate::error::{Error, Result};
use crate::lattice::ReciprocalVector;
use nalgebra::Vector3;

/// Geometry of a cubic reciprocal-space grid.
///
/// Reciprocal spacing is `rlgrid = 2 / (d_min * N)`. The physical origin sits
/// on voxel `N/2` of every axis, and voxels are stored with the last axis
/// contiguous (`z + N*y + N*N*x`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridGeometry {
    d_min: f64,
    n_points: usize,
    half: i64,
    rlgrid: f64,
    inv_rlgrid: f64,
}

impl GridGeometry {
    /// Creates the geometry for a resolution limit and grid side length.
    ///
    /// # Errors
    /// Returns an error if `d_min` is not positive or `n_points < 2`.
    pub fn new(d_min: f64, n_points: usize) -> Result<Self> {
        if !(d_min.is_finite() && d_min > 0.0) {
            return Err(Error::ConfigError(format!(
                "d_min must be positive and finite, got {d_min}"
            )));
        }
        if n_points < 2 {
            return Err(Error::ConfigError(format!(
                "n_points must be at least 2, got {n_points}"
            )));
        }
        let half = i64::try_from(n_points / 2).map_err(|_| Error::GridTooLarge { n_points })?;
        #[allow(clippy::cast_precision_loss)]
        let rlgrid = 2.0 / (d_min * n_points as f64);
        Ok(Self {
            d_min,
            n_points,
            half,
            rlgrid,
            inv_rlgrid: 1.0 / rlgrid,
        })
    }

    /// Resolution limit the grid was sized for (Å).
    #[must_use]
    pub fn d_min(&self) -> f64 {
        self.d_min
    }

    /// Grid side length.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Reciprocal-space spacing between voxels (Å⁻¹).
    #[must_use]
    pub fn rlgrid(&self) -> f64 {
        self.rlgrid
    }

    /// Real-space edge length of the transformed grid (Å), `N * d_min / 2`.
    #[must_use]
    pub fn fft_cell_length(&self) -> f64 {
        self.inv_rlgrid
    }

    /// Total number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n_points * self.n_points * self.n_points
    }

    /// Always false; a valid geometry has at least 8 voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Voxel coordinates of a reciprocal vector, or `None` if any axis
    /// falls outside `[0, N)`.
    #[must_use]
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    pub fn voxel_coord(&self, v: &ReciprocalVector) -> Option<[usize; 3]> {
        let upper = self.n_points as f64;
        let mut coord = [0usize; 3];
        for (axis, slot) in coord.iter_mut().enumerate() {
            // range check in f64 so huge or NaN components never reach the cast
            let c = (v[axis] * self.inv_rlgrid).round() + self.half as f64;
            if !(0.0..upper).contains(&c) {
                return None;
            }
            *slot = c as usize;
        }
        Some(coord)
    }

    /// Flat buffer index of a voxel.
    #[must_use]
    pub fn flat_index(&self, coord: [usize; 3]) -> usize {
        let n = self.n_points;
        coord[2] + n * coord[1] + n * n * coord[0]
    }

    /// Voxel coordinates of a flat buffer index.
    #[must_use]
    pub fn unflatten(&self, index: usize) -> [usize; 3] {
        let n = self.n_points;
        [index / (n * n), (index / n) % n, index % n]
    }

    /// Real-space vector (Å) for a fractional peak position on the
    /// transformed grid.
    ///
    /// Fractions at or above 0.5 wrap to the negative half, then scale by
    /// the real-space cell length `1 / rlgrid`.
    #[must_use]
    pub fn real_space_vector(&self, centroid_frac: &Vector3<f64>) -> Vector3<f64> {
        centroid_frac.map(|c| if c >= 0.5 { c - 1.0 } else { c }) * self.inv_rlgrid
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_rlgrid_and_cell_length() {
        let geometry = GridGeometry::new(2.0, 256).unwrap();
        assert_abs_diff_eq!(geometry.rlgrid(), 1.0 / 256.0, epsilon = 1e-15);
        assert_abs_diff_eq!(geometry.fft_cell_length(), 256.0, epsilon = 1e-9);
        assert_eq!(geometry.len(), 256 * 256 * 256);
    }

    #[test]
    fn test_origin_maps_to_centre() {
        let geometry = GridGeometry::new(2.0, 64).unwrap();
        let coord = geometry.voxel_coord(&Vector3::zeros()).unwrap();
        assert_eq!(coord, [32, 32, 32]);
    }

    #[test]
    fn test_out_of_bounds_excluded() {
        let geometry = GridGeometry::new(2.0, 16).unwrap();
        // rlgrid = 1/16; 8 voxels above centre lands on index 16
        let v = Vector3::new(0.5, 0.0, 0.0);
        assert!(geometry.voxel_coord(&v).is_none());
        // the negative edge is still in range
        let v = Vector3::new(-0.5, 0.0, 0.0);
        assert_eq!(geometry.voxel_coord(&v), Some([0, 8, 8]));
    }

    #[test]
    fn test_extreme_components_excluded() {
        let geometry = GridGeometry::new(2.0, 16).unwrap();
        for x in [1e300, -1e300, f64::MAX, f64::INFINITY, f64::NAN] {
            assert!(geometry.voxel_coord(&Vector3::new(x, 0.0, 0.0)).is_none());
            assert!(geometry.voxel_coord(&Vector3::new(0.0, 0.0, x)).is_none());
        }
        // last in-range voxel on the negative side of the edge
        let v = Vector3::new(7.0 / 16.0, 0.0, 0.0);
        assert_eq!(geometry.voxel_coord(&v), Some([15, 8, 8]));
    }

    #[test]
    fn test_flat_index_roundtrip() {
        let geometry = GridGeometry::new(1.5, 10).unwrap();
        let coord = [3, 7, 9];
        let index = geometry.flat_index(coord);
        assert_eq!(index, 9 + 10 * 7 + 100 * 3);
        assert_eq!(geometry.unflatten(index), coord);
    }

    #[test]
    fn test_real_space_vector_wraps_upper_half() {
        let geometry = GridGeometry::new(2.0, 100).unwrap();
        // one cell is 100 Å
        let v = geometry.real_space_vector(&Vector3::new(0.1, 0.9, 0.5));
        assert_abs_diff_eq!(v.x, 10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v.y, -10.0, epsilon = 1e-9);
        assert_abs_diff_eq!(v.z, -50.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_geometry() {
        assert!(GridGeometry::new(0.0, 256).is_err());
        assert!(GridGeometry::new(2.0, 1).is_err());
    }
}
