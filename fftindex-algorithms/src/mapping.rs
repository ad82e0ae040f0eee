//! Reciprocal-space grid mapping.
//!
//! Bins reciprocal vectors onto the cubic voxel grid, skipping spots beyond
//! the resolution limit or outside the grid and weighting the rest by an
//! isotropic B-factor fall-off.

use crate::grid::VoxelGrid;
use fftindex_core::{Error, GridGeometry, ReciprocalVector, Result, Stage};
use num_complex::Complex64;

/// Output of [`map_to_grid`].
#[derive(Debug, Clone)]
pub struct GridMapping {
    /// Populated voxel grid.
    pub grid: VoxelGrid,
    /// One flag per input vector; true if it was written to the grid,
    /// even when a later vector overwrote the same voxel.
    pub used: Vec<bool>,
    /// Number of distinct voxels that went from empty to populated.
    pub voxels_populated: usize,
}

impl GridMapping {
    /// Number of input vectors written to the grid.
    #[must_use]
    pub fn points_used(&self) -> usize {
        self.used.iter().filter(|&&used| used).count()
    }
}

/// Maps reciprocal vectors onto a fresh voxel grid.
///
/// Each accepted vector sets its voxel to `(T, 0)` with
/// `T = exp(-b_iso * |v|² / 4)`, or `T = 1` when `b_iso` is zero.
/// When two vectors land in the same voxel the later one overwrites the
/// earlier; weights are never summed.
///
/// # Errors
/// Returns [`Error::NonFinite`] with the offending input index for vectors
/// with NaN/infinite components, zero length, or a non-finite weight.
pub fn map_to_grid(
    vectors: &[ReciprocalVector],
    geometry: GridGeometry,
    b_iso: f64,
) -> Result<GridMapping> {
    let d_min = geometry.d_min();
    let mut grid = VoxelGrid::zeros(geometry);
    let mut used = vec![false; vectors.len()];
    let mut voxels_populated = 0usize;

    for (i, v) in vectors.iter().enumerate() {
        if !v.iter().all(|c| c.is_finite()) {
            return Err(Error::NonFinite {
                stage: Stage::Mapping,
                index: i,
            });
        }
        let length_sq = v.norm_squared();
        if length_sq == 0.0 {
            return Err(Error::NonFinite {
                stage: Stage::Mapping,
                index: i,
            });
        }
        let length = length_sq.sqrt();
        let d_spacing = 1.0 / length;
        if d_spacing < d_min {
            continue;
        }
        let Some(coord) = geometry.voxel_coord(v) else {
            continue;
        };
        let weight = if b_iso == 0.0 {
            1.0
        } else {
            (-b_iso * length_sq / 4.0).exp()
        };
        if !weight.is_finite() {
            return Err(Error::NonFinite {
                stage: Stage::Mapping,
                index: i,
            });
        }

        let index = geometry.flat_index(coord);
        if grid.as_slice()[index].re == 0.0 {
            voxels_populated += 1;
        }
        grid.set(index, Complex64::new(weight, 0.0));
        used[i] = true;
    }

    log::debug!(
        "gridded {} of {} reciprocal vectors into {} voxels",
        used.iter().filter(|&&u| u).count(),
        vectors.len(),
        voxels_populated
    );

    Ok(GridMapping {
        grid,
        used,
        voxels_populated,
    })
}
