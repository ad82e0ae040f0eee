//! Voxel grid and intensity volume buffers.

use fftindex_core::{Error, GridGeometry, Result};
use num_complex::Complex64;

/// Cubic complex grid holding the gridded reciprocal-space points.
#[derive(Debug, Clone)]
pub struct VoxelGrid {
    geometry: GridGeometry,
    data: Vec<Complex64>,
}

impl VoxelGrid {
    /// Allocates a zeroed grid for the given geometry.
    #[must_use]
    pub fn zeros(geometry: GridGeometry) -> Self {
        Self {
            data: vec![Complex64::default(); geometry.len()],
            geometry,
        }
    }

    /// Wraps an existing buffer.
    ///
    /// # Errors
    /// Returns [`Error::GridMismatch`] if the buffer is not `N³` long.
    pub fn from_data(geometry: GridGeometry, data: Vec<Complex64>) -> Result<Self> {
        if data.len() != geometry.len() {
            return Err(Error::GridMismatch {
                expected: geometry.len(),
                found: data.len(),
            });
        }
        Ok(Self { geometry, data })
    }

    /// Grid geometry.
    #[must_use]
    pub fn geometry(&self) -> &GridGeometry {
        &self.geometry
    }

    /// Grid side length.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.geometry.n_points()
    }

    /// Value at voxel coordinates.
    #[must_use]
    pub fn get(&self, coord: [usize; 3]) -> Complex64 {
        self.data[self.geometry.flat_index(coord)]
    }

    /// Raw values in storage order.
    #[must_use]
    pub fn as_slice(&self) -> &[Complex64] {
        &self.data
    }

    /// Count of voxels with a non-zero value.
    #[must_use]
    pub fn count_nonzero(&self) -> usize {
        self.data.iter().filter(|c| c.re != 0.0 || c.im != 0.0).count()
    }

    pub(crate) fn set(&mut self, index: usize, value: Complex64) {
        self.data[index] = value;
    }

    pub(crate) fn into_data(self) -> Vec<Complex64> {
        self.data
    }
}

/// Real-valued intensity on the transformed grid.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityVolume {
    n_points: usize,
    values: Vec<f64>,
}

impl IntensityVolume {
    /// Wraps `N³` intensity values stored with the last axis contiguous.
    ///
    /// # Errors
    /// Returns [`Error::GridMismatch`] if the buffer is not `N³` long.
    pub fn from_values(n_points: usize, values: Vec<f64>) -> Result<Self> {
        let expected = n_points
            .checked_mul(n_points)
            .and_then(|sq| sq.checked_mul(n_points))
            .ok_or(Error::GridTooLarge { n_points })?;
        if values.len() != expected || n_points == 0 {
            return Err(Error::GridMismatch {
                expected,
                found: values.len(),
            });
        }
        Ok(Self { n_points, values })
    }

    /// Grid side length.
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.n_points
    }

    /// Intensity values in storage order.
    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of voxels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// True if the volume holds no voxels.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
