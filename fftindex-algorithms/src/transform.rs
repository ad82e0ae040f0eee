//! Dense 3D forward transform of the voxel grid.
//!
//! The transform is separable: 1D FFTs run over the contiguous axis, then
//! over each plane's columns, then over the slowest axis via one transposed
//! scratch buffer. Each 1D line is independent, so the result does not
//! depend on how rayon schedules the work.

use crate::grid::{IntensityVolume, VoxelGrid};
use fftindex_core::{Error, Result, Stage};
use num_complex::Complex64;
use rayon::prelude::*;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Planned forward FFT over an `N×N×N` cube.
pub struct Fft3d {
    n: usize,
    fft: Arc<dyn Fft<f64>>,
}

impl Fft3d {
    /// Plans a forward transform for side length `n`.
    #[must_use]
    pub fn new(n: usize) -> Self {
        let mut planner = FftPlanner::new();
        Self {
            n,
            fft: planner.plan_fft_forward(n),
        }
    }

    /// Side length this plan transforms.
    #[must_use]
    pub fn len(&self) -> usize {
        self.n
    }

    /// True for a zero-length plan.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// Unnormalized forward transform in place.
    ///
    /// # Errors
    /// Returns [`Error::GridMismatch`] if `data` is not `N³` long.
    pub fn forward(&self, data: &mut [Complex64]) -> Result<()> {
        let expected = self.n * self.n * self.n;
        if data.len() != expected {
            return Err(Error::GridMismatch {
                expected,
                found: data.len(),
            });
        }
        self.transform_rows(data);
        self.transform_columns(data);
        self.transform_planes(data);
        Ok(())
    }

    fn scratch(&self) -> Vec<Complex64> {
        vec![Complex64::default(); self.fft.get_inplace_scratch_len()]
    }

    // Last axis: every run of N values is one line.
    fn transform_rows(&self, data: &mut [Complex64]) {
        let nn = self.n * self.n;
        data.par_chunks_mut(nn).for_each_init(
            || self.scratch(),
            |scratch, plane| {
                self.fft.process_with_scratch(plane, scratch);
            },
        );
    }

    // Middle axis: transpose each plane so columns become rows.
    fn transform_columns(&self, data: &mut [Complex64]) {
        let n = self.n;
        data.par_chunks_mut(n * n).for_each_init(
            || (vec![Complex64::default(); n * n], self.scratch()),
            |(buffer, scratch), plane| {
                transpose_square(plane, buffer, n);
                self.fft.process_with_scratch(buffer, scratch);
                transpose_square(buffer, plane, n);
            },
        );
    }

    // Slowest axis: gather into a buffer where it is contiguous, transform,
    // scatter back. This is the one full-size temporary.
    fn transform_planes(&self, data: &mut [Complex64]) {
        let n = self.n;
        let nn = n * n;
        let mut lines = vec![Complex64::default(); data.len()];
        {
            let src: &[Complex64] = &*data;
            lines.par_chunks_mut(n).enumerate().for_each(|(p, line)| {
                for (x, slot) in line.iter_mut().enumerate() {
                    *slot = src[x * nn + p];
                }
            });
        }
        lines.par_chunks_mut(nn).for_each_init(
            || self.scratch(),
            |scratch, block| {
                self.fft.process_with_scratch(block, scratch);
            },
        );
        data.par_chunks_mut(nn).enumerate().for_each(|(x, plane)| {
            for (p, slot) in plane.iter_mut().enumerate() {
                *slot = lines[p * n + x];
            }
        });
    }
}

fn transpose_square(src: &[Complex64], dst: &mut [Complex64], n: usize) {
    for row in 0..n {
        for col in 0..n {
            dst[col * n + row] = src[row * n + col];
        }
    }
}

/// Runs `f` on a dedicated pool of `threads` workers, or on the global pool
/// (sized from available parallelism) when `threads` is `None`.
///
/// # Errors
/// Returns [`Error::ThreadPool`] if the pool cannot be built.
pub fn with_thread_pool<R, F>(threads: Option<usize>, f: F) -> Result<R>
where
    R: Send,
    F: FnOnce() -> R + Send,
{
    match threads {
        None => Ok(f()),
        Some(count) => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(count)
                .build()
                .map_err(|e| Error::ThreadPool(e.to_string()))?;
            Ok(pool.install(f))
        }
    }
}

/// Forward-transforms the grid and reduces it to `Re(F)²`.
///
/// The grid is consumed so its buffer is released once the intensity
/// volume exists.
///
/// # Errors
/// Returns [`Error::NonFinite`] with the flat voxel index if the transform
/// produced a NaN or infinity.
pub fn fft3d(grid: VoxelGrid, threads: Option<usize>) -> Result<IntensityVolume> {
    let n = grid.n_points();
    with_thread_pool(threads, move || {
        let plan = Fft3d::new(n);
        let mut data = grid.into_data();
        plan.forward(&mut data)?;
        square_real(n, &data)
    })?
}

/// `intensity[i] = Re(data[i])²`; the imaginary part is discarded.
///
/// # Errors
/// Returns [`Error::NonFinite`] for the first non-finite output voxel.
pub fn square_real(n: usize, data: &[Complex64]) -> Result<IntensityVolume> {
    let values: Vec<f64> = data.par_iter().map(|c| c.re * c.re).collect();
    if let Some(index) = values.par_iter().position_first(|v| !v.is_finite()) {
        return Err(Error::NonFinite {
            stage: Stage::Transform,
            index,
        });
    }
    IntensityVolume::from_values(n, values)
}
