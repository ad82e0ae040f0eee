//! Memory sizing for the gridding and transform stages.

use crate::{Error, Result};
use sysinfo::System;

/// Peak bytes held per voxel: the complex grid plus the transposed
/// transform buffer (2 × 16 bytes).
pub const PEAK_BYTES_PER_VOXEL: usize = 32;

/// Estimated peak memory for an `n_points³` search.
///
/// # Errors
/// Returns [`Error::CoreError`] if the size overflows `usize`.
pub fn estimate_peak_bytes(n_points: usize) -> Result<usize> {
    n_points
        .checked_mul(n_points)
        .and_then(|sq| sq.checked_mul(n_points))
        .and_then(|voxels| voxels.checked_mul(PEAK_BYTES_PER_VOXEL))
        .ok_or(Error::CoreError(fftindex_core::Error::GridTooLarge { n_points }))
}

/// Outcome of comparing the estimate with available memory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MemoryCheck {
    /// Estimated peak bytes.
    pub required_bytes: usize,
    /// Bytes the budget allows.
    pub budget_bytes: usize,
}

impl MemoryCheck {
    /// True when the estimate fits the budget.
    #[must_use]
    pub fn fits(&self) -> bool {
        self.required_bytes <= self.budget_bytes
    }
}

/// Memory budget: an explicit byte count or a fraction of available memory.
#[derive(Clone, Debug)]
pub struct MemoryBudget {
    /// Fraction of available system memory to allow (0.0 < fraction <= 1.0).
    pub memory_fraction: f64,
    /// Explicit budget override (bytes). If set, `memory_fraction` is ignored.
    pub memory_budget_bytes: Option<usize>,
}

impl Default for MemoryBudget {
    fn default() -> Self {
        Self {
            memory_fraction: 0.8,
            memory_budget_bytes: None,
        }
    }
}

impl MemoryBudget {
    /// Set an explicit budget in bytes.
    #[must_use]
    pub fn with_memory_budget_bytes(mut self, bytes: usize) -> Self {
        self.memory_budget_bytes = Some(bytes);
        self
    }

    /// Set the fraction of available memory.
    #[must_use]
    pub fn with_memory_fraction(mut self, fraction: f64) -> Self {
        self.memory_fraction = fraction;
        self
    }

    /// Budget in bytes: the explicit override, else the configured share
    /// of the memory the system reports as available.
    ///
    /// # Errors
    /// Returns [`Error::CoreError`] wrapping a config error when
    /// `memory_fraction` is outside `(0, 1]`, and
    /// [`Error::MemoryUnavailable`] when the system reports no free memory.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn resolve_budget_bytes(&self) -> Result<usize> {
        if let Some(bytes) = self.memory_budget_bytes {
            return Ok(bytes);
        }
        let fraction = self.memory_fraction;
        if fraction.is_nan() || fraction <= 0.0 || fraction > 1.0 {
            return Err(fftindex_core::Error::ConfigError(format!(
                "memory_fraction must be in (0, 1], got {fraction}"
            ))
            .into());
        }

        let mut system = System::new();
        system.refresh_memory();
        match system.available_memory() {
            0 => Err(Error::MemoryUnavailable),
            free => {
                let share = (free as f64 * fraction) as u64;
                Ok(usize::try_from(share).unwrap_or(usize::MAX))
            }
        }
    }

    /// Compares the estimate for `n_points` with the budget.
    ///
    /// # Errors
    /// See [`estimate_peak_bytes`] and [`Self::resolve_budget_bytes`].
    pub fn check(&self, n_points: usize) -> Result<MemoryCheck> {
        let check = MemoryCheck {
            required_bytes: estimate_peak_bytes(n_points)?,
            budget_bytes: self.resolve_budget_bytes()?,
        };
        if check.fits() {
            log::debug!(
                "grid {n_points}^3 needs ~{} MiB of {} MiB budget",
                check.required_bytes >> 20,
                check.budget_bytes >> 20
            );
        } else {
            log::warn!(
                "grid {n_points}^3 needs ~{} MiB, above the {} MiB budget",
                check.required_bytes >> 20,
                check.budget_bytes >> 20
            );
        }
        Ok(check)
    }
}
