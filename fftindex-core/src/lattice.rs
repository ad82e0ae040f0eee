//! Reciprocal-space input points and real-space candidate vectors.

use nalgebra::Vector3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// One observed reflection mapped into reciprocal space (Å⁻¹).
pub type ReciprocalVector = Vector3<f64>;

/// A candidate real-space lattice translation (Å).
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct CandidateVector {
    /// Real-space vector in Å.
    pub vector: Vector3<f64>,
    /// Voxel count of the peak this vector came from (confidence).
    pub voxel_count: usize,
}

impl CandidateVector {
    /// Creates a candidate from a vector and its peak volume.
    #[must_use]
    pub fn new(vector: Vector3<f64>, voxel_count: usize) -> Self {
        Self {
            vector,
            voxel_count,
        }
    }

    /// Length of the vector in Å.
    #[inline]
    #[must_use]
    pub fn length(&self) -> f64 {
        self.vector.norm()
    }

    /// Components as a plain array.
    #[inline]
    #[must_use]
    pub fn to_array(&self) -> [f64; 3] {
        [self.vector.x, self.vector.y, self.vector.z]
    }
}
