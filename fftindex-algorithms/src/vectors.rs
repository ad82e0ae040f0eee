//! Candidate lattice vectors from filtered peak centroids.
//!
//! Steps, in order:
//! 1. fractional centroid -> real-space vector (inverse of the grid scale)
//! 2. canonical sign, so each antipodal pair points the same way
//! 3. inclusive `[min_cell, max_cell]` length window
//! 4. near-collinear dedup (integer multiples included), shortest first
//! 5. rank by peak volume, then length, then components

use fftindex_core::{CandidateVector, GridGeometry, Peak};
use nalgebra::Vector3;
use std::cmp::Ordering;

/// Angular tolerance for treating two directions as the same lattice row.
pub const ANGULAR_TOLERANCE_DEG: f64 = 5.0;

/// Flips `v` so its first non-zero component is positive.
#[must_use]
pub fn canonical_sign(v: Vector3<f64>) -> Vector3<f64> {
    match v.iter().find(|&&c| c != 0.0) {
        // negation turns zeros into -0.0; keep them positive
        Some(&first) if first < 0.0 => (-v).map(|c| if c == 0.0 { 0.0 } else { c }),
        _ => v,
    }
}

/// True if `a` and `b` point along the same line, in either sense, within
/// [`ANGULAR_TOLERANCE_DEG`]. Zero vectors are never collinear.
#[must_use]
pub fn is_near_collinear(a: &Vector3<f64>, b: &Vector3<f64>) -> bool {
    if a.norm() == 0.0 || b.norm() == 0.0 {
        return false;
    }
    let angle = a.angle(b).to_degrees();
    angle < ANGULAR_TOLERANCE_DEG || (180.0 - angle).abs() < ANGULAR_TOLERANCE_DEG
}

/// True when `|v|` lies in `[min_cell, max_cell]`, both edges included.
#[must_use]
pub fn within_cell_bounds(v: &Vector3<f64>, min_cell: f64, max_cell: f64) -> bool {
    let length = v.norm();
    length >= min_cell && length <= max_cell
}

fn compare_components(a: &Vector3<f64>, b: &Vector3<f64>) -> Ordering {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| x.total_cmp(y))
        .find(|o| o.is_ne())
        .unwrap_or(Ordering::Equal)
}

fn by_length(a: &CandidateVector, b: &CandidateVector) -> Ordering {
    a.length()
        .total_cmp(&b.length())
        .then_with(|| b.voxel_count.cmp(&a.voxel_count))
        .then_with(|| compare_components(&a.vector, &b.vector))
}

fn by_confidence(a: &CandidateVector, b: &CandidateVector) -> Ordering {
    b.voxel_count
        .cmp(&a.voxel_count)
        .then_with(|| a.length().total_cmp(&b.length()))
        .then_with(|| compare_components(&a.vector, &b.vector))
}

/// Drops vectors lying along a shorter, already accepted lattice row.
///
/// Input must be sorted shortest first. Any near-collinear later vector is
/// dropped, integer multiple or not. The kept row's `voxel_count` becomes
/// the largest count among the vectors it absorbed, and ranking uses that
/// merged count.
#[must_use]
pub fn deduplicate(sorted: &[CandidateVector]) -> Vec<CandidateVector> {
    let mut unique: Vec<CandidateVector> = Vec::with_capacity(sorted.len());
    for candidate in sorted {
        match unique
            .iter_mut()
            .find(|u| is_near_collinear(&u.vector, &candidate.vector))
        {
            Some(existing) => {
                existing.voxel_count = existing.voxel_count.max(candidate.voxel_count);
            }
            None => unique.push(*candidate),
        }
    }
    unique
}

/// Converts filtered peaks into ranked candidate lattice vectors.
///
/// `geometry` must be the one used to grid the reciprocal vectors.
#[must_use]
pub fn peaks_to_vectors(
    peaks: &[Peak],
    geometry: &GridGeometry,
    min_cell: f64,
    max_cell: f64,
) -> Vec<CandidateVector> {
    let mut candidates: Vec<CandidateVector> = peaks
        .iter()
        .map(|peak| {
            let v = canonical_sign(geometry.real_space_vector(&peak.centroid_frac));
            CandidateVector::new(v, peak.voxel_count)
        })
        .filter(|c| within_cell_bounds(&c.vector, min_cell, max_cell))
        .collect();

    candidates.sort_by(by_length);
    let mut unique = deduplicate(&candidates);
    unique.sort_by(by_confidence);

    log::debug!(
        "{} peaks -> {} in length window -> {} unique candidate vectors",
        peaks.len(),
        candidates.len(),
        unique.len()
    );
    unique
}
