//! Reciprocal vector readers.
//!
//! Two layouts are accepted:
//! - JSON: an array of `[x, y, z]` triplets
//! - text: one vector per line, components separated by whitespace and/or
//!   commas; blank lines and lines starting with `#` are skipped

use crate::{Error, Result};
use fftindex_core::ReciprocalVector;
use nalgebra::Vector3;
use std::fs::File;
use std::io::{BufRead, BufReader, Read};
use std::path::Path;

/// On-disk layout of a reciprocal vector file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorFormat {
    /// JSON array of triplets.
    Json,
    /// Delimited text, one triplet per line.
    Text,
}

impl VectorFormat {
    /// Picks the format from the file extension; anything but `.json` is text.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::Json,
            _ => Self::Text,
        }
    }
}

/// Reads reciprocal vectors (Å⁻¹) from `path`, detecting the format from
/// its extension.
///
/// # Errors
/// Returns an error if the file cannot be read or is malformed.
pub fn read_reciprocal_vectors<P: AsRef<Path>>(path: P) -> Result<Vec<ReciprocalVector>> {
    let path = path.as_ref();
    let format = VectorFormat::from_path(path);
    let file = File::open(path)?;
    let vectors = read_reciprocal_vectors_from(BufReader::new(file), format)?;
    log::debug!(
        "read {} reciprocal vectors from {}",
        vectors.len(),
        path.display()
    );
    Ok(vectors)
}

/// Reads reciprocal vectors from any reader in the given format.
///
/// # Errors
/// Returns an error if reading fails or the content is malformed.
pub fn read_reciprocal_vectors_from<R: BufRead>(
    reader: R,
    format: VectorFormat,
) -> Result<Vec<ReciprocalVector>> {
    match format {
        VectorFormat::Json => read_json(reader),
        VectorFormat::Text => read_text(reader),
    }
}

fn read_json<R: Read>(reader: R) -> Result<Vec<ReciprocalVector>> {
    let triplets: Vec<[f64; 3]> = serde_json::from_reader(reader)?;
    Ok(triplets
        .into_iter()
        .map(|[x, y, z]| Vector3::new(x, y, z))
        .collect())
}

fn read_text<R: BufRead>(reader: R) -> Result<Vec<ReciprocalVector>> {
    let mut vectors = Vec::new();
    for (line_no, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let fields: Vec<&str> = trimmed
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|f| !f.is_empty())
            .collect();
        if fields.len() != 3 {
            return Err(Error::InvalidFormat(format!(
                "line {}: expected 3 components, found {}",
                line_no + 1,
                fields.len()
            )));
        }
        let mut components = [0.0; 3];
        for (slot, field) in components.iter_mut().zip(&fields) {
            *slot = field.parse().map_err(|_| {
                Error::InvalidFormat(format!("line {}: invalid number {field:?}", line_no + 1))
            })?;
        }
        vectors.push(Vector3::from(components));
    }
    Ok(vectors)
}

/// Count and resolution range of a set of reciprocal vectors.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct VectorSummary {
    /// Number of vectors.
    pub count: usize,
    /// Vectors with zero or non-finite length.
    pub degenerate: usize,
    /// Largest d-spacing (Å), i.e. the lowest-resolution spot.
    pub d_max: Option<f64>,
    /// Smallest d-spacing (Å), i.e. the highest-resolution spot.
    pub d_min: Option<f64>,
}

/// Summarizes `vectors` for display.
#[must_use]
pub fn summarize_vectors(vectors: &[ReciprocalVector]) -> VectorSummary {
    let mut degenerate = 0;
    let mut d_max: Option<f64> = None;
    let mut d_min: Option<f64> = None;
    for v in vectors {
        let length = v.norm();
        if !length.is_finite() || length == 0.0 {
            degenerate += 1;
            continue;
        }
        let d = 1.0 / length;
        d_max = Some(d_max.map_or(d, |m| m.max(d)));
        d_min = Some(d_min.map_or(d, |m| m.min(d)));
    }
    VectorSummary {
        count: vectors.len(),
        degenerate,
        d_max,
        d_min,
    }
}
