//! JSON writers for candidate vectors and indexing reports.

use crate::Result;
use fftindex_algorithms::IndexingReport;
use fftindex_core::{CandidateVector, IndexingConfig};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Default output file name for candidate vectors.
pub const CANDIDATE_VECTORS_FILE: &str = "candidate_vectors.json";

/// Candidate vectors as a JSON object keyed by zero-padded index.
///
/// Keys are padded to the width of the largest index (`"00"`..`"11"` for
/// twelve candidates), so lexical and rank order agree.
#[must_use]
pub fn candidate_vectors_json(candidates: &[CandidateVector]) -> Value {
    let width = candidates.len().saturating_sub(1).to_string().len();
    let mut object = Map::new();
    for (i, c) in candidates.iter().enumerate() {
        let components = c.to_array().iter().map(|&x| Value::from(x)).collect();
        object.insert(format!("{i:0width$}"), Value::Array(components));
    }
    Value::Object(object)
}

/// Writes [`candidate_vectors_json`] to `path`, indented by four spaces.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_candidate_vectors_json<P: AsRef<Path>>(
    path: P,
    candidates: &[CandidateVector],
) -> Result<()> {
    write_pretty(path.as_ref(), &candidate_vectors_json(candidates))
}

/// Full run record: configuration plus everything the pipeline reported.
#[derive(Debug, Serialize)]
pub struct ReportDocument<'a> {
    /// Configuration the run used.
    pub config: &'a IndexingConfig,
    /// Pipeline output.
    pub report: &'a IndexingReport,
    /// Whether at least three candidates were found.
    pub has_trial_cell: bool,
}

impl<'a> ReportDocument<'a> {
    /// Bundles a configuration with its report.
    #[must_use]
    pub fn new(config: &'a IndexingConfig, report: &'a IndexingReport) -> Self {
        Self {
            config,
            report,
            has_trial_cell: report.has_trial_cell(),
        }
    }
}

/// Writes the configuration and full report to `path` as JSON.
///
/// # Errors
/// Returns an error if the file cannot be created or serialization fails.
pub fn write_report_json<P: AsRef<Path>>(
    path: P,
    config: &IndexingConfig,
    report: &IndexingReport,
) -> Result<()> {
    write_pretty(path.as_ref(), &ReportDocument::new(config, report))
}

fn write_pretty<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
    let mut serializer = serde_json::Serializer::with_formatter(&mut writer, formatter);
    value.serialize(&mut serializer)?;
    writer.flush()?;
    log::debug!("wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;
    use tempfile::NamedTempFile;

    fn candidates(n: usize) -> Vec<CandidateVector> {
        (0..n)
            .map(|i| CandidateVector::new(Vector3::new(10.0 + i as f64, 0.0, 1.5), 100 - i))
            .collect()
    }

    #[test]
    fn test_keys_are_zero_padded() {
        let value = candidate_vectors_json(&candidates(12));
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), 12);
        let keys: Vec<&String> = object.keys().collect();
        assert_eq!(keys[0], "00");
        assert_eq!(keys[9], "09");
        assert_eq!(keys[11], "11");
        assert_eq!(object["03"], serde_json::json!([13.0, 0.0, 1.5]));
    }

    #[test]
    fn test_short_list_has_single_digit_keys() {
        let value = candidate_vectors_json(&candidates(3));
        let object = value.as_object().unwrap();
        assert!(object.contains_key("0"));
        assert!(object.contains_key("2"));
    }

    #[test]
    fn test_empty_list_is_empty_object() {
        assert_eq!(candidate_vectors_json(&[]), serde_json::json!({}));
    }

    #[test]
    fn test_write_candidate_file() {
        let file = NamedTempFile::new().unwrap();
        write_candidate_vectors_json(file.path(), &candidates(2)).unwrap();

        let text = std::fs::read_to_string(file.path()).unwrap();
        assert!(text.contains("\n    \"0\": ["));
        let parsed: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed["1"], serde_json::json!([11.0, 0.0, 1.5]));
    }

    #[test]
    fn test_write_report_file() {
        let config = IndexingConfig::new(2.0, 20.0);
        let report = IndexingReport {
            candidates: candidates(3),
            used_in_indexing: vec![true, false],
            points_used: 1,
            voxels_populated: 1,
            ..IndexingReport::default()
        };
        let file = NamedTempFile::new().unwrap();
        write_report_json(file.path(), &config, &report).unwrap();

        let parsed: Value = serde_json::from_str(&std::fs::read_to_string(file.path()).unwrap())
            .unwrap();
        assert_eq!(parsed["has_trial_cell"], Value::Bool(true));
        assert_eq!(parsed["config"]["d_min"], serde_json::json!(2.0));
        assert_eq!(parsed["report"]["points_used"], serde_json::json!(1));
        assert_eq!(
            parsed["report"]["used_in_indexing"],
            serde_json::json!([true, false])
        );
        assert!(parsed["report"]["statistics"].is_null());
    }
}
