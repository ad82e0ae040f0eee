//! fftindex-io: File I/O for fftindex.
//!
//! This crate reads reciprocal vectors from JSON or delimited text, writes
//! candidate vectors and run reports as JSON, and sizes the grid against
//! available memory via sysinfo.
//!

pub mod budget;
mod error;
mod reader;
mod writer;

pub use budget::{estimate_peak_bytes, MemoryBudget, MemoryCheck};
pub use error::{Error, Result};
pub use reader::{
    read_reciprocal_vectors, read_reciprocal_vectors_from, summarize_vectors, VectorFormat,
    VectorSummary,
};
pub use writer::{
    candidate_vectors_json, write_candidate_vectors_json, write_report_json, ReportDocument,
    CANDIDATE_VECTORS_FILE,
};
