//! fftindex CLI
//!
//! Searches a set of reciprocal lattice points for candidate real-space
//! lattice vectors and writes them as JSON.
#![allow(clippy::uninlined_format_args)]

use clap::{Parser, Subcommand};
use fftindex_algorithms::Indexer;
use fftindex_core::IndexingConfig;
use fftindex_io::{
    read_reciprocal_vectors, summarize_vectors, write_candidate_vectors_json, write_report_json,
    MemoryBudget, CANDIDATE_VECTORS_FILE,
};
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Instant;
use thiserror::Error;

/// Result type for CLI operations.
type Result<T> = std::result::Result<T, CliError>;

/// CLI error types.
#[derive(Error, Debug)]
enum CliError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("I/O error: {0}")]
    FftindexIo(#[from] fftindex_io::Error),

    #[error("Core error: {0}")]
    Core(#[from] fftindex_core::Error),

    #[error("Config file error: {0}")]
    Config(#[from] serde_json::Error),

    #[error(
        "grid needs ~{required_mib} MiB but only {budget_mib} MiB is available; \
         lower --fft-npoints or pass --skip-memory-check"
    )]
    Memory { required_mib: usize, budget_mib: usize },
}

/// FFT-based candidate lattice vector search.
#[derive(Parser)]
#[command(name = "fftindex")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Verbose logging (same as RUST_LOG=debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find candidate lattice vectors in a reciprocal vector file
    Index {
        /// Reciprocal vectors (Å⁻¹): JSON array of triplets or delimited text
        input: PathBuf,

        /// Resolution limit (Å)
        #[arg(long, required_unless_present = "config")]
        dmin: Option<f64>,

        /// Maximum cell length (Å)
        #[arg(long, required_unless_present = "config")]
        max_cell: Option<f64>,

        /// Minimum cell length (Å)
        #[arg(long)]
        min_cell: Option<f64>,

        /// FFT grid side length
        #[arg(long)]
        fft_npoints: Option<usize>,

        /// Peak threshold in standard deviations above the mean
        #[arg(long)]
        rmsd_cutoff: Option<f64>,

        /// Fraction of the largest peak volume a peak must reach
        #[arg(long)]
        peak_volume_cutoff: Option<f64>,

        /// Isotropic B-factor (0 disables weighting; default derives from dmin)
        #[arg(long)]
        b_iso: Option<f64>,

        /// Transform worker threads (default: available parallelism)
        #[arg(long)]
        threads: Option<usize>,

        /// JSON configuration file; command-line flags override its values
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output file for candidate vectors
        #[arg(short, long, default_value = CANDIDATE_VECTORS_FILE)]
        output: PathBuf,

        /// Also write a full JSON report with diagnostics
        #[arg(long)]
        report: Option<PathBuf>,

        /// Run even if the grid looks too large for available memory
        #[arg(long)]
        skip_memory_check: bool,
    },

    /// Show information about a reciprocal vector file
    Info {
        /// Reciprocal vector file
        input: PathBuf,
    },
}

/// Command-line overrides applied on top of the base configuration.
struct Overrides {
    dmin: Option<f64>,
    max_cell: Option<f64>,
    min_cell: Option<f64>,
    fft_npoints: Option<usize>,
    rmsd_cutoff: Option<f64>,
    peak_volume_cutoff: Option<f64>,
    b_iso: Option<f64>,
    threads: Option<usize>,
}

impl Overrides {
    fn apply(self, mut config: IndexingConfig) -> IndexingConfig {
        if let Some(v) = self.dmin {
            config.d_min = v;
        }
        if let Some(v) = self.max_cell {
            config.max_cell = v;
        }
        if let Some(v) = self.min_cell {
            config.min_cell = v;
        }
        if let Some(v) = self.fft_npoints {
            config.n_points = v;
        }
        if let Some(v) = self.rmsd_cutoff {
            config.rmsd_cutoff = v;
        }
        if let Some(v) = self.peak_volume_cutoff {
            config.peak_volume_cutoff = v;
        }
        if self.b_iso.is_some() {
            config.b_iso = self.b_iso;
        }
        if self.threads.is_some() {
            config.threads = self.threads;
        }
        config
    }
}

fn load_config(path: Option<&Path>) -> Result<IndexingConfig> {
    match path {
        Some(path) => {
            let file = File::open(path)?;
            Ok(serde_json::from_reader(BufReader::new(file))?)
        }
        None => Ok(IndexingConfig::default()),
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Index {
            input,
            dmin,
            max_cell,
            min_cell,
            fft_npoints,
            rmsd_cutoff,
            peak_volume_cutoff,
            b_iso,
            threads,
            config,
            output,
            report,
            skip_memory_check,
        } => {
            let start = Instant::now();
            let overrides = Overrides {
                dmin,
                max_cell,
                min_cell,
                fft_npoints,
                rmsd_cutoff,
                peak_volume_cutoff,
                b_iso,
                threads,
            };
            let config = overrides.apply(load_config(config.as_deref())?);
            let indexer = Indexer::new(config)?;
            let config = indexer.config();

            if !skip_memory_check {
                let check = MemoryBudget::default().check(config.n_points)?;
                if !check.fits() {
                    return Err(CliError::Memory {
                        required_mib: check.required_bytes >> 20,
                        budget_mib: check.budget_bytes >> 20,
                    });
                }
            }

            let vectors = read_reciprocal_vectors(&input)?;
            log::info!(
                "read {} reciprocal vectors from {}",
                vectors.len(),
                input.display()
            );
            log::info!("setting b_iso = {:.4}", config.effective_b_iso());

            // Per-stage counts and timings are logged by the indexer.
            let result = indexer.run(&vectors)?;
            println!("Candidate vectors: {}", result.candidates.len());
            for (i, c) in result.candidates.iter().take(10).enumerate() {
                println!(
                    "  {:>2}: [{:>9.4}, {:>9.4}, {:>9.4}]  |v| = {:>8.4}  volume = {}",
                    i,
                    c.vector.x,
                    c.vector.y,
                    c.vector.z,
                    c.length(),
                    c.voxel_count
                );
            }

            log::info!("saving candidate vectors to {}", output.display());
            write_candidate_vectors_json(&output, &result.candidates)?;
            if let Some(path) = report {
                log::info!("saving report to {}", path.display());
                write_report_json(&path, config, &result)?;
            }

            if !result.has_trial_cell() {
                println!("Insufficient number of candidate vectors to make a crystal model.");
            }
            log::info!(
                "total time for indexer: {:.3}s",
                start.elapsed().as_secs_f64()
            );
        }

        Commands::Info { input } => {
            let vectors = read_reciprocal_vectors(&input)?;
            let summary = summarize_vectors(&vectors);

            println!("File: {}", input.display());
            println!("Vectors: {}", summary.count);
            if summary.degenerate > 0 {
                println!("Zero-length or non-finite: {}", summary.degenerate);
            }
            if let (Some(d_max), Some(d_min)) = (summary.d_max, summary.d_min) {
                println!("Resolution range: {:.3} - {:.3} Å", d_max, d_min);
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn no_overrides() -> Overrides {
        Overrides {
            dmin: None,
            max_cell: None,
            min_cell: None,
            fft_npoints: None,
            rmsd_cutoff: None,
            peak_volume_cutoff: None,
            b_iso: None,
            threads: None,
        }
    }

    #[test]
    fn test_cli_parses_index() {
        let cli = Cli::try_parse_from([
            "fftindex",
            "index",
            "spots.txt",
            "--dmin",
            "1.8",
            "--max-cell",
            "50",
            "--fft-npoints",
            "128",
        ])
        .unwrap();
        match cli.command {
            Commands::Index {
                dmin,
                max_cell,
                fft_npoints,
                output,
                ..
            } => {
                assert_eq!(dmin, Some(1.8));
                assert_eq!(max_cell, Some(50.0));
                assert_eq!(fft_npoints, Some(128));
                assert_eq!(output, PathBuf::from(CANDIDATE_VECTORS_FILE));
            }
            Commands::Info { .. } => panic!("expected index"),
        }
    }

    #[test]
    fn test_cli_requires_dmin_without_config() {
        let missing = ["fftindex", "index", "spots.txt", "--max-cell", "50"];
        assert!(Cli::try_parse_from(missing).is_err());
        let from_file = ["fftindex", "index", "spots.txt", "--config", "c.json"];
        assert!(Cli::try_parse_from(from_file).is_ok());
    }

    #[test]
    fn test_overrides_win_over_config_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"d_min": 3.0, "max_cell": 80.0, "n_points": 64}}"#).unwrap();
        file.flush().unwrap();

        let base = load_config(Some(file.path())).unwrap();
        assert_eq!(base.n_points, 64);
        assert_eq!(base.min_cell, 3.0);

        let merged = Overrides {
            dmin: Some(2.5),
            threads: Some(2),
            ..no_overrides()
        }
        .apply(base);
        assert_eq!(merged.d_min, 2.5);
        assert_eq!(merged.max_cell, 80.0);
        assert_eq!(merged.n_points, 64);
        assert_eq!(merged.threads, Some(2));
    }

    #[test]
    fn test_default_config_without_file() {
        let config = no_overrides().apply(load_config(None).unwrap());
        assert_eq!(config, IndexingConfig::default());
    }
}
