//! Shared analysis pipeline used by the `fingerprint` and `cluster` commands.
//!
//! Keeping this in one place avoids duplicating the core workflow:
//! ingest/generate -> fingerprint extraction -> (optional) clustering
//!
//! The CLI layer then focuses on presentation and exports.

use crate::data::generate_set;
use crate::domain::AnalysisConfig;
use crate::error::AppError;
use crate::fingerprint::{FingerprintStack, fingerprint_stack, trim_fingerprints};
use crate::io::ingest::IngestReport;

/// All computed outputs of one fingerprint/cluster run.
#[derive(Debug)]
pub struct AnalysisOutput {
    pub ingest: IngestReport,
    pub stack: FingerprintStack,
    /// Where the run data came from, for reporting.
    pub source: String,
}

/// Load or generate the experiment set and extract the fingerprint stack.
pub fn run_analysis(config: &AnalysisConfig) -> Result<AnalysisOutput, AppError> {
    config.validate()?;

    let (ingest, source) = match &config.input {
        Some(path) => {
            let report = crate::io::load_run_csv(path)?;
            (report, path.display().to_string())
        }
        None => {
            let set = generate_set(&config.synth)?;
            let points: usize = set
                .experiments()
                .iter()
                .flat_map(|e| e.run_sets())
                .flat_map(|rs| rs.runs())
                .map(|r| r.len())
                .sum();
            let report = IngestReport {
                set,
                rows_read: points,
                rows_used: points,
                row_errors: Vec::new(),
            };
            (report, format!("synthetic (seed {})", config.synth.seed))
        }
    };

    let stack = fingerprint_stack(&ingest.set, config.level)?;
    // Analysis is done with the cached rows; drop everything non-permanent.
    trim_fingerprints(&ingest.set)?;

    Ok(AnalysisOutput {
        ingest,
        stack,
        source,
    })
}
