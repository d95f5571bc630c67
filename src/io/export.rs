//! Exports: fingerprint CSV, cluster-group JSON, and synthetic run CSV.
//!
//! Exports are meant to be easy to consume in spreadsheets or downstream
//! scripts; the JSON schema mirrors what the reporting layer prints.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cluster::ClusterGroup;
use crate::domain::{DimKind, DimType, ExperimentSet, Level};
use crate::error::AppError;
use crate::fingerprint::FingerprintStack;

/// Write one fingerprint row per entity; rows may have differing widths.
pub fn write_fingerprint_csv(path: &Path, stack: &FingerprintStack) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create '{}': {e}", path.display()))
    })?;

    for row in &stack.rows {
        write!(file, "{}", row.name)
            .and_then(|_| {
                for v in &row.values {
                    write!(file, ",{v:.10}")?;
                }
                writeln!(file)
            })
            .map_err(|e| {
                AppError::invalid_input(format!("Failed to write fingerprint CSV: {e}"))
            })?;
    }
    Ok(())
}

/// A saved clustering result (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupsFile {
    pub tool: String,
    pub level: Level,
    pub k: usize,
    pub groups: Vec<ClusterGroup>,
}

/// Write the cluster partition to a pretty-printed JSON file.
pub fn write_groups_json(
    path: &Path,
    level: Level,
    k: usize,
    groups: &[ClusterGroup],
) -> Result<(), AppError> {
    let file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create '{}': {e}", path.display()))
    })?;
    let payload = GroupsFile {
        tool: "bcurves".to_string(),
        level,
        k,
        groups: groups.to_vec(),
    };
    serde_json::to_writer_pretty(file, &payload)
        .map_err(|e| AppError::invalid_input(format!("Failed to write groups JSON: {e}")))
}

/// Write an experiment set as a long-format run CSV (the ingest schema).
pub fn write_runs_csv(path: &Path, set: &ExperimentSet) -> Result<(), AppError> {
    let mut file = File::create(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to create '{}': {e}", path.display()))
    })?;

    let mut header = String::from("experiment,instance,run");
    for dim in set.dimensions() {
        let ty = match dim.data_type {
            DimType::Int => "int",
            DimType::Float => "float",
        };
        let kind = match dim.kind {
            DimKind::Time => "time",
            DimKind::Quality => "quality",
        };
        header.push_str(&format!(",{}:{ty}:{kind}", dim.name));
    }
    writeln!(file, "{header}")
        .map_err(|e| AppError::invalid_input(format!("Failed to write run CSV header: {e}")))?;

    for experiment in set.experiments() {
        for run_set in experiment.run_sets() {
            for (r, run) in run_set.runs().iter().enumerate() {
                for point in run.points() {
                    write!(
                        file,
                        "{},{},r{:03}",
                        experiment.name(),
                        run_set.instance(),
                        r + 1
                    )
                    .and_then(|_| {
                        for dim in set.dimensions() {
                            let v = point.value(dim.index);
                            match dim.data_type {
                                DimType::Int => write!(file, ",{}", v as i64)?,
                                DimType::Float => write!(file, ",{v}")?,
                            }
                        }
                        writeln!(file)
                    })
                    .map_err(|e| {
                        AppError::invalid_input(format!("Failed to write run CSV row: {e}"))
                    })?;
                }
            }
        }
    }
    Ok(())
}
