//! CSV ingest and normalization.
//!
//! Turns a long-format run CSV into an [`ExperimentSet`]. Design goals:
//!
//! - **Strict schema** for the required key columns (clear errors + exit code 2)
//! - **Row-level validation** (skip bad rows, but report what happened)
//! - **Deterministic behavior** (entities ordered by first appearance)
//! - **Separation of concerns**: no fingerprinting or fitting logic here
//!
//! Expected schema: key columns `experiment`, `instance`, `run`, followed by
//! one column per dimension. A dimension header is `name[:int|float][:time|quality]`;
//! the type defaults to `float`, the kind defaults to `time` for the first
//! dimension and `quality` for the rest.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use crate::domain::{
    DataPoint, DimKind, DimType, Dimension, Experiment, ExperimentSet, Instance, Run, RunSet,
};
use crate::error::AppError;
use crate::fit::XySamples;

/// A row-level error encountered during ingest.
#[derive(Debug, Clone)]
pub struct RowError {
    pub line: usize,
    pub message: String,
}

/// Ingest output: the assembled set plus bookkeeping about skipped rows.
#[derive(Debug)]
pub struct IngestReport {
    pub set: ExperimentSet,
    pub rows_read: usize,
    pub rows_used: usize,
    pub row_errors: Vec<RowError>,
}

/// Load a long-format run CSV into an experiment set.
pub fn load_run_csv(path: &Path) -> Result<IngestReport, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;

    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let headers = reader
        .headers()
        .map_err(|e| AppError::invalid_input(format!("Failed to read CSV headers: {e}")))?
        .clone();

    let layout = Layout::from_headers(&headers)?;

    // Grouping keyed by (experiment, instance, run), all ordered by first
    // appearance so re-ingesting a file reproduces the same set.
    let mut group_order: Vec<RunKey> = Vec::new();
    let mut groups: HashMap<RunKey, Vec<DataPoint>> = HashMap::new();
    let mut experiment_order: Vec<String> = Vec::new();
    let mut instance_order: Vec<String> = Vec::new();

    let mut rows_read = 0usize;
    let mut rows_used = 0usize;
    let mut row_errors = Vec::new();

    for (idx, result) in reader.records().enumerate() {
        // +2: records() starts after the header row and lines are 1-based.
        let line = idx + 2;
        rows_read += 1;

        let record = match result {
            Ok(r) => r,
            Err(e) => {
                row_errors.push(RowError {
                    line,
                    message: format!("CSV parse error: {e}"),
                });
                continue;
            }
        };

        match layout.parse_row(&record) {
            Ok((key, point)) => {
                if !experiment_order.contains(&key.experiment) {
                    experiment_order.push(key.experiment.clone());
                }
                if !instance_order.contains(&key.instance) {
                    instance_order.push(key.instance.clone());
                }
                let points = match groups.entry(key) {
                    std::collections::hash_map::Entry::Occupied(e) => e.into_mut(),
                    std::collections::hash_map::Entry::Vacant(e) => {
                        group_order.push(e.key().clone());
                        e.insert(Vec::new())
                    }
                };
                points.push(point);
                rows_used += 1;
            }
            Err(message) => row_errors.push(RowError { line, message }),
        }
    }

    for e in &row_errors {
        tracing::warn!(line = e.line, "skipped row: {}", e.message);
    }

    if rows_used == 0 {
        return Err(AppError::insufficient_data(format!(
            "CSV '{}' contains no usable data rows ({} skipped).",
            path.display(),
            row_errors.len()
        )));
    }

    let set = assemble(layout.dimensions, experiment_order, instance_order, group_order, groups)?;
    tracing::info!(
        experiments = set.experiments().len(),
        instances = set.instances().len(),
        runs = set.total_runs(),
        rows_used,
        skipped = row_errors.len(),
        "ingested run CSV"
    );
    Ok(IngestReport {
        set,
        rows_read,
        rows_used,
        row_errors,
    })
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct RunKey {
    experiment: String,
    instance: String,
    run: String,
}

struct Layout {
    experiment_col: usize,
    instance_col: usize,
    run_col: usize,
    /// Dimension metadata paired with its CSV column position.
    dim_cols: Vec<usize>,
    dimensions: Vec<Dimension>,
}

impl Layout {
    fn from_headers(headers: &csv::StringRecord) -> Result<Self, AppError> {
        let mut experiment_col = None;
        let mut instance_col = None;
        let mut run_col = None;
        let mut dim_cols = Vec::new();
        let mut dimensions = Vec::new();

        for (col, raw) in headers.iter().enumerate() {
            match raw.to_ascii_lowercase().as_str() {
                "experiment" => experiment_col = Some(col),
                "instance" => instance_col = Some(col),
                "run" => run_col = Some(col),
                _ => {
                    let dim = parse_dim_header(raw, dimensions.len())?;
                    dim_cols.push(col);
                    dimensions.push(dim);
                }
            }
        }

        let experiment_col = experiment_col
            .ok_or_else(|| AppError::invalid_input("CSV is missing the 'experiment' column."))?;
        let instance_col = instance_col
            .ok_or_else(|| AppError::invalid_input("CSV is missing the 'instance' column."))?;
        let run_col =
            run_col.ok_or_else(|| AppError::invalid_input("CSV is missing the 'run' column."))?;
        if dimensions.len() < 2 {
            return Err(AppError::invalid_input(
                "CSV needs at least two dimension columns besides the key columns.",
            ));
        }

        Ok(Self {
            experiment_col,
            instance_col,
            run_col,
            dim_cols,
            dimensions,
        })
    }

    fn parse_row(&self, record: &csv::StringRecord) -> Result<(RunKey, DataPoint), String> {
        let field = |col: usize| record.get(col).unwrap_or("").trim();

        let experiment = field(self.experiment_col);
        let instance = field(self.instance_col);
        let run = field(self.run_col);
        if experiment.is_empty() || instance.is_empty() || run.is_empty() {
            return Err("empty experiment/instance/run key".to_string());
        }

        let mut values = Vec::with_capacity(self.dimensions.len());
        for (dim, &col) in self.dimensions.iter().zip(self.dim_cols.iter()) {
            let raw = field(col);
            let v: f64 = raw
                .parse()
                .map_err(|_| format!("unparseable value '{raw}' for dimension '{}'", dim.name))?;
            if !v.is_finite() {
                return Err(format!("non-finite value for dimension '{}'", dim.name));
            }
            if dim.data_type == DimType::Int && v.fract() != 0.0 {
                return Err(format!(
                    "non-integral value '{raw}' for integer dimension '{}'",
                    dim.name
                ));
            }
            values.push(v);
        }

        Ok((
            RunKey {
                experiment: experiment.to_string(),
                instance: instance.to_string(),
                run: run.to_string(),
            },
            DataPoint::new(values),
        ))
    }
}

/// Parse `name[:int|float][:time|quality]` into dimension metadata.
fn parse_dim_header(raw: &str, index: usize) -> Result<Dimension, AppError> {
    let mut parts = raw.split(':');
    let name = parts.next().unwrap_or("").trim();
    if name.is_empty() {
        return Err(AppError::invalid_input(format!(
            "Dimension column {index} has an empty name."
        )));
    }

    let mut data_type = DimType::Float;
    let mut kind = if index == 0 { DimKind::Time } else { DimKind::Quality };
    for tag in parts {
        match tag.trim().to_ascii_lowercase().as_str() {
            "int" => data_type = DimType::Int,
            "float" => data_type = DimType::Float,
            "time" => kind = DimKind::Time,
            "quality" => kind = DimKind::Quality,
            other => {
                return Err(AppError::invalid_input(format!(
                    "Unknown tag '{other}' in dimension header '{raw}'."
                )));
            }
        }
    }

    Ok(Dimension {
        index,
        name: name.to_string(),
        data_type,
        kind,
    })
}

fn assemble(
    dimensions: Vec<Dimension>,
    experiment_order: Vec<String>,
    instance_order: Vec<String>,
    group_order: Vec<RunKey>,
    groups: HashMap<RunKey, Vec<DataPoint>>,
) -> Result<ExperimentSet, AppError> {
    let mut experiments = Vec::with_capacity(experiment_order.len());
    for experiment in &experiment_order {
        let mut run_sets = Vec::new();
        for instance in &instance_order {
            let runs: Vec<Run> = group_order
                .iter()
                .filter(|k| &k.experiment == experiment && &k.instance == instance)
                .map(|k| Run::new(groups[k].clone()))
                .collect::<Result<_, _>>()?;
            if !runs.is_empty() {
                run_sets.push(RunSet::new(instance.clone(), runs)?);
            }
        }
        experiments.push(Experiment::new(experiment.clone(), run_sets));
    }

    let instances = instance_order.into_iter().map(Instance::new).collect();
    ExperimentSet::new(dimensions, instances, experiments)
}

/// Load a plain two-column `(x, y)` CSV for the guess demo.
///
/// The first two columns are used; a header row is expected. Unparseable
/// rows are skipped with a warning.
pub fn load_xy_csv(path: &Path) -> Result<XySamples, AppError> {
    let file = File::open(path).map_err(|e| {
        AppError::invalid_input(format!("Failed to open CSV '{}': {e}", path.display()))
    })?;
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(file);

    let mut xs = Vec::new();
    let mut ys = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        let line = idx + 2;
        let Ok(record) = result else {
            tracing::warn!(line, "skipped malformed CSV row");
            continue;
        };
        let parsed = (
            record.get(0).and_then(|f| f.trim().parse::<f64>().ok()),
            record.get(1).and_then(|f| f.trim().parse::<f64>().ok()),
        );
        match parsed {
            (Some(x), Some(y)) => {
                xs.push(x);
                ys.push(y);
            }
            _ => tracing::warn!(line, "skipped row without numeric x,y"),
        }
    }

    if xs.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "CSV '{}' contains no usable (x, y) rows.",
            path.display()
        )));
    }
    XySamples::new(xs, ys)
}
