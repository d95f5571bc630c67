//! Fingerprint aggregation across the data-model levels.
//!
//! - run-set level: the extractor's row directly
//! - instance level: the run-set rows of every experiment covering the
//!   instance, concatenated horizontally (experiments without runs for the
//!   instance are skipped)
//! - experiment level: all of the experiment's run-set rows, concatenated
//!   horizontally
//! - set level: one row per instance / experiment, stacked with per-row
//!   identity; widths may differ when experiment coverage differs, so the
//!   stack is ragged by design and only [`FingerprintStack::to_matrix`]
//!   enforces uniformity
//!
//! Rows are cached through the owning entity's attribute store under the
//! `Temporary` policy, so a global trim can release the memory and a later
//! request recomputes transparently.

use nalgebra::DMatrix;
use rayon::prelude::*;

use crate::cache::{Attribute, StoragePolicy};
use crate::domain::{Dimension, Experiment, ExperimentSet, Instance, Level, RunSet};
use crate::error::AppError;
use crate::fingerprint::extract_row;

/// One named fingerprint row.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintRow {
    pub name: String,
    pub values: Vec<f64>,
}

/// A vertically stacked set of fingerprint rows; possibly ragged.
#[derive(Debug, Clone, PartialEq)]
pub struct FingerprintStack {
    pub rows: Vec<FingerprintRow>,
}

impl FingerprintStack {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Width shared by all rows, or `None` when the stack is ragged.
    pub fn uniform_width(&self) -> Option<usize> {
        let mut widths = self.rows.iter().map(|r| r.values.len());
        let first = widths.next()?;
        widths.all(|w| w == first).then_some(first)
    }

    /// Convert to a dense matrix; fails fast on ragged or empty stacks.
    pub fn to_matrix(&self) -> Result<DMatrix<f64>, AppError> {
        if self.rows.is_empty() {
            return Err(AppError::insufficient_data(
                "Cannot build a matrix from an empty fingerprint stack.",
            ));
        }
        let Some(width) = self.uniform_width() else {
            return Err(AppError::invalid_input(
                "Fingerprint rows have differing widths; matrix conversion requires \
                 uniform experiment coverage.",
            ));
        };
        Ok(DMatrix::from_fn(self.rows.len(), width, |i, j| {
            self.rows[i].values[j]
        }))
    }
}

/// Cached per-run-set fingerprint row.
struct RunSetFingerprint;

/// View pairing a run set with the dimension list it was recorded under.
pub struct RunSetScope<'a> {
    pub dims: &'a [Dimension],
    pub run_set: &'a RunSet,
}

impl Attribute<RunSetScope<'_>> for RunSetFingerprint {
    type Value = Vec<f64>;

    fn policy(&self) -> StoragePolicy {
        StoragePolicy::Temporary
    }

    fn compute(&self, scope: &RunSetScope<'_>) -> Result<Vec<f64>, AppError> {
        extract_row(scope.run_set.runs(), scope.dims)
    }
}

/// Fingerprint row of one run set, through its attribute store.
pub fn run_set_fingerprint(dims: &[Dimension], run_set: &RunSet) -> Result<Vec<f64>, AppError> {
    let scope = RunSetScope { dims, run_set };
    let row = run_set.attrs().get(&scope, &RunSetFingerprint)?;
    Ok((*row).clone())
}

struct InstanceFingerprint;

/// View pairing an instance with the set it belongs to.
pub struct InstanceScope<'a> {
    pub set: &'a ExperimentSet,
    pub instance: &'a Instance,
}

impl Attribute<InstanceScope<'_>> for InstanceFingerprint {
    type Value = Vec<f64>;

    fn policy(&self) -> StoragePolicy {
        StoragePolicy::Temporary
    }

    fn compute(&self, scope: &InstanceScope<'_>) -> Result<Vec<f64>, AppError> {
        let dims = scope.set.dimensions();
        let mut row = Vec::new();
        let mut covered = 0usize;
        for experiment in scope.set.experiments() {
            let Some(run_set) = experiment.run_set_for(scope.instance.name()) else {
                continue;
            };
            covered += 1;
            row.extend_from_slice(&run_set_fingerprint(dims, run_set)?);
        }
        if covered == 0 {
            return Err(AppError::insufficient_data(format!(
                "No experiment has runs for instance '{}'.",
                scope.instance.name()
            )));
        }
        Ok(row)
    }
}

/// Fingerprint row of one instance: run-set rows across all covering
/// experiments, concatenated horizontally.
pub fn instance_fingerprint(set: &ExperimentSet, instance: &Instance) -> Result<Vec<f64>, AppError> {
    let scope = InstanceScope { set, instance };
    let row = instance.attrs().get(&scope, &InstanceFingerprint)?;
    Ok((*row).clone())
}

struct ExperimentFingerprint;

/// View pairing an experiment with the set it belongs to.
pub struct ExperimentScope<'a> {
    pub set: &'a ExperimentSet,
    pub experiment: &'a Experiment,
}

impl Attribute<ExperimentScope<'_>> for ExperimentFingerprint {
    type Value = Vec<f64>;

    fn policy(&self) -> StoragePolicy {
        StoragePolicy::Temporary
    }

    fn compute(&self, scope: &ExperimentScope<'_>) -> Result<Vec<f64>, AppError> {
        let dims = scope.set.dimensions();
        if scope.experiment.run_sets().is_empty() {
            return Err(AppError::insufficient_data(format!(
                "Experiment '{}' has no run sets to fingerprint.",
                scope.experiment.name()
            )));
        }
        let mut row = Vec::new();
        for run_set in scope.experiment.run_sets() {
            row.extend_from_slice(&run_set_fingerprint(dims, run_set)?);
        }
        Ok(row)
    }
}

/// Fingerprint row of one experiment: all its run-set rows concatenated.
pub fn experiment_fingerprint(
    set: &ExperimentSet,
    experiment: &Experiment,
) -> Result<Vec<f64>, AppError> {
    let scope = ExperimentScope { set, experiment };
    let row = experiment.attrs().get(&scope, &ExperimentFingerprint)?;
    Ok((*row).clone())
}

/// Stack one fingerprint row per entity at the requested level.
///
/// Entities without any usable runs are omitted from the stack; an entirely
/// empty stack is an error. Extraction is independent per entity and runs in
/// parallel.
pub fn fingerprint_stack(set: &ExperimentSet, level: Level) -> Result<FingerprintStack, AppError> {
    let rows: Vec<Option<FingerprintRow>> = match level {
        Level::Instances => set
            .instances()
            .par_iter()
            .map(|instance| stack_row(instance.name(), instance_fingerprint(set, instance)))
            .collect::<Result<_, _>>()?,
        Level::Experiments => set
            .experiments()
            .par_iter()
            .map(|experiment| stack_row(experiment.name(), experiment_fingerprint(set, experiment)))
            .collect::<Result<_, _>>()?,
    };

    let rows: Vec<FingerprintRow> = rows.into_iter().flatten().collect();
    if rows.is_empty() {
        return Err(AppError::insufficient_data(format!(
            "No {} with runs to fingerprint.",
            level.display_name()
        )));
    }
    Ok(FingerprintStack { rows })
}

/// Missing coverage (exit code 3) skips the row; anything else propagates.
fn stack_row(
    name: &str,
    row: Result<Vec<f64>, AppError>,
) -> Result<Option<FingerprintRow>, AppError> {
    match row {
        Ok(values) => Ok(Some(FingerprintRow {
            name: name.to_string(),
            values,
        })),
        Err(e) if e.exit_code() == 3 => {
            tracing::debug!(entity = name, error = %e, "skipping entity without coverage");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// Release every `Temporary` cached fingerprint in the set.
pub fn trim_fingerprints(set: &ExperimentSet) -> Result<(), AppError> {
    for instance in set.instances() {
        instance.attrs().trim()?;
    }
    for experiment in set.experiments() {
        experiment.attrs().trim()?;
        for run_set in experiment.run_sets() {
            run_set.attrs().trim()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{DataPoint, DimKind, DimType, Run};
    use crate::fingerprint::row_width;

    fn dims2() -> Vec<Dimension> {
        vec![
            Dimension {
                index: 0,
                name: "step".into(),
                data_type: DimType::Int,
                kind: DimKind::Time,
            },
            Dimension {
                index: 1,
                name: "quality".into(),
                data_type: DimType::Float,
                kind: DimKind::Quality,
            },
        ]
    }

    fn simple_run() -> Run {
        Run::new(vec![
            DataPoint::new(vec![0.0, 10.0]),
            DataPoint::new(vec![10.0, 0.0]),
        ])
        .unwrap()
    }

    fn set_with_partial_coverage() -> ExperimentSet {
        // e1 covers i1 and i2; e2 covers only i1.
        let e1 = Experiment::new(
            "e1",
            vec![
                RunSet::new("i1", vec![simple_run()]).unwrap(),
                RunSet::new("i2", vec![simple_run()]).unwrap(),
            ],
        );
        let e2 = Experiment::new("e2", vec![RunSet::new("i1", vec![simple_run()]).unwrap()]);
        ExperimentSet::new(
            dims2(),
            vec![Instance::new("i1"), Instance::new("i2")],
            vec![e1, e2],
        )
        .unwrap()
    }

    #[test]
    fn instance_rows_concatenate_only_covering_experiments() {
        let set = set_with_partial_coverage();
        let w = row_width(2);

        let i1 = instance_fingerprint(&set, set.instance("i1").unwrap()).unwrap();
        let i2 = instance_fingerprint(&set, set.instance("i2").unwrap()).unwrap();
        assert_eq!(i1.len(), 2 * w);
        assert_eq!(i2.len(), w);
    }

    #[test]
    fn instance_stack_tolerates_ragged_widths_but_matrix_does_not() {
        let set = set_with_partial_coverage();
        let stack = fingerprint_stack(&set, Level::Instances).unwrap();
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.uniform_width(), None);
        assert!(stack.to_matrix().is_err());
    }

    #[test]
    fn experiment_stack_is_uniform_for_equal_coverage() {
        let set = set_with_partial_coverage();
        let stack = fingerprint_stack(&set, Level::Experiments).unwrap();
        // e1 has two run sets, e2 one: ragged here as well.
        assert_eq!(stack.len(), 2);
        assert_eq!(stack.rows[0].name, "e1");
        assert_eq!(stack.rows[0].values.len(), 2 * row_width(2));
        assert_eq!(stack.rows[1].values.len(), row_width(2));
    }

    #[test]
    fn uncovered_instance_is_skipped_not_fatal() {
        let e1 = Experiment::new("e1", vec![RunSet::new("i1", vec![simple_run()]).unwrap()]);
        let set = ExperimentSet::new(
            dims2(),
            vec![Instance::new("i1"), Instance::new("orphan")],
            vec![e1],
        )
        .unwrap();
        let stack = fingerprint_stack(&set, Level::Instances).unwrap();
        assert_eq!(stack.len(), 1);
        assert_eq!(stack.rows[0].name, "i1");
    }

    #[test]
    fn set_without_any_runs_fails_fast() {
        let set = ExperimentSet::new(dims2(), vec![Instance::new("i1")], Vec::new()).unwrap();
        let err = fingerprint_stack(&set, Level::Instances).unwrap_err();
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn cached_rows_survive_until_trim() {
        let set = set_with_partial_coverage();
        let instance = set.instance("i1").unwrap();
        let _ = instance_fingerprint(&set, instance).unwrap();
        assert_eq!(instance.attrs().stored_len().unwrap(), 1);

        trim_fingerprints(&set).unwrap();
        assert_eq!(instance.attrs().stored_len().unwrap(), 0);

        // A trimmed entry recomputes transparently.
        let row = instance_fingerprint(&set, instance).unwrap();
        assert_eq!(row.len(), 2 * row_width(2));
    }

    #[test]
    fn matrix_conversion_round_trips_uniform_stacks() {
        let stack = FingerprintStack {
            rows: vec![
                FingerprintRow {
                    name: "a".into(),
                    values: vec![1.0, 2.0],
                },
                FingerprintRow {
                    name: "b".into(),
                    values: vec![3.0, 4.0],
                },
            ],
        };
        let m = stack.to_matrix().unwrap();
        assert_eq!(m.nrows(), 2);
        assert_eq!(m[(1, 0)], 3.0);
    }
}
