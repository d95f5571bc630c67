//! Shared domain types.
//!
//! The experiment data model is deliberately flat: an [`ExperimentSet`] owns
//! dimensions, instances, and experiments; an [`Experiment`] owns one
//! [`RunSet`] per instance it covers; a [`Run`] is an ordered, non-empty,
//! immutable sequence of data points. Everything downstream (fingerprints,
//! clustering) consumes these through read accessors only.

use std::path::PathBuf;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::cache::AttributeStore;
use crate::error::AppError;

/// Storage type of a dimension's values.
///
/// This only decides how exact-match lookups compare values: integer
/// dimensions compare as `i64`, float dimensions as `f64`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimType {
    Int,
    Float,
}

/// Semantic kind of a dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DimKind {
    /// Time-like measure (steps, evaluations, wall clock).
    Time,
    /// Quality-like measure (objective value, error).
    Quality,
}

/// One measured dimension of the recorded curves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub index: usize,
    pub name: String,
    pub data_type: DimType,
    pub kind: DimKind,
}

/// One recorded instant of a run: one value per dimension.
#[derive(Debug, Clone, PartialEq)]
pub struct DataPoint {
    values: Vec<f64>,
}

impl DataPoint {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values }
    }

    /// Value of the dimension with the given index.
    ///
    /// # Panics
    /// Panics if `dim_index` is out of range; points are always constructed
    /// with one value per dimension of the owning set.
    pub fn value(&self, dim_index: usize) -> f64 {
        self.values[dim_index]
    }

    pub fn width(&self) -> usize {
        self.values.len()
    }
}

/// An ordered, non-empty sequence of data points; immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    points: Vec<DataPoint>,
}

impl Run {
    pub fn new(points: Vec<DataPoint>) -> Result<Self, AppError> {
        if points.is_empty() {
            return Err(AppError::internal("A run must contain at least one data point."));
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[DataPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn first(&self) -> &DataPoint {
        &self.points[0]
    }

    pub fn last(&self) -> &DataPoint {
        &self.points[self.points.len() - 1]
    }
}

/// All runs one experiment recorded on one instance.
#[derive(Debug)]
pub struct RunSet {
    instance: String,
    runs: Vec<Run>,
    attrs: AttributeStore,
}

impl RunSet {
    pub fn new(instance: impl Into<String>, runs: Vec<Run>) -> Result<Self, AppError> {
        let instance = instance.into();
        if runs.is_empty() {
            return Err(AppError::internal(format!(
                "Run set for instance '{instance}' must contain at least one run."
            )));
        }
        Ok(Self {
            instance,
            runs,
            attrs: AttributeStore::new(),
        })
    }

    pub fn instance(&self) -> &str {
        &self.instance
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn attrs(&self) -> &AttributeStore {
        &self.attrs
    }
}

/// A benchmark instance (problem) shared by all experiments.
#[derive(Debug)]
pub struct Instance {
    name: String,
    attrs: AttributeStore,
}

impl Instance {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attrs: AttributeStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attrs(&self) -> &AttributeStore {
        &self.attrs
    }
}

/// One algorithm setup, with a run set per instance it was applied to.
#[derive(Debug)]
pub struct Experiment {
    name: String,
    run_sets: Vec<RunSet>,
    attrs: AttributeStore,
}

impl Experiment {
    pub fn new(name: impl Into<String>, run_sets: Vec<RunSet>) -> Self {
        Self {
            name: name.into(),
            run_sets,
            attrs: AttributeStore::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn run_sets(&self) -> &[RunSet] {
        &self.run_sets
    }

    /// The run set recorded for `instance`, if this experiment covers it.
    pub fn run_set_for(&self, instance: &str) -> Option<&RunSet> {
        self.run_sets.iter().find(|rs| rs.instance() == instance)
    }

    pub fn attrs(&self) -> &AttributeStore {
        &self.attrs
    }
}

/// Root of the experiment data model.
#[derive(Debug)]
pub struct ExperimentSet {
    dimensions: Vec<Dimension>,
    instances: Vec<Instance>,
    experiments: Vec<Experiment>,
}

impl ExperimentSet {
    pub fn new(
        dimensions: Vec<Dimension>,
        instances: Vec<Instance>,
        experiments: Vec<Experiment>,
    ) -> Result<Self, AppError> {
        if dimensions.len() < 2 {
            return Err(AppError::insufficient_data(
                "An experiment set needs at least two dimensions.",
            ));
        }
        for (i, d) in dimensions.iter().enumerate() {
            if d.index != i {
                return Err(AppError::internal(format!(
                    "Dimension '{}' has index {} but sits at position {i}.",
                    d.name, d.index
                )));
            }
        }
        Ok(Self {
            dimensions,
            instances,
            experiments,
        })
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    pub fn instances(&self) -> &[Instance] {
        &self.instances
    }

    pub fn experiments(&self) -> &[Experiment] {
        &self.experiments
    }

    pub fn instance(&self, name: &str) -> Option<&Instance> {
        self.instances.iter().find(|i| i.name() == name)
    }

    pub fn experiment(&self, name: &str) -> Option<&Experiment> {
        self.experiments.iter().find(|e| e.name() == name)
    }

    /// Total number of recorded runs across all experiments.
    pub fn total_runs(&self) -> usize {
        self.experiments
            .iter()
            .flat_map(|e| e.run_sets())
            .map(|rs| rs.runs().len())
            .sum()
    }
}

/// Aggregation level for fingerprints and clustering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    /// One fingerprint row per instance.
    Instances,
    /// One fingerprint row per experiment.
    Experiments,
}

impl Level {
    pub fn display_name(self) -> &'static str {
        match self {
            Level::Instances => "instances",
            Level::Experiments => "experiments",
        }
    }
}

/// Which parametric model the `guess` command exercises.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelChoice {
    Decay,
    Logistic,
    Quadratic,
}

impl ModelChoice {
    pub fn display_name(self) -> &'static str {
        match self {
            ModelChoice::Decay => "decay",
            ModelChoice::Logistic => "logistic",
            ModelChoice::Quadratic => "quadratic",
        }
    }
}

/// Grid settings for synthetic run generation.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthSpec {
    pub experiments: usize,
    pub instances: usize,
    pub runs: usize,
    pub points: usize,
    /// Multiplicative noise level applied per run.
    pub noise: f64,
    pub seed: u64,
}

impl SynthSpec {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.experiments == 0 || self.instances == 0 || self.runs == 0 {
            return Err(AppError::invalid_input(
                "Synthetic grid needs at least one experiment, instance, and run.",
            ));
        }
        if self.points < 2 {
            return Err(AppError::invalid_input(
                "Synthetic runs need at least two points per run.",
            ));
        }
        if !self.noise.is_finite() || self.noise < 0.0 {
            return Err(AppError::invalid_input("Noise level must be finite and >= 0."));
        }
        Ok(())
    }
}

/// A full analysis run's configuration as understood by the pipeline.
///
/// This is derived from CLI flags (plus defaults).
#[derive(Debug, Clone)]
pub struct AnalysisConfig {
    /// Run CSV to ingest; when absent, a synthetic set is generated.
    pub input: Option<PathBuf>,
    pub synth: SynthSpec,
    pub level: Level,
    /// Number of clusters for the `cluster` command.
    pub clusters: usize,
    pub export_csv: Option<PathBuf>,
    pub export_json: Option<PathBuf>,
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<(), AppError> {
        self.synth.validate()?;
        if self.clusters == 0 {
            return Err(AppError::invalid_input("Cluster count must be >= 1."));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_rejects_empty_point_list() {
        assert!(Run::new(Vec::new()).is_err());
    }

    #[test]
    fn experiment_set_rejects_misindexed_dimensions() {
        let dims = vec![
            Dimension {
                index: 0,
                name: "t".into(),
                data_type: DimType::Int,
                kind: DimKind::Time,
            },
            Dimension {
                index: 2,
                name: "q".into(),
                data_type: DimType::Float,
                kind: DimKind::Quality,
            },
        ];
        assert!(ExperimentSet::new(dims, Vec::new(), Vec::new()).is_err());
    }

    #[test]
    fn run_set_lookup_by_instance_name() {
        let point = DataPoint::new(vec![1.0, 2.0]);
        let run = Run::new(vec![point]).unwrap();
        let rs = RunSet::new("i1", vec![run]).unwrap();
        let exp = Experiment::new("e1", vec![rs]);
        assert!(exp.run_set_for("i1").is_some());
        assert!(exp.run_set_for("i2").is_none());
    }
}
