//! Command-line parsing for the benchmark curve analyzer.
//!
//! The goal of this module is to keep **argument parsing** and **command
//! dispatch** separate from the modeling/math code.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::domain::{Level, ModelChoice};

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "bcurves", version, about = "Benchmark curve fingerprinting and clustering")]
pub struct Cli {
    /// Log debug-level diagnostics to stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract fingerprints from run data and print them (optionally export CSV).
    Fingerprint(AnalyzeArgs),
    /// Extract fingerprints, cluster them, and print the groups.
    Cluster(AnalyzeArgs),
    /// Draw random starting parameters for a model and report the best one.
    Guess(GuessArgs),
    /// Generate a synthetic run CSV for experimentation.
    Sample(SampleArgs),
}

/// Synthetic-grid settings shared by commands that can generate their input.
#[derive(Debug, Args, Clone)]
pub struct SynthArgs {
    /// Number of synthetic experiments (algorithm setups).
    #[arg(long, default_value_t = 4)]
    pub experiments: usize,

    /// Number of synthetic instances per experiment.
    #[arg(long, default_value_t = 6)]
    pub instances: usize,

    /// Number of runs per experiment/instance pair.
    #[arg(long, default_value_t = 10)]
    pub runs: usize,

    /// Number of recorded points per run.
    #[arg(long, default_value_t = 25)]
    pub points: usize,

    /// Multiplicative noise level on generated quality values.
    #[arg(long, default_value_t = 0.05)]
    pub noise: f64,

    /// Random seed for synthetic generation.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Common options for fingerprinting and clustering.
#[derive(Debug, Parser, Clone)]
pub struct AnalyzeArgs {
    /// Run CSV to analyze; omitted means a synthetic set is generated.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Aggregation level for fingerprints and clusters.
    #[arg(short, long, value_enum, default_value_t = Level::Instances)]
    pub level: Level,

    /// Number of clusters (used by `cluster`).
    #[arg(short = 'k', long, default_value_t = 2)]
    pub clusters: usize,

    /// Export the fingerprint rows to CSV.
    #[arg(long = "export-csv")]
    pub export_csv: Option<PathBuf>,

    /// Export the cluster groups to JSON.
    #[arg(long = "export-json")]
    pub export_json: Option<PathBuf>,

    #[command(flatten)]
    pub synth: SynthArgs,
}

/// Options for the parameter-guessing demo.
#[derive(Debug, Parser)]
pub struct GuessArgs {
    /// Which parametric model to guess for.
    #[arg(short, long, value_enum, default_value_t = ModelChoice::Decay)]
    pub model: ModelChoice,

    /// Two-column x,y CSV; omitted means a series is synthesized from the model.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Number of random starts to draw.
    #[arg(long, default_value_t = 25)]
    pub starts: usize,

    /// Number of points for a synthesized series.
    #[arg(long, default_value_t = 40)]
    pub points: usize,

    /// Additive noise level for a synthesized series.
    #[arg(long, default_value_t = 0.01)]
    pub noise: f64,

    /// Random seed for generation and guessing.
    #[arg(long, default_value_t = 42)]
    pub seed: u64,
}

/// Options for synthetic run CSV generation.
#[derive(Debug, Parser)]
pub struct SampleArgs {
    /// Output CSV path.
    #[arg(short, long)]
    pub output: PathBuf,

    #[command(flatten)]
    pub synth: SynthArgs,
}
