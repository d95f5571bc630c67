//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - parses CLI arguments
//! - sets up logging
//! - runs the analysis pipeline
//! - prints reports
//! - writes optional exports

use clap::Parser;
use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing_subscriber::EnvFilter;

use crate::cli::{AnalyzeArgs, Command, GuessArgs, SampleArgs, SynthArgs};
use crate::cluster::KMeansEngine;
use crate::domain::{AnalysisConfig, SynthSpec};
use crate::error::AppError;

pub mod pipeline;

/// Entry point for the `bcurves` binary.
pub fn run() -> Result<(), AppError> {
    let cli = crate::cli::Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Fingerprint(args) => handle_analyze(args, OutputMode::Fingerprints),
        Command::Cluster(args) => handle_analyze(args, OutputMode::Groups),
        Command::Guess(args) => handle_guess(args),
        Command::Sample(args) => handle_sample(args),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(std::io::stderr)
        .init();
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputMode {
    Fingerprints,
    Groups,
}

fn handle_analyze(args: AnalyzeArgs, mode: OutputMode) -> Result<(), AppError> {
    let config = analysis_config_from_args(&args);
    let out = pipeline::run_analysis(&config)?;

    println!("{}", crate::report::format_set_summary(&out.ingest, &out.source));
    println!(
        "{}",
        crate::report::format_fingerprint_summary(&out.stack, config.level)
    );

    if mode == OutputMode::Groups {
        let groups = crate::cluster::group_entities(&out.stack, &KMeansEngine, config.clusters)?;
        println!(
            "{}",
            crate::report::format_groups(&groups, config.level, config.clusters)
        );
        if let Some(path) = &config.export_json {
            crate::io::write_groups_json(path, config.level, config.clusters, &groups)?;
        }
    }

    if let Some(path) = &config.export_csv {
        crate::io::write_fingerprint_csv(path, &out.stack)?;
    }

    Ok(())
}

fn handle_guess(args: GuessArgs) -> Result<(), AppError> {
    let model = crate::models::model_for(args.model);

    let (data, truth) = match &args.input {
        Some(path) => (crate::io::load_xy_csv(path)?, None),
        None => {
            let (data, params) =
                crate::data::generate_series(model.as_ref(), args.points, args.noise, args.seed)?;
            (data, Some(params))
        }
    };

    let mut rng = StdRng::seed_from_u64(args.seed);
    let report = crate::fit::best_start(model.as_ref(), &data, &mut rng, args.starts, None)?;

    println!(
        "{}",
        crate::report::format_guess_report(model.name(), &report, truth.as_deref())
    );
    Ok(())
}

fn handle_sample(args: SampleArgs) -> Result<(), AppError> {
    let spec = synth_spec_from_args(&args.synth);
    let set = crate::data::generate_set(&spec)?;
    crate::io::write_runs_csv(&args.output, &set)?;

    println!(
        "Wrote {} runs ({} experiments x {} instances) to {}",
        set.total_runs(),
        spec.experiments,
        spec.instances,
        args.output.display()
    );
    Ok(())
}

pub fn analysis_config_from_args(args: &AnalyzeArgs) -> AnalysisConfig {
    AnalysisConfig {
        input: args.input.clone(),
        synth: synth_spec_from_args(&args.synth),
        level: args.level,
        clusters: args.clusters,
        export_csv: args.export_csv.clone(),
        export_json: args.export_json.clone(),
    }
}

fn synth_spec_from_args(args: &SynthArgs) -> SynthSpec {
    SynthSpec {
        experiments: args.experiments,
        instances: args.instances,
        runs: args.runs,
        points: args.points,
        noise: args.noise,
        seed: args.seed,
    }
}
