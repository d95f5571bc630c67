//! Synthetic experiment-set generation.
//!
//! Produces decay-shaped runs over a configurable grid of experiments x
//! instances x runs x points. Experiments alternate between a fast- and a
//! slow-decay regime with per-experiment parameter jitter and per-run
//! multiplicative noise, so the clustering demo has real structure to find.
//! Generation is deterministic: the RNG seed is derived by hashing the
//! generation settings.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{
    DataPoint, DimKind, DimType, Dimension, Experiment, ExperimentSet, Instance, Run, RunSet,
    SynthSpec,
};
use crate::error::AppError;
use crate::fit::XySamples;
use crate::models::ParametricModel;

/// Quality scale of the generated curves (start level at t -> 0).
const QUALITY_SCALE: f64 = 10.0;

/// Generate a full synthetic experiment set from the grid settings.
pub fn generate_set(spec: &SynthSpec) -> Result<ExperimentSet, AppError> {
    spec.validate()?;

    let mut rng = StdRng::seed_from_u64(grid_seed(spec));
    let normal: Normal<f64> = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let dims = vec![
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
    ];

    let instances: Vec<Instance> = (0..spec.instances)
        .map(|i| Instance::new(format!("inst-{:02}", i + 1)))
        .collect();

    let mut experiments = Vec::with_capacity(spec.experiments);
    for e in 0..spec.experiments {
        // Alternate decay regimes so experiment fingerprints form two camps.
        let (base_a, base_b) = if e % 2 == 0 { (-0.6, -0.9) } else { (-0.05, -0.3) };
        let a = base_a * (1.0 + 0.1 * normal.sample(&mut rng));
        let b = base_b * (1.0 + 0.1 * normal.sample(&mut rng));

        let mut run_sets = Vec::with_capacity(spec.instances);
        for instance in &instances {
            // Per-instance difficulty shifts the quality scale.
            let scale = QUALITY_SCALE * (1.0 + 0.2 * normal.sample(&mut rng)).abs().max(0.1);

            let mut runs = Vec::with_capacity(spec.runs);
            for _ in 0..spec.runs {
                let mut points = Vec::with_capacity(spec.points);
                for p in 0..spec.points {
                    let t = (p + 1) as f64;
                    let clean = scale * decay_value(t, a, b);
                    let noisy = clean * (1.0 + spec.noise * normal.sample(&mut rng));
                    points.push(DataPoint::new(vec![t, noisy]));
                }
                runs.push(Run::new(points)?);
            }
            run_sets.push(RunSet::new(instance.name(), runs)?);
        }
        experiments.push(Experiment::new(format!("algo-{:02}", e + 1), run_sets));
    }

    ExperimentSet::new(dims, instances, experiments)
}

/// Normalized decay curve used as the generator shape.
fn decay_value(t: f64, a: f64, b: f64) -> f64 {
    crate::models::DecayModel.value(t, &[a, b])
}

/// Synthesize a noisy `(x, y)` series from a model's own random parameters.
///
/// Returns the samples together with the generating parameter vector so
/// reports can show how close a guess came.
pub fn generate_series(
    model: &dyn ParametricModel,
    points: usize,
    noise: f64,
    seed: u64,
) -> Result<(XySamples, Vec<f64>), AppError> {
    if points == 0 {
        return Err(AppError::invalid_input("Series needs at least one point."));
    }
    if !noise.is_finite() || noise < 0.0 {
        return Err(AppError::invalid_input("Noise level must be finite and >= 0."));
    }

    let mut rng = StdRng::seed_from_u64(seed);
    let normal: Normal<f64> = Normal::new(0.0, 1.0)
        .map_err(|e| AppError::internal(format!("Noise distribution error: {e}")))?;

    let mut params = vec![0.0; model.param_count()];
    model.random_guess(&mut params, &mut rng);
    model.canonicalize(&mut params);

    let mut xs = Vec::with_capacity(points);
    let mut ys = Vec::with_capacity(points);
    for p in 0..points {
        let x = (p + 1) as f64;
        let y = model.value(x, &params) + noise * normal.sample(&mut rng);
        xs.push(x);
        ys.push(y);
    }
    Ok((XySamples::new(xs, ys)?, params))
}

fn grid_seed(spec: &SynthSpec) -> u64 {
    let mut hasher = DefaultHasher::new();
    spec.experiments.hash(&mut hasher);
    spec.instances.hash(&mut hasher);
    spec.runs.hash(&mut hasher);
    spec.points.hash(&mut hasher);
    spec.noise.to_bits().hash(&mut hasher);
    spec.seed.hash(&mut hasher);
    hasher.finish()
}
