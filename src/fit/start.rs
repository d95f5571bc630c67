//! Multi-start scoring of initial guesses.
//!
//! An external optimizer owns the real convergence loop; this module only
//! exercises the guesser the way such an optimizer's restart logic would:
//! draw several starts, score each by its sum of squared residuals, and keep
//! the best. The winner is canonicalized and, when an optimizer is supplied,
//! handed over for refinement.

use rand::RngCore;

use crate::error::AppError;
use crate::fit::XySamples;
use crate::models::ParametricModel;

/// Seam for an external iterative nonlinear least-squares optimizer.
///
/// `refine` polishes `params` in place and returns the final residual error.
pub trait CurveOptimizer {
    fn refine(
        &self,
        model: &dyn ParametricModel,
        data: &XySamples,
        params: &mut [f64],
    ) -> Result<f64, AppError>;
}

/// The best starting point found by multi-start guessing.
#[derive(Debug, Clone)]
pub struct GuessReport {
    pub params: Vec<f64>,
    /// Sum of squared residuals of `params` over the data.
    pub sse: f64,
    /// Number of starts drawn.
    pub starts: usize,
    /// Residual error reported by the optimizer, when one was supplied.
    pub refined_sse: Option<f64>,
}

/// Sum of squared residuals; `+inf` when any prediction is non-finite.
pub fn sum_squared_residuals(
    model: &dyn ParametricModel,
    data: &XySamples,
    params: &[f64],
) -> f64 {
    let mut sse = 0.0;
    for i in 0..data.len() {
        let r = data.y(i) - model.value(data.x(i), params);
        if !r.is_finite() {
            return f64::INFINITY;
        }
        sse += r * r;
    }
    sse
}

/// Draw `starts` guesses, keep the lowest-error one, canonicalize it, and
/// optionally refine it with an external optimizer.
pub fn best_start(
    model: &dyn ParametricModel,
    data: &XySamples,
    rng: &mut dyn RngCore,
    starts: usize,
    optimizer: Option<&dyn CurveOptimizer>,
) -> Result<GuessReport, AppError> {
    if starts == 0 {
        return Err(AppError::invalid_input("Number of starts must be >= 1."));
    }

    let guesser = model.guesser(data);
    let mut params = vec![0.0; model.param_count()];
    let mut best_params = params.clone();
    let mut best_sse = f64::INFINITY;

    for i in 0..starts {
        guesser.random_guess(&mut params, rng);
        let sse = sum_squared_residuals(model, data, &params);
        tracing::debug!(start = i, sse, "scored guess");
        if sse < best_sse || i == 0 {
            best_sse = sse;
            best_params.copy_from_slice(&params);
        }
    }

    model.canonicalize(&mut best_params);
    // Canonicalization maps to an equivalent parameter vector; re-score so
    // the reported error matches the reported parameters.
    let sse = sum_squared_residuals(model, data, &best_params);

    let refined_sse = match optimizer {
        Some(opt) => Some(opt.refine(model, data, &mut best_params)?),
        None => None,
    };

    Ok(GuessReport {
        params: best_params,
        sse,
        starts,
        refined_sse,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DecayModel, PolyModel};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn zero_starts_is_an_input_error() {
        let data = XySamples::new(vec![1.0], vec![1.0]).unwrap();
        let mut rng = StdRng::seed_from_u64(0);
        let err = best_start(&DecayModel, &data, &mut rng, 0, None).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn quadratic_data_yields_a_near_exact_start() {
        // With >3 samples the polynomial guesser solves three of them exactly,
        // which is exact everywhere for noise-free quadratic data.
        let xs: Vec<f64> = (0..12).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 2.0 - 0.5 * x + 0.1 * x * x).collect();
        let data = XySamples::new(xs, ys).unwrap();
        let mut rng = StdRng::seed_from_u64(9);

        let report = best_start(&PolyModel, &data, &mut rng, 4, None).unwrap();
        assert!(report.sse < 1e-16, "sse {} should be ~0", report.sse);
        assert_eq!(report.starts, 4);
    }

    #[test]
    fn decay_start_is_always_produced_and_canonical() {
        let xs: Vec<f64> = (1..30).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| (-0.3f64 * x.powf(-0.5)).exp_m1().abs()).collect();
        let data = XySamples::new(xs, ys).unwrap();
        let mut rng = StdRng::seed_from_u64(1);

        let report = best_start(&DecayModel, &data, &mut rng, 8, None).unwrap();
        assert_eq!(report.params.len(), 2);
        assert!(report.params[0] <= 0.0 && report.params[1] <= 0.0);
        assert!(report.params.iter().all(|p| p.is_finite()));
    }

    struct HalvingOptimizer;

    impl CurveOptimizer for HalvingOptimizer {
        fn refine(
            &self,
            model: &dyn ParametricModel,
            data: &XySamples,
            params: &mut [f64],
        ) -> Result<f64, AppError> {
            Ok(sum_squared_residuals(model, data, params) / 2.0)
        }
    }

    #[test]
    fn optimizer_seam_receives_the_chosen_start() {
        let xs: Vec<f64> = (0..6).map(|i| i as f64).collect();
        let ys: Vec<f64> = xs.iter().map(|x| 1.0 + x).collect();
        let data = XySamples::new(xs, ys).unwrap();
        let mut rng = StdRng::seed_from_u64(2);

        let report = best_start(&PolyModel, &data, &mut rng, 2, Some(&HalvingOptimizer)).unwrap();
        let refined = report.refined_sse.unwrap();
        assert!((refined - report.sse / 2.0).abs() < 1e-12);
    }
}
