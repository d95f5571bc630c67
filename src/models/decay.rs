//! Exponential decay model `f(x) = -expm1(a * x^b)`.
//!
//! With `a < 0, b < 0` the curve falls from its ceiling of 1 (as `x -> 0+`)
//! towards 0 for large `x`, the typical shape of a normalized quality curve.
//!
//! Numerics: when `x <= 0`, or `x^b` underflows to 0, or `a * x^b` underflows
//! to 0, the exponent carries no information anymore; the value is pinned to
//! the ceiling 1 and the gradient to 0 instead of computing through a
//! meaningless near-zero exponent.

use rand::Rng;
use rand::RngCore;
use rand_distr::StandardNormal;

use crate::fit::{GuessStrategy, SpreadGuesser, XySamples};
use crate::models::{ParameterGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct DecayModel;

/// The inner exponent `a * x^b`, or `None` in the degenerate regime.
fn exponent(x: f64, a: f64, b: f64) -> Option<f64> {
    if x <= 0.0 {
        return None;
    }
    let xb = x.powf(b);
    if xb == 0.0 {
        return None;
    }
    let e = a * xb;
    if e == 0.0 {
        return None;
    }
    Some(e)
}

fn random_decay_guess(params: &mut [f64], rng: &mut dyn RngCore) {
    let n: f64 = rng.sample(StandardNormal);
    params[0] = -1e-2 * n.abs();
    params[1] = -rng.gen_range(0.0..1.0);
}

impl ParametricModel for DecayModel {
    fn name(&self) -> &'static str {
        "decay"
    }

    fn param_count(&self) -> usize {
        2
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        match exponent(x, params[0], params[1]) {
            None => 1.0,
            Some(e) => -e.exp_m1(),
        }
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (a, b) = (params[0], params[1]);
        let Some(e) = exponent(x, a, b) else {
            out[0] = 0.0;
            out[1] = 0.0;
            return;
        };
        let xb = x.powf(b);
        let scale = -e.exp();
        // d/da = -x^b * exp(a x^b); d/db = -a x^b ln(x) * exp(a x^b)
        let da = scale * xb;
        let db = scale * a * xb * x.ln();
        out[0] = if da.is_finite() { da } else { 0.0 };
        out[1] = if db.is_finite() { db } else { 0.0 };
    }

    /// The family is symmetric under flipping the signs of both parameters;
    /// the canonical representative has `a <= 0` and `b <= 0`.
    fn canonicalize(&self, params: &mut [f64]) {
        if params[0] > 0.0 {
            params[0] = -params[0];
        }
        if params[1] > 0.0 {
            params[1] = -params[1];
        }
    }

    fn random_guess(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_decay_guess(params, rng);
    }

    fn guesser<'a>(&self, data: &'a XySamples) -> Box<dyn ParameterGuesser + 'a> {
        Box::new(SpreadGuesser::new(data, DecayGuessStrategy))
    }
}

/// The decay model has no closed-form point solvers; every guess comes from
/// the scaffold's fallback path.
struct DecayGuessStrategy;

impl GuessStrategy for DecayGuessStrategy {
    fn fallback(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_decay_guess(params, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn non_positive_x_is_pinned_to_the_ceiling() {
        let m = DecayModel;
        let params = [-0.5, -0.7];
        assert_eq!(m.value(0.0, &params), 1.0);
        assert_eq!(m.value(-3.0, &params), 1.0);

        let mut grad = [f64::NAN; 2];
        m.gradient(-1.0, &params, &mut grad);
        assert_eq!(grad, [0.0, 0.0]);
    }

    #[test]
    fn valid_parameters_stay_in_unit_interval_and_decrease_in_x() {
        let m = DecayModel;
        let params = [-0.3, -0.8];
        let mut prev = 1.0;
        for i in 1..200 {
            let x = i as f64 * 0.25;
            let v = m.value(x, &params);
            assert!(v > 0.0 && v <= 1.0, "value {v} at x={x} out of (0, 1]");
            assert!(v <= prev + 1e-15, "curve must not increase with x");
            prev = v;
        }
    }

    #[test]
    fn value_matches_expm1_identity() {
        let m = DecayModel;
        let (a, b) = (-0.2, -0.5);
        let x = 3.0f64;
        let expected = -((a * x.powf(b)).exp() - 1.0);
        assert!((m.value(x, &[a, b]) - expected).abs() < 1e-12);
    }

    #[test]
    fn underflowing_exponent_is_pinned_to_the_ceiling() {
        let m = DecayModel;
        // x^b underflows to zero for a huge x with a strongly negative b.
        assert_eq!(m.value(1e300, &[-0.5, -2.0]), 1.0);
        // a * x^b underflows when a itself is subnormal-small.
        assert_eq!(m.value(1e8, &[-1e-320, -2.0]), 1.0);
    }

    #[test]
    fn canonicalize_forces_non_positive_signs_and_is_idempotent() {
        let m = DecayModel;
        let mut params = [0.4, 0.9];
        m.canonicalize(&mut params);
        assert!(params[0] <= 0.0 && params[1] <= 0.0);
        let once = params;
        m.canonicalize(&mut params);
        assert_eq!(params, once);
    }

    #[test]
    fn random_guess_draws_canonical_parameters() {
        let m = DecayModel;
        let mut rng = StdRng::seed_from_u64(42);
        let mut params = [0.0; 2];
        for _ in 0..50 {
            m.random_guess(&mut params, &mut rng);
            assert!(params[0] <= 0.0 && params[0] >= -1.0);
            assert!(params[1] <= 0.0 && params[1] > -1.0);
        }
    }

    #[test]
    fn gradient_is_finite_in_the_regular_regime() {
        let m = DecayModel;
        let mut grad = [0.0; 2];
        m.gradient(2.0, &[-0.3, -0.8], &mut grad);
        assert!(grad.iter().all(|g| g.is_finite()));
        // f = 1 - exp(a x^b), so df/da = -x^b exp(a x^b) < 0 everywhere.
        assert!(grad[0] < 0.0);
    }
}
