//! Degree-2 polynomial model `f(x) = a + b*x + c*x^2`.
//!
//! Evaluation runs through the compensated accumulator so that terms of very
//! different magnitude (think `a ~ 1e-3`, `c*x^2 ~ 1e9`) do not erase each
//! other. The guesser is fully closed-form: degree-0 from one point, a
//! straight line from two, an exact quadratic from three. The solvers fail
//! only on exact numerical degeneracy such as duplicate x values.

use rand::RngCore;
use rand_distr::StandardNormal;

use rand::Rng;

use crate::fit::{GuessStrategy, SpreadGuesser, XySamples};
use crate::math::StableSum;
use crate::models::{ParameterGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct PolyModel;

fn random_poly_guess(params: &mut [f64], rng: &mut dyn RngCore) {
    for p in params.iter_mut() {
        *p = rng.sample(StandardNormal);
    }
}

impl ParametricModel for PolyModel {
    fn name(&self) -> &'static str {
        "quadratic"
    }

    fn param_count(&self) -> usize {
        3
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        let mut s = StableSum::new();
        s.reset();
        s.append(params[0]);
        s.append(params[1] * x);
        s.append(params[2] * x * x);
        s.value()
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let _ = params;
        out[0] = 1.0;
        out[1] = x;
        let xx = x * x;
        out[2] = if xx.is_finite() { xx } else { 0.0 };
        if !out[1].is_finite() {
            out[1] = 0.0;
        }
    }

    fn canonicalize(&self, _params: &mut [f64]) {
        // Coefficients are already unique per curve.
    }

    fn random_guess(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_poly_guess(params, rng);
    }

    fn guesser<'a>(&self, data: &'a XySamples) -> Box<dyn ParameterGuesser + 'a> {
        Box::new(SpreadGuesser::new(data, PolyGuessStrategy))
    }
}

/// Closed-form point solvers for the quadratic.
struct PolyGuessStrategy;

impl GuessStrategy for PolyGuessStrategy {
    fn guess_from_1(&self, _x: f64, y: f64, params: &mut [f64]) -> bool {
        if !y.is_finite() {
            return false;
        }
        params[0] = y;
        params[1] = 0.0;
        params[2] = 0.0;
        true
    }

    fn guess_from_2(&self, xs: [f64; 2], ys: [f64; 2], params: &mut [f64]) -> bool {
        if xs[0] == xs[1] {
            return false;
        }
        let slope = (ys[1] - ys[0]) / (xs[1] - xs[0]);
        let intercept = ys[0] - slope * xs[0];
        if !(slope.is_finite() && intercept.is_finite()) {
            return false;
        }
        params[0] = intercept;
        params[1] = slope;
        params[2] = 0.0;
        true
    }

    /// Exact quadratic through three points via divided differences.
    fn guess_from_3(
        &self,
        xs: [f64; 3],
        ys: [f64; 3],
        params: &mut [f64],
        _rng: &mut dyn RngCore,
    ) -> bool {
        if xs[0] == xs[1] || xs[1] == xs[2] || xs[0] == xs[2] {
            return false;
        }
        let d01 = (ys[1] - ys[0]) / (xs[1] - xs[0]);
        let d12 = (ys[2] - ys[1]) / (xs[2] - xs[1]);
        let c = (d12 - d01) / (xs[2] - xs[0]);
        let b = d01 - c * (xs[0] + xs[1]);
        let a = ys[0] - xs[0] * (b + c * xs[0]);
        if !(a.is_finite() && b.is_finite() && c.is_finite()) {
            return false;
        }
        params[0] = a;
        params[1] = b;
        params[2] = c;
        true
    }

    fn fallback(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_poly_guess(params, rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn dummy_rng() -> StdRng {
        StdRng::seed_from_u64(0)
    }

    #[test]
    fn three_point_solver_recovers_a_known_quadratic() {
        let (a, b, c) = (1.5, -2.0, 0.25);
        let xs = [-1.0, 2.0, 5.0];
        let ys = xs.map(|x| a + b * x + c * x * x);
        let mut params = [0.0; 3];
        assert!(PolyGuessStrategy.guess_from_3(xs, ys, &mut params, &mut dummy_rng()));
        assert!((params[0] - a).abs() < 1e-12);
        assert!((params[1] - b).abs() < 1e-12);
        assert!((params[2] - c).abs() < 1e-12);

        // The recovered coefficients reproduce the y values exactly.
        let m = PolyModel;
        for (x, y) in xs.iter().zip(ys.iter()) {
            assert!((m.value(*x, &params) - y).abs() < 1e-10);
        }
    }

    #[test]
    fn duplicate_x_values_are_rejected() {
        let mut params = [0.0; 3];
        assert!(!PolyGuessStrategy.guess_from_3(
            [1.0, 1.0, 2.0],
            [0.0, 1.0, 2.0],
            &mut params,
            &mut dummy_rng()
        ));
        assert!(!PolyGuessStrategy.guess_from_2([3.0, 3.0], [0.0, 1.0], &mut params));
    }

    #[test]
    fn two_point_solver_fits_a_straight_line() {
        let mut params = [f64::NAN; 3];
        assert!(PolyGuessStrategy.guess_from_2([0.0, 4.0], [1.0, 9.0], &mut params));
        assert_eq!(params, [1.0, 2.0, 0.0]);
    }

    #[test]
    fn one_point_solver_fits_a_constant() {
        let mut params = [0.0; 3];
        assert!(PolyGuessStrategy.guess_from_1(7.0, 3.5, &mut params));
        assert_eq!(params, [3.5, 0.0, 0.0]);
    }

    #[test]
    fn value_survives_magnitude_spread_between_terms() {
        let m = PolyModel;
        // b*x and c*x^2 cancel; the tiny a must survive the summation.
        let params = [1e-3, 1e8, -1e8];
        let v = m.value(1.0, &params);
        assert!((v - 1e-3).abs() < 1e-12, "got {v}");
    }

    #[test]
    fn gradient_is_one_x_x_squared() {
        let m = PolyModel;
        let mut grad = [0.0; 3];
        m.gradient(3.0, &[0.0; 3], &mut grad);
        assert_eq!(grad, [1.0, 3.0, 9.0]);
    }
}
