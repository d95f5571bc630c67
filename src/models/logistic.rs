//! Logistic model `f(x) = a / (1 + exp(b + c*x))` and its 3-point solver.
//!
//! The gradient denominator `(1 + E)^2 = 1 + 2E + E^2` is combined with a
//! compensated 3-term sum; for moderate exponents the naive expansion loses
//! the `1` against `E^2` and the partials collapse to garbage.
//!
//! The guesser has no closed form. The 3-point solver keeps an `(a, b, c)`
//! candidate plus its fit error (sum of absolute residuals over the three
//! points) and iterates a pairwise algebraic elimination: pick an ordering of
//! the points, solve a new `b` from the first (holding `a`, `c`), a new `a`
//! from the second, a new `c` from the third, and accept the candidate only
//! when its error is finite and strictly smaller. Candidates with `|a|`,
//! `|b|`, or `c` below 1e-8 are numerically meaningless and rejected.

use rand::Rng;
use rand::RngCore;
use rand_distr::StandardNormal;

use crate::fit::{GuessStrategy, SpreadGuesser, XySamples};
use crate::math::add3;
use crate::models::{ParameterGuesser, ParametricModel};

#[derive(Debug, Clone, Copy, Default)]
pub struct LogisticModel;

fn logistic(x: f64, a: f64, b: f64, c: f64) -> f64 {
    a / (1.0 + (b + c * x).exp())
}

fn random_logistic_guess(params: &mut [f64], rng: &mut dyn RngCore) {
    params[0] = rng.sample::<f64, _>(StandardNormal);
    params[1] = -0.1 * rng.sample::<f64, _>(StandardNormal).abs();
    params[2] = positive_normal(rng);
}

/// `|N(0,1)|` resampled until it clears the degeneracy threshold.
fn positive_normal(rng: &mut dyn RngCore) -> f64 {
    loop {
        let c = rng.sample::<f64, _>(StandardNormal).abs();
        if c > PARAM_EPS {
            return c;
        }
    }
}

impl ParametricModel for LogisticModel {
    fn name(&self) -> &'static str {
        "logistic"
    }

    fn param_count(&self) -> usize {
        3
    }

    fn value(&self, x: f64, params: &[f64]) -> f64 {
        logistic(x, params[0], params[1], params[2])
    }

    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]) {
        let (a, b, c) = (params[0], params[1], params[2]);
        let e = (b + c * x).exp();
        let denom_sq = add3(1.0, 2.0 * e, e * e);

        let da = 1.0 / (1.0 + e);
        let db = -a * e / denom_sq;
        let dc = x * db;
        out[0] = if da.is_finite() { da } else { 0.0 };
        out[1] = if db.is_finite() { db } else { 0.0 };
        out[2] = if dc.is_finite() { dc } else { 0.0 };
    }

    fn canonicalize(&self, _params: &mut [f64]) {
        // No sign ambiguity to collapse.
    }

    fn random_guess(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_logistic_guess(params, rng);
    }

    fn guesser<'a>(&self, data: &'a XySamples) -> Box<dyn ParameterGuesser + 'a> {
        Box::new(SpreadGuesser::new(data, LogisticGuessStrategy))
    }
}

/// Below this magnitude a parameter no longer influences the curve at double
/// precision; such candidates are rejected.
const PARAM_EPS: f64 = 1e-8;
/// Global refinement step budget per `guess_from_3` invocation.
const MAX_STEPS: usize = 100;

const ORDERINGS: [[usize; 3]; 6] = [
    [0, 1, 2],
    [0, 2, 1],
    [1, 0, 2],
    [1, 2, 0],
    [2, 0, 1],
    [2, 1, 0],
];

#[derive(Debug, Clone, Copy)]
struct Candidate {
    a: f64,
    b: f64,
    c: f64,
    err: f64,
}

fn fit_error(a: f64, b: f64, c: f64, xs: &[f64; 3], ys: &[f64; 3]) -> f64 {
    add3(
        (ys[0] - logistic(xs[0], a, b, c)).abs(),
        (ys[1] - logistic(xs[1], a, b, c)).abs(),
        (ys[2] - logistic(xs[2], a, b, c)).abs(),
    )
}

/// One working candidate undergoing pairwise refinement.
struct PairwiseSolver {
    cur: Candidate,
}

impl PairwiseSolver {
    /// Data-driven seed: `a` near one of the observed magnitudes, `b` a small
    /// negative scaled Gaussian, `c` a positive Gaussian magnitude.
    fn seeded(xs: &[f64; 3], ys: &[f64; 3], rng: &mut dyn RngCore) -> Self {
        let v = match rng.gen_range(0..4u8) {
            0 => ys[0],
            1 => ys[1],
            2 => ys[2],
            _ => ys[0].max(ys[1]).max(ys[2]),
        };
        let a = v.abs() * (1.0 + 0.1 * rng.sample::<f64, _>(StandardNormal));
        let b = -0.1 * rng.sample::<f64, _>(StandardNormal).abs();
        let c = positive_normal(rng);
        let err = fit_error(a, b, c, xs, ys);
        Self {
            cur: Candidate { a, b, c, err },
        }
    }

    /// Try all six point orderings once; returns whether any candidate was
    /// accepted (finite error, strictly smaller than the current one).
    fn sweep(&mut self, xs: &[f64; 3], ys: &[f64; 3]) -> bool {
        let mut improved = false;
        for [i, j, k] in ORDERINGS {
            // exp(b + c x) = a/y - 1 at an exactly-fitted point; eliminate
            // one parameter at a time from one point each.
            let nb = (self.cur.a / ys[i] - 1.0).ln() - self.cur.c * xs[i];
            let na = ys[j] * (1.0 + (nb + self.cur.c * xs[j]).exp());
            let nc = ((na / ys[k] - 1.0).ln() - nb) / xs[k];

            if !(na.is_finite() && nb.is_finite() && nc.is_finite()) {
                continue;
            }
            if na.abs() < PARAM_EPS || nb.abs() < PARAM_EPS || nc < PARAM_EPS {
                continue;
            }
            let err = fit_error(na, nb, nc, xs, ys);
            if err.is_finite() && err < self.cur.err {
                self.cur = Candidate {
                    a: na,
                    b: nb,
                    c: nc,
                    err,
                };
                improved = true;
            }
        }
        improved
    }
}

/// Logistic point-solver strategy for the shared guess scaffold.
struct LogisticGuessStrategy;

impl GuessStrategy for LogisticGuessStrategy {
    fn guess_from_3(
        &self,
        xs: [f64; 3],
        ys: [f64; 3],
        params: &mut [f64],
        rng: &mut dyn RngCore,
    ) -> bool {
        let mut steps = 0usize;
        let mut best: Option<Candidate> = None;

        while steps < MAX_STEPS {
            let mut solver = PairwiseSolver::seeded(&xs, &ys, rng);
            merge_best(&mut best, solver.cur);

            loop {
                if steps >= MAX_STEPS {
                    break;
                }
                steps += 1;
                if !solver.sweep(&xs, &ys) {
                    break;
                }
                merge_best(&mut best, solver.cur);
            }

            if best.is_some_and(|c| c.err.is_finite()) {
                break;
            }
        }

        match best {
            Some(c) if c.err.is_finite() => {
                params[0] = c.a;
                params[1] = c.b;
                params[2] = c.c;
                true
            }
            _ => false,
        }
    }

    fn fallback(&self, params: &mut [f64], rng: &mut dyn RngCore) {
        random_logistic_guess(params, rng);
    }
}

fn merge_best(best: &mut Option<Candidate>, cand: Candidate) {
    if !cand.err.is_finite() {
        return;
    }
    match best {
        Some(b) if b.err <= cand.err => {}
        _ => *best = Some(cand),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn gradient_partials_are_finite_and_clamped() {
        let m = LogisticModel;
        let mut grad = [0.0; 3];
        m.gradient(1.5, &[2.0, -1.0, 0.5], &mut grad);
        assert!(grad.iter().all(|g| g.is_finite()));
        assert!(grad[0] > 0.0, "df/da must carry the sign of 1/(1+E)");

        // Overflowing exponent: partials clamp to zero instead of NaN.
        m.gradient(1e4, &[2.0, 0.0, 1.0], &mut grad);
        assert_eq!(grad[1], 0.0);
        assert_eq!(grad[2], 0.0);
    }

    #[test]
    fn compensated_denominator_beats_naive_expansion() {
        // At e ~ 1e9 the naive 1 + 2e + e^2 drops the leading 1.
        let e = 1e9f64;
        let naive = 1.0 + 2.0 * e + e * e;
        let stable = add3(1.0, 2.0 * e, e * e);
        assert!((stable - (1.0 + e) * (1.0 + e)).abs() <= (naive - (1.0 + e) * (1.0 + e)).abs());
    }

    #[test]
    fn sweep_errors_are_non_increasing() {
        let (a, b, c) = (2.0, -1.0, 0.5);
        let xs = [0.0, 2.0, 5.0];
        let ys = [
            logistic(xs[0], a, b, c),
            logistic(xs[1], a, b, c),
            logistic(xs[2], a, b, c),
        ];
        let mut rng = StdRng::seed_from_u64(17);
        let mut solver = PairwiseSolver::seeded(&xs, &ys, &mut rng);
        let mut prev = solver.cur.err;
        for _ in 0..50 {
            let improved = solver.sweep(&xs, &ys);
            assert!(solver.cur.err <= prev, "accepted error sequence must not increase");
            prev = solver.cur.err;
            if !improved {
                break;
            }
        }
    }

    #[test]
    fn three_point_solver_succeeds_on_exact_logistic_data() {
        let (a, b, c) = (2.0, -1.0, 0.5);
        let xs = [1.0, 3.0, 6.0];
        let ys = [
            logistic(xs[0], a, b, c),
            logistic(xs[1], a, b, c),
            logistic(xs[2], a, b, c),
        ];
        let strategy = LogisticGuessStrategy;
        let mut rng = StdRng::seed_from_u64(5);
        let mut params = [0.0; 3];
        assert!(strategy.guess_from_3(xs, ys, &mut params, &mut rng));
        assert!(params.iter().all(|p| p.is_finite()));
        assert!(params[2] > 0.0);
        let err = fit_error(params[0], params[1], params[2], &xs, &ys);
        assert!(err.is_finite());
    }

    #[test]
    fn solver_reports_a_guess_even_for_degenerate_data() {
        // All-zero ys break every elimination; the seed candidate still has a
        // finite error, so the solver reports success with finite parameters.
        let xs = [1.0, 2.0, 3.0];
        let ys = [0.0, 0.0, 0.0];
        let strategy = LogisticGuessStrategy;
        let mut rng = StdRng::seed_from_u64(23);
        let mut params = [0.0; 3];
        assert!(strategy.guess_from_3(xs, ys, &mut params, &mut rng));
        assert!(params.iter().all(|p| p.is_finite()));
    }
}
