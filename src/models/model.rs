//! Parametric model and parameter-guesser contracts.
//!
//! A model is a pure function family `f(x; p1..pk)`. The fitting side needs
//! four primitive operations:
//!
//! - evaluate `f` at a point (for residuals)
//! - evaluate the gradient w.r.t. the parameters (for an external optimizer)
//! - canonicalize a parameter vector (collapse sign ambiguities)
//! - draw a random starting vector from a caller-supplied random source
//!
//! plus a factory binding a [`ParameterGuesser`] to a fixed `(x, y)` sample.

use rand::RngCore;

use crate::fit::XySamples;

/// A pure function family with a fixed number of parameters.
pub trait ParametricModel {
    /// Human-readable label for terminal output.
    fn name(&self) -> &'static str;

    /// Number of parameters `k`.
    fn param_count(&self) -> usize;

    /// Evaluate `f(x; params)`.
    fn value(&self, x: f64, params: &[f64]) -> f64;

    /// Write the partial derivatives w.r.t. each parameter into `out`.
    ///
    /// `out` must have length `param_count()`. Non-finite partials are
    /// clamped to zero so an optimizer never steps along a garbage direction.
    fn gradient(&self, x: f64, params: &[f64], out: &mut [f64]);

    /// Map equivalent parameter vectors to one representative. Idempotent.
    fn canonicalize(&self, params: &mut [f64]);

    /// Overwrite `params` with a fresh random starting vector.
    fn random_guess(&self, params: &mut [f64], rng: &mut dyn RngCore);

    /// Create a guesser bound to `data` for the lifetime of one fit attempt.
    fn guesser<'a>(&self, data: &'a XySamples) -> Box<dyn ParameterGuesser + 'a>;
}

/// Produces starting parameter vectors for one fixed data sample.
///
/// Created once per fitting attempt and invoked repeatedly by the restart
/// logic of whatever optimizer consumes the guesses. A guess never fails:
/// when every data-driven strategy is rejected, the guesser falls back to a
/// random draw.
pub trait ParameterGuesser {
    fn random_guess(&self, params: &mut [f64], rng: &mut dyn RngCore);
}
