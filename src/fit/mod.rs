//! Parameter guessing and fit-start orchestration.
//!
//! Responsibilities:
//!
//! - hold the `(x, y)` sample view guessers are bound to (`XySamples`)
//! - run the shared spread-based guess scaffold (`guess`)
//! - score multiple starts and hand the best to an optional optimizer (`start`)

use crate::error::AppError;

pub mod guess;
pub mod start;

pub use guess::*;
pub use start::*;

/// A fixed two-column `(x, y)` sample a guesser is bound to.
#[derive(Debug, Clone)]
pub struct XySamples {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

impl XySamples {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, AppError> {
        if xs.len() != ys.len() {
            return Err(AppError::internal(format!(
                "Sample columns have different lengths ({} vs {}).",
                xs.len(),
                ys.len()
            )));
        }
        if xs.is_empty() {
            return Err(AppError::insufficient_data("Sample data is empty."));
        }
        Ok(Self { xs, ys })
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    pub fn x(&self, i: usize) -> f64 {
        self.xs[i]
    }

    pub fn y(&self, i: usize) -> f64 {
        self.ys[i]
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    /// Smallest finite x value (`+inf` when none is finite).
    pub fn min_x(&self) -> f64 {
        min_finite(&self.xs)
    }

    /// Smallest finite y value (`+inf` when none is finite).
    pub fn min_y(&self) -> f64 {
        min_finite(&self.ys)
    }
}

fn min_finite(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(f64::INFINITY, f64::min)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn samples_reject_mismatched_columns() {
        assert!(XySamples::new(vec![1.0, 2.0], vec![1.0]).is_err());
    }

    #[test]
    fn minima_skip_non_finite_values() {
        let s = XySamples::new(vec![3.0, f64::NAN, 1.0], vec![2.0, -5.0, f64::INFINITY]).unwrap();
        assert_eq!(s.min_x(), 1.0);
        assert_eq!(s.min_y(), -5.0);
    }
}
