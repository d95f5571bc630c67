//! Per-run-set fingerprint extraction.
//!
//! A fingerprint condenses a set of runs into one fixed-width numeric row.
//! For each dimension `d`:
//!
//! 1. the 25/50/75 quantiles of `d` at the *first* point of every run
//!    (3 values; the median is the `start` level),
//! 2. the same at the *last* point (3 values; median is the `end` level),
//! 3. for each of three knee slots `target = start + slot*(end-start)/4`,
//!    and each *other* dimension `d'`: locate, per run, the earliest point
//!    whose `d` value matches `target` exactly, falling back to the nearer of
//!    the run's first/last point along `d` (ties go to the first point), and
//!    take the 25/50/75 quantiles of `d'` at the located points.
//!
//! Row width is therefore `sum over d of [6 + 9*(D-1)]`. The three quantile
//! accumulators are allocated once and reset between phases.

use crate::domain::{DataPoint, DimType, Dimension, Run};
use crate::error::AppError;
use crate::math::QuantileAggregate;

/// Number of interpolated knee slots between start and end.
const KNEE_SLOTS: usize = 3;

/// Fingerprint row width for a set with `dims` dimensions.
pub fn row_width(dims: usize) -> usize {
    dims * (6 + 9 * (dims - 1))
}

/// Extract the fingerprint row of one run set.
pub fn extract_row(runs: &[Run], dims: &[Dimension]) -> Result<Vec<f64>, AppError> {
    if runs.is_empty() {
        return Err(AppError::insufficient_data(
            "Cannot fingerprint a run set without runs.",
        ));
    }
    if dims.len() < 2 {
        return Err(AppError::insufficient_data(
            "Fingerprinting needs at least two dimensions.",
        ));
    }

    let mut quantiles = Quartiles::new();
    let mut row = Vec::with_capacity(row_width(dims.len()));

    for dim in dims {
        // Phase 1: quantiles of `dim` at the first point of every run.
        quantiles.reset();
        for run in runs {
            quantiles.append(run.first().value(dim.index));
        }
        let (q25, start, q75) = quantiles.values();
        row.extend_from_slice(&[q25, start, q75]);

        // Phase 2: same at the last point.
        quantiles.reset();
        for run in runs {
            quantiles.append(run.last().value(dim.index));
        }
        let (q25, end, q75) = quantiles.values();
        row.extend_from_slice(&[q25, end, q75]);

        // Phase 3: three interpolated knee slots, sampled per other dimension.
        for slot in 1..=KNEE_SLOTS {
            let target = start + slot as f64 * (end - start) / 4.0;
            for other in dims {
                if other.index == dim.index {
                    continue;
                }
                quantiles.reset();
                for run in runs {
                    let point = locate_point(run, dim, target);
                    quantiles.append(point.value(other.index));
                }
                let (q25, q50, q75) = quantiles.values();
                row.extend_from_slice(&[q25, q50, q75]);
            }
        }
    }

    debug_assert_eq!(row.len(), row_width(dims.len()));
    Ok(row)
}

/// The point of `run` whose `dim` value matches `target`.
///
/// Earliest exact match wins; without one, the nearer of the run's endpoints
/// by absolute distance along `dim`, the first point on a tie. Integer
/// dimensions compare as `i64`, float dimensions as `f64`.
fn locate_point<'a>(run: &'a Run, dim: &Dimension, target: f64) -> &'a DataPoint {
    for point in run.points() {
        let v = point.value(dim.index);
        let exact = match dim.data_type {
            DimType::Int => (v as i64) == (target as i64),
            DimType::Float => v == target,
        };
        if exact {
            return point;
        }
    }

    let first = run.first();
    let last = run.last();
    let d_first = (first.value(dim.index) - target).abs();
    let d_last = (last.value(dim.index) - target).abs();
    if d_first <= d_last { first } else { last }
}

/// The three fixed quantile accumulators, reset together between phases.
struct Quartiles {
    q25: QuantileAggregate,
    q50: QuantileAggregate,
    q75: QuantileAggregate,
}

impl Quartiles {
    fn new() -> Self {
        Self {
            q25: QuantileAggregate::new(0.25),
            q50: QuantileAggregate::new(0.5),
            q75: QuantileAggregate::new(0.75),
        }
    }

    fn reset(&mut self) {
        self.q25.reset();
        self.q50.reset();
        self.q75.reset();
    }

    fn append(&mut self, value: f64) {
        self.q25.append(value);
        self.q50.append(value);
        self.q75.append(value);
    }

    fn values(&mut self) -> (f64, f64, f64) {
        (self.q25.value(), self.q50.value(), self.q75.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DimKind;

    fn dims2() -> Vec<Dimension> {
        vec![
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
        ]
    }

    fn run(points: &[(f64, f64)]) -> Run {
        Run::new(
            points
                .iter()
                .map(|(t, q)| DataPoint::new(vec![*t, *q]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn row_width_matches_dimension_count() {
        assert_eq!(row_width(2), 2 * (6 + 9));
        assert_eq!(row_width(3), 3 * (6 + 18));

        let runs = vec![run(&[(0.0, 10.0), (10.0, 0.0)]); 4];
        let row = extract_row(&runs, &dims2()).unwrap();
        assert_eq!(row.len(), row_width(2));
    }

    #[test]
    fn two_point_decay_scenario_interpolates_linearly() {
        // 4 identical runs from (t=0, q=10) to (t=10, q=0).
        let runs = vec![run(&[(0.0, 10.0), (10.0, 0.0)]); 4];
        let dims = dims2();
        let row = extract_row(&runs, &dims).unwrap();

        // Dimension 0 (time): start quantiles all 0, end quantiles all 10.
        assert_eq!(&row[0..3], &[0.0, 0.0, 0.0]);
        assert_eq!(&row[3..6], &[10.0, 10.0, 10.0]);

        // Knee targets along time are 2.5, 5.0, 7.5; no exact match exists,
        // so each run contributes an endpoint: 2.5 is nearer the first point
        // (q=10), 5.0 ties and takes the first, 7.5 is nearer the last (q=0).
        assert_eq!(&row[6..9], &[10.0, 10.0, 10.0]);
        assert_eq!(&row[9..12], &[10.0, 10.0, 10.0]);
        assert_eq!(&row[12..15], &[0.0, 0.0, 0.0]);

        // Dimension 1 (quality): start 10, end 0.
        assert_eq!(&row[15..18], &[10.0, 10.0, 10.0]);
        assert_eq!(&row[18..21], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn exact_match_prefers_the_earliest_point() {
        // Time value 5 appears twice; the earlier point (q=7) must win.
        let runs = vec![run(&[(0.0, 9.0), (5.0, 7.0), (5.0, 3.0), (10.0, 1.0)])];
        let dims = dims2();
        let row = extract_row(&runs, &dims).unwrap();

        // start=0, end=10; slot 2 target along time is 5.0, an exact match.
        // Slot 2's quality quantiles sit at indices 9..12 for dimension 0.
        assert_eq!(&row[9..12], &[7.0, 7.0, 7.0]);
    }

    #[test]
    fn integer_dimensions_compare_as_integers() {
        // start=0, end=10 -> targets 2.5, 5.0, 7.5 truncate to 2, 5, 7 for
        // integer comparison; a point at t=2 therefore matches target 2.5.
        let runs = vec![run(&[(0.0, 9.0), (2.0, 6.0), (10.0, 1.0)])];
        let dims = dims2();
        let row = extract_row(&runs, &dims).unwrap();
        assert_eq!(&row[6..9], &[6.0, 6.0, 6.0]);
    }

    #[test]
    fn empty_run_set_is_rejected() {
        assert!(extract_row(&[], &dims2()).is_err());
    }
}
