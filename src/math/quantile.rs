//! Streaming quantile accumulation.
//!
//! Fingerprint extraction computes the 25/50/75 quantiles of many small
//! samples (one per dimension per extraction phase). The accumulator is
//! designed to be allocated once and cycled through `reset` / `append` /
//! `value` many times without re-allocating its sample buffer.

/// Accumulates observations and reports a fixed p-quantile of them.
#[derive(Debug, Clone)]
pub struct QuantileAggregate {
    p: f64,
    samples: Vec<f64>,
}

impl QuantileAggregate {
    /// Create an accumulator for the quantile `p` (`0.0 ..= 1.0`).
    ///
    /// # Panics
    /// Panics if `p` is outside `[0, 1]` or not finite; the quantile is a
    /// compile-time-style constant at every call site in this crate.
    pub fn new(p: f64) -> Self {
        assert!(
            p.is_finite() && (0.0..=1.0).contains(&p),
            "quantile must be in [0, 1], got {p}"
        );
        Self {
            p,
            samples: Vec::new(),
        }
    }

    /// Drop all observations, keeping the allocated buffer for reuse.
    pub fn reset(&mut self) {
        self.samples.clear();
    }

    /// Add one floating-point observation.
    pub fn append(&mut self, value: f64) {
        self.samples.push(value);
    }

    /// Add one integer observation.
    pub fn append_int(&mut self, value: i64) {
        self.samples.push(value as f64);
    }

    /// Number of observations since the last reset.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// The configured quantile of all observations since the last reset,
    /// using linear interpolation between order statistics.
    ///
    /// Returns `NaN` when no observations have been appended.
    pub fn value(&mut self) -> f64 {
        if self.samples.is_empty() {
            return f64::NAN;
        }
        self.samples
            .sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let n = self.samples.len();
        let h = self.p * (n - 1) as f64;
        let lo = h.floor() as usize;
        let hi = h.ceil() as usize;
        if lo == hi {
            return self.samples[lo];
        }
        let frac = h - lo as f64;
        self.samples[lo] + frac * (self.samples[hi] - self.samples[lo])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn median_of_odd_sample_is_middle_order_statistic() {
        let mut q = QuantileAggregate::new(0.5);
        for v in [9.0, 1.0, 5.0, 3.0, 7.0] {
            q.append(v);
        }
        assert_eq!(q.value(), 5.0);
    }

    #[test]
    fn quartiles_interpolate_between_order_statistics() {
        let mut q25 = QuantileAggregate::new(0.25);
        let mut q75 = QuantileAggregate::new(0.75);
        for v in [0.0, 1.0, 2.0, 3.0] {
            q25.append(v);
            q75.append(v);
        }
        // h = 0.25 * 3 = 0.75 between samples 0 and 1.
        assert!((q25.value() - 0.75).abs() < 1e-12);
        assert!((q75.value() - 2.25).abs() < 1e-12);
    }

    #[test]
    fn reset_matches_fresh_instance() {
        let mut reused = QuantileAggregate::new(0.5);
        for v in [100.0, -4.0, 3.5] {
            reused.append(v);
        }
        let _ = reused.value();
        reused.reset();
        assert!(reused.is_empty());

        let mut fresh = QuantileAggregate::new(0.5);
        for v in [2.0, 4.0, 6.0] {
            reused.append(v);
            fresh.append(v);
        }
        assert_eq!(reused.value(), fresh.value());
    }

    #[test]
    fn integer_appends_mix_with_float_appends() {
        let mut q = QuantileAggregate::new(0.5);
        q.append_int(1);
        q.append(2.0);
        q.append_int(3);
        assert_eq!(q.value(), 2.0);
    }

    #[test]
    fn empty_aggregate_reports_nan() {
        let mut q = QuantileAggregate::new(0.5);
        assert!(q.value().is_nan());
    }
}
