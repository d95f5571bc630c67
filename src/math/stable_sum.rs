//! Compensated floating-point summation.
//!
//! The logistic gradient and the polynomial evaluation both add a handful of
//! terms whose magnitudes can differ by many orders of magnitude; a naive
//! left-to-right sum loses the small terms entirely. We use Neumaier's
//! variant of Kahan summation, which also handles the case where the incoming
//! term is larger than the running sum.

/// Reusable compensated accumulator (`reset`, `append` terms, read `value`).
#[derive(Debug, Clone, Default)]
pub struct StableSum {
    sum: f64,
    compensation: f64,
}

impl StableSum {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.sum = 0.0;
        self.compensation = 0.0;
    }

    pub fn append(&mut self, value: f64) {
        let t = self.sum + value;
        if self.sum.abs() >= value.abs() {
            self.compensation += (self.sum - t) + value;
        } else {
            self.compensation += (value - t) + self.sum;
        }
        self.sum = t;
    }

    pub fn value(&self) -> f64 {
        self.sum + self.compensation
    }
}

/// Compensated sum of exactly three terms.
pub fn add3(a: f64, b: f64, c: f64) -> f64 {
    let mut s = StableSum::new();
    s.append(a);
    s.append(b);
    s.append(c);
    s.value()
}
