//! Mathematical utilities: quantile accumulation and compensated summation.

pub mod quantile;
pub mod stable_sum;

pub use quantile::*;
pub use stable_sum::*;
