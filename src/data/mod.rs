//! Data acquisition: synthetic experiment-set and series generation.

pub mod synth;

pub use synth::*;
