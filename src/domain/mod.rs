//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the experiment data model (`ExperimentSet`, `Experiment`, `RunSet`, `Run`)
//! - dimension metadata (`Dimension`, `DimType`, `DimKind`)
//! - analysis configuration (`AnalysisConfig`, `SynthSpec`, `Level`)

pub mod types;

pub use types::*;
