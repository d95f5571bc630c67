//! Input/output helpers.
//!
//! - run CSV ingest + validation (`ingest`)
//! - fingerprint/cluster/run exports (CSV/JSON) (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
