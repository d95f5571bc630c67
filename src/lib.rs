//! `bench-curves` library crate.
//!
//! The binary (`bcurves`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - modules are reusable (e.g., future daemon, notebooks, etc.)
//! - code stays easy to navigate as the project grows

pub mod app;
pub mod cache;
pub mod cli;
pub mod cluster;
pub mod data;
pub mod domain;
pub mod error;
pub mod fingerprint;
pub mod fit;
pub mod io;
pub mod math;
pub mod models;
pub mod report;
