//! Fingerprint extraction and aggregation.
//!
//! Responsibilities:
//!
//! - condense one run set into a fixed-width numeric row (`extract`)
//! - combine rows across instances / experiments / whole sets (`aggregate`)
//! - cache rows through the entities' attribute stores

pub mod aggregate;
pub mod extract;

pub use aggregate::*;
pub use extract::*;
