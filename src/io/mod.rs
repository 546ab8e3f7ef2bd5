//! Input/output helpers.
//!
//! - raw case CSV ingest + validation (`ingest`)
//! - feature source CSV loading (`ingest`)
//! - training table export (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
