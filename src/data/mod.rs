//! Remote raw-data acquisition.

pub mod github;

pub use github::*;
