//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the wide per-country input table (`WideSeriesTable`, `CountrySeries`)
//! - the long training table (`LongFeatureTable`, `FeatureRow`)
//! - per-country feature sources (`ScalarSource`, `SeriesSource`)
//! - resolved pipeline configuration (`BuildConfig`, `FeatureSpec`, `CaseType`)

pub mod types;

pub use types::*;
