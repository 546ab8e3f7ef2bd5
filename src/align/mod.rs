//! The feature alignment engine.
//!
//! Responsibilities:
//!
//! - expand the wide per-country case table into the long training table,
//!   labelling each row with the next day's value (`expand`)
//! - broadcast per-country scalar features into the table (`join_scalar`)
//! - align per-country time-varying features positionally, with
//!   carry-forward extension for short series (`join_series`)
//!
//! Everything here is pure in-memory computation: no I/O, no retries, no
//! partial-result recovery. A failed call leaves the table exactly as it was
//! before the failing column write began.

pub mod expand;
pub mod join;

pub use expand::*;
pub use join::*;
