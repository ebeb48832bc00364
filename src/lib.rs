//! `recast-curves` library crate.
//!
//! Recasts published limits on new vector bosons onto other coupling models:
//!
//! - `models`: coupling models and their decay widths
//! - `production`: production mechanisms and cross-section ratios
//! - `limit`: limits and the recasting algorithm
//! - `io`, `report`, `cli`, `app`: the `recast` binary's front-end
//!
//! The binary (`recast`) is a thin wrapper around this library so the physics is
//! testable without spawning processes.

pub mod app;
pub mod cli;
pub mod domain;
pub mod error;
pub mod io;
pub mod limit;
pub mod math;
pub mod models;
pub mod params;
pub mod production;
pub mod report;

#[cfg(test)]
pub(crate) mod test_support;
