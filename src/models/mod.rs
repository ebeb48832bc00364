//! Coupling models: per-fermion couplings, decay widths and lifetimes.
//!
//! - `model`: `CouplingModel` and its width engine
//! - `hadrons`: vector-meson mixing and axial spectral contributions
//! - `builtin`: the standard benchmark models

pub mod builtin;
pub(crate) mod hadrons;
pub mod model;

pub use builtin::*;
pub use model::*;
