//! Numerical utilities: tabulated grids and scalar root finding.

pub mod interp;
pub mod solve;

pub use interp::*;
pub use solve::*;
