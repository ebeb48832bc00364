//! Domain types used throughout the engine.
//!
//! This module defines:
//!
//! - particle identities and coupling sectors (`Fermion`, `Meson`, `Sector`)
//! - mass-dependent couplings (`MassFunction`, `FermionCoupling`)
//! - the final-state vocabulary (`FinalState`, `HadronicState`)
//! - recast outputs (`CurvePoint`, `RecastBounds`)

pub mod state;
pub mod types;

pub use state::*;
pub use types::*;
