//! Shared domain types.
//!
//! This module defines:
//!
//! - particle identities (`Fermion`, `Meson`) and coupling sectors (`Sector`)
//! - mass-dependent quantities (`MassFunction`) and per-fermion couplings
//! - recast outputs (`CurvePoint`, `RecastBounds`)

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::ModelError;
use crate::math::Interpolator;

/// Fundamental fermions a boson can couple to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Fermion {
    #[serde(rename = "e")]
    E,
    #[serde(rename = "mu")]
    Mu,
    #[serde(rename = "tau")]
    Tau,
    #[serde(rename = "nue")]
    NuE,
    #[serde(rename = "numu")]
    NuMu,
    #[serde(rename = "nutau")]
    NuTau,
    #[serde(rename = "d")]
    D,
    #[serde(rename = "u")]
    U,
    #[serde(rename = "s")]
    S,
    #[serde(rename = "c")]
    C,
    #[serde(rename = "b")]
    B,
    #[serde(rename = "t")]
    T,
}

impl Fermion {
    pub const ALL: [Fermion; 12] = [
        Fermion::E,
        Fermion::Mu,
        Fermion::Tau,
        Fermion::NuE,
        Fermion::NuMu,
        Fermion::NuTau,
        Fermion::D,
        Fermion::U,
        Fermion::S,
        Fermion::C,
        Fermion::B,
        Fermion::T,
    ];

    /// Position in `Fermion::ALL`, used to index parameter arrays.
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn name(self) -> &'static str {
        match self {
            Fermion::E => "e",
            Fermion::Mu => "mu",
            Fermion::Tau => "tau",
            Fermion::NuE => "nue",
            Fermion::NuMu => "numu",
            Fermion::NuTau => "nutau",
            Fermion::D => "d",
            Fermion::U => "u",
            Fermion::S => "s",
            Fermion::C => "c",
            Fermion::B => "b",
            Fermion::T => "t",
        }
    }

    pub fn is_neutrino(self) -> bool {
        matches!(self, Fermion::NuE | Fermion::NuMu | Fermion::NuTau)
    }
}

impl fmt::Display for Fermion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Fermion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Fermion::ALL
            .into_iter()
            .find(|f| f.name() == s)
            .ok_or_else(|| ModelError::UnknownState(s.to_string()))
    }
}

/// Mesons (and the photon) that appear in generators, resonances and production names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Meson {
    Gamma,
    Rho0,
    Pi0,
    Omega,
    Phi,
    Eta,
    EtaPrime,
    D0,
    DStar0,
    K,
    A1,
}

impl Meson {
    pub const ALL: [Meson; 11] = [
        Meson::Gamma,
        Meson::Rho0,
        Meson::Pi0,
        Meson::Omega,
        Meson::Phi,
        Meson::Eta,
        Meson::EtaPrime,
        Meson::D0,
        Meson::DStar0,
        Meson::K,
        Meson::A1,
    ];

    /// Vector mesons that mix with the boson, in their canonical order.
    pub const VECTORS: [Meson; 3] = [Meson::Rho0, Meson::Omega, Meson::Phi];

    pub fn name(self) -> &'static str {
        match self {
            Meson::Gamma => "gamma",
            Meson::Rho0 => "rho0",
            Meson::Pi0 => "pi0",
            Meson::Omega => "omega",
            Meson::Phi => "phi",
            Meson::Eta => "eta",
            Meson::EtaPrime => "eta'",
            Meson::D0 => "D0",
            Meson::DStar0 => "D*0",
            Meson::K => "K",
            Meson::A1 => "a1",
        }
    }

    pub fn parse(s: &str) -> Option<Meson> {
        Meson::ALL.into_iter().find(|m| m.name() == s)
    }
}

impl fmt::Display for Meson {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Axial or vector part of a coupling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sector {
    Axial,
    Vector,
}

/// A quantity that may depend on the boson mass (GeV).
#[derive(Clone)]
pub enum MassFunction {
    Constant(f64),
    /// Piecewise-linear table; zero outside its range.
    Table(Interpolator),
    /// `below` for `m < threshold`, `above` otherwise.
    Step { threshold: f64, below: f64, above: f64 },
    /// In-process definition (built-in models, tests).
    Custom(Arc<dyn Fn(f64) -> f64 + Send + Sync>),
}

impl MassFunction {
    pub fn custom(f: impl Fn(f64) -> f64 + Send + Sync + 'static) -> Self {
        MassFunction::Custom(Arc::new(f))
    }

    pub fn eval(&self, m: f64) -> f64 {
        match self {
            MassFunction::Constant(v) => *v,
            MassFunction::Table(t) => t.eval(m),
            MassFunction::Step {
                threshold,
                below,
                above,
            } => {
                if m < *threshold {
                    *below
                } else {
                    *above
                }
            }
            MassFunction::Custom(f) => f(m),
        }
    }

    /// True when this is known to vanish for every mass.
    pub fn is_zero(&self) -> bool {
        matches!(self, MassFunction::Constant(v) if *v == 0.0)
    }
}

impl Default for MassFunction {
    fn default() -> Self {
        MassFunction::Constant(0.0)
    }
}

impl From<f64> for MassFunction {
    fn from(value: f64) -> Self {
        MassFunction::Constant(value)
    }
}

impl fmt::Debug for MassFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MassFunction::Constant(v) => f.debug_tuple("Constant").field(v).finish(),
            MassFunction::Table(t) => f.debug_struct("Table").field("points", &t.len()).finish(),
            MassFunction::Step {
                threshold,
                below,
                above,
            } => f
                .debug_struct("Step")
                .field("threshold", threshold)
                .field("below", below)
                .field("above", above)
                .finish(),
            MassFunction::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Axial and vector coupling of one fermion.
#[derive(Debug, Clone, Default)]
pub struct FermionCoupling {
    pub axial: MassFunction,
    pub vector: MassFunction,
}

impl FermionCoupling {
    pub fn new(axial: impl Into<MassFunction>, vector: impl Into<MassFunction>) -> Self {
        Self {
            axial: axial.into(),
            vector: vector.into(),
        }
    }

    pub fn get(&self, sector: Sector) -> &MassFunction {
        match sector {
            Sector::Axial => &self.axial,
            Sector::Vector => &self.vector,
        }
    }
}

/// One point of a bound curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvePoint {
    /// Boson mass (GeV).
    pub mass: f64,
    /// Global coupling bound at this mass.
    pub coupling: f64,
}

/// Result of recasting a limit onto a target model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecastBounds {
    pub lower: Vec<CurvePoint>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upper: Option<Vec<CurvePoint>>,
}

impl RecastBounds {
    pub fn is_double_sided(&self) -> bool {
        self.upper.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fermion_names_round_trip() {
        for f in Fermion::ALL {
            assert_eq!(f.name().parse::<Fermion>().unwrap(), f);
            assert_eq!(Fermion::ALL[f.index()], f);
        }
        assert!("x".parse::<Fermion>().is_err());
    }

    #[test]
    fn step_function_switches_at_threshold() {
        let step = MassFunction::Step {
            threshold: 0.135,
            below: 1.0,
            above: 0.0,
        };
        assert_eq!(step.eval(0.1), 1.0);
        assert_eq!(step.eval(0.135), 0.0);
        assert!(MassFunction::Constant(0.0).is_zero());
        assert!(!MassFunction::custom(|_| 0.0).is_zero());
    }
}
