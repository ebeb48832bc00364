//! Final-state vocabulary.
//!
//! Final states form a closed, recursively composable set: elementary fermion pairs,
//! the three-photon loop state, exclusive hadronic states and named aggregates. The
//! canonical string names (`e_e`, `pi+_pi-`, `visible`, ...) are what definition
//! records and the CLI use.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::domain::{Fermion, Meson};
use crate::error::ModelError;

/// Exclusive hadronic final states reached through vector-meson mixing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum HadronicState {
    PiPi,
    FourPiCharged,
    FourPiNeutral,
    ThreePi,
    Pi0Gamma,
    KK,
    KKPi,
    Other,
}

impl HadronicState {
    pub const ALL: [HadronicState; 8] = [
        HadronicState::PiPi,
        HadronicState::FourPiCharged,
        HadronicState::FourPiNeutral,
        HadronicState::ThreePi,
        HadronicState::Pi0Gamma,
        HadronicState::KK,
        HadronicState::KKPi,
        HadronicState::Other,
    ];

    pub fn name(self) -> &'static str {
        match self {
            HadronicState::PiPi => "pi+_pi-",
            HadronicState::FourPiCharged => "pi+_pi-_pi+_pi-",
            HadronicState::FourPiNeutral => "pi+_pi-_pi0_pi0",
            HadronicState::ThreePi => "pi+_pi-_pi0",
            HadronicState::Pi0Gamma => "pi0_gamma",
            HadronicState::KK => "K_K",
            HadronicState::KKPi => "K_K_pi",
            HadronicState::Other => "other",
        }
    }

    /// Vector-meson contributions to this state. Two-meson entries are interference terms.
    pub fn components(self) -> &'static [&'static [Meson]] {
        match self {
            HadronicState::PiPi
            | HadronicState::FourPiCharged
            | HadronicState::FourPiNeutral => &[&[Meson::Rho0]],
            HadronicState::ThreePi => &[&[Meson::Omega], &[Meson::Phi], &[Meson::Omega, Meson::Phi]],
            HadronicState::Pi0Gamma => &[&[Meson::Omega]],
            HadronicState::KK | HadronicState::KKPi => &[&[Meson::Phi]],
            HadronicState::Other => &[&[Meson::Rho0], &[Meson::Omega], &[Meson::Phi]],
        }
    }

    /// Key of the R-ratio grid for one contribution, e.g. `pi+_pi-_pi0.omega_phi`.
    pub fn grid_key(self, mesons: &[Meson]) -> String {
        let joined: Vec<&str> = mesons.iter().map(|m| m.name()).collect();
        format!("{}.{}", self.name(), joined.join("_"))
    }
}

/// A decay final state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FinalState {
    /// Decoupled decay: the boson is treated as never decaying.
    NoDecay,
    Pair(Fermion),
    ThreePhoton,
    Exclusive(HadronicState),
    Leptons,
    Quarks,
    Neutrinos,
    Hadrons,
    Dark,
    Visible,
    Invisible,
    Total,
}

impl FinalState {
    /// Sub-states of the aggregates whose content does not depend on the model.
    pub fn fixed_substates(self) -> Option<Vec<FinalState>> {
        use FinalState::*;
        let states = match self {
            Leptons => vec![Pair(Fermion::E), Pair(Fermion::Mu), Pair(Fermion::Tau)],
            Quarks => vec![Pair(Fermion::C), Pair(Fermion::B), Pair(Fermion::T)],
            Neutrinos => vec![
                Pair(Fermion::NuE),
                Pair(Fermion::NuMu),
                Pair(Fermion::NuTau),
            ],
            Invisible => vec![Dark, Neutrinos],
            _ => return None,
        };
        Some(states)
    }

    pub fn name(self) -> String {
        match self {
            FinalState::NoDecay => "none".to_string(),
            FinalState::Pair(f) => format!("{f}_{f}"),
            FinalState::ThreePhoton => "gamma_gamma_gamma".to_string(),
            FinalState::Exclusive(h) => h.name().to_string(),
            FinalState::Leptons => "leptons".to_string(),
            FinalState::Quarks => "quarks".to_string(),
            FinalState::Neutrinos => "neutrinos".to_string(),
            FinalState::Hadrons => "hadrons".to_string(),
            FinalState::Dark => "dark".to_string(),
            FinalState::Visible => "visible".to_string(),
            FinalState::Invisible => "invisible".to_string(),
            FinalState::Total => "total".to_string(),
        }
    }
}

impl fmt::Display for FinalState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name())
    }
}

impl FromStr for FinalState {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let state = match s {
            "none" => FinalState::NoDecay,
            "gamma_gamma_gamma" => FinalState::ThreePhoton,
            "leptons" => FinalState::Leptons,
            "quarks" => FinalState::Quarks,
            "neutrinos" => FinalState::Neutrinos,
            "hadrons" => FinalState::Hadrons,
            "dark" => FinalState::Dark,
            "visible" => FinalState::Visible,
            "invisible" => FinalState::Invisible,
            "total" => FinalState::Total,
            _ => {
                if let Some(h) = HadronicState::ALL.into_iter().find(|h| h.name() == s) {
                    return Ok(FinalState::Exclusive(h));
                }
                let Some((a, b)) = s.split_once('_') else {
                    return Err(ModelError::UnknownState(s.to_string()));
                };
                if a != b {
                    return Err(ModelError::UnknownState(s.to_string()));
                }
                let fermion = a
                    .parse::<Fermion>()
                    .map_err(|_| ModelError::UnknownState(s.to_string()))?;
                FinalState::Pair(fermion)
            }
        };
        Ok(state)
    }
}

impl TryFrom<String> for FinalState {
    type Error = ModelError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FinalState> for String {
    fn from(value: FinalState) -> Self {
        value.name()
    }
}

/// Parse a list of state names.
pub fn parse_states<S: AsRef<str>>(names: &[S]) -> Result<Vec<FinalState>, ModelError> {
    names.iter().map(|n| n.as_ref().parse()).collect()
}
