//! Physical parameters shared by every model, mechanism and limit in a run.
//!
//! Defaults reproduce the standard inputs:
//!
//! - constants (`hbar`, electromagnetic coupling, W/Z masses)
//! - fermion masses and color factors
//! - meson U(3) generators (the photon charge matrix is included for convenience)
//! - vector-meson prefactors, resonance masses, widths and two-body decay channels
//!
//! Tabulated grids (hadronic R-ratios per resonance combination and the axial spectral
//! functions) are not built in. They are attached with [`ParameterTable::with_grid`] or
//! loaded from a data directory by `io::grid`; missing grids evaluate to zero.

use std::collections::{BTreeMap, HashMap};
use std::f64::consts::SQRT_2;

use nalgebra::Vector3;

use crate::domain::{Fermion, HadronicState, Meson};
use crate::math::Interpolator;

/// Breit-Wigner flavour used by every lineshape in the run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineshapeKind {
    Fixed,
    Running,
}

/// Two-body decay channel of a resonance: branching fraction and daughter masses (GeV).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DecayChannel {
    pub branching: f64,
    pub m0: f64,
    pub m1: f64,
}

const fn channel(branching: f64, m0: f64, m1: f64) -> DecayChannel {
    DecayChannel { branching, m0, m1 }
}

/// Axial spectral functions of hadronic tau decay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Spectral {
    /// Light (`u_d`) component.
    Light,
    /// Strange (`s`) component.
    Strange,
}

impl Spectral {
    pub fn key(self) -> &'static str {
        match self {
            Spectral::Light => "u_d",
            Spectral::Strange => "s",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParameterTable {
    /// Speed of light (m/s).
    pub c: f64,
    /// Reduced Planck constant (GeV s).
    pub hbar: f64,
    /// Electromagnetic coupling.
    pub ge: f64,
    /// W mass (GeV).
    pub mw: f64,
    /// Z mass (GeV).
    pub mz: f64,
    pub lineshape: LineshapeKind,
    /// Interference phase for the axial hadronic currents.
    pub cphi: f64,
    /// Proton form-factor coefficient.
    pub pff: f64,
    /// Proton form-factor masses (axial, vector) in GeV.
    pub proton_form_masses: (f64, f64),
    /// Ratio of axial to vector pion form factors at zero mass.
    pub piff: f64,

    fermion_masses: [f64; 12],
    color_factors: [f64; 12],
    meson_masses: BTreeMap<Meson, f64>,
    meson_widths: BTreeMap<Meson, f64>,
    meson_decays: BTreeMap<Meson, Vec<DecayChannel>>,
    r_ratios: HashMap<String, Interpolator>,
    spectral: HashMap<Spectral, Interpolator>,
}

impl Default for ParameterTable {
    fn default() -> Self {
        let meson_masses = BTreeMap::from([
            (Meson::Rho0, 0.77549),
            (Meson::Pi0, 0.13498),
            (Meson::Omega, 0.78265),
            (Meson::Phi, 1.01946),
            (Meson::Eta, 0.54785),
            (Meson::K, 0.49368),
            (Meson::A1, 1.23000),
        ]);
        let meson_widths = BTreeMap::from([
            (Meson::Rho0, 0.14910),
            (Meson::Omega, 0.00849),
            (Meson::Phi, 0.00426),
            (Meson::A1, 0.42000),
        ]);
        let meson_decays = BTreeMap::from([
            (Meson::Rho0, vec![channel(0.9988447, 0.13957, 0.13957)]),
            (
                Meson::Omega,
                vec![
                    channel(0.8994773, 2.0 * 0.13957, 0.13498),
                    channel(0.0834941, 0.13498, 0.0),
                    channel(0.0154283, 0.13957, 0.13957),
                ],
            ),
            (
                Meson::Phi,
                vec![
                    channel(0.4893042, 0.49368, 0.49368),
                    channel(0.3422127, 0.49761, 0.49761),
                    channel(0.0130981, 0.54785, 0.0),
                ],
            ),
            (
                Meson::A1,
                vec![
                    channel(2.0 * 0.3500000, 0.13957, 0.77549),
                    channel(2.0 * 0.0725000, 0.89166, 0.49368),
                    channel(2.0 * 0.0725000, 0.89594, 0.49761),
                    channel(0.0100000, 0.13498, 0.0),
                ],
            ),
        ]);

        Self {
            c: 2.99792458e8,
            hbar: 6.58211951e-25,
            ge: 3.02822e-1,
            mw: 8.0379e1,
            mz: 9.11876e1,
            lineshape: LineshapeKind::Running,
            cphi: -0.66,
            pff: 1.6,
            proton_form_masses: (0.84, 1.01),
            piff: 0.52,
            // Order follows `Fermion::ALL`.
            fermion_masses: [
                5.110e-04, 0.10566, 1.77682, 0.0, 0.0, 0.0, 0.33, 0.33, 0.5, 1.5, 4.8, 171.0,
            ],
            color_factors: [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 3.0, 3.0, 3.0, 3.0, 3.0, 3.0],
            meson_masses,
            meson_widths,
            meson_decays,
            r_ratios: HashMap::new(),
            spectral: HashMap::new(),
        }
    }
}

impl ParameterTable {
    /// Attach the R-ratio grid for one resonance combination of an exclusive state.
    pub fn with_grid(mut self, state: HadronicState, mesons: &[Meson], grid: Interpolator) -> Self {
        self.r_ratios.insert(state.grid_key(mesons), grid);
        self
    }

    /// Attach an axial spectral-function grid.
    pub fn with_spectral(mut self, kind: Spectral, grid: Interpolator) -> Self {
        self.spectral.insert(kind, grid);
        self
    }

    pub fn insert_grid(&mut self, key: impl Into<String>, grid: Interpolator) {
        self.r_ratios.insert(key.into(), grid);
    }

    pub fn insert_spectral(&mut self, kind: Spectral, grid: Interpolator) {
        self.spectral.insert(kind, grid);
    }

    pub fn grid_count(&self) -> usize {
        self.r_ratios.len() + self.spectral.len()
    }

    pub fn fermion_mass(&self, f: Fermion) -> f64 {
        self.fermion_masses[f.index()]
    }

    pub fn set_fermion_mass(&mut self, f: Fermion, mass: f64) {
        self.fermion_masses[f.index()] = mass;
    }

    pub fn color_factor(&self, f: Fermion) -> f64 {
        self.color_factors[f.index()]
    }

    pub fn meson_mass(&self, m: Meson) -> Option<f64> {
        self.meson_masses.get(&m).copied()
    }

    pub fn meson_width(&self, m: Meson) -> Option<f64> {
        self.meson_widths.get(&m).copied()
    }

    pub fn meson_decays(&self, m: Meson) -> Option<&[DecayChannel]> {
        self.meson_decays.get(&m).map(Vec::as_slice)
    }

    /// On-diagonal U(3) generator of a meson, or the photon charge matrix for `Gamma`.
    pub fn generator(&self, m: Meson) -> Option<Vector3<f64>> {
        let t = match m {
            Meson::Gamma => Vector3::new(2.0, -1.0, -1.0) / 3.0,
            Meson::Rho0 | Meson::Pi0 => Vector3::new(1.0, -1.0, 0.0) / 2.0,
            Meson::Omega => Vector3::new(1.0, 1.0, 0.0) / 2.0,
            Meson::Phi => Vector3::new(0.0, 0.0, 1.0) / SQRT_2,
            Meson::Eta => Vector3::new(1.0, 1.0, -1.0) / 6f64.sqrt(),
            Meson::EtaPrime => Vector3::new(1.0, 1.0, 2.0) / (2.0 * 3f64.sqrt()),
            Meson::D0 | Meson::DStar0 => Vector3::new(1.0, 0.0, 0.0),
            Meson::K | Meson::A1 => return None,
        };
        Some(t)
    }

    /// Prefactor of a vector-meson contribution to the hadronic widths.
    pub fn vector_prefactor(&self, m: Meson) -> Option<f64> {
        match m {
            Meson::Rho0 => Some(2.0),
            Meson::Omega => Some(6.0),
            Meson::Phi => Some(3.0 * SQRT_2),
            _ => None,
        }
    }

    /// R-ratio of one resonance combination of an exclusive state at mass `m`.
    pub fn r_ratio(&self, state: HadronicState, mesons: &[Meson], m: f64) -> f64 {
        self.r_ratios
            .get(&state.grid_key(mesons))
            .map_or(0.0, |g| g.eval(m))
    }

    pub fn spectral(&self, kind: Spectral, m: f64) -> f64 {
        self.spectral.get(&kind).map_or(0.0, |g| g.eval(m))
    }
}

/// Trace of the product of three diagonal matrices.
pub fn trace3(a: &Vector3<f64>, b: &Vector3<f64>, c: &Vector3<f64>) -> f64 {
    a.component_mul(b).dot(c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fermion_tables_follow_declaration_order() {
        let p = ParameterTable::default();
        assert_eq!(p.fermion_mass(Fermion::E), 5.110e-04);
        assert_eq!(p.fermion_mass(Fermion::T), 171.0);
        assert_eq!(p.fermion_mass(Fermion::NuMu), 0.0);
        assert_eq!(p.color_factor(Fermion::B), 3.0);
        assert_eq!(p.color_factor(Fermion::Tau), 1.0);
    }

    #[test]
    fn pi0_gamma_couples_only_through_rho_and_omega() {
        let p = ParameterTable::default();
        let pi0 = p.generator(Meson::Pi0).unwrap();
        let gamma = p.generator(Meson::Gamma).unwrap();
        let traces: Vec<f64> = Meson::VECTORS
            .iter()
            .map(|&v| trace3(&pi0, &gamma, &p.generator(v).unwrap()))
            .collect();
        assert!(traces[0].abs() > 0.0);
        assert!(traces[1].abs() > 0.0);
        assert_eq!(traces[2], 0.0);
    }

    #[test]
    fn missing_grids_evaluate_to_zero() {
        let p = ParameterTable::default();
        assert_eq!(p.r_ratio(HadronicState::PiPi, &[Meson::Rho0], 0.7), 0.0);
        let grid = Interpolator::new(vec![0.3, 1.0], vec![1.0, 1.0]).unwrap();
        let p = p.with_grid(HadronicState::PiPi, &[Meson::Rho0], grid);
        assert_eq!(p.r_ratio(HadronicState::PiPi, &[Meson::Rho0], 0.7), 1.0);
    }
}
