//! Production of the boson at an experiment.
//!
//! A `ProductionMechanism` is a weighted set of channels. Its only job is the
//! cross-section ratio between two models at a given mass and pair of couplings:
//!
//! - quadratic mechanisms factor the couplings out, `(g0/g1)^2 * R(m)`, and cache `R`
//!   for the most recent mass
//! - general mechanisms (any coupling-dependent channel) evaluate both cross-sections
//!   in full on every call
//!
//! The cache is keyed on mass only. A mechanism must not be shared between recasts
//! onto different target models running at the same time.

pub mod breit_wigner;
pub mod mechanism;
pub mod scattering;

pub use breit_wigner::*;
pub use mechanism::*;
pub use scattering::*;

use std::cell::Cell;
use std::fmt;

use crate::domain::MassFunction;
use crate::error::ProductionError;
use crate::models::CouplingModel;
use crate::params::ParameterTable;

/// One production channel and its mass-dependent fraction.
#[derive(Debug, Clone)]
pub struct Channel {
    pub mechanism: Mechanism,
    pub fraction: MassFunction,
}

pub struct ProductionMechanism {
    name: String,
    channels: Vec<Channel>,
    quadratic: bool,
    cache: Cell<Option<(f64, f64)>>,
}

impl ProductionMechanism {
    /// Single built-in mechanism with unit fraction.
    pub fn new(name: &str, params: &ParameterTable) -> Result<Self, ProductionError> {
        let mechanism = Mechanism::parse(name, params)?;
        Self::from_channels(
            name,
            vec![Channel {
                mechanism,
                fraction: MassFunction::Constant(1.0),
            }],
        )
    }

    /// Weighted union of built-in mechanisms, e.g. `pi0_gamma` below the pion mass and
    /// `eta_gamma` above.
    pub fn weighted<S: AsRef<str>>(
        name: &str,
        channels: Vec<(S, MassFunction)>,
        params: &ParameterTable,
    ) -> Result<Self, ProductionError> {
        let channels = channels
            .into_iter()
            .map(|(mech, fraction)| {
                Ok(Channel {
                    mechanism: Mechanism::parse(mech.as_ref(), params)?,
                    fraction,
                })
            })
            .collect::<Result<Vec<_>, ProductionError>>()?;
        Self::from_channels(name, channels)
    }

    /// Coupling-dependent neutrino scattering on electrons at rest.
    pub fn scattering(name: &str, terms: Vec<ScatteringTerm>) -> Result<Self, ProductionError> {
        for term in &terms {
            term.validate(name)?;
        }
        if terms.is_empty() {
            return Err(ProductionError::NoChannels {
                name: name.to_string(),
            });
        }
        Self::from_channels(
            name,
            vec![Channel {
                mechanism: Mechanism::Scattering(terms),
                fraction: MassFunction::Constant(1.0),
            }],
        )
    }

    pub fn from_channels(name: &str, channels: Vec<Channel>) -> Result<Self, ProductionError> {
        if channels.is_empty() {
            return Err(ProductionError::NoChannels {
                name: name.to_string(),
            });
        }
        let quadratic = channels.iter().all(|c| c.mechanism.is_quadratic());
        Ok(Self {
            name: name.to_string(),
            channels,
            quadratic,
            cache: Cell::new(None),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }

    pub fn is_quadratic(&self) -> bool {
        self.quadratic
    }

    /// Cross-section ratio `sigma(m, g0, target) / sigma(m, g1, reference)`.
    ///
    /// Channels whose reference cross-section vanishes are skipped.
    pub fn ratio(
        &self,
        m: f64,
        g0: f64,
        g1: f64,
        target: &CouplingModel,
        reference: &CouplingModel,
    ) -> f64 {
        if !self.quadratic {
            return self
                .channels
                .iter()
                .filter_map(|c| {
                    let den = c.mechanism.sigma_at(m, g1, reference);
                    (den != 0.0).then(|| c.fraction.eval(m) * c.mechanism.sigma_at(m, g0, target) / den)
                })
                .sum();
        }

        let scale = (g0 / g1).powi(2);
        if let Some((cached_m, ratio)) = self.cache.get() {
            if cached_m == m {
                return scale * ratio;
            }
        }
        let ratio: f64 = self
            .channels
            .iter()
            .filter_map(|c| {
                let den = c.mechanism.sigma(m, reference);
                (den != 0.0).then(|| c.fraction.eval(m) * c.mechanism.sigma(m, target) / den)
            })
            .sum();
        self.cache.set(Some((m, ratio)));
        scale * ratio
    }

    /// Forget the cached ratio. Called before evaluating against a new target model.
    pub(crate) fn reset_cache(&self) {
        self.cache.set(None);
    }
}

impl Clone for ProductionMechanism {
    /// Clones start with an empty ratio cache.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            channels: self.channels.clone(),
            quadratic: self.quadratic,
            cache: Cell::new(None),
        }
    }
}

impl fmt::Debug for ProductionMechanism {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProductionMechanism")
            .field("name", &self.name)
            .field("channels", &self.channels)
            .field("quadratic", &self.quadratic)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::domain::{Fermion, Meson};
    use crate::models::builtin;

    fn params() -> Arc<ParameterTable> {
        Arc::new(ParameterTable::default())
    }

    #[test]
    fn self_ratio_is_one_for_every_builtin_mechanism() {
        let p = params();
        let model = builtin("dark_photon", Arc::clone(&p)).unwrap();
        for name in ["none", "p_brem", "pi_brem", "e_brem", "mu_mu", "rho0", "omega", "phi", "pi0_gamma", "eta_gamma"] {
            let prod = ProductionMechanism::new(name, &p).unwrap();
            for m in [0.01, 0.3, 0.78, 2.0] {
                let r = prod.ratio(m, 0.2, 0.2, &model, &model);
                assert!((r - 1.0).abs() < 1e-12, "{name} at {m}: {r}");
            }
        }
    }

    #[test]
    fn ratio_scales_with_coupling_and_charges() {
        let p = params();
        let dark_photon = builtin("dark_photon", Arc::clone(&p)).unwrap();
        let b_minus_l = builtin("B-L_boson", Arc::clone(&p)).unwrap();
        let prod = ProductionMechanism::new("e_e", &p).unwrap();
        let r = prod.ratio(0.5, 2e-3, 1e-3, &b_minus_l, &dark_photon);
        let expected = 4.0 / p.ge.powi(2);
        assert!((r / expected - 1.0).abs() < 1e-12);
        // Cached value at the same mass with different couplings.
        let r2 = prod.ratio(0.5, 1e-3, 1e-3, &b_minus_l, &dark_photon);
        assert!((r2 / (expected / 4.0) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn zero_reference_cross_section_skips_the_channel() {
        let p = params();
        let axial = builtin("axial", Arc::clone(&p)).unwrap();
        let dark_photon = builtin("dark_photon", Arc::clone(&p)).unwrap();
        // Pure axial models do not mix with vector mesons.
        let prod = ProductionMechanism::new("phi", &p).unwrap();
        assert_eq!(prod.ratio(1.0, 1.0, 1.0, &dark_photon, &axial), 0.0);
    }

    #[test]
    fn weighted_channels_switch_with_their_fractions() {
        let p = params();
        let mpi = p.meson_mass(Meson::Pi0).unwrap() - 2.0 * p.fermion_mass(Fermion::E);
        let prod = ProductionMechanism::weighted(
            "meson_decays",
            vec![
                ("pi0_gamma", MassFunction::Step { threshold: mpi, below: 1.0, above: 0.0 }),
                ("eta_gamma", MassFunction::Step { threshold: mpi, below: 0.0, above: 1.0 }),
            ],
            &p,
        )
        .unwrap();
        assert!(prod.is_quadratic());
        let dark_photon = builtin("dark_photon", Arc::clone(&p)).unwrap();
        let b_minus_l = builtin("B-L_boson", Arc::clone(&p)).unwrap();

        let single = ProductionMechanism::new("eta_gamma", &p).unwrap();
        let m = 0.3;
        let a = prod.ratio(m, 1.0, 1.0, &b_minus_l, &dark_photon);
        let b = single.ratio(m, 1.0, 1.0, &b_minus_l, &dark_photon);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn scattering_mechanisms_are_not_factored() {
        let p = params();
        let model = builtin("B-L_boson", Arc::clone(&p)).unwrap();
        let prod = ProductionMechanism::scattering(
            "nu_scat",
            vec![ScatteringTerm {
                process: ScatteringProcess::DifferentFlavour,
                neutrino: Fermion::NuMu,
                lepton: Fermion::E,
                energy: 23.7,
            }],
        )
        .unwrap();
        assert!(!prod.is_quadratic());
        let r = prod.ratio(0.01, 1e-5, 1e-5, &model, &model);
        assert!((r - 1.0).abs() < 1e-12);
        assert!(ProductionMechanism::scattering("nu_scat", Vec::new()).is_err());
    }

    #[test]
    fn clones_drop_the_cached_ratio() {
        let p = params();
        let model = builtin("dark_photon", Arc::clone(&p)).unwrap();
        let prod = ProductionMechanism::new("e_e", &p).unwrap();
        prod.ratio(0.5, 1.0, 1.0, &model, &model);
        assert!(prod.cache.get().is_some());
        assert!(prod.clone().cache.get().is_none());
        prod.reset_cache();
        assert!(prod.cache.get().is_none());
    }
}
