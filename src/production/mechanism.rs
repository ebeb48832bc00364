//! Built-in production mechanisms.
//!
//! Names resolve in this order:
//!
//! - `none`: unit cross-section
//! - `p_brem` / `pi_brem`: proton and charged-pion beam bremsstrahlung
//! - `<f>_brem` and `<f>_<f>`: fermion bremsstrahlung and Drell-Yan
//! - `<V>`: vector-meson mixing for `rho0`, `omega`, `phi`
//! - `<A>_<B>`: meson decays `A -> B X` through vector-meson dominance

use nalgebra::Vector3;

use crate::domain::{Fermion, Meson, Sector};
use crate::error::ProductionError;
use crate::models::CouplingModel;
use crate::params::{ParameterTable, trace3};
use crate::production::{BreitWigner, ScatteringTerm};

/// One vector-meson contribution to a meson decay `A -> B X`.
#[derive(Debug, Clone)]
pub struct MixingTerm {
    pub generator: Vector3<f64>,
    pub prefactor: f64,
    pub lineshape: BreitWigner,
}

#[derive(Debug, Clone)]
pub enum Mechanism {
    Unit,
    ProtonBrem {
        pff: f64,
        axial_mass: f64,
        vector_mass: f64,
    },
    PionBrem {
        pre: f64,
        rho: BreitWigner,
        a1: BreitWigner,
    },
    Fermion(Fermion),
    VectorMixing(Vector3<f64>),
    MesonDecay(Vec<MixingTerm>),
    /// Coupling-dependent neutrino scattering; the only non-quadratic mechanism.
    Scattering(Vec<ScatteringTerm>),
}

impl Mechanism {
    pub fn parse(name: &str, params: &ParameterTable) -> Result<Self, ProductionError> {
        if name == "none" {
            return Ok(Mechanism::Unit);
        }
        if name == "p_brem" {
            let (axial_mass, vector_mass) = params.proton_form_masses;
            return Ok(Mechanism::ProtonBrem {
                pff: params.pff,
                axial_mass,
                vector_mass,
            });
        }
        if name == "pi_brem" {
            let rho = BreitWigner::new(params, Meson::Rho0, None)?;
            let a1 = BreitWigner::new(params, Meson::A1, None)?;
            let pre = params.piff * rho.squared(0.0) / a1.squared(0.0);
            return Ok(Mechanism::PionBrem { pre, rho, a1 });
        }

        let parts: Vec<&str> = name.split('_').collect();
        if let [first, second] = parts.as_slice() {
            if *second == "brem" || first == second {
                if let Ok(f) = first.parse::<Fermion>() {
                    return Ok(Mechanism::Fermion(f));
                }
            }
        }

        if let Some(meson) = Meson::parse(name) {
            if Meson::VECTORS.contains(&meson) {
                if let Some(t) = params.generator(meson) {
                    return Ok(Mechanism::VectorMixing(t));
                }
            }
        }

        if let [first, second] = parts.as_slice() {
            let ta = Meson::parse(first).and_then(|m| params.generator(m));
            let tb = Meson::parse(second).and_then(|m| params.generator(m));
            if let (Some(ta), Some(tb)) = (ta, tb) {
                let mut terms = Vec::new();
                for v in Meson::VECTORS {
                    let Some(tv) = params.generator(v) else {
                        continue;
                    };
                    let prefactor = trace3(&ta, &tb, &tv);
                    if prefactor != 0.0 {
                        terms.push(MixingTerm {
                            generator: tv,
                            prefactor,
                            lineshape: BreitWigner::new(params, v, Some(1))?,
                        });
                    }
                }
                return Ok(Mechanism::MesonDecay(terms));
            }
        }

        Err(ProductionError::UnknownMechanism(name.to_string()))
    }

    /// Whether the cross-section scales as `g^2` (and can be cached per mass).
    pub fn is_quadratic(&self) -> bool {
        !matches!(self, Mechanism::Scattering(_))
    }

    /// Cross-section at unit global coupling, up to model-independent factors.
    pub fn sigma(&self, m: f64, model: &CouplingModel) -> f64 {
        let a = |f: Fermion| model.coupling(f, Sector::Axial, m);
        let v = |f: Fermion| model.coupling(f, Sector::Vector, m);
        match self {
            Mechanism::Unit => 1.0,
            Mechanism::ProtonBrem {
                pff,
                axial_mass,
                vector_mass,
            } => {
                let form = (1.0 + (m / vector_mass).powi(2)) / (1.0 + (m / axial_mass).powi(2));
                (2.0 * v(Fermion::U) + v(Fermion::D)).powi(2)
                    + pff * (2.0 * a(Fermion::U) + a(Fermion::D)).powi(2) * form.powi(4)
            }
            Mechanism::PionBrem { pre, rho, a1 } => {
                let form = pre * a1.squared(m) / rho.squared(m);
                (v(Fermion::U) - v(Fermion::D)).powi(2) + (a(Fermion::U) - a(Fermion::D)).powi(2) * form * form
            }
            Mechanism::Fermion(f) => v(*f).powi(2) + a(*f).powi(2),
            Mechanism::VectorMixing(t) => model.trace(m, Sector::Vector, t).powi(2),
            Mechanism::MesonDecay(terms) => terms
                .iter()
                .map(|term| {
                    term.lineshape.amplitude(m)
                        * (term.prefactor * model.trace(m, Sector::Vector, &term.generator))
                })
                .sum::<nalgebra::Complex<f64>>()
                .norm_sqr(),
            Mechanism::Scattering(terms) => terms.iter().map(|t| t.excess(m, 1.0, model)).sum(),
        }
    }

    /// Cross-section at global coupling `g`.
    pub fn sigma_at(&self, m: f64, g: f64, model: &CouplingModel) -> f64 {
        match self {
            Mechanism::Scattering(terms) => terms.iter().map(|t| t.excess(m, g, model)).sum(),
            other => g * g * other.sigma(m, model),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::builtin;

    fn params() -> ParameterTable {
        ParameterTable::default()
    }

    #[test]
    fn resolves_names_in_order() {
        let p = params();
        assert!(matches!(Mechanism::parse("none", &p), Ok(Mechanism::Unit)));
        assert!(matches!(Mechanism::parse("p_brem", &p), Ok(Mechanism::ProtonBrem { .. })));
        assert!(matches!(Mechanism::parse("pi_brem", &p), Ok(Mechanism::PionBrem { .. })));
        assert!(matches!(Mechanism::parse("e_brem", &p), Ok(Mechanism::Fermion(Fermion::E))));
        assert!(matches!(Mechanism::parse("mu_mu", &p), Ok(Mechanism::Fermion(Fermion::Mu))));
        assert!(matches!(Mechanism::parse("phi", &p), Ok(Mechanism::VectorMixing(_))));
        assert!(matches!(Mechanism::parse("pi0_gamma", &p), Ok(Mechanism::MesonDecay(_))));
        assert_eq!(
            Mechanism::parse("e_mu", &p).unwrap_err(),
            ProductionError::UnknownMechanism("e_mu".to_string())
        );
        assert!(Mechanism::parse("eta", &p).is_err());
    }

    #[test]
    fn pi0_decay_mixes_only_through_rho_and_omega() {
        let Ok(Mechanism::MesonDecay(terms)) = Mechanism::parse("pi0_gamma", &params()) else {
            panic!("pi0_gamma should be a meson decay");
        };
        assert_eq!(terms.len(), 2);
    }

    #[test]
    fn dark_photon_meson_decay_is_close_to_charge_squared_far_below_resonances() {
        let p = Arc::new(params());
        let model = builtin("dark_photon", Arc::clone(&p)).unwrap();
        let mech = Mechanism::parse("pi0_gamma", &p).unwrap();
        // At small masses the lineshapes tend to one. The vector generators are orthogonal
        // with squared norm 1/2, so the sum collapses to tr(Q T_pi0 T_gamma) / 2.
        let ge = p.ge;
        let expected = (0.5 * ge * trace3(
            &p.generator(Meson::Pi0).unwrap(),
            &p.generator(Meson::Gamma).unwrap(),
            &p.generator(Meson::Gamma).unwrap(),
        ))
        .powi(2);
        let sigma = mech.sigma(1e-3, &model);
        assert!((sigma / expected - 1.0).abs() < 1e-3, "{sigma} vs {expected}");
    }

    #[test]
    fn quadratic_mechanisms_scale_with_g_squared() {
        let p = Arc::new(params());
        let model = builtin("chiral", Arc::clone(&p)).unwrap();
        for name in ["p_brem", "pi_brem", "e_e", "omega", "eta_gamma"] {
            let mech = Mechanism::parse(name, &p).unwrap();
            assert!(mech.is_quadratic());
            let s1 = mech.sigma(0.4, &model);
            let s3 = mech.sigma_at(0.4, 3.0, &model);
            assert!((s3 - 9.0 * s1).abs() <= 1e-12 * s3.abs(), "{name}");
        }
    }
}
