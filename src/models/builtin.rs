//! Built-in coupling models.
//!
//! Each entry gives the `(axial, vector)` coupling of every fermion. Custom models are
//! loaded from JSON definitions by `io::records`.

use std::f64::consts::PI;
use std::sync::Arc;

use nalgebra::Complex;

use crate::domain::{Fermion, MassFunction};
use crate::error::ModelError;
use crate::models::{CouplingModel, ModelDefinition};
use crate::params::ParameterTable;

pub const BUILTIN_MODELS: [&str; 7] = [
    "dark_photon",
    "B-L_boson",
    "B_boson",
    "Le-Lmu_boson",
    "axial",
    "chiral",
    "2hdm",
];

/// Definition of a built-in model, or `None` for an unknown name.
pub fn builtin_definition(name: &str, params: &ParameterTable) -> Option<ModelDefinition> {
    let ge = params.ge;
    let table: Vec<(Fermion, MassFunction, MassFunction)> = match name {
        "dark_photon" => charges()
            .into_iter()
            .map(|(f, q)| (f, MassFunction::Constant(0.0), MassFunction::Constant(q * ge)))
            .collect(),
        "B-L_boson" => Fermion::ALL
            .into_iter()
            .map(|f| {
                let q: f64 = if is_quark(f) { 1.0 / 3.0 } else { -1.0 };
                (f, MassFunction::Constant(0.0), MassFunction::Constant(q))
            })
            .collect(),
        "B_boson" => {
            let loop_mixing = -ge * ge / (4.0 * PI).powi(2);
            Fermion::ALL
                .into_iter()
                .map(|f| {
                    let v: f64 = if is_quark(f) {
                        1.0 / 3.0
                    } else if f.is_neutrino() {
                        0.0
                    } else {
                        loop_mixing
                    };
                    (f, MassFunction::Constant(0.0), MassFunction::Constant(v))
                })
                .collect()
        }
        "Le-Lmu_boson" => le_lmu(params),
        "axial" => constants(&[
            (Fermion::E, -1.0, 0.0),
            (Fermion::Mu, -1.0, 0.0),
            (Fermion::Tau, -1.0, 0.0),
            (Fermion::NuE, -0.25, 0.25),
            (Fermion::NuMu, -0.25, 0.25),
            (Fermion::NuTau, -0.25, 0.25),
            (Fermion::D, -1.0, 0.0),
            (Fermion::U, 1.0, 0.0),
            (Fermion::S, -1.0, 0.0),
        ]),
        "chiral" => constants(&[
            (Fermion::E, -1.0, -1.0),
            (Fermion::Mu, -1.0, -1.0),
            (Fermion::Tau, -1.0, -1.0),
            (Fermion::D, -1.0, 1.0),
            (Fermion::U, 1.0, 1.0),
            (Fermion::S, -1.0, 1.0),
        ]),
        "2hdm" => two_higgs_doublet(),
        _ => return None,
    };

    let mut def = ModelDefinition::new(name);
    for (f, axial, vector) in table {
        def = def.coupling(f, axial, vector);
    }
    Some(def.fill_zero())
}

/// Build a built-in model.
pub fn builtin(name: &str, params: Arc<ParameterTable>) -> Result<CouplingModel, ModelError> {
    let def = builtin_definition(name, &params).ok_or_else(|| ModelError::InconsistentStates {
        model: name.to_string(),
        reason: "no built-in model with this name".to_string(),
    })?;
    CouplingModel::new(def, params)
}

fn is_quark(f: Fermion) -> bool {
    f.index() >= Fermion::D.index()
}

/// Electric charges in units of the positron charge.
fn charges() -> Vec<(Fermion, f64)> {
    Fermion::ALL
        .into_iter()
        .map(|f| {
            let q = match f {
                Fermion::E | Fermion::Mu | Fermion::Tau => -1.0,
                Fermion::NuE | Fermion::NuMu | Fermion::NuTau => 0.0,
                Fermion::D | Fermion::S | Fermion::B => -1.0 / 3.0,
                Fermion::U | Fermion::C | Fermion::T => 2.0 / 3.0,
            };
            (f, q)
        })
        .collect()
}

fn constants(rows: &[(Fermion, f64, f64)]) -> Vec<(Fermion, MassFunction, MassFunction)> {
    rows.iter()
        .map(|&(f, a, v)| (f, MassFunction::Constant(a), MassFunction::Constant(v)))
        .collect()
}

fn two_higgs_doublet() -> Vec<(Fermion, MassFunction, MassFunction)> {
    // Mixing, Higgs charges, weak angle and muon vector offset.
    let (the, qhd, qhu, sw2, kap) = (0.1, 0.1, 2.0, 0.22, 0.0);
    let down_axial = -0.5 * qhd - 0.5 * the;
    let up_axial = -0.5 * qhu + 0.5 * the;
    let lepton_vector = 0.5 * qhd + the * (-0.5 + 2.0 * sw2);
    let down_vector = 0.5 * qhd + the * (-0.5 + 2.0 / 3.0 * sw2);
    let up_vector = 0.5 * qhu + the * (0.5 - 4.0 / 3.0 * sw2);
    constants(&[
        (Fermion::E, down_axial, lepton_vector),
        (Fermion::Mu, down_axial, lepton_vector + kap),
        (Fermion::Tau, down_axial, lepton_vector - kap),
        (Fermion::NuE, 0.5 * the, 0.5 * the),
        (Fermion::NuMu, 0.5 * (the + kap), 0.5 * (the + kap)),
        (Fermion::NuTau, 0.5 * (the - kap), 0.5 * (the - kap)),
        (Fermion::D, down_axial, down_vector),
        (Fermion::U, up_axial, up_vector),
        (Fermion::S, down_axial, down_vector),
        (Fermion::C, up_axial, up_vector),
        (Fermion::B, down_axial, down_vector),
        (Fermion::T, up_axial, up_vector),
    ])
}

fn le_lmu(params: &ParameterTable) -> Vec<(Fermion, MassFunction, MassFunction)> {
    let ge = params.ge;
    let m0 = params.fermion_mass(Fermion::Mu);
    let m1 = params.fermion_mass(Fermion::Tau);
    let eps = move |m: f64| loop_mixing(m, m0, m1, ge);

    let mut rows = constants(&[
        (Fermion::E, 0.0, 1.0),
        (Fermion::Mu, 0.0, -1.0),
        (Fermion::NuE, 0.0, 1.0),
        (Fermion::NuMu, 0.0, -1.0),
    ]);
    rows.push((Fermion::Tau, MassFunction::Constant(0.0), MassFunction::custom(move |m| -eps(m))));
    for f in [Fermion::D, Fermion::S, Fermion::B] {
        rows.push((f, MassFunction::Constant(0.0), MassFunction::custom(move |m| -eps(m) / 3.0)));
    }
    for f in [Fermion::U, Fermion::C, Fermion::T] {
        rows.push((f, MassFunction::Constant(0.0), MassFunction::custom(move |m| 2.0 * eps(m) / 3.0)));
    }
    rows
}

/// Kinetic mixing induced by a `m0`/`m1` lepton loop.
pub fn loop_mixing(m: f64, m0: f64, m1: f64, ge: f64) -> f64 {
    if m <= 0.0 {
        return 1.0;
    }
    if 4.0 * m0 * m0 == m * m || 4.0 * m1 * m1 == m * m {
        return 0.0;
    }
    let term = |mi: f64| {
        let root = Complex::new(4.0 * mi * mi - m * m, 0.0).sqrt();
        root * (Complex::new(m, 0.0) / root).atan() * (m * m + 2.0 * mi * mi)
    };
    let m3 = m.powi(3);
    let sum = Complex::new(4.0 * m * (m0 - m1) * (m0 + m1) - m3 * (m0 * m0 / (m1 * m1)).ln(), 0.0)
        - term(m0) * 2.0
        + term(m1) * 2.0;
    (sum / m3 * (ge * ge / (12.0 * PI * PI))).norm()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FinalState, Sector};

    fn params() -> Arc<ParameterTable> {
        Arc::new(ParameterTable::default())
    }

    #[test]
    fn every_builtin_model_builds() {
        for name in BUILTIN_MODELS {
            let model = builtin(name, params()).unwrap();
            assert_eq!(model.name(), name);
            let w = model.width_of(FinalState::Total, 0.5, 1.0).unwrap();
            assert!(w.is_finite() && w > 0.0, "{name}: {w}");
        }
        assert!(builtin("no_such_model", params()).is_err());
    }

    #[test]
    fn dark_photon_is_pure_vector_with_electric_charges() {
        let model = builtin("dark_photon", params()).unwrap();
        assert!(!model.axial_active());
        let ge = model.params().ge;
        assert!((model.coupling(Fermion::U, Sector::Vector, 1.0) - 2.0 * ge / 3.0).abs() < 1e-15);
        assert_eq!(model.coupling(Fermion::NuMu, Sector::Vector, 1.0), 0.0);
    }

    #[test]
    fn axial_and_chiral_models_report_axial_couplings() {
        assert!(builtin("axial", params()).unwrap().axial_active());
        assert!(builtin("chiral", params()).unwrap().axial_active());
        assert!(!builtin("B-L_boson", params()).unwrap().axial_active());
    }

    #[test]
    fn loop_mixing_is_finite_on_both_sides_of_thresholds() {
        let p = ParameterTable::default();
        let (m0, m1) = (p.fermion_mass(Fermion::Mu), p.fermion_mass(Fermion::Tau));
        assert_eq!(loop_mixing(0.0, m0, m1, p.ge), 1.0);
        assert_eq!(loop_mixing(2.0 * m0, m0, m1, p.ge), 0.0);
        for m in [0.01, 0.15, 0.5, 3.0, 10.0] {
            let e = loop_mixing(m, m0, m1, p.ge);
            assert!(e.is_finite() && e > 0.0, "m = {m}: {e}");
        }
        // Loop-suppressed relative to the tree-level couplings.
        assert!(loop_mixing(0.5, m0, m1, p.ge) < 0.1);
    }
}
