//! Neutrino-lepton elastic scattering with the lepton initially at rest.
//!
//! Each process returns the absolute difference between the model and Standard Model
//! cross-sections. The interference term is linear in `g^2` and the pure boson term
//! quadratic, so these mechanisms are evaluated at the actual couplings on every call.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::domain::{Fermion, Sector};
use crate::error::ProductionError;
use crate::models::CouplingModel;
use crate::params::ParameterTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScatteringProcess {
    /// `nu + l -> nu + l` with different neutrino and lepton flavours.
    #[serde(rename = "nu_l")]
    DifferentFlavour,
    /// `nu_l + l -> nu_l + l`.
    #[serde(rename = "nul_l")]
    SameFlavour,
    /// `nubar_l + l -> nubar_l + l`.
    #[serde(rename = "nulbar_l")]
    AntiSameFlavour,
}

/// One scattering contribution to a production mechanism.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScatteringTerm {
    pub process: ScatteringProcess,
    pub neutrino: Fermion,
    pub lepton: Fermion,
    /// Neutrino beam energy (GeV).
    pub energy: f64,
}

impl ScatteringTerm {
    pub fn validate(&self, mechanism: &str) -> Result<(), ProductionError> {
        let ok = self.neutrino.is_neutrino()
            && matches!(self.lepton, Fermion::E | Fermion::Mu | Fermion::Tau)
            && self.energy.is_finite()
            && self.energy > 0.0;
        if ok {
            Ok(())
        } else {
            Err(ProductionError::UnknownMechanism(format!(
                "{mechanism}: scattering of {} on {} at {} GeV",
                self.neutrino, self.lepton, self.energy
            )))
        }
    }

    /// `|sigma_model(m, g) - sigma_SM|`.
    pub fn excess(&self, m: f64, g: f64, model: &CouplingModel) -> f64 {
        let m = if m == 0.0 { 1e-5 } else { m };
        let ew = Electroweak::new(model.params(), self.lepton);
        let c = Couplings {
            an: model.coupling(self.neutrino, Sector::Axial, m),
            vn: model.coupling(self.neutrino, Sector::Vector, m),
            al: model.coupling(self.lepton, Sector::Axial, m),
            vl: model.coupling(self.lepton, Sector::Vector, m),
        };
        let sigma = match self.process {
            ScatteringProcess::DifferentFlavour => different_flavour,
            ScatteringProcess::SameFlavour => same_flavour,
            ScatteringProcess::AntiSameFlavour => anti_same_flavour,
        };
        let sm = sigma(m, g, self.energy, &Couplings::ZERO, &ew);
        (sigma(m, g, self.energy, &c, &ew) - sm).abs()
    }
}

#[derive(Debug, Clone, Copy)]
struct Couplings {
    an: f64,
    vn: f64,
    al: f64,
    vl: f64,
}

impl Couplings {
    const ZERO: Couplings = Couplings {
        an: 0.0,
        vn: 0.0,
        al: 0.0,
        vl: 0.0,
    };
}

#[derive(Debug, Clone, Copy)]
struct Electroweak {
    ml: f64,
    mw: f64,
    mz: f64,
    cw: f64,
    sw: f64,
    gf: f64,
}

impl Electroweak {
    fn new(params: &ParameterTable, lepton: Fermion) -> Self {
        let (mw, mz) = (params.mw, params.mz);
        let cw = mw / mz;
        let sw = (1.0 - cw * cw).sqrt();
        let gf = 4.0 * PI * PI * params.ge.powi(2) / (2f64.sqrt() * mz * mz * cw * cw * sw * sw);
        Self {
            ml: params.fermion_mass(lepton),
            mw,
            mz,
            cw,
            sw,
            gf,
        }
    }
}

fn different_flavour(m: f64, g: f64, en: f64, c: &Couplings, ew: &Electroweak) -> f64 {
    let Couplings { an, vn, al, vl } = *c;
    let Electroweak { ml, sw, gf, .. } = *ew;
    let (m2, sw2, e2) = (m * m, sw * sw, en * en);
    let a = 2.0 * en + ml;
    let log_term = ((a * m2) / (4.0 * e2 * ml + a * m2)).ln();
    let mixed = an * an * (al * al + vl * vl) - 4.0 * al * an * vl * vn + (al * al + vl * vl) * vn * vn;

    let sm = (16.0 * e2 * gf * gf * ml.powi(3)
        * (3.0 * a * a - 6.0 * a * (4.0 * en + ml) * sw2
            + 4.0 * (16.0 * e2 + 12.0 * en * ml + 3.0 * ml * ml) * sw2 * sw2))
        / a.powi(3);

    let interference = (1.0 / e2) * 3.0 * gf * g * g * (an - vn)
        * (-((4.0 * e2 * ml
            * (-2.0 * a * (2.0 * ml * a + m2) * sw2 * (al + vl)
                + ml * (4.0 * e2 * sw2 * (al + vl) + ml * a * (al + 4.0 * sw2 * al + vl))))
            / (a * a))
            + (8.0 * en * ml * m2 * sw2 * (al + vl) + 2.0 * m2 * m2 * sw2 * (al + vl)
                - ml * ml * m2 * (al + vl - 4.0 * sw2 * vl)
                + 4.0 * e2 * ml * ml * (al + (-1.0 + 4.0 * sw2) * vl))
                * log_term);

    let boson = 3.0 * g.powi(4)
        * ((1.0 / (a * m2 * (4.0 * e2 * ml + a * m2)))
            * 4.0
            * ml
            * (-ml.powi(3) * m2 * (al - vl) * (al + vl) * (an * an + vn * vn)
                + 8.0 * en.powi(3) * ml * ml * (al * al + vl * vl) * (an * an + vn * vn)
                + ml * m2 * m2 * mixed
                + 2.0 * en * m2
                    * (2.0 * ml * ml * vl * (an * an * vl - 2.0 * al * an * vn + vl * vn * vn)
                        + m2 * mixed)
                + 2.0 * e2 * ml
                    * (2.0 * ml * ml * (al * al + vl * vl) * (an * an + vn * vn) + 3.0 * m2 * mixed))
            + ((-2.0 * ml * ml * al * (-2.0 * an * vl * vn + al * (an * an + vn * vn))
                + (2.0 * en * ml + ml * ml + m2)
                    * (-4.0 * al * an * vl * vn
                        + al * al * (an * an + vn * vn)
                        + vl * vl * (an * an + vn * vn)))
                * log_term)
                / e2);

    (1.0 / (12.0 * ml * ml * PI)) * (sm + interference + boson)
}

/// Pure boson exchange term shared by the same-flavour processes; `sign` selects
/// neutrino (-1) or antineutrino (+1) helicity.
fn same_flavour_boson(m: f64, en: f64, ml: f64, c: &Couplings, sign: f64) -> f64 {
    let Couplings { an, vn, al, vl } = *c;
    let (m2, e2) = (m * m, en * en);
    let a = 2.0 * en + ml;
    let s2 = (al * al + vl * vl) * (an * an + vn * vn);
    let mixed = (al * al + vl * vl) * an * an + sign * 4.0 * al * vl * vn * an + (al * al + vl * vl) * vn * vn;

    let rational = (4.0 * ml
        * (ml * mixed * m2 * m2 - ml.powi(3) * (al - vl) * (al + vl) * (an * an + vn * vn) * m2
            + 2.0 * en
                * (2.0 * vl * (vl * an * an + sign * 2.0 * al * vn * an + vl * vn * vn) * ml * ml + m2 * mixed)
                * m2
            + 8.0 * en.powi(3) * ml * ml * s2
            + 2.0 * e2 * ml * (2.0 * s2 * ml * ml + 3.0 * m2 * mixed)))
        / (a * m2 * (4.0 * ml * e2 + a * m2));
    let logarithmic = 1.0 / e2
        * (-(al - vl) * (al + vl) * (an * an + vn * vn) * ml * ml
            + 2.0 * en
                * ((an * an + vn * vn) * al * al + sign * 4.0 * an * vl * vn * al + vl * vl * (an * an + vn * vn))
                * ml
            + m2 * mixed)
        * (2.0 * m.ln() - ((4.0 * ml * e2) / a + m2).ln());

    1.0 / (4.0 * ml * ml * PI) * (rational + logarithmic)
}

fn same_flavour(m: f64, g: f64, en: f64, c: &Couplings, ew: &Electroweak) -> f64 {
    let Couplings { an, vn, al, vl } = *c;
    let Electroweak { ml, mw, mz, cw, sw, gf } = *ew;
    let (m2, sw2, e2, mw2) = (m * m, sw * sw, en * en, mw * mw);
    let a = 2.0 * en + ml;
    let z = mw2 - 2.0 * cw * cw * mz * mz;
    let czz = 2.0 * cw * cw * mz * mz;

    let boson = same_flavour_boson(m, en, ml, c, -1.0) * g.powi(4);

    let interference = 1.0 / (4.0 * ml * ml * mw2 * PI) * gf * (an - vn)
        * (-4.0 * ((al + (4.0 * sw2 - 1.0) * vl) * mw2 + czz * (vl - al))
            * ((4.0 * ml * e2) / a + m2).ln()
            * ml
            * ml
            + 1.0 / (a * a)
                * (-4.0 * a * z * al * ml.powi(3) - 4.0 * a * z * vl * ml.powi(3)
                    + 8.0 * mw2 * (a * m2 + 2.0 * en * ml * (3.0 * en + 2.0 * ml)) * sw2 * al * ml
                    + 8.0 * mw2 * (a * m2 + 2.0 * ml * (en + ml) * (3.0 * en + ml)) * sw2 * vl * ml)
            + 1.0 / e2
                * 2.0
                * (2.0 * mw2 * sw2 * (al + vl) * m2 * m2
                    + 8.0 * en * ml * mw2 * sw2 * (al + vl) * m2
                    + ml * ml * (czz * (al + vl) - mw2 * (-4.0 * vl * sw2 + al + vl)) * m2
                    + 4.0 * e2 * ml * ml * ((4.0 * vl * sw2 + al - vl) * mw2 + czz * (vl - al)))
                * m.ln()
            + (m2
                * ((czz * (al + vl) - mw2 * (-4.0 * vl * sw2 + al + vl)) * ml * ml
                    + 8.0 * en * mw2 * sw2 * (al + vl) * ml
                    + 2.0 * mw2 * m2 * sw2 * (al + vl))
                * (a / (4.0 * ml * e2 + a * m2)).ln())
                / e2)
        * g
        * g;

    let sm = (4.0 * e2 * gf * gf * ml
        * (4.0 * (16.0 * e2 + 12.0 * ml * en + 3.0 * ml * ml) * mw2 * mw2 * sw2 * sw2
            - 6.0 * a * (4.0 * en + ml) * mw2 * z * sw2
            + 3.0 * a * a * z * z))
        / (3.0 * a.powi(3) * mw2 * mw2 * PI);

    boson + interference + sm
}

fn anti_same_flavour(m: f64, g: f64, en: f64, c: &Couplings, ew: &Electroweak) -> f64 {
    let Couplings { an, vn, al, vl } = *c;
    let Electroweak { ml, mw, mz, cw, sw, gf } = *ew;
    let (m2, sw2, e2, mw2) = (m * m, sw * sw, en * en, mw * mw);
    let a = 2.0 * en + ml;
    let z = mw2 - 2.0 * cw * cw * mz * mz;

    let boson = same_flavour_boson(m, en, ml, c, 1.0) * g.powi(4);

    let interference = 1.0 / (4.0 * ml * ml * mw2 * PI) * gf * (an - vn)
        * (1.0 / e2
            * (-2.0 * mw2 * m2 * (m2 + 4.0 * en * ml) * al * sw2
                + 2.0 * mw2 * (m2 * m2 + 2.0 * ml * a * m2 + 8.0 * e2 * ml * ml) * vl * sw2
                + (2.0 * en * ml + m * (m - ml)) * (2.0 * en * ml + m * (ml + m)) * z * al
                - (m2 * m2 + ml * (4.0 * en + ml) * m2 + 4.0 * e2 * ml * ml) * z * vl)
            * (2.0 * m.ln() - ((4.0 * ml * e2) / a + m2).ln())
            - 1.0 / (a * a)
                * 4.0
                * ml
                * (-2.0 * mw2 * (a * m2 + 2.0 * ml * (en + ml) * (3.0 * en + ml)) * vl * sw2
                    + (2.0 * mw2 * (a * m2 + 2.0 * en * ml * (3.0 * en + 2.0 * ml)) * sw2
                        - (-ml.powi(3) + 6.0 * e2 * ml + m2 * ml + 2.0 * en * (ml * ml + m2)) * z)
                        * al
                    + (a * m2 + ml * (6.0 * e2 + 6.0 * ml * en + ml * ml)) * z * vl))
        * g
        * g;

    let sm = (4.0 * e2 * gf * gf * ml
        * (4.0 * (16.0 * e2 + 12.0 * ml * en + 3.0 * ml * ml) * mw2 * mw2 * sw2 * sw2
            - 2.0 * (8.0 * e2 + 6.0 * ml * en + 3.0 * ml * ml) * mw2 * z * sw2
            + (4.0 * e2 + 6.0 * ml * en + 3.0 * ml * ml) * z * z))
        / (3.0 * a.powi(3) * mw2 * mw2 * PI);

    boson + interference + sm
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::models::builtin;

    fn term(process: ScatteringProcess, neutrino: Fermion, energy: f64) -> ScatteringTerm {
        ScatteringTerm {
            process,
            neutrino,
            lepton: Fermion::E,
            energy,
        }
    }

    #[test]
    fn excess_vanishes_without_couplings_and_grows_with_g() {
        let params = Arc::new(ParameterTable::default());
        let model = builtin("B-L_boson", params).unwrap();
        for t in [
            term(ScatteringProcess::DifferentFlavour, Fermion::NuMu, 23.7),
            term(ScatteringProcess::SameFlavour, Fermion::NuE, 8.62e-4),
            term(ScatteringProcess::AntiSameFlavour, Fermion::NuE, 2.0e-3),
        ] {
            assert_eq!(t.excess(0.01, 0.0, &model), 0.0, "{t:?}");
            let small = t.excess(0.01, 1e-6, &model);
            let large = t.excess(0.01, 1e-4, &model);
            assert!(small.is_finite() && large.is_finite(), "{t:?}");
            assert!(large > small, "{t:?}: {small} vs {large}");
        }
    }

    #[test]
    fn zero_mass_is_regularized() {
        let params = Arc::new(ParameterTable::default());
        let model = builtin("B-L_boson", params).unwrap();
        let t = term(ScatteringProcess::SameFlavour, Fermion::NuE, 8.62e-4);
        assert!(t.excess(0.0, 1e-5, &model).is_finite());
    }

    #[test]
    fn rejects_non_neutrino_beams() {
        let t = ScatteringTerm {
            process: ScatteringProcess::DifferentFlavour,
            neutrino: Fermion::E,
            lepton: Fermion::E,
            energy: 1.0,
        };
        assert!(t.validate("nu_scat").is_err());
        assert!(term(ScatteringProcess::DifferentFlavour, Fermion::NuMu, 1.0)
            .validate("nu_scat")
            .is_ok());
    }
}
