//! Hadronic widths through vector-meson mixing and the axial spectral functions.

use std::f64::consts::PI;

use nalgebra::Vector3;

use crate::domain::{Fermion, HadronicState, Meson, Sector};
use crate::models::CouplingModel;
use crate::params::Spectral;

/// Vector-current width into one exclusive state at unit coupling.
///
/// Each contribution is `m / (12 pi) * sub * R(m)`, where `sub` is the squared mixing
/// amplitude for a single resonance and twice the product of amplitudes for an
/// interference term.
pub(crate) fn exclusive_vector(model: &CouplingModel, state: HadronicState, m: f64) -> f64 {
    let params = model.params();
    let mut part = 0.0;
    for &mesons in state.components() {
        let amplitudes: Option<Vec<f64>> = mesons
            .iter()
            .map(|&v| mixing_amplitude(model, v, m))
            .collect();
        let Some(amplitudes) = amplitudes else {
            continue;
        };
        let sub = match amplitudes.as_slice() {
            [a] => a * a,
            many => 2.0 * many.iter().product::<f64>(),
        };
        part += m / (12.0 * PI) * sub * params.r_ratio(state, mesons, m);
    }
    part
}

fn mixing_amplitude(model: &CouplingModel, meson: Meson, m: f64) -> Option<f64> {
    let params = model.params();
    let prefactor = params.vector_prefactor(meson)?;
    let generator = params.generator(meson)?;
    Some(prefactor * model.trace(m, Sector::Vector, &generator))
}

/// Axial-current contribution to the inclusive hadronic width at unit coupling.
pub(crate) fn axial_correction(model: &CouplingModel, m: f64) -> f64 {
    let params = model.params();
    let light = params.spectral(Spectral::Light, m);
    let strange = params.spectral(Spectral::Strange, m);

    let t = model.trace(m, Sector::Axial, &Vector3::new(1.0, -1.0, 0.0));
    let mut part = t * t * light;

    let mk = params.meson_mass(Meson::K).unwrap_or(f64::INFINITY);
    if m > 2.0 * mk {
        let a_s = model.coupling(Fermion::S, Sector::Axial, m);
        let mixed = (light * strange).max(0.0).sqrt();
        part += a_s * a_s * (light / 4.0 + strange - params.cphi * mixed);
    }
    m / (4.0 * PI) * part
}
