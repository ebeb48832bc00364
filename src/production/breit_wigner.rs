//! Breit-Wigner lineshapes for the vector and axial resonances.

use std::f64::consts::PI;

use nalgebra::Complex;

use crate::domain::Meson;
use crate::error::BreitWignerError;
use crate::params::{DecayChannel, LineshapeKind, ParameterTable};

/// Resonance lineshape with a fixed or running width.
#[derive(Debug, Clone)]
pub struct BreitWigner {
    mr: f64,
    sr: f64,
    wr: f64,
    /// Orbital angular momentum; `None` selects the fixed-width form.
    orbital: Option<u32>,
    channels: Vec<DecayChannel>,
}

impl BreitWigner {
    /// Lineshape of `resonance`. A `Fixed` lineshape kind in `params` overrides `orbital`.
    pub fn new(
        params: &ParameterTable,
        resonance: Meson,
        orbital: Option<u32>,
    ) -> Result<Self, BreitWignerError> {
        let missing = || BreitWignerError(resonance.name().to_string());
        let mr = params.meson_mass(resonance).ok_or_else(missing)?;
        let wr = params.meson_width(resonance).ok_or_else(missing)?;
        let channels = params.meson_decays(resonance).ok_or_else(missing)?.to_vec();
        let orbital = match params.lineshape {
            LineshapeKind::Fixed => None,
            LineshapeKind::Running => orbital,
        };
        Ok(Self {
            mr,
            sr: mr * mr,
            wr,
            orbital,
            channels,
        })
    }

    pub fn is_running(&self) -> bool {
        self.orbital.is_some()
    }

    /// Relative width `Gamma(m) / Gamma(mr)` summed over open channels.
    fn running_factor(&self, m: f64, l: u32) -> f64 {
        if m <= 0.0 {
            return 0.0;
        }
        let s = m * m;
        let momentum2 = |s: f64, m0: f64, m1: f64| {
            (s - (m0 + m1).powi(2)) * (s - (m0 - m1).powi(2)) / (4.0 * s)
        };
        self.channels
            .iter()
            .filter(|c| m > c.m0 + c.m1)
            .map(|c| {
                let ratio = momentum2(s, c.m0, c.m1) / momentum2(self.sr, c.m0, c.m1);
                c.branching * ratio.sqrt().powi(2 * l as i32 + 1)
            })
            .sum()
    }

    /// Complex amplitude `sr / (sr - s - i X)` at mass `m`.
    pub fn amplitude(&self, m: f64) -> Complex<f64> {
        let s = m * m;
        let imag = match self.orbital {
            Some(l) if m > 0.0 => self.sr * self.wr * self.running_factor(m, l) / m,
            Some(_) => 0.0,
            None => self.mr * self.wr,
        };
        Complex::new(self.sr, 0.0) / Complex::new(self.sr - s, -imag)
    }

    /// Normalized squared lineshape at mass `m`.
    pub fn squared(&self, m: f64) -> f64 {
        let s = m * m;
        let (w, damping) = match self.orbital {
            Some(l) => {
                let w = if m > 0.0 {
                    self.wr * self.running_factor(m, l) / m
                } else {
                    0.0
                };
                (w, self.sr * w)
            }
            None => (self.wr, self.mr * self.wr),
        };
        let g = (self.sr * (self.sr + w * w)).sqrt();
        let n = 8f64.sqrt() * self.mr * w * g / (PI * (self.sr + g).sqrt());
        n / ((self.sr - s).powi(2) + damping * damping)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_width_peaks_at_the_resonance_mass() {
        let params = ParameterTable::default();
        let bw = BreitWigner::new(&params, Meson::Rho0, None).unwrap();
        assert!(!bw.is_running());
        let mr = params.meson_mass(Meson::Rho0).unwrap();
        let wr = params.meson_width(Meson::Rho0).unwrap();

        let a = bw.amplitude(mr);
        assert!(a.re.abs() < 1e-12);
        assert!((a.im - mr / wr).abs() < 1e-9);
        assert!(bw.squared(mr) > bw.squared(0.9 * mr));
        assert!(bw.squared(mr) > bw.squared(1.1 * mr));
    }

    #[test]
    fn running_width_closes_below_threshold() {
        let params = ParameterTable::default();
        let bw = BreitWigner::new(&params, Meson::Rho0, Some(1)).unwrap();
        assert!(bw.is_running());
        // Below the two-pion threshold the width vanishes and the amplitude is real.
        let a = bw.amplitude(0.2);
        assert_eq!(a.im, 0.0);
        assert_eq!(bw.squared(0.2), 0.0);
        // At the pole the running width equals the nominal width times the open fraction.
        let mr = params.meson_mass(Meson::Rho0).unwrap();
        let k = bw.running_factor(mr, 1);
        assert!((k - 0.9988447).abs() < 1e-12);
    }

    #[test]
    fn fixed_lineshape_kind_overrides_running_request() {
        let mut params = ParameterTable::default();
        params.lineshape = LineshapeKind::Fixed;
        let bw = BreitWigner::new(&params, Meson::Phi, Some(1)).unwrap();
        assert!(!bw.is_running());
    }

    #[test]
    fn missing_resonance_data_is_an_error() {
        let params = ParameterTable::default();
        let err = BreitWigner::new(&params, Meson::Eta, Some(1)).unwrap_err();
        assert_eq!(err, BreitWignerError("eta".to_string()));
    }
}
