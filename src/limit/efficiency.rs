//! Detector efficiency ratios between two boson lifetimes.
//!
//! The ratio `eff(tau_target) / eff(tau_reference)` corrects a limit for the change in
//! the fraction of bosons decaying inside the detector. Four descriptors are supported:
//!
//! - `Unity`: prompt or lifetime-independent searches
//! - `Window { t0, t1 }`: decays between proper times `t0` and `t1`
//! - `LengthRatio`: a displaced search whose shielding time is inferred per mass from the
//!   two sides of the excluded band; an infinite ratio uses the `RValues` ratio
//! - `RValues`: extrapolation beyond the edges of an r-value grid

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use tracing::debug;

use crate::math::{Seed, solve};
use crate::models::CouplingModel;

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Efficiency {
    #[default]
    Unity,
    /// Decay-time window in seconds; an omitted `t1` is unbounded.
    Window {
        t0: f64,
        #[serde(default = "unbounded")]
        t1: f64,
    },
    /// Decay-volume over shielding length; `None` for an unbounded decay volume.
    /// JSON has no infinity, so `"inf"` is accepted and written for an infinite ratio.
    LengthRatio {
        #[serde(default, deserialize_with = "de_lratio", serialize_with = "ser_lratio")]
        lratio: Option<f64>,
    },
    RValues,
}

fn unbounded() -> f64 {
    f64::INFINITY
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RatioRecord {
    Number(f64),
    Text(String),
}

fn de_lratio<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    match Option::<RatioRecord>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RatioRecord::Number(r)) => Ok(Some(r)),
        Some(RatioRecord::Text(text)) => match text.trim().to_ascii_lowercase().as_str() {
            "inf" | "infinity" => Ok(Some(f64::INFINITY)),
            other => other
                .parse()
                .map(Some)
                .map_err(|_| serde::de::Error::custom(format!("invalid length ratio '{text}'"))),
        },
    }
}

fn ser_lratio<S: Serializer>(lratio: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
    match lratio {
        Some(r) if r.is_infinite() => serializer.serialize_str("inf"),
        Some(r) => serializer.serialize_f64(*r),
        None => serializer.serialize_none(),
    }
}

/// Probability of decaying between proper times `t0` and `t1`.
pub fn window(tau: f64, t0: f64, t1: f64) -> f64 {
    let tail = if t1.is_infinite() { 0.0 } else { (-t1 / tau).exp() };
    (-t0 / tau).exp() - tail
}

/// Reference couplings and lifetimes at the two edges of an excluded band.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BandEdges {
    pub g_lower: f64,
    pub g_upper: f64,
    pub tau_lower: f64,
    pub tau_upper: f64,
}

impl BandEdges {
    pub fn new(reference: &CouplingModel, m: f64, g_lower: f64, g_upper: f64) -> Option<Self> {
        let tau_lower = reference.tau(m, g_lower).ok()?;
        let tau_upper = reference.tau(m, g_upper).ok()?;
        Some(Self {
            g_lower,
            g_upper,
            tau_lower,
            tau_upper,
        })
    }

    /// Shielding decay time `t0` that equalizes the yields at both band edges.
    pub fn shielding_time(&self, lratio: Option<f64>) -> Option<f64> {
        let rate = 1.0 / self.tau_upper - 1.0 / self.tau_lower;
        let closed = 2.0 * (self.g_upper / self.g_lower).ln() / rate;
        if !(closed.is_finite() && closed > 0.0) {
            return None;
        }
        let Some(lratio) = lratio else {
            return Some(closed);
        };

        let residual = |t0: f64| {
            let t1 = t0 * (1.0 + lratio);
            let lower = self.g_lower.powi(2) * window(self.tau_lower, t0, t1);
            let upper = self.g_upper.powi(2) * window(self.tau_upper, t0, t1);
            (lower / upper).ln()
        };
        match solve(residual, Seed::Near(closed)) {
            Ok(t0) if t0 > 0.0 => Some(t0),
            Ok(_) | Err(_) => {
                debug!(closed, "falling back to the unbounded shielding time");
                Some(closed)
            }
        }
    }
}

impl Efficiency {
    /// `eff(tau_target) / eff(tau_reference)`, with the window known.
    pub(crate) fn window_ratio(tau_target: f64, tau_reference: f64, t0: f64, t1: f64) -> f64 {
        let den = window(tau_reference, t0, t1);
        if den == 0.0 {
            return 0.0;
        }
        window(tau_target, t0, t1) / den
    }

    /// Ratio for r-value grids: linear in the lifetime above the reference, exponential
    /// suppression below it.
    pub(crate) fn rvalue_ratio(tau_target: f64, tau_reference: f64) -> f64 {
        if tau_target > tau_reference {
            tau_reference / tau_target
        } else {
            (1.0 - tau_reference / tau_target).exp()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn window_is_a_decay_probability() {
        assert_eq!(window(1.0, 0.0, f64::INFINITY), 1.0);
        let p = window(2.0, 1.0, 3.0);
        assert!((p - ((-0.5f64).exp() - (-1.5f64).exp())).abs() < 1e-15);
        assert_eq!(Efficiency::window_ratio(1.0, 2.0, 1.0, 1.0), 0.0);
    }

    #[test]
    fn rvalue_ratio_is_continuous_at_the_reference() {
        let tau = 3e-12;
        assert_eq!(Efficiency::rvalue_ratio(tau, tau), 1.0);
        assert!((Efficiency::rvalue_ratio(2.0 * tau, tau) - 0.5).abs() < 1e-15);
        assert!(Efficiency::rvalue_ratio(0.5 * tau, tau) < (-0.9f64).exp());
    }

    #[test]
    fn shielding_time_equalizes_band_edge_yields() {
        let edges = BandEdges {
            g_lower: 1e-5,
            g_upper: 1e-3,
            tau_lower: 1e-8,
            tau_upper: 1e-12,
        };
        let t0 = edges.shielding_time(None).unwrap();
        let yield_at = |g: f64, tau: f64| g * g * window(tau, t0, f64::INFINITY);
        let (lo, hi) = (yield_at(1e-5, 1e-8), yield_at(1e-3, 1e-12));
        assert!((lo / hi - 1.0).abs() < 1e-9);

        let lratio = 0.5;
        let t0 = edges.shielding_time(Some(lratio)).unwrap();
        let t1 = t0 * (1.0 + lratio);
        let (lo, hi) = (
            1e-10 * window(1e-8, t0, t1),
            1e-6 * window(1e-12, t0, t1),
        );
        assert!((lo / hi - 1.0).abs() < 1e-6, "t0 = {t0}");
    }

    #[test]
    fn deserializes_tagged_descriptors() {
        let e: Efficiency = serde_json::from_str(r#"{"kind": "length_ratio", "lratio": 0.528}"#).unwrap();
        assert_eq!(e, Efficiency::LengthRatio { lratio: Some(0.528) });
        let e: Efficiency = serde_json::from_str(r#"{"kind": "window", "t0": 0.0, "t1": 1e-9}"#).unwrap();
        assert_eq!(e, Efficiency::Window { t0: 0.0, t1: 1e-9 });
        let e: Efficiency = serde_json::from_str(r#"{"kind": "window", "t0": 0.0}"#).unwrap();
        assert_eq!(e, Efficiency::Window { t0: 0.0, t1: f64::INFINITY });
    }

    #[test]
    fn infinite_length_ratio_reads_and_writes_as_text() {
        let e: Efficiency = serde_json::from_str(r#"{"kind": "length_ratio", "lratio": "inf"}"#).unwrap();
        assert_eq!(e, Efficiency::LengthRatio { lratio: Some(f64::INFINITY) });
        assert_eq!(
            serde_json::to_string(&e).unwrap(),
            r#"{"kind":"length_ratio","lratio":"inf"}"#
        );

        let e: Efficiency = serde_json::from_str(r#"{"kind": "length_ratio"}"#).unwrap();
        assert_eq!(e, Efficiency::LengthRatio { lratio: None });
        let e: Efficiency = serde_json::from_str(r#"{"kind": "length_ratio", "lratio": null}"#).unwrap();
        assert_eq!(e, Efficiency::LengthRatio { lratio: None });
        assert!(serde_json::from_str::<Efficiency>(r#"{"kind": "length_ratio", "lratio": "wide"}"#).is_err());
    }
}
