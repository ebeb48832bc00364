//! JSON definition records for models, production mechanisms and limits.
//!
//! Records are plain data. They are turned into validated domain objects by
//! `io::loader`, which also resolves names (models referenced by limits) and file paths
//! (bound tables referenced by limits).
//!
//! A limit record looks like:
//!
//! ```json
//! {
//!   "notes": "Prompt search, unit efficiency.",
//!   "model": "dark_photon",
//!   "production": "e_brem",
//!   "decay": ["e_e"],
//!   "bounds": { "lower": "A1_Merkel2011ze.lmt" },
//!   "efficiency": { "kind": "unity" }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::{Fermion, FinalState, MassFunction};
use crate::error::GridError;
use crate::limit::{Efficiency, Validity};
use crate::math::Interpolator;
use crate::models::{DarkWidth, ModelDefinition};
use crate::production::ScatteringTerm;

/// Mass function as written in JSON: a number, a table, or a step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MassFunctionRecord {
    Constant(f64),
    Table { masses: Vec<f64>, values: Vec<f64> },
    Step { threshold: f64, below: f64, above: f64 },
}

impl Default for MassFunctionRecord {
    fn default() -> Self {
        MassFunctionRecord::Constant(0.0)
    }
}

impl MassFunctionRecord {
    pub fn into_function(self) -> Result<MassFunction, GridError> {
        Ok(match self {
            MassFunctionRecord::Constant(v) => MassFunction::Constant(v),
            MassFunctionRecord::Table { masses, values } => MassFunction::Table(Interpolator::new(masses, values)?),
            MassFunctionRecord::Step {
                threshold,
                below,
                above,
            } => MassFunction::Step {
                threshold,
                below,
                above,
            },
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CouplingRecord {
    #[serde(default)]
    pub axial: MassFunctionRecord,
    #[serde(default)]
    pub vector: MassFunctionRecord,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DarkRecord {
    Constant(f64),
    Scaled { states: Vec<FinalState>, factor: f64 },
}

/// A user model. Fermions left out couple with zero strength.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRecord {
    #[serde(default)]
    pub name: Option<String>,
    pub couplings: BTreeMap<Fermion, CouplingRecord>,
    #[serde(default)]
    pub states: Option<Vec<FinalState>>,
    #[serde(default)]
    pub dark: Option<DarkRecord>,
}

impl ModelRecord {
    /// Definition named `fallback` unless the record carries its own name.
    pub fn into_definition(self, fallback: &str) -> Result<ModelDefinition, GridError> {
        let mut def = ModelDefinition::new(self.name.unwrap_or_else(|| fallback.to_string()));
        for (fermion, c) in self.couplings {
            def = def.coupling(fermion, c.axial.into_function()?, c.vector.into_function()?);
        }
        def = def.fill_zero();
        if let Some(states) = self.states {
            def = def.states(states);
        }
        if let Some(dark) = self.dark {
            def = def.dark(match dark {
                DarkRecord::Constant(w) => DarkWidth::Constant(w),
                DarkRecord::Scaled { states, factor } => DarkWidth::Scaled { states, factor },
            });
        }
        Ok(def)
    }
}

/// One weighted channel of a production mechanism.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRecord {
    pub mechanism: String,
    #[serde(default = "unit_fraction")]
    pub fraction: MassFunctionRecord,
}

fn unit_fraction() -> MassFunctionRecord {
    MassFunctionRecord::Constant(1.0)
}

/// Production as a built-in name, a weighted channel list, or scattering terms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductionRecord {
    Named(String),
    Channels {
        name: String,
        channels: Vec<ChannelRecord>,
    },
    Scattering {
        name: String,
        scattering: Vec<ScatteringTerm>,
    },
}

impl ProductionRecord {
    pub fn name(&self) -> &str {
        match self {
            ProductionRecord::Named(name)
            | ProductionRecord::Channels { name, .. }
            | ProductionRecord::Scattering { name, .. } => name,
        }
    }
}

/// A model referenced by name or defined inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ModelRef {
    Named(String),
    Inline(ModelRecord),
}

/// A bound curve given inline as `[mass, coupling]` pairs or as a table path relative
/// to the limit file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CurveSource {
    Points(Vec<(f64, f64)>),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GridSource {
    Inline {
        masses: Vec<f64>,
        couplings: Vec<f64>,
        values: Vec<f64>,
    },
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundsRecord {
    Lower(CurveSource),
    Band { lower: CurveSource, upper: CurveSource },
    Rvalues(GridSource),
}

/// Decay final states; a single name is accepted as shorthand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DecayRecord {
    One(FinalState),
    Many(Vec<FinalState>),
}

impl DecayRecord {
    pub fn into_states(self) -> Vec<FinalState> {
        match self {
            DecayRecord::One(s) => vec![s],
            DecayRecord::Many(v) => v,
        }
    }
}

/// A limit definition. Every component is optional at parse time so that missing ones
/// are reported by name when the limit is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimitRecord {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub model: Option<ModelRef>,
    #[serde(default)]
    pub production: Option<ProductionRecord>,
    #[serde(default)]
    pub decay: Option<DecayRecord>,
    #[serde(default)]
    pub bounds: Option<BoundsRecord>,
    #[serde(default)]
    pub efficiency: Option<Efficiency>,
    #[serde(default)]
    pub validity: Validity,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::production::ScatteringProcess;

    #[test]
    fn parses_every_mass_function_shape() {
        let rec: CouplingRecord = serde_json::from_str(
            r#"{"axial": {"threshold": 0.5, "below": 0.0, "above": 1.0},
                "vector": {"masses": [0.1, 1.0], "values": [2.0, 3.0]}}"#,
        )
        .unwrap();
        let axial = rec.axial.into_function().unwrap();
        assert_eq!(axial.eval(0.4), 0.0);
        assert_eq!(axial.eval(0.6), 1.0);
        let vector = rec.vector.into_function().unwrap();
        assert!((vector.eval(0.55) - 2.5).abs() < 1e-12);

        let rec: CouplingRecord = serde_json::from_str(r#"{"vector": -1.0}"#).unwrap();
        assert!(rec.axial.into_function().unwrap().is_zero());
    }

    #[test]
    fn model_records_fill_missing_fermions() {
        let rec: ModelRecord = serde_json::from_str(
            r#"{"couplings": {"e": {"vector": 1.0}, "mu": {"axial": 0.5}},
                "dark": {"scaled": {"states": ["visible"], "factor": 1.0}}}"#,
        )
        .unwrap();
        let def = rec.into_definition("user").unwrap();
        assert_eq!(def.name, "user");
        assert_eq!(def.couplings.len(), Fermion::ALL.len());
        assert!(matches!(def.dark, DarkWidth::Scaled { factor, .. } if factor == 1.0));
    }

    #[test]
    fn production_records_accept_three_shapes() {
        let named: ProductionRecord = serde_json::from_str(r#""e_brem""#).unwrap();
        assert_eq!(named, ProductionRecord::Named("e_brem".to_string()));

        let channels: ProductionRecord = serde_json::from_str(
            r#"{"name": "meson", "channels": [{"mechanism": "pi0_gamma"},
                {"mechanism": "eta_gamma", "fraction": 0.5}]}"#,
        )
        .unwrap();
        let ProductionRecord::Channels { channels, .. } = channels else {
            panic!("expected channels");
        };
        assert_eq!(channels[0].fraction, MassFunctionRecord::Constant(1.0));

        let scattering: ProductionRecord = serde_json::from_str(
            r#"{"name": "nu_scat", "scattering": [{"process": "nu_l", "neutrino": "numu",
                "lepton": "e", "energy": 23.7}]}"#,
        )
        .unwrap();
        let ProductionRecord::Scattering { scattering, .. } = &scattering else {
            panic!("expected scattering");
        };
        assert_eq!(scattering[0].process, ScatteringProcess::DifferentFlavour);
    }

    #[test]
    fn limit_records_keep_missing_components_empty() {
        let rec: LimitRecord = serde_json::from_str(
            r#"{"model": "dark_photon", "decay": "e_e",
                "bounds": {"band": {"lower": [[0.1, 1e-5]], "upper": "upper.lmt"}}}"#,
        )
        .unwrap();
        assert!(rec.production.is_none());
        assert_eq!(rec.decay.unwrap().into_states().len(), 1);
        assert!(matches!(
            rec.bounds,
            Some(BoundsRecord::Band {
                lower: CurveSource::Points(_),
                upper: CurveSource::File(_)
            })
        ));
        assert_eq!(rec.validity, Validity::default());
    }
}
