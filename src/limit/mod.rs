//! Experimental limits and their recasting onto other models.
//!
//! A `Limit` bundles everything needed to reinterpret a published exclusion:
//! - the reference model and production mechanism it was derived for
//! - the decay final states the search was sensitive to
//! - the bounds themselves (a curve, a band, or a grid of r-values)
//! - an efficiency descriptor and the sectors it may be recast to
//!
//! Construction validates the whole bundle; `recast` itself never fails.

pub mod efficiency;
pub mod recast;

pub use efficiency::*;
pub use recast::*;

use serde::{Deserialize, Serialize};

use crate::domain::FinalState;
use crate::error::{GridError, LimitError};
use crate::math::Interpolator;
use crate::models::CouplingModel;
use crate::production::ProductionMechanism;

/// Default maximum coupling for recasting.
pub const DEFAULT_GMAX: f64 = 1e5;

/// Grid of r-values (expected signal over excluded signal) on a mass x coupling grid.
///
/// Values are stored row-major with mass as the outer axis:
/// `values[i * couplings.len() + j]` belongs to `(masses[i], couplings[j])`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RValueGrid {
    masses: Vec<f64>,
    couplings: Vec<f64>,
    values: Vec<f64>,
}

impl RValueGrid {
    pub fn new(masses: Vec<f64>, couplings: Vec<f64>, values: Vec<f64>) -> Result<Self, GridError> {
        if masses.is_empty() || couplings.is_empty() {
            return Err(GridError::Empty);
        }
        if values.len() != masses.len() * couplings.len() {
            return Err(GridError::LengthMismatch {
                axis: masses.len() * couplings.len(),
                values: values.len(),
            });
        }
        if let Some(i) = masses.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GridError::Unsorted(i + 1));
        }
        if let Some(i) = couplings.iter().position(|g| !(g.is_finite() && *g > 0.0)) {
            return Err(GridError::NonFinite(i));
        }
        if let Some(i) = masses.iter().chain(values.iter()).position(|v| !v.is_finite()) {
            return Err(GridError::NonFinite(i));
        }
        Ok(Self {
            masses,
            couplings,
            values,
        })
    }

    pub fn masses(&self) -> &[f64] {
        &self.masses
    }

    pub fn couplings(&self) -> &[f64] {
        &self.couplings
    }

    /// r-values along the coupling axis at mass index `i`.
    pub fn row(&self, i: usize) -> &[f64] {
        let n = self.couplings.len();
        &self.values[i * n..(i + 1) * n]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Bounds {
    /// Single-sided upper limit on the coupling.
    Lower(Interpolator),
    /// Excluded band between two curves.
    Band {
        lower: Interpolator,
        upper: Interpolator,
    },
    RValues(RValueGrid),
}

impl Bounds {
    pub fn is_double_sided(&self) -> bool {
        !matches!(self, Bounds::Lower(_))
    }
}

/// Coupling sectors a limit may be recast to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validity {
    pub axial: bool,
    pub vector: bool,
}

impl Default for Validity {
    fn default() -> Self {
        Self {
            axial: true,
            vector: true,
        }
    }
}

/// Components of a limit before validation. Missing components are reported by name.
#[derive(Debug, Clone, Default)]
pub struct LimitDefinition {
    pub name: String,
    pub notes: Option<String>,
    pub model: Option<CouplingModel>,
    pub production: Option<ProductionMechanism>,
    pub decay: Option<Vec<FinalState>>,
    pub bounds: Option<Bounds>,
    pub efficiency: Option<Efficiency>,
    pub validity: Validity,
}

#[derive(Debug, Clone)]
pub struct Limit {
    name: String,
    notes: String,
    model: CouplingModel,
    production: ProductionMechanism,
    decay: Vec<FinalState>,
    bounds: Bounds,
    efficiency: Efficiency,
    validity: Validity,
}

impl Limit {
    pub fn new(def: LimitDefinition) -> Result<Self, LimitError> {
        let LimitDefinition {
            name,
            notes,
            model,
            production,
            decay,
            bounds,
            efficiency,
            validity,
        } = def;
        let missing = |field: &'static str| LimitError::MissingField {
            limit: name.clone(),
            field,
        };

        let model = model.ok_or_else(|| missing("model"))?;
        let production = production.ok_or_else(|| missing("production"))?;
        let decay = decay.ok_or_else(|| missing("decay"))?;
        let bounds = bounds.ok_or_else(|| missing("bounds"))?;
        let efficiency = efficiency.ok_or_else(|| missing("efficiency"))?;

        if decay.is_empty() {
            return Err(LimitError::InvalidDecay {
                limit: name,
                reason: "no final states".to_string(),
            });
        }
        if let Some(w) = model.width(&decay, 1.0, 1.0) {
            if !w.is_finite() {
                return Err(LimitError::InvalidDecay {
                    limit: name,
                    reason: format!("width {w} at 1 GeV"),
                });
            }
        }

        match &bounds {
            Bounds::Lower(curve) => check_curve(&name, "lower", curve)?,
            Bounds::Band { lower, upper } => {
                check_curve(&name, "lower", lower)?;
                check_curve(&name, "upper", upper)?;
            }
            Bounds::RValues(_) => {}
        }

        match efficiency {
            Efficiency::Window { t0, t1 } if !(t0 >= 0.0 && t1 > t0) => {
                return Err(LimitError::InvalidEfficiency {
                    limit: name,
                    reason: format!("decay window [{t0}, {t1}] is empty"),
                });
            }
            Efficiency::LengthRatio { lratio } => {
                if !matches!(bounds, Bounds::Band { .. }) {
                    return Err(LimitError::InvalidEfficiency {
                        limit: name,
                        reason: "a length ratio needs both lower and upper bounds".to_string(),
                    });
                }
                if let Some(r) = lratio {
                    if !(r > 0.0) {
                        return Err(LimitError::InvalidEfficiency {
                            limit: name,
                            reason: format!("length ratio {r} must be positive"),
                        });
                    }
                }
            }
            _ => {}
        }

        let notes = notes.unwrap_or_else(|| format!("The limit {name} has no notes."));
        // Evaluate once on a clone so the mechanism's ratio cache starts empty.
        production.clone().ratio(1.0, 1.0, 1.0, &model, &model);

        Ok(Self {
            name,
            notes,
            model,
            production,
            decay,
            bounds,
            efficiency,
            validity,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn model(&self) -> &CouplingModel {
        &self.model
    }

    pub fn production(&self) -> &ProductionMechanism {
        &self.production
    }

    pub fn decay(&self) -> &[FinalState] {
        &self.decay
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn efficiency(&self) -> Efficiency {
        self.efficiency
    }

    pub fn validity(&self) -> Validity {
        self.validity
    }
}

fn check_curve(limit: &str, side: &str, curve: &Interpolator) -> Result<(), LimitError> {
    if curve.ys().iter().any(|g| *g < 0.0) {
        return Err(LimitError::InvalidBounds {
            limit: limit.to_string(),
            reason: format!("negative coupling in the {side} curve"),
        });
    }
    if curve.xs()[0] <= 0.0 {
        return Err(LimitError::InvalidBounds {
            limit: limit.to_string(),
            reason: format!("non-positive mass in the {side} curve"),
        });
    }
    Ok(())
}
