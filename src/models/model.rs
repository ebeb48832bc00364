//! Coupling models and their decay widths.
//!
//! A `CouplingModel` holds the axial/vector coupling of every fermion as a function of
//! the boson mass. Widths are computed for a requested list of final states:
//!
//! - aggregates recurse into their sub-states
//! - fermion pairs use the closed-form two-body width
//! - the three-photon and exclusive hadronic states need a pure vector model
//!
//! Every per-state width (at unit global coupling) is memoized together with the mass
//! it was computed at. A query at any other mass recomputes and replaces the entry.

use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::f64::consts::PI;
use std::fmt;
use std::sync::Arc;

use nalgebra::Vector3;
use tracing::warn;

use crate::domain::{FermionCoupling, Fermion, FinalState, HadronicState, MassFunction, Sector};
use crate::error::ModelError;
use crate::models::hadrons;
use crate::params::ParameterTable;

/// Dark-sector width rule, evaluated at unit global coupling.
#[derive(Clone, Default)]
pub enum DarkWidth {
    #[default]
    Zero,
    /// Fixed width in GeV.
    Constant(f64),
    /// A multiple of the width into other states, e.g. `invisible = visible`.
    Scaled { states: Vec<FinalState>, factor: f64 },
    Custom(Arc<dyn Fn(f64, &CouplingModel) -> f64 + Send + Sync>),
}

impl fmt::Debug for DarkWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DarkWidth::Zero => f.write_str("Zero"),
            DarkWidth::Constant(w) => f.debug_tuple("Constant").field(w).finish(),
            DarkWidth::Scaled { states, factor } => f
                .debug_struct("Scaled")
                .field("states", states)
                .field("factor", factor)
                .finish(),
            DarkWidth::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Plain description of a model, before validation.
#[derive(Debug, Clone)]
pub struct ModelDefinition {
    pub name: String,
    pub couplings: BTreeMap<Fermion, FermionCoupling>,
    /// Final states summed for `total`; defaults to `visible` + `invisible`.
    pub states: Option<Vec<FinalState>>,
    pub dark: DarkWidth,
}

impl ModelDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            couplings: BTreeMap::new(),
            states: None,
            dark: DarkWidth::Zero,
        }
    }

    /// Set one fermion's `(axial, vector)` coupling.
    pub fn coupling(
        mut self,
        fermion: Fermion,
        axial: impl Into<MassFunction>,
        vector: impl Into<MassFunction>,
    ) -> Self {
        self.couplings
            .insert(fermion, FermionCoupling::new(axial, vector));
        self
    }

    /// Set every fermion not yet defined to zero coupling.
    pub fn fill_zero(mut self) -> Self {
        for f in Fermion::ALL {
            self.couplings.entry(f).or_default();
        }
        self
    }

    pub fn states(mut self, states: Vec<FinalState>) -> Self {
        self.states = Some(states);
        self
    }

    pub fn dark(mut self, dark: DarkWidth) -> Self {
        self.dark = dark;
        self
    }
}

pub struct CouplingModel {
    name: String,
    couplings: Vec<FermionCoupling>,
    axial_active: bool,
    vector_active: bool,
    dark: DarkWidth,
    states: Vec<FinalState>,
    params: Arc<ParameterTable>,
    cache: RefCell<HashMap<FinalState, (f64, f64)>>,
}

impl CouplingModel {
    pub fn new(def: ModelDefinition, params: Arc<ParameterTable>) -> Result<Self, ModelError> {
        let ModelDefinition {
            name,
            mut couplings,
            states,
            dark,
        } = def;

        let mut table = Vec::with_capacity(Fermion::ALL.len());
        let (mut axial_active, mut vector_active) = (false, false);
        for f in Fermion::ALL {
            let Some(coupling) = couplings.remove(&f) else {
                return Err(ModelError::InvalidCoupling {
                    model: name,
                    fermion: f.to_string(),
                    reason: "no coupling defined".to_string(),
                });
            };
            for (sector, active) in [
                (Sector::Axial, &mut axial_active),
                (Sector::Vector, &mut vector_active),
            ] {
                let func = coupling.get(sector);
                if let MassFunction::Constant(v) = func {
                    if !v.is_finite() {
                        return Err(ModelError::InvalidCoupling {
                            model: name,
                            fermion: f.to_string(),
                            reason: format!("non-finite {sector:?} coupling {v}"),
                        });
                    }
                }
                if !func.is_zero() {
                    *active = true;
                }
            }
            table.push(coupling);
        }

        let states = states.unwrap_or_else(|| vec![FinalState::Visible, FinalState::Invisible]);
        if states.is_empty() {
            return Err(ModelError::InconsistentStates {
                model: name,
                reason: "no final states declared".to_string(),
            });
        }
        if states.contains(&FinalState::Total) {
            return Err(ModelError::InconsistentStates {
                model: name,
                reason: "'total' cannot be one of its own states".to_string(),
            });
        }
        if let DarkWidth::Scaled { states: dark_states, factor } = &dark {
            let recursive = dark_states.iter().any(|s| {
                matches!(
                    s,
                    FinalState::Dark | FinalState::Invisible | FinalState::Total | FinalState::NoDecay
                )
            });
            if recursive || !factor.is_finite() || *factor < 0.0 {
                return Err(ModelError::InconsistentStates {
                    model: name,
                    reason: "dark width must be a non-negative multiple of visible states".to_string(),
                });
            }
        }

        let model = Self {
            name,
            couplings: table,
            axial_active,
            vector_active,
            dark,
            states,
            params,
            cache: RefCell::new(HashMap::new()),
        };

        // The declared states must be evaluable.
        for m in [0.0, 1.0] {
            if let Some(w) = model.width(&[FinalState::Total], m, 1.0) {
                if !(w.is_finite() && w >= 0.0) {
                    return Err(ModelError::InconsistentStates {
                        model: model.name.clone(),
                        reason: format!("total width {w} at m = {m} GeV"),
                    });
                }
            }
        }
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn params(&self) -> &Arc<ParameterTable> {
        &self.params
    }

    /// Whether any fermion has a non-trivial axial coupling.
    pub fn axial_active(&self) -> bool {
        self.axial_active
    }

    /// Whether any fermion has a non-trivial vector coupling.
    pub fn vector_active(&self) -> bool {
        self.vector_active
    }

    /// Final states summed for the total width.
    pub fn states(&self) -> &[FinalState] {
        &self.states
    }

    pub fn coupling(&self, f: Fermion, sector: Sector, m: f64) -> f64 {
        self.couplings[f.index()].get(sector).eval(m)
    }

    /// Couplings of the light quarks `(u, d, s)`: the diagonal of the U(3) charge matrix.
    pub fn quark_charges(&self, m: f64, sector: Sector) -> Vector3<f64> {
        Vector3::new(
            self.coupling(Fermion::U, sector, m),
            self.coupling(Fermion::D, sector, m),
            self.coupling(Fermion::S, sector, m),
        )
    }

    /// Trace of the quark charge matrix with a diagonal matrix (e.g. a meson generator).
    pub fn trace_quark_charge(&self, m: f64, sector: Sector, diagonal: &[f64]) -> Result<f64, ModelError> {
        if diagonal.len() != 3 {
            return Err(ModelError::InvalidTrace(diagonal.len()));
        }
        Ok(self.trace(m, sector, &Vector3::from_column_slice(diagonal)))
    }

    pub(crate) fn trace(&self, m: f64, sector: Sector, diagonal: &Vector3<f64>) -> f64 {
        self.quark_charges(m, sector).dot(diagonal)
    }

    /// Width (GeV) into `states` at mass `m` and global coupling `g`.
    ///
    /// Returns `None` when `states` contains [`FinalState::NoDecay`]: a decoupled decay
    /// dominates everything else in the request.
    pub fn width(&self, states: &[FinalState], m: f64, g: f64) -> Option<f64> {
        self.sum(states, m).map(|w| g * g * w)
    }

    /// Width into a single state; see [`CouplingModel::width`].
    pub fn width_of(&self, state: FinalState, m: f64, g: f64) -> Option<f64> {
        self.width(&[state], m, g)
    }

    /// Proper lifetime (s) at mass `m` and global coupling `g`.
    pub fn tau(&self, m: f64, g: f64) -> Result<f64, ModelError> {
        match self.width(&[FinalState::Total], m, g) {
            Some(w) if w > 0.0 => Ok(self.params.hbar / w),
            _ => Err(ModelError::StableLifetime {
                model: self.name.clone(),
                mass: m,
            }),
        }
    }

    /// Global coupling giving proper lifetime `tau` (s) at mass `m`.
    pub fn coupling_for_lifetime(&self, m: f64, tau: f64) -> Result<f64, ModelError> {
        Ok((self.tau(m, 1.0)? / tau).sqrt())
    }

    /// Branching fraction into `states` at mass `m`.
    pub fn bfrac(&self, states: &[FinalState], m: f64) -> f64 {
        let Some(num) = self.width(states, m, 1.0) else {
            return 1.0;
        };
        if num == 0.0 {
            return 0.0;
        }
        match self.width(&[FinalState::Total], m, 1.0) {
            Some(den) if den != 0.0 => num / den,
            _ => 0.0,
        }
    }

    fn sum(&self, states: &[FinalState], m: f64) -> Option<f64> {
        let mut total = 0.0;
        for &state in states {
            total += self.partial(state, m)?;
        }
        Some(total)
    }

    fn partial(&self, state: FinalState, m: f64) -> Option<f64> {
        if state == FinalState::NoDecay {
            return None;
        }
        if let Some(&(cached_m, value)) = self.cache.borrow().get(&state) {
            if cached_m == m {
                return Some(value);
            }
        }

        let part = match state {
            FinalState::NoDecay => return None,
            FinalState::Pair(f) => self.pair_width(f, m),
            FinalState::ThreePhoton => {
                if self.axial_active {
                    warn!(
                        model = %self.name,
                        state = %state,
                        "cannot calculate width with non-zero axial couplings"
                    );
                    0.0
                } else {
                    self.three_photon_width(m)
                }
            }
            FinalState::Exclusive(h) => {
                if self.axial_active {
                    warn!(
                        model = %self.name,
                        state = %state,
                        "cannot calculate width with non-zero axial couplings"
                    );
                    0.0
                } else {
                    hadrons::exclusive_vector(self, h, m)
                }
            }
            FinalState::Hadrons => {
                let vector: f64 = HadronicState::ALL
                    .iter()
                    .map(|&h| hadrons::exclusive_vector(self, h, m))
                    .sum();
                vector + hadrons::axial_correction(self, m)
            }
            FinalState::Visible => {
                let mut parts = vec![FinalState::Leptons, FinalState::Quarks, FinalState::Hadrons];
                if !self.axial_active {
                    parts.push(FinalState::ThreePhoton);
                }
                self.sum(&parts, m)?
            }
            FinalState::Dark => self.dark_width(m)?,
            FinalState::Total => self.sum(&self.states, m)?,
            FinalState::Leptons | FinalState::Quarks | FinalState::Neutrinos | FinalState::Invisible => {
                let parts = state.fixed_substates().unwrap_or_default();
                self.sum(&parts, m)?
            }
        };

        self.cache.borrow_mut().insert(state, (m, part));
        Some(part)
    }

    fn dark_width(&self, m: f64) -> Option<f64> {
        match &self.dark {
            DarkWidth::Zero => Some(0.0),
            DarkWidth::Constant(w) => Some(*w),
            DarkWidth::Scaled { states, factor } => Some(factor * self.sum(states, m)?),
            DarkWidth::Custom(f) => Some(f(m, self)),
        }
    }

    fn pair_width(&self, f: Fermion, m: f64) -> f64 {
        let mf = self.params.fermion_mass(f);
        if m <= 2.0 * mf {
            return 0.0;
        }
        let cf = self.params.color_factor(f);
        let a = self.coupling(f, Sector::Axial, m);
        let v = self.coupling(f, Sector::Vector, m);
        let r = mf * mf / (m * m);
        let beta = (1.0 - 4.0 * r).sqrt();
        cf * m / (12.0 * PI) * (v * v * (1.0 + 2.0 * r) + a * a * (1.0 - 4.0 * r)) * beta
    }

    /// Three photons through an electron loop; valid below the two-electron threshold.
    fn three_photon_width(&self, m: f64) -> f64 {
        let me = self.params.fermion_mass(Fermion::E);
        if m > 2.0 * me {
            return 0.0;
        }
        let a = self.coupling(Fermion::E, Sector::Axial, m);
        let v = self.coupling(Fermion::E, Sector::Vector, m);
        let ge6 = self.params.ge.powi(6);
        let x = m * m / (me * me);
        (a * a + v * v) * ge6 / (4.0 * PI).powi(4)
            / (2f64.powi(7) * 3f64.powi(6) * 5f64.powi(2) * PI.powi(3))
            * (m.powi(9) / me.powi(8))
            * (17.0 / 5.0 + 67.0 * x / 42.0 + 128941.0 * x * x / 246960.0)
    }
}

impl Clone for CouplingModel {
    /// Clones start with an empty width cache.
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            couplings: self.couplings.clone(),
            axial_active: self.axial_active,
            vector_active: self.vector_active,
            dark: self.dark.clone(),
            states: self.states.clone(),
            params: Arc::clone(&self.params),
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl fmt::Debug for CouplingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CouplingModel")
            .field("name", &self.name)
            .field("axial_active", &self.axial_active)
            .field("vector_active", &self.vector_active)
            .field("states", &self.states)
            .field("dark", &self.dark)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Meson;
    use crate::math::Interpolator;
    use crate::test_support::capture_warnings;
    use rand::prelude::*;
    use rand::rngs::StdRng;

    fn params() -> Arc<ParameterTable> {
        Arc::new(ParameterTable::default())
    }

    fn electron_only(c: f64) -> CouplingModel {
        let def = ModelDefinition::new("electron_vector")
            .coupling(Fermion::E, 0.0, c)
            .fill_zero();
        CouplingModel::new(def, params()).unwrap()
    }

    /// Photon-like vector couplings scaled by 0.3, plus an optional axial muon coupling.
    fn photon_like(p: Arc<ParameterTable>, axial_mu: f64) -> CouplingModel {
        let q = [
            (Fermion::E, -1.0),
            (Fermion::Mu, -1.0),
            (Fermion::Tau, -1.0),
            (Fermion::D, -1.0 / 3.0),
            (Fermion::U, 2.0 / 3.0),
            (Fermion::S, -1.0 / 3.0),
            (Fermion::C, 2.0 / 3.0),
            (Fermion::B, -1.0 / 3.0),
            (Fermion::T, 2.0 / 3.0),
        ];
        let mut def = ModelDefinition::new("photon_like");
        for (f, charge) in q {
            def = def.coupling(f, 0.0, charge * 0.3);
        }
        def = def
            .coupling(Fermion::Mu, axial_mu, -0.3)
            .coupling(Fermion::NuMu, 0.0, 0.1)
            .fill_zero();
        CouplingModel::new(def, p).unwrap()
    }

    #[test]
    fn electron_pair_width_matches_closed_form() {
        let c = 0.7;
        let model = electron_only(c);
        let me: f64 = 5.11e-4;
        let expected = c * c / (12.0 * PI) * (1.0 + 2.0 * me * me) * (1.0 - 4.0 * me * me).sqrt();
        let w = model.width_of(FinalState::Pair(Fermion::E), 1.0, 1.0).unwrap();
        assert!((w - expected).abs() < 1e-15);
        assert!((w / (c * c) - 0.02653).abs() < 1e-5);
    }

    #[test]
    fn pair_width_vanishes_at_and_below_threshold() {
        let model = photon_like(params(), 0.0);
        let mmu = 0.10566;
        assert_eq!(model.width_of(FinalState::Pair(Fermion::Mu), 2.0 * mmu, 1.0), Some(0.0));
        assert_eq!(model.width_of(FinalState::Pair(Fermion::Mu), 0.1, 1.0), Some(0.0));
        assert!(model.width_of(FinalState::Pair(Fermion::Mu), 0.3, 1.0).unwrap() > 0.0);
    }

    #[test]
    fn width_scales_with_coupling_squared() {
        let model = photon_like(params(), 0.0);
        let w1 = model.width_of(FinalState::Total, 2.0, 1.0).unwrap();
        let w3 = model.width_of(FinalState::Total, 2.0, 3.0).unwrap();
        assert!((w3 - 9.0 * w1).abs() < 1e-12 * w3);
    }

    #[test]
    fn three_photon_state_needs_pure_vector_model() {
        let p = params();
        let axial = photon_like(Arc::clone(&p), 0.2);
        assert!(axial.axial_active());
        let (w, logs) = capture_warnings(|| axial.width_of(FinalState::ThreePhoton, 2e-4, 1.0));
        assert_eq!(w, Some(0.0));
        assert!(logs.contains("cannot calculate width with non-zero axial couplings"), "{logs}");
        assert!(logs.contains("state=gamma_gamma_gamma"), "{logs}");

        let vector = photon_like(p, 0.0);
        let w = vector.width_of(FinalState::ThreePhoton, 1e-4, 1.0).unwrap();
        assert!(w > 0.0);
        assert_eq!(vector.width_of(FinalState::ThreePhoton, 0.01, 1.0), Some(0.0));
    }

    #[test]
    fn exclusive_hadrons_use_tabulated_ratios() {
        let grid = Interpolator::new(vec![0.3, 2.0], vec![1.0, 1.0]).unwrap();
        let p = Arc::new(ParameterTable::default().with_grid(HadronicState::PiPi, &[Meson::Rho0], grid));
        let model = photon_like(Arc::clone(&p), 0.0);
        let m = 0.8;
        // rho0 contribution: (2 * tr(Q diag(1,-1,0)/2))^2 * R * m / (12 pi).
        let t = 0.3 * (2.0 / 3.0 + 1.0 / 3.0) / 2.0;
        let expected = m / (12.0 * PI) * (2.0 * t) * (2.0 * t);
        let w = model.width_of(FinalState::Exclusive(HadronicState::PiPi), m, 1.0).unwrap();
        assert!((w - expected).abs() < 1e-14);

        let axial = photon_like(p, 0.2);
        let (w, logs) = capture_warnings(|| axial.width_of(FinalState::Exclusive(HadronicState::PiPi), m, 1.0));
        assert_eq!(w, Some(0.0));
        assert!(logs.contains("WARN"), "{logs}");
        assert!(logs.contains("non-zero axial couplings"), "{logs}");
        // The hadrons aggregate still carries the vector part for axial models.
        assert!(axial.width_of(FinalState::Hadrons, m, 1.0).unwrap() > 0.0);
    }

    #[test]
    fn no_decay_short_circuits_the_request() {
        let model = photon_like(params(), 0.0);
        let states = [FinalState::Pair(Fermion::E), FinalState::NoDecay];
        assert_eq!(model.width(&states, 1.0, 1.0), None);
        assert_eq!(model.bfrac(&[FinalState::NoDecay], 1.0), 1.0);
    }

    #[test]
    fn total_dominates_each_declared_substate_and_fractions_sum_to_one() {
        let model = photon_like(params(), 0.0);
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let m: f64 = rng.gen_range(0.002..20.0);
            let total = model.width_of(FinalState::Total, m, 1.0).unwrap();
            let mut sum = 0.0;
            for &state in model.states() {
                let w = model.width_of(state, m, 1.0).unwrap();
                assert!(w >= 0.0);
                assert!(total >= w);
                sum += model.bfrac(&[state], m);
            }
            assert!((sum - 1.0).abs() < 1e-12, "m = {m}, sum = {sum}");
        }
    }

    #[test]
    fn lifetime_round_trips() {
        let model = photon_like(params(), 0.0);
        let hbar = model.params().hbar;
        for &(m, g) in &[(0.05, 1e-3), (0.5, 2e-5), (3.0, 0.4)] {
            let tau = model.tau(m, g).unwrap();
            let w = model.width_of(FinalState::Total, m, g).unwrap();
            assert!((tau * w / hbar - 1.0).abs() < 1e-12);
            let back = model.coupling_for_lifetime(m, tau).unwrap();
            assert!((back / g - 1.0).abs() < 1e-12);
            assert!((model.tau(m, back).unwrap() / tau - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn stable_model_reports_infinite_lifetime() {
        let def = ModelDefinition::new("decoupled")
            .coupling(Fermion::E, 0.0, 0.0)
            .fill_zero();
        let model = CouplingModel::new(def, params()).unwrap();
        let err = model.tau(1e-4, 1.0).unwrap_err();
        assert!(matches!(err, ModelError::StableLifetime { .. }));
        assert_eq!(model.bfrac(&[FinalState::Pair(Fermion::E)], 1e-4), 0.0);
    }

    #[test]
    fn scaled_dark_width_tracks_visible_width() {
        let def = ModelDefinition::new("half_invisible")
            .coupling(Fermion::E, 0.0, 1.0)
            .fill_zero()
            .dark(DarkWidth::Scaled {
                states: vec![FinalState::Visible],
                factor: 1.0,
            });
        let model = CouplingModel::new(def, params()).unwrap();
        let b = model.bfrac(&[FinalState::Invisible], 0.5);
        assert!((b - 0.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_incomplete_or_recursive_definitions() {
        let missing = ModelDefinition::new("missing").coupling(Fermion::E, 0.0, 1.0);
        assert!(matches!(
            CouplingModel::new(missing, params()),
            Err(ModelError::InvalidCoupling { .. })
        ));

        let recursive = ModelDefinition::new("recursive")
            .fill_zero()
            .dark(DarkWidth::Scaled {
                states: vec![FinalState::Total],
                factor: 1.0,
            });
        assert!(matches!(
            CouplingModel::new(recursive, params()),
            Err(ModelError::InconsistentStates { .. })
        ));
    }

    #[test]
    fn trace_requires_three_entries() {
        let model = photon_like(params(), 0.0);
        let t = model.trace_quark_charge(1.0, Sector::Vector, &[1.0, 1.0, 1.0]).unwrap();
        assert!((t - 0.0).abs() < 1e-15);
        assert_eq!(
            model.trace_quark_charge(1.0, Sector::Vector, &[1.0, 1.0]),
            Err(ModelError::InvalidTrace(2))
        );
    }

    #[test]
    fn cache_is_keyed_on_the_last_mass() {
        let model = photon_like(params(), 0.0);
        let a = model.width_of(FinalState::Leptons, 1.0, 1.0).unwrap();
        let b = model.width_of(FinalState::Leptons, 2.0, 1.0).unwrap();
        let a_again = model.width_of(FinalState::Leptons, 1.0, 1.0).unwrap();
        assert_ne!(a, b);
        assert_eq!(a, a_again);
        assert!(model.clone().cache.borrow().is_empty());
    }
}
