//! Recasting a limit onto a target model.
//!
//! Two regimes, selected by the shape of the bounds:
//!
//! 1. **Bound curves** (single-sided or band): at every mass of the lower curve, solve
//!    for the target coupling giving the same signal yield as the reference coupling.
//!    For bands, the second root is searched on the far side of the first.
//! 2. **r-value grids**: map each grid coupling to the target coupling with the same
//!    lifetime, rescale the r-value, and keep the extremes of the excluded region.
//!    Edges sitting at the grid's lifetime boundary are extrapolated with the
//!    efficiency ratio.
//!
//! Root-finding failures never propagate: they fall back to `gmax` (curves) or to the
//! grid estimate (r-values). Every emitted coupling is clipped to `gmax`.

use rayon::prelude::*;
use tracing::{debug, warn};

use crate::domain::{CurvePoint, RecastBounds};
use crate::limit::{BandEdges, Bounds, Efficiency, Limit, RValueGrid};
use crate::math::{Interpolator, Seed, solve};
use crate::models::CouplingModel;

/// Efficiency descriptor resolved at one mass.
#[derive(Debug, Clone, Copy)]
enum Resolved {
    Unity,
    Window { t0: f64, t1: f64 },
    RValues,
}

impl Resolved {
    fn ratio(self, tau_target: f64, tau_reference: f64) -> f64 {
        match self {
            Resolved::Unity => 1.0,
            Resolved::Window { t0, t1 } => Efficiency::window_ratio(tau_target, tau_reference, t0, t1),
            Resolved::RValues => Efficiency::rvalue_ratio(tau_target, tau_reference),
        }
    }
}

/// Result of recasting one limit.
#[derive(Debug, Clone)]
pub struct LimitRecast {
    pub limit: String,
    pub bounds: Option<RecastBounds>,
}

impl Limit {
    /// Recast onto `target`, clipping couplings at `gmax`.
    ///
    /// Returns `None` when the target has couplings in a sector this limit is not
    /// valid for.
    pub fn recast(&self, target: &CouplingModel, gmax: f64) -> Option<RecastBounds> {
        for (active, valid, sector) in [
            (target.axial_active(), self.validity().axial, "axial"),
            (target.vector_active(), self.validity().vector, "vector"),
        ] {
            if active && !valid {
                warn!(
                    limit = %self.name(),
                    model = %target.name(),
                    "cannot recast limit to a model with non-zero {sector} couplings"
                );
                return None;
            }
        }

        self.production().reset_cache();
        let bounds = match self.bounds() {
            Bounds::Lower(lower) => RecastBounds {
                lower: self.recast_curve(target, lower, false, gmax).0,
                upper: None,
            },
            Bounds::Band { lower, .. } => {
                let (lower, upper) = self.recast_curve(target, lower, true, gmax);
                RecastBounds {
                    lower,
                    upper: Some(upper),
                }
            }
            Bounds::RValues(grid) => {
                let (lower, upper) = self.recast_rvalues(target, grid, gmax);
                RecastBounds {
                    lower,
                    upper: Some(upper),
                }
            }
        };
        Some(bounds)
    }

    /// Efficiency ratio `eff(tau_target) / eff(tau_reference)` at mass `m`.
    pub fn efficiency_ratio(&self, m: f64, tau_target: f64, tau_reference: f64) -> f64 {
        self.resolve_efficiency(m).ratio(tau_target, tau_reference)
    }

    fn resolve_efficiency(&self, m: f64) -> Resolved {
        match self.efficiency() {
            Efficiency::Unity => Resolved::Unity,
            Efficiency::Window { t0, t1 } => Resolved::Window { t0, t1 },
            Efficiency::RValues => Resolved::RValues,
            Efficiency::LengthRatio {
                lratio: Some(r),
            } if r.is_infinite() => Resolved::RValues,
            Efficiency::LengthRatio { lratio } => {
                let Bounds::Band { lower, upper } = self.bounds() else {
                    return Resolved::Unity;
                };
                let (Some(g_lower), Some(g_upper)) = (within(lower, m), within(upper, m)) else {
                    return Resolved::Unity;
                };
                let t0 = BandEdges::new(self.model(), m, g_lower, g_upper)
                    .and_then(|edges| edges.shielding_time(lratio));
                match t0 {
                    Some(t0) => Resolved::Window {
                        t0,
                        t1: lratio.map_or(f64::INFINITY, |r| t0 * (1.0 + r)),
                    },
                    None => {
                        debug!(limit = %self.name(), m, "no shielding time, using unit efficiency");
                        Resolved::Unity
                    }
                }
            }
        }
    }

    fn recast_curve(
        &self,
        target: &CouplingModel,
        lower: &Interpolator,
        band: bool,
        gmax: f64,
    ) -> (Vec<CurvePoint>, Vec<CurvePoint>) {
        let reference = self.model();
        let decay = self.decay();
        let mut out_lower = Vec::with_capacity(lower.len());
        let mut out_upper = Vec::new();
        let mut emit = |m: f64, gl: f64, gu: f64| {
            out_lower.push(CurvePoint {
                mass: m,
                coupling: gl.abs().min(gmax),
            });
            if band {
                out_upper.push(CurvePoint {
                    mass: m,
                    coupling: gu.abs().min(gmax),
                });
            }
        };

        let mut previous: Option<f64> = None;
        for (m, g1) in lower.points() {
            let b_target = target.bfrac(decay, m);
            let b_reference = reference.bfrac(decay, m);
            if b_target == 0.0
                || b_reference == 0.0
                || self.production().ratio(m, 1.0, 1.0, target, reference) == 0.0
            {
                emit(m, gmax, gmax);
                continue;
            }
            if g1 >= gmax {
                emit(m, gmax, gmax);
                continue;
            }

            let efficiency = self.resolve_efficiency(m);
            let tau_reference = reference.tau(m, g1).unwrap_or(f64::INFINITY);
            let residual = |g: f64| {
                let tau_target = target.tau(m, g).unwrap_or(f64::INFINITY);
                b_target / b_reference
                    * self.production().ratio(m, g, g1, target, reference)
                    * efficiency.ratio(tau_target, tau_reference)
                    - 1.0
            };

            let solved = match solve(&residual, Seed::Near(previous.unwrap_or(g1))) {
                Ok(g) => Some(g.abs().min(gmax)),
                Err(err) => {
                    debug!(limit = %self.name(), m, %err, "lower coupling not found");
                    None
                }
            };
            let g0l = solved.unwrap_or(gmax);
            if !band {
                if solved.is_some() {
                    previous = Some(g0l);
                }
                emit(m, g0l, gmax);
                continue;
            }

            let g0u = if g0l == gmax {
                gmax
            } else {
                let seed = if residual(1.01 * g0l) < 0.0 {
                    Seed::Below(0.99 * g0l)
                } else {
                    Seed::Above(1.01 * g0l)
                };
                match solve(&residual, seed) {
                    Ok(g) => g.abs(),
                    Err(err) => {
                        debug!(limit = %self.name(), m, %err, "upper coupling not found");
                        gmax
                    }
                }
            };
            let (gl, gu) = if g0u < g0l { (g0u, g0l) } else { (g0l, g0u) };
            if solved.is_some() {
                previous = Some(gl.min(gmax));
            }
            emit(m, gl, gu);
        }
        (out_lower, out_upper)
    }

    fn recast_rvalues(
        &self,
        target: &CouplingModel,
        grid: &RValueGrid,
        gmax: f64,
    ) -> (Vec<CurvePoint>, Vec<CurvePoint>) {
        let reference = self.model();
        let decay = self.decay();
        let mut out_lower = Vec::with_capacity(grid.masses().len());
        let mut out_upper = Vec::with_capacity(grid.masses().len());

        for (i, &m) in grid.masses().iter().enumerate() {
            let (mut gl, mut gu) = (gmax, -gmax);
            let (mut rl, mut ru) = (1.0, 1.0);
            let (mut tl, mut tu) = (0.0, 0.0);
            let (mut tmin, mut tmax) = (f64::INFINITY, 0.0_f64);

            let b_target = target.bfrac(decay, m);
            let b_reference = reference.bfrac(decay, m);
            for (&g1, &r1) in grid.couplings().iter().zip(grid.row(i)) {
                let Ok(tau) = reference.tau(m, g1) else {
                    continue;
                };
                let Ok(g0) = target.coupling_for_lifetime(m, tau) else {
                    continue;
                };
                let pr = self.production().ratio(m, g0, g1, target, reference);
                let r0 = if b_target * pr != 0.0 {
                    r1 * b_reference / (b_target * pr)
                } else {
                    gmax
                };

                if r0 < 1.0 {
                    if g0 < gl {
                        (tl, gl, rl) = (tau, g0, r0);
                    }
                    if g0 > gu {
                        (tu, gu, ru) = (tau, g0, r0);
                    }
                }
                tmin = tmin.min(tau);
                tmax = tmax.max(tau);
            }

            let efficiency = self.resolve_efficiency(m);
            let extrapolate = |g_edge: f64, t_edge: f64, r_edge: f64, seed: Seed| {
                let residual = |g: f64| {
                    let tau_target = target.tau(m, g).unwrap_or(f64::INFINITY);
                    g * g / (g_edge * g_edge) * efficiency.ratio(tau_target, t_edge) / r_edge - 1.0
                };
                match solve(residual, seed) {
                    Ok(g) => g,
                    Err(err) => {
                        debug!(limit = %self.name(), m, %err, "keeping grid edge");
                        g_edge
                    }
                }
            };
            if tl == tmax && rl < 1.0 {
                gl = extrapolate(gl, tl, rl, Seed::Below(gl));
            }
            if tu == tmin && ru < 1.0 {
                gu = extrapolate(gu, tu, ru, Seed::Above(gu));
            }

            out_lower.push(CurvePoint {
                mass: m,
                coupling: gl.abs().min(gmax),
            });
            out_upper.push(CurvePoint {
                mass: m,
                coupling: gu.abs().min(gmax),
            });
        }
        (out_lower, out_upper)
    }
}

/// Value of `curve` at `m` when `m` lies inside its mass range.
fn within(curve: &Interpolator, m: f64) -> Option<f64> {
    let xs = curve.xs();
    (m >= xs[0] && m <= xs[xs.len() - 1]).then(|| curve.eval(m))
}

/// Recast many limits onto one target model in parallel.
///
/// Each task receives its own copy of the target so that width caches are not shared.
/// Results keep the input order.
pub fn recast_all(limits: Vec<Limit>, target: &CouplingModel, gmax: f64) -> Vec<LimitRecast> {
    let tasks: Vec<(Limit, CouplingModel)> = limits
        .into_iter()
        .map(|limit| (limit, target.clone()))
        .collect();
    tasks
        .into_par_iter()
        .map(|(limit, target)| LimitRecast {
            limit: limit.name().to_string(),
            bounds: limit.recast(&target, gmax),
        })
        .collect()
}
