//! Scalar root finding for the recasting equations.
//!
//! The residuals we solve are smooth in the coupling but can span many orders of
//! magnitude, so the search works in two phases:
//!
//! 1. **Bracketing**: step geometrically away from a seed until the residual changes
//!    sign. The seed says where to look (`Near` a guess, strictly `Above` or `Below`
//!    a point).
//! 2. **Refinement**: secant steps inside the bracket, falling back to bisection
//!    whenever a secant step leaves the bracket or fails to halve it.
//!
//! Non-finite residuals during bracketing end the search in that direction; during
//! refinement they are reported as errors.

use crate::error::SolveError;

/// Relative bracket width at which a root is accepted.
pub const REL_TOL: f64 = 1e-10;

/// Maximum number of refinement iterations.
pub const MAX_ITER: usize = 100;

/// Maximum number of geometric steps while searching for a bracket.
pub const MAX_EXPAND: i32 = 60;

/// Ratio between consecutive bracketing probes.
const GROWTH: f64 = 1.6;

/// Where to start looking for a root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Seed {
    /// Search outwards in both directions from a guess.
    Near(f64),
    /// Search only for roots above this point.
    Above(f64),
    /// Search only for roots below this point.
    Below(f64),
}

impl Seed {
    fn start(self) -> f64 {
        match self {
            Seed::Near(x) | Seed::Above(x) | Seed::Below(x) => x,
        }
    }
}

/// Find a root of `f` starting from `seed`.
pub fn solve<F>(mut f: F, seed: Seed) -> Result<f64, SolveError>
where
    F: FnMut(f64) -> f64,
{
    let x0 = seed.start();
    if !x0.is_finite() {
        return Err(SolveError::NonFinite { x: x0 });
    }
    let f0 = f(x0);
    if !f0.is_finite() {
        return Err(SolveError::NonFinite { x: x0 });
    }
    if f0 == 0.0 {
        return Ok(x0);
    }

    let (up, down) = match seed {
        Seed::Near(_) => (true, true),
        Seed::Above(_) => (true, false),
        Seed::Below(_) => (false, true),
    };
    let Some((a, fa, b, fb)) = bracket(&mut f, x0, f0, up, down) else {
        return Err(SolveError::NoBracket { start: x0 });
    };
    if fa == 0.0 {
        return Ok(a);
    }
    if fb == 0.0 {
        return Ok(b);
    }
    refine(&mut f, a, fa, b, fb)
}

fn probe(x: f64, k: i32, up: bool) -> f64 {
    let scale = GROWTH.powi(k);
    if x > 0.0 {
        if up { x * scale } else { x / scale }
    } else {
        let d = x.abs().max(1.0) * (scale - 1.0);
        if up { x + d } else { x - d }
    }
}

fn bracket<F>(f: &mut F, x0: f64, f0: f64, up: bool, down: bool) -> Option<(f64, f64, f64, f64)>
where
    F: FnMut(f64) -> f64,
{
    let mut last_up = Some((x0, f0)).filter(|_| up);
    let mut last_down = Some((x0, f0)).filter(|_| down);

    for k in 1..=MAX_EXPAND {
        if let Some((xp, fp)) = last_up {
            let x = probe(x0, k, true);
            let fx = f(x);
            if !fx.is_finite() {
                last_up = None;
            } else if fx == 0.0 || fx.signum() != fp.signum() {
                return Some((xp, fp, x, fx));
            } else {
                last_up = Some((x, fx));
            }
        }
        if let Some((xp, fp)) = last_down {
            let x = probe(x0, k, false);
            let fx = f(x);
            if !fx.is_finite() {
                last_down = None;
            } else if fx == 0.0 || fx.signum() != fp.signum() {
                return Some((x, fx, xp, fp));
            } else {
                last_down = Some((x, fx));
            }
        }
        if last_up.is_none() && last_down.is_none() {
            break;
        }
    }
    None
}

fn refine<F>(f: &mut F, mut a: f64, mut fa: f64, mut b: f64, mut fb: f64) -> Result<f64, SolveError>
where
    F: FnMut(f64) -> f64,
{
    let mut force_bisect = false;
    for _ in 0..MAX_ITER {
        let width = (b - a).abs();
        let (lo, hi) = (a.min(b), a.max(b));

        let secant = b - fb * (b - a) / (fb - fa);
        let x = if force_bisect || !secant.is_finite() || secant <= lo || secant >= hi {
            0.5 * (a + b)
        } else {
            secant
        };

        let fx = f(x);
        if !fx.is_finite() {
            return Err(SolveError::NonFinite { x });
        }
        if fx == 0.0 {
            return Ok(x);
        }
        if fa.signum() != fx.signum() {
            b = x;
            fb = fx;
        } else {
            a = x;
            fa = fx;
        }

        let new_width = (b - a).abs();
        force_bisect = new_width > 0.5 * width;
        if new_width <= REL_TOL * a.abs().max(b.abs()) + f64::MIN_POSITIVE {
            return Ok(if fa.abs() <= fb.abs() { a } else { b });
        }
    }
    Err(SolveError::NotConverged {
        iterations: MAX_ITER,
        lo: a.min(b),
        hi: a.max(b),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn solves_from_a_nearby_guess() {
        let x = solve(|x| x * x - 2.0, Seed::Near(1.0)).unwrap();
        assert!((x - 2f64.sqrt()).abs() < 1e-9);
    }

    #[test]
    fn directional_seeds_select_the_matching_root() {
        let f = |x: f64| (x - 1.0) * (x - 3.0);
        let above = solve(f, Seed::Above(2.0)).unwrap();
        let below = solve(f, Seed::Below(2.0)).unwrap();
        assert!((above - 3.0).abs() < 1e-9, "above = {above}");
        assert!((below - 1.0).abs() < 1e-9, "below = {below}");
    }

    #[test]
    fn handles_roots_many_decades_away() {
        let target = 3.0e-7;
        let x = solve(|g: f64| (g / target).powi(2) - 1.0, Seed::Near(0.5)).unwrap();
        assert!(((x - target) / target).abs() < 1e-8, "x = {x}");
    }

    #[test]
    fn reports_missing_bracket() {
        let err = solve(|x| x * x + 1.0, Seed::Near(1.0)).unwrap_err();
        assert!(matches!(err, SolveError::NoBracket { .. }));
    }

    #[test]
    fn exact_seed_root_is_returned_unchanged() {
        assert_eq!(solve(|x| x - 4.0, Seed::Above(4.0)).unwrap(), 4.0);
    }
}
