//! Tabulated grids.
//!
//! Two shapes are used throughout the crate:
//!
//! - `Interpolator`: a one-dimensional table `x -> y` (mass-dependent couplings,
//!   hadronic R-ratios, spectral functions, bound curves)
//! - `log_space`: helper for building log-spaced mass scans
//!
//! Interpolation is piecewise linear. Outside the tabulated range the table evaluates
//! to zero, which is the natural value for the hadronic grids (no data means no channel).

use serde::{Deserialize, Serialize};

use crate::error::GridError;

/// Piecewise-linear table over a strictly increasing axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawTable", into = "RawTable")]
pub struct Interpolator {
    xs: Vec<f64>,
    ys: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RawTable {
    masses: Vec<f64>,
    values: Vec<f64>,
}

impl TryFrom<RawTable> for Interpolator {
    type Error = GridError;

    fn try_from(raw: RawTable) -> Result<Self, Self::Error> {
        Interpolator::new(raw.masses, raw.values)
    }
}

impl From<Interpolator> for RawTable {
    fn from(table: Interpolator) -> Self {
        RawTable {
            masses: table.xs,
            values: table.ys,
        }
    }
}

impl Interpolator {
    pub fn new(xs: Vec<f64>, ys: Vec<f64>) -> Result<Self, GridError> {
        if xs.is_empty() {
            return Err(GridError::Empty);
        }
        if xs.len() != ys.len() {
            return Err(GridError::LengthMismatch {
                axis: xs.len(),
                values: ys.len(),
            });
        }
        if let Some(i) = xs.iter().chain(ys.iter()).position(|v| !v.is_finite()) {
            return Err(GridError::NonFinite(i % xs.len()));
        }
        if let Some(i) = xs.windows(2).position(|w| w[1] <= w[0]) {
            return Err(GridError::Unsorted(i + 1));
        }
        Ok(Self { xs, ys })
    }

    /// Build from `(x, y)` rows.
    pub fn from_pairs(pairs: &[(f64, f64)]) -> Result<Self, GridError> {
        let (xs, ys) = pairs.iter().copied().unzip();
        Self::new(xs, ys)
    }

    pub fn xs(&self) -> &[f64] {
        &self.xs
    }

    pub fn ys(&self) -> &[f64] {
        &self.ys
    }

    pub fn len(&self) -> usize {
        self.xs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.xs.is_empty()
    }

    /// Iterate over `(x, y)` rows in axis order.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.xs.iter().copied().zip(self.ys.iter().copied())
    }

    /// Evaluate at `x`; zero outside `[x_min, x_max]`.
    pub fn eval(&self, x: f64) -> f64 {
        let n = self.xs.len();
        if !x.is_finite() || x < self.xs[0] || x > self.xs[n - 1] {
            return 0.0;
        }
        if n == 1 {
            return self.ys[0];
        }

        // First index with xs[i] >= x; x is inside the range so 0 <= i < n.
        let i = self.xs.partition_point(|&v| v < x);
        if self.xs[i] == x {
            return self.ys[i];
        }
        let (x0, x1) = (self.xs[i - 1], self.xs[i]);
        let (y0, y1) = (self.ys[i - 1], self.ys[i]);
        y0 + (y1 - y0) * (x - x0) / (x1 - x0)
    }
}

/// Generate `steps` log-spaced points between `min` and `max` (inclusive).
pub fn log_space(min: f64, max: f64, steps: usize) -> Result<Vec<f64>, GridError> {
    if !(min.is_finite() && min > 0.0) {
        return Err(GridError::NonFinite(0));
    }
    if !(max.is_finite() && max > min) {
        return Err(GridError::Unsorted(1));
    }
    if steps < 2 {
        return Err(GridError::Empty);
    }

    let ln_min = min.ln();
    let ln_max = max.ln();
    let step = (ln_max - ln_min) / (steps as f64 - 1.0);

    let mut out = Vec::with_capacity(steps);
    for i in 0..steps {
        out.push((ln_min + step * i as f64).exp());
    }
    Ok(out)
}
