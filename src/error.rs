//! Error types.
//!
//! Two layers:
//!
//! - domain errors (`ModelError`, `ProductionError`, ...) raised while building or
//!   evaluating physics objects
//! - `AppError`, the exit-code carrying error returned by the `recast` binary
//!
//! Domain errors convert into `AppError` so front-end code can use `?` throughout.

use thiserror::Error;

#[derive(Clone)]
pub struct AppError {
    exit_code: u8,
    message: String,
}

impl AppError {
    pub fn new(exit_code: u8, message: impl Into<String>) -> Self {
        Self {
            exit_code,
            message: message.into(),
        }
    }

    pub fn exit_code(&self) -> u8 {
        self.exit_code
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("exit_code", &self.exit_code)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}

/// Failures while defining or querying a coupling model.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ModelError {
    #[error("invalid '{fermion}' coupling in model '{model}': {reason}")]
    InvalidCoupling {
        model: String,
        fermion: String,
        reason: String,
    },
    #[error("unknown final state '{0}'")]
    UnknownState(String),
    #[error("invalid diagonal of length {0} provided to the quark-charge trace (expected 3)")]
    InvalidTrace(usize),
    #[error("invalid definition of allowed final states for model '{model}': {reason}")]
    InconsistentStates { model: String, reason: String },
    #[error("model '{model}' does not decay at mass {mass} GeV (infinite lifetime)")]
    StableLifetime { model: String, mass: f64 },
}

/// Missing tabulated data for a resonance lineshape.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("no data is available for the {0} resonance")]
pub struct BreitWignerError(pub String);

/// Failures while building a production mechanism.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProductionError {
    #[error("unknown production mechanism '{0}'")]
    UnknownMechanism(String),
    #[error("production mechanism '{name}' has no channels")]
    NoChannels { name: String },
    #[error(transparent)]
    Lineshape(#[from] BreitWignerError),
}

/// Failures while building a limit definition.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LimitError {
    #[error("no {field} is defined for limit '{limit}'")]
    MissingField { limit: String, field: &'static str },
    #[error("the decay defined for limit '{limit}' is not valid: {reason}")]
    InvalidDecay { limit: String, reason: String },
    #[error("malformed bounds for limit '{limit}': {reason}")]
    InvalidBounds { limit: String, reason: String },
    #[error("efficiency of limit '{limit}' is not usable: {reason}")]
    InvalidEfficiency { limit: String, reason: String },
    #[error(transparent)]
    Model(#[from] ModelError),
    #[error(transparent)]
    Production(#[from] ProductionError),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Scalar root-finder failures. Recasting absorbs these locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolveError {
    #[error("could not bracket a root starting from {start}")]
    NoBracket { start: f64 },
    #[error("no convergence after {iterations} iterations (bracket [{lo}, {hi}])")]
    NotConverged { iterations: usize, lo: f64, hi: f64 },
    #[error("residual is not finite at x = {x}")]
    NonFinite { x: f64 },
}

impl From<ModelError> for AppError {
    fn from(value: ModelError) -> Self {
        let code = match value {
            ModelError::StableLifetime { .. } => 4,
            _ => 2,
        };
        AppError::new(code, value.to_string())
    }
}

impl From<ProductionError> for AppError {
    fn from(value: ProductionError) -> Self {
        AppError::new(2, value.to_string())
    }
}

impl From<LimitError> for AppError {
    fn from(value: LimitError) -> Self {
        AppError::new(2, value.to_string())
    }
}

impl From<SolveError> for AppError {
    fn from(value: SolveError) -> Self {
        AppError::new(4, value.to_string())
    }
}

/// Malformed tabulated data.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GridError {
    #[error("grid has no points")]
    Empty,
    #[error("grid axis has {axis} points but {values} values")]
    LengthMismatch { axis: usize, values: usize },
    #[error("grid axis is not strictly increasing at index {0}")]
    Unsorted(usize),
    #[error("grid contains a non-finite entry at index {0}")]
    NonFinite(usize),
}

impl From<GridError> for AppError {
    fn from(value: GridError) -> Self {
        AppError::new(2, value.to_string())
    }
}
