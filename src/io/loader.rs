//! Name resolution and batch loading.
//!
//! Definitions live in directories as `<name>.json`:
//!
//! - models are searched in the model directories first, then among the built-ins
//! - limits are searched in the limit directories; bound tables they reference are
//!   resolved relative to the limit file
//! - tabulated hadronic data is read from one data directory (`rf.<state>.<mesons>.dat`,
//!   `sf.u_d.a.dat`, `sf.s.a.dat`)
//!
//! Batch loaders skip definitions that fail to load with a warning.

use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, warn};

use crate::domain::FinalState;
use crate::error::AppError;
use crate::io::records::{
    BoundsRecord, CurveSource, GridSource, LimitRecord, ModelRecord, ModelRef, ProductionRecord,
};
use crate::io::table::{read_curve, read_rvalue_grid};
use crate::limit::{Bounds, Limit, LimitDefinition, RValueGrid};
use crate::math::Interpolator;
use crate::models::{BUILTIN_MODELS, CouplingModel, builtin};
use crate::params::{ParameterTable, Spectral};
use crate::production::{Channel, Mechanism, ProductionMechanism};

pub const MODEL_PATH_VAR: &str = "RECAST_MODEL_PATH";
pub const LIMIT_PATH_VAR: &str = "RECAST_LIMIT_PATH";
pub const DATA_PATH_VAR: &str = "RECAST_DATA_PATH";

/// Directories searched for definitions and data.
#[derive(Debug, Clone, Default)]
pub struct SearchPaths {
    pub models: Vec<PathBuf>,
    pub limits: Vec<PathBuf>,
    pub data: Option<PathBuf>,
}

impl SearchPaths {
    /// Paths from the environment (and `.env`), each variable a platform path list.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        let list = |var: &str| -> Vec<PathBuf> {
            std::env::var_os(var)
                .map(|v| std::env::split_paths(&v).filter(|p| !p.as_os_str().is_empty()).collect())
                .unwrap_or_default()
        };
        Self {
            models: list(MODEL_PATH_VAR),
            limits: list(LIMIT_PATH_VAR),
            data: list(DATA_PATH_VAR).into_iter().next(),
        }
    }
}

/// Physical parameters with every grid found in `dir` attached.
pub fn load_parameters(dir: &Path) -> Result<ParameterTable, AppError> {
    let mut params = ParameterTable::default();
    for path in sorted_entries(dir)? {
        let Some(file) = path.file_name().and_then(|f| f.to_str()) else {
            continue;
        };
        let loaded = if let Some(key) = file.strip_prefix("rf.").and_then(|f| f.strip_suffix(".dat")) {
            read_curve(&path).map(|grid| params.insert_grid(key, grid))
        } else if file == "sf.u_d.a.dat" {
            read_curve(&path).map(|grid| params.insert_spectral(Spectral::Light, grid))
        } else if file == "sf.s.a.dat" {
            read_curve(&path).map(|grid| params.insert_spectral(Spectral::Strange, grid))
        } else {
            continue;
        };
        if let Err(err) = loaded {
            warn!(file, %err, "skipping data file");
        }
    }
    debug!(dir = %dir.display(), grids = params.grid_count(), "loaded hadronic data");
    Ok(params)
}

fn sorted_entries(dir: &Path) -> Result<Vec<PathBuf>, AppError> {
    let entries = fs::read_dir(dir)
        .map_err(|e| AppError::new(2, format!("Failed to read directory '{}': {e}", dir.display())))?;
    let mut paths: Vec<PathBuf> = entries.filter_map(|e| e.ok().map(|e| e.path())).collect();
    paths.sort();
    Ok(paths)
}

fn json_files(dir: &Path) -> Vec<PathBuf> {
    match sorted_entries(dir) {
        Ok(paths) => paths
            .into_iter()
            .filter(|p| p.extension().is_some_and(|e| e == "json"))
            .collect(),
        Err(err) => {
            warn!(%err, "skipping search path");
            Vec::new()
        }
    }
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::new(2, format!("Failed to open '{}': {e}", path.display())))?;
    serde_json::from_reader(file)
        .map_err(|e| AppError::new(2, format!("Invalid definition '{}': {e}", path.display())))
}

/// Resolves model and limit names against the search paths, sharing one parameter table.
#[derive(Debug, Clone)]
pub struct Library {
    params: Arc<ParameterTable>,
    paths: SearchPaths,
}

impl Library {
    pub fn new(params: ParameterTable, paths: SearchPaths) -> Self {
        Self {
            params: Arc::new(params),
            paths,
        }
    }

    pub fn params(&self) -> &Arc<ParameterTable> {
        &self.params
    }

    pub fn paths(&self) -> &SearchPaths {
        &self.paths
    }

    fn find(dirs: &[PathBuf], name: &str) -> Option<PathBuf> {
        dirs.iter()
            .map(|d| d.join(format!("{name}.json")))
            .find(|p| p.is_file())
    }

    /// Model by name: a definition file on the model path, else a built-in.
    pub fn model(&self, name: &str) -> Result<CouplingModel, AppError> {
        if let Some(path) = Self::find(&self.paths.models, name) {
            return self.model_from_file(&path);
        }
        if BUILTIN_MODELS.contains(&name) {
            return Ok(builtin(name, Arc::clone(&self.params))?);
        }
        Err(AppError::new(2, format!("Unknown model '{name}'.")))
    }

    pub fn model_from_file(&self, path: &Path) -> Result<CouplingModel, AppError> {
        let record: ModelRecord = read_json(path)?;
        self.model_from_record(record, &file_stem(path))
    }

    fn model_from_record(&self, record: ModelRecord, name: &str) -> Result<CouplingModel, AppError> {
        let def = record.into_definition(name)?;
        Ok(CouplingModel::new(def, Arc::clone(&self.params))?)
    }

    /// Every built-in model followed by every model on the model path.
    pub fn models(&self) -> Vec<CouplingModel> {
        let mut out = Vec::new();
        for name in BUILTIN_MODELS {
            match builtin(name, Arc::clone(&self.params)) {
                Ok(model) => out.push(model),
                Err(err) => warn!(model = name, %err, "could not load built-in model"),
            }
        }
        for dir in &self.paths.models {
            for path in json_files(dir) {
                match self.model_from_file(&path) {
                    Ok(model) => out.push(model),
                    Err(err) => warn!(path = %path.display(), %err, "could not load model"),
                }
            }
        }
        out
    }

    pub fn production(&self, record: ProductionRecord) -> Result<ProductionMechanism, AppError> {
        let mechanism = match record {
            ProductionRecord::Named(name) => ProductionMechanism::new(&name, &self.params)?,
            ProductionRecord::Channels { name, channels } => {
                let channels = channels
                    .into_iter()
                    .map(|c| {
                        Ok(Channel {
                            mechanism: Mechanism::parse(&c.mechanism, &self.params)?,
                            fraction: c.fraction.into_function()?,
                        })
                    })
                    .collect::<Result<Vec<_>, AppError>>()?;
                ProductionMechanism::from_channels(&name, channels)?
            }
            ProductionRecord::Scattering { name, scattering } => {
                ProductionMechanism::scattering(&name, scattering)?
            }
        };
        Ok(mechanism)
    }

    /// Limit by name from the limit path.
    pub fn limit(&self, name: &str) -> Result<Limit, AppError> {
        let path = Self::find(&self.paths.limits, name)
            .ok_or_else(|| AppError::new(2, format!("Unknown limit '{name}'.")))?;
        self.limit_from_file(&path)
    }

    pub fn limit_from_file(&self, path: &Path) -> Result<Limit, AppError> {
        let record: LimitRecord = read_json(path)?;
        let base = path.parent().unwrap_or(Path::new("."));
        let name = record.name.clone().unwrap_or_else(|| file_stem(path));

        let model = match record.model {
            Some(ModelRef::Named(model)) => Some(self.model(&model)?),
            Some(ModelRef::Inline(model)) => Some(self.model_from_record(model, &name)?),
            None => None,
        };
        let production = record.production.map(|p| self.production(p)).transpose()?;
        let bounds = record.bounds.map(|b| load_bounds(b, base)).transpose()?;

        let def = LimitDefinition {
            name,
            notes: record.notes,
            model,
            production,
            decay: record.decay.map(|d| d.into_states()),
            bounds,
            efficiency: record.efficiency,
            validity: record.validity,
        };
        Ok(Limit::new(def)?)
    }

    /// Every limit on the limit path, in file-name order.
    pub fn limits(&self) -> Vec<Limit> {
        let mut out = Vec::new();
        for dir in &self.paths.limits {
            for path in json_files(dir) {
                match self.limit_from_file(&path) {
                    Ok(limit) => out.push(limit),
                    Err(err) => warn!(path = %path.display(), %err, "could not load limit"),
                }
            }
        }
        out
    }

    /// Parse final-state names against this library's conventions.
    pub fn states(&self, names: &[String]) -> Result<Vec<FinalState>, AppError> {
        Ok(crate::domain::parse_states(names)?)
    }
}

fn load_curve(source: CurveSource, base: &Path) -> Result<Interpolator, AppError> {
    match source {
        CurveSource::Points(points) => Ok(Interpolator::from_pairs(&points)?),
        CurveSource::File(path) => read_curve(&base.join(path)),
    }
}

fn load_bounds(record: BoundsRecord, base: &Path) -> Result<Bounds, AppError> {
    Ok(match record {
        BoundsRecord::Lower(curve) => Bounds::Lower(load_curve(curve, base)?),
        BoundsRecord::Band { lower, upper } => Bounds::Band {
            lower: load_curve(lower, base)?,
            upper: load_curve(upper, base)?,
        },
        BoundsRecord::Rvalues(GridSource::Inline {
            masses,
            couplings,
            values,
        }) => Bounds::RValues(RValueGrid::new(masses, couplings, values)?),
        BoundsRecord::Rvalues(GridSource::File(path)) => Bounds::RValues(read_rvalue_grid(&base.join(path))?),
    })
}
