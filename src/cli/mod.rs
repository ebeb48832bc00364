//! Command-line parsing for the `recast` binary.
//!
//! Argument parsing and command dispatch stay separate from the physics code: this
//! module only describes the interface, `app` turns it into calls.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

use crate::limit::DEFAULT_GMAX;

/// Top-level CLI.
#[derive(Debug, Parser)]
#[command(name = "recast", version, about = "Recast dark-boson limits onto other coupling models")]
pub struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace). Overrides `RUST_LOG`.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(flatten)]
    pub paths: PathArgs,

    #[command(subcommand)]
    pub command: Command,
}

/// Search-path overrides. Each defaults to the matching `RECAST_*_PATH` variable.
#[derive(Debug, Args, Clone, Default)]
pub struct PathArgs {
    /// Directory with hadronic data tables (`rf.*.dat`, `sf.*.a.dat`).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Directory with model definitions (`<name>.json`). May be repeated.
    #[arg(long, global = true, value_name = "DIR")]
    pub model_dir: Vec<PathBuf>,

    /// Directory with limit definitions (`<name>.json`). May be repeated.
    #[arg(long, global = true, value_name = "DIR")]
    pub limit_dir: Vec<PathBuf>,
}

/// CLI subcommands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Recast one limit, or every limit on the search path, onto a model.
    Recast(RecastArgs),
    /// Print partial widths, branching fractions and the lifetime of a model.
    Width(WidthArgs),
    /// List the available models and limits.
    List,
}

#[derive(Debug, Parser, Clone)]
pub struct RecastArgs {
    /// Target model (built-in name or `<name>.json` on the model path).
    #[arg(short, long)]
    pub model: String,

    /// Limit to recast; all limits when omitted.
    #[arg(short, long)]
    pub limit: Option<String>,

    /// Couplings are clipped to this value.
    #[arg(long, default_value_t = DEFAULT_GMAX)]
    pub gmax: f64,

    /// Print the full recast curve of every limit.
    #[arg(long)]
    pub curves: bool,

    /// Export results; `.csv` writes CSV, anything else JSON.
    #[arg(long, value_name = "FILE")]
    pub export: Option<PathBuf>,
}

#[derive(Debug, Parser, Clone)]
pub struct WidthArgs {
    /// Model name.
    #[arg(short, long)]
    pub model: String,

    /// Boson mass (GeV).
    #[arg(long)]
    pub mass: f64,

    /// Global coupling.
    #[arg(short, long, default_value_t = 1.0)]
    pub g: f64,

    /// Final states to report.
    #[arg(
        long,
        value_delimiter = ',',
        default_values_t = ["e_e", "mu_mu", "hadrons", "invisible", "visible", "total"].map(String::from)
    )]
    pub states: Vec<String>,
}
