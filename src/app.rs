//! Top-level application orchestration.
//!
//! `src/main.rs` is intentionally tiny; this module is the "real main" that:
//! - installs the tracing subscriber
//! - parses CLI arguments and resolves search paths
//! - loads hadronic data, models and limits
//! - runs recasts and prints reports
//! - writes optional exports

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command, PathArgs, RecastArgs, WidthArgs};
use crate::error::AppError;
use crate::io::{Library, SearchPaths, load_parameters, write_results};
use crate::limit::{LimitRecast, recast_all};
use crate::params::ParameterTable;

/// Entry point for the `recast` binary.
pub fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let library = library(&cli.paths)?;

    match cli.command {
        Command::Recast(args) => handle_recast(&library, args),
        Command::Width(args) => handle_width(&library, args),
        Command::List => handle_list(&library),
    }
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    // A second initialization (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Merge CLI overrides into the environment's search paths and load the data directory.
pub fn library(args: &PathArgs) -> Result<Library, AppError> {
    let mut paths = SearchPaths::from_env();
    if let Some(dir) = &args.data_dir {
        paths.data = Some(dir.clone());
    }
    if !args.model_dir.is_empty() {
        paths.models = args.model_dir.clone();
    }
    if !args.limit_dir.is_empty() {
        paths.limits = args.limit_dir.clone();
    }

    let params = match &paths.data {
        Some(dir) => load_parameters(dir)?,
        None => ParameterTable::default(),
    };
    Ok(Library::new(params, paths))
}

fn handle_recast(library: &Library, args: RecastArgs) -> Result<(), AppError> {
    if !(args.gmax.is_finite() && args.gmax > 0.0) {
        return Err(AppError::new(2, format!("gmax must be positive, got {}.", args.gmax)));
    }
    let target = library.model(&args.model)?;

    let limits = match &args.limit {
        Some(name) => vec![library.limit(name)?],
        None => library.limits(),
    };
    if limits.is_empty() {
        return Err(AppError::new(
            2,
            "No limits found. Set RECAST_LIMIT_PATH or pass --limit-dir.",
        ));
    }
    info!(model = %args.model, limits = limits.len(), "recasting");

    let results: Vec<LimitRecast> = recast_all(limits, &target, args.gmax);

    println!(
        "{}",
        crate::report::format_recast_summary(target.name(), args.gmax, &results)
    );
    if args.curves {
        for r in &results {
            println!("{}", crate::report::format_recast_curve(r));
        }
    }

    if let Some(path) = &args.export {
        write_results(path, target.name(), args.gmax, &results)?;
    }
    Ok(())
}

fn handle_width(library: &Library, args: WidthArgs) -> Result<(), AppError> {
    if !(args.mass.is_finite() && args.mass >= 0.0) {
        return Err(AppError::new(2, format!("mass must be non-negative, got {}.", args.mass)));
    }
    let model = library.model(&args.model)?;
    let states = library.states(&args.states)?;
    println!(
        "{}",
        crate::report::format_widths(&model, args.mass, args.g, &states)
    );
    Ok(())
}

fn handle_list(library: &Library) -> Result<(), AppError> {
    let models = library.models();
    let limits = library.limits();
    println!("{}", crate::report::format_catalog(&models, &limits));
    Ok(())
}
