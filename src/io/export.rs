//! Export recast results to JSON or CSV.
//!
//! The JSON export is self-describing (target model, `gmax`, generation time, one entry
//! per limit). The CSV export is long-format, one row per limit, side and mass, so it
//! can be filtered in spreadsheets or plotted directly.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use chrono::Local;
use serde::Serialize;

use crate::domain::RecastBounds;
use crate::error::AppError;
use crate::limit::LimitRecast;

#[derive(Debug, Serialize)]
struct RecastFile<'a> {
    tool: &'static str,
    generated: String,
    model: &'a str,
    gmax: f64,
    limits: Vec<LimitEntry<'a>>,
}

#[derive(Debug, Serialize)]
struct LimitEntry<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    bounds: Option<&'a RecastBounds>,
}

/// Export format, chosen from the file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Json,
    Csv,
}

impl ExportFormat {
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("csv") => ExportFormat::Csv,
            _ => ExportFormat::Json,
        }
    }
}

pub fn write_results(path: &Path, model: &str, gmax: f64, results: &[LimitRecast]) -> Result<(), AppError> {
    match ExportFormat::from_path(path) {
        ExportFormat::Json => write_results_json(path, model, gmax, results),
        ExportFormat::Csv => write_results_csv(path, results),
    }
}

pub fn write_results_json(path: &Path, model: &str, gmax: f64, results: &[LimitRecast]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export JSON '{}': {e}", path.display())))?;

    let out = RecastFile {
        tool: "recast",
        generated: Local::now().to_rfc3339(),
        model,
        gmax,
        limits: results
            .iter()
            .map(|r| LimitEntry {
                name: &r.limit,
                bounds: r.bounds.as_ref(),
            })
            .collect(),
    };

    serde_json::to_writer_pretty(file, &out)
        .map_err(|e| AppError::new(2, format!("Failed to write export JSON: {e}")))?;
    Ok(())
}

pub fn write_results_csv(path: &Path, results: &[LimitRecast]) -> Result<(), AppError> {
    let mut file = File::create(path)
        .map_err(|e| AppError::new(2, format!("Failed to create export CSV '{}': {e}", path.display())))?;

    writeln!(file, "limit,side,mass,coupling")
        .map_err(|e| AppError::new(2, format!("Failed to write export CSV header: {e}")))?;

    for r in results {
        let Some(bounds) = &r.bounds else {
            continue;
        };
        let sides = [("lower", Some(&bounds.lower)), ("upper", bounds.upper.as_ref())];
        for (side, points) in sides {
            for p in points.into_iter().flatten() {
                writeln!(file, "{},{side},{:.6e},{:.6e}", r.limit, p.mass, p.coupling)
                    .map_err(|e| AppError::new(2, format!("Failed to write export CSV row: {e}")))?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CurvePoint;

    fn results() -> Vec<LimitRecast> {
        let pt = |mass, coupling| CurvePoint { mass, coupling };
        vec![
            LimitRecast {
                limit: "band".to_string(),
                bounds: Some(RecastBounds {
                    lower: vec![pt(0.1, 1e-5), pt(0.2, 2e-5)],
                    upper: Some(vec![pt(0.1, 1e-3), pt(0.2, 2e-3)]),
                }),
            },
            LimitRecast {
                limit: "gated".to_string(),
                bounds: None,
            },
        ]
    }

    #[test]
    fn csv_has_one_row_per_side_and_mass() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_results(&path, "dark_photon", 1e5, &results()).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "limit,side,mass,coupling");
        assert_eq!(lines[3], "band,upper,1.000000e-1,1.000000e-3");
    }

    #[test]
    fn json_records_the_run() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.json");
        write_results(&path, "B-L_boson", 10.0, &results()).unwrap();
        let value: serde_json::Value = serde_json::from_reader(File::open(&path).unwrap()).unwrap();
        assert_eq!(value["model"], "B-L_boson");
        assert_eq!(value["gmax"], 10.0);
        let g = value["limits"][0]["bounds"]["lower"][1]["coupling"].as_f64().unwrap();
        assert!((g / 2e-5 - 1.0).abs() < 1e-12);
        assert!(value["limits"][1].get("bounds").is_none());
    }
}
