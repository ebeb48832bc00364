//! Formatted terminal output.
//!
//! Formatting lives here so the physics modules return data only, and output changes
//! stay local to one file.

use crate::domain::{CurvePoint, FinalState};
use crate::limit::{Limit, LimitRecast};
use crate::models::CouplingModel;

/// One-line-per-limit summary of a recast run.
pub fn format_recast_summary(model: &str, gmax: f64, results: &[LimitRecast]) -> String {
    let mut out = String::new();

    out.push_str("=== recast ===\n");
    out.push_str(&format!("Model: {model}\n"));
    out.push_str(&format!("gmax: {gmax:.3e}\n\n"));

    out.push_str(
        format!(
            "{:<32} {:<6} {:>6} {:>12} {:>12}\n",
            "limit", "kind", "points", "best g", "at mass"
        )
        .trim_end(),
    );
    out.push('\n');
    out.push_str(format!("{:-<32} {:-<6} {:->6} {:->12} {:->12}\n", "", "", "", "", "").trim_end());
    out.push('\n');

    for r in results {
        let Some(bounds) = &r.bounds else {
            out.push_str(&format!("{:<32} not valid for this model\n", truncate(&r.limit, 32)));
            continue;
        };
        let kind = if bounds.is_double_sided() { "band" } else { "lower" };
        let best = strongest(&bounds.lower, gmax);
        let (g, m) = match best {
            Some(p) => (format!("{:.4e}", p.coupling), format!("{:.4}", p.mass)),
            None => ("-".to_string(), "-".to_string()),
        };
        out.push_str(
            format!(
                "{:<32} {:<6} {:>6} {:>12} {:>12}\n",
                truncate(&r.limit, 32),
                kind,
                bounds.lower.len(),
                g,
                m
            )
            .trim_end(),
        );
        out.push('\n');
    }

    out
}

/// Smallest excluded coupling below `gmax`.
fn strongest(points: &[CurvePoint], gmax: f64) -> Option<&CurvePoint> {
    points
        .iter()
        .filter(|p| p.coupling < gmax)
        .min_by(|a, b| a.coupling.total_cmp(&b.coupling))
}

/// Full table of one recast result.
pub fn format_recast_curve(result: &LimitRecast) -> String {
    let mut out = format!("Limit: {}\n", result.limit);
    let Some(bounds) = &result.bounds else {
        out.push_str("not valid for this model\n");
        return out;
    };

    out.push_str(&format!("{:>12} {:>12} {:>12}\n", "mass", "lower", "upper"));
    for (i, p) in bounds.lower.iter().enumerate() {
        let upper = bounds
            .upper
            .as_ref()
            .and_then(|u| u.get(i))
            .map(|u| format!("{:.4e}", u.coupling))
            .unwrap_or_default();
        out.push_str(format!("{:>12.5} {:>12.4e} {:>12}\n", p.mass, p.coupling, upper).trim_end());
        out.push('\n');
    }
    out
}

/// Partial widths, branching fractions and lifetime of `model` at mass `m`.
pub fn format_widths(model: &CouplingModel, m: f64, g: f64, states: &[FinalState]) -> String {
    let mut out = String::new();
    out.push_str(&format!("Model: {} | m = {m} GeV | g = {g:e}\n", model.name()));

    out.push_str(format!("{:<24} {:>14} {:>12}\n", "state", "width [GeV]", "bfrac").trim_end());
    out.push('\n');
    for &state in states {
        let width = model.width(&[state], m, g);
        let bfrac = model.bfrac(&[state], m);
        let width = width.map_or_else(|| "-".to_string(), |w| format!("{w:.6e}"));
        out.push_str(format!("{:<24} {:>14} {:>12.6}\n", state.name(), width, bfrac).trim_end());
        out.push('\n');
    }

    match model.tau(m, g) {
        Ok(tau) => out.push_str(&format!("lifetime: {tau:.6e} s\n")),
        Err(err) => out.push_str(&format!("lifetime: {err}\n")),
    }
    out
}

/// Available models and limits.
pub fn format_catalog(models: &[CouplingModel], limits: &[Limit]) -> String {
    let mut out = String::from("Models:\n");
    for model in models {
        let sectors = match (model.axial_active(), model.vector_active()) {
            (true, true) => "axial+vector",
            (true, false) => "axial",
            (false, true) => "vector",
            (false, false) => "decoupled",
        };
        out.push_str(&format!("  {:<24} {sectors}\n", model.name()));
    }

    out.push_str("\nLimits:\n");
    for limit in limits {
        let decay: Vec<String> = limit.decay().iter().map(|s| s.name()).collect();
        out.push_str(&format!(
            "  {:<32} {:<16} {:<12} {}\n",
            truncate(limit.name(), 32),
            limit.model().name(),
            limit.production().name(),
            decay.join(",")
        ));
    }
    out
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
    out.push('.');
    out
}
