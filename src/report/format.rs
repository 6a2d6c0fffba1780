//! Formatted terminal output.
//!
//! We keep formatting code in one place so:
//! - the math/fitting code stays clean and testable
//! - output changes are localized

use crate::domain::{DatasetStats, FitResult, ModelKind, ReadingResidual};
use crate::fit::FitReport;

/// Format the full run summary (dataset stats + per-model diagnostics + prediction).
pub fn format_fit_summary(stats: &DatasetStats, report: &FitReport, expected_fg: Option<f64>) -> String {
    let mut out = String::new();

    out.push_str("=== ferment - Fermentation Curve Fit ===\n");
    out.push_str(&format!(
        "Readings: n={} | hours=[{:.1}, {:.1}] | sg=[{:.4}, {:.4}]\n",
        stats.n_readings, stats.hours_min, stats.hours_max, stats.sg_min, stats.sg_max
    ));
    match expected_fg {
        Some(fg) => out.push_str(&format!("Recipe FG: {fg:.4}\n")),
        None => out.push_str("Recipe FG: (none)\n"),
    }

    if !report.fits.is_empty() || !report.skipped.is_empty() {
        out.push_str("\nModel diagnostics:\n");
        let chosen = report.best.as_ref().map(|b| b.model);
        for fit in &report.fits {
            let mark = if Some(fit.model) == chosen { "*" } else { " " };
            out.push_str(&format!(
                "{mark} {:<18} R²={:.4} RMSE={:.5} iters={} params={}\n",
                fit.model.display_name(),
                fit.r_squared,
                fit.rmse,
                fit.iterations,
                fmt_params(fit.model, &fit.params),
            ));
        }
        for (kind, reason) in &report.skipped {
            out.push_str(&format!("  {:<18} rejected: {reason}\n", kind.display_name()));
        }
    }

    out.push('\n');
    out.push_str(&format_prediction(&report.result));
    out
}

/// Format the prediction block for a single result.
pub fn format_prediction(result: &FitResult) -> String {
    let mut out = String::new();

    if !result.fitted {
        out.push_str(&format!(
            "No curve fitted: {}\n",
            result.reason.as_deref().unwrap_or("unknown")
        ));
        if let Some(h) = result.hours_to_target_linear {
            out.push_str(&format!("- linear ETA to target: {}\n", fmt_hours(h)));
        }
        return out;
    }

    out.push_str("Prediction:\n");
    if let Some(kind) = result.model_type {
        out.push_str(&format!("- model      : {}\n", kind.display_name()));
    }
    out.push_str(&format!(
        "- OG / FG    : {} / {}\n",
        fmt_sg(result.predicted_og),
        fmt_sg(result.predicted_fg)
    ));
    out.push_str(&format!("- rate       : {}\n", fmt_opt(result.decay_rate, 5)));
    out.push_str(&format!("- R²         : {}\n", fmt_opt(result.r_squared, 4)));
    out.push_str(&format!("- confidence : {}\n", fmt_opt(result.confidence, 3)));
    out.push_str(&format!(
        "- ETA (curve / linear / blended): {} / {} / {}\n",
        result.hours_to_completion.map(fmt_hours).unwrap_or_else(|| "-".to_string()),
        result.hours_to_target_linear.map(fmt_hours).unwrap_or_else(|| "-".to_string()),
        result.blended_hours_to_completion.map(fmt_hours).unwrap_or_else(|| "-".to_string()),
    ));

    out
}

/// Format observed vs. fitted readings as a table.
pub fn format_residual_table(rows: &[ReadingResidual]) -> String {
    let mut out = String::new();
    out.push_str(&format!("{:>8} {:>8} {:>8} {:>9}\n", "hours", "sg_obs", "sg_fit", "residual"));
    out.push_str(&format!("{:-<8} {:-<8} {:-<8} {:-<9}\n", "", "", "", ""));
    for r in rows {
        out.push_str(&format!(
            "{:>8.1} {:>8.4} {:>8.4} {:>+9.5}\n",
            r.reading.hours, r.reading.sg, r.sg_fit, r.residual
        ));
    }
    out
}

fn fmt_params(kind: ModelKind, params: &[f64]) -> String {
    let mut parts = vec![
        format!("og={:.4}", params[0]),
        format!("fg={:.4}", params[1]),
        format!("rate={:.5}", params[2]),
    ];
    if let (Some(name), Some(v)) = (kind.shape_name(), params.get(3)) {
        parts.push(format!("{name}={v:.2}"));
    }
    format!("[{}]", parts.join(", "))
}

fn fmt_sg(v: Option<f64>) -> String {
    fmt_opt(v, 4)
}

fn fmt_opt(v: Option<f64>, decimals: usize) -> String {
    match v {
        Some(x) => format!("{x:.decimals$}"),
        None => "-".to_string(),
    }
}

/// `37.5h (1.6d)`
fn fmt_hours(h: f64) -> String {
    format!("{h:.1}h ({:.1}d)", h / 24.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{FailureReason, Reading};

    #[test]
    fn failed_prediction_names_reason() {
        let mut result = FitResult::failed(&FailureReason::InsufficientProgress);
        result.hours_to_target_linear = Some(48.0);
        let text = format_prediction(&result);
        assert!(text.contains("insufficient_fermentation_progress"));
        assert!(text.contains("48.0h (2.0d)"));
    }

    #[test]
    fn fitted_prediction_lists_etas() {
        let result = FitResult {
            fitted: true,
            model_type: Some(ModelKind::Logistic),
            predicted_og: Some(1.06),
            predicted_fg: Some(1.01),
            decay_rate: Some(0.05),
            r_squared: Some(0.995),
            hours_to_completion: Some(24.0),
            hours_to_target_linear: None,
            blended_hours_to_completion: Some(24.0),
            confidence: Some(0.6965),
            reason: None,
        };
        let text = format_prediction(&result);
        assert!(text.contains("Logistic"));
        assert!(text.contains("1.0600 / 1.0100"));
        assert!(text.contains("24.0h (1.0d) / - / 24.0h (1.0d)"));
    }

    #[test]
    fn residual_table_has_a_row_per_reading() {
        let rows = vec![
            ReadingResidual { reading: Reading { hours: 0.0, sg: 1.05 }, sg_fit: 1.05, residual: 0.0 },
            ReadingResidual { reading: Reading { hours: 4.0, sg: 1.04 }, sg_fit: 1.041, residual: -0.001 },
        ];
        assert_eq!(format_residual_table(&rows).lines().count(), 4);
    }
}
