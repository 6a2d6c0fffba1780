//! Shared "fit pipeline" logic for the CLI.
//!
//! ingest -> fit/select -> residuals
//!
//! Front-ends then only deal with presentation (printing, plotting, exports).

use std::path::Path;

use crate::domain::{PredictorConfig, ReadingResidual};
use crate::error::AppError;
use crate::fit::FitReport;
use crate::io::{IngestedReadings, load_readings};
use crate::predictor::fit_report;

/// All computed outputs of a single `ferment fit` run.
#[derive(Debug, Clone)]
pub struct RunOutput {
    pub ingest: IngestedReadings,
    pub report: FitReport,
    /// Empty when no model produced a curve.
    pub residuals: Vec<ReadingResidual>,
}

/// Load a readings CSV and run the predictor on it.
pub fn run_fit(
    csv: &Path,
    config: &PredictorConfig,
    expected_fg: Option<f64>,
    model: &str,
) -> Result<RunOutput, AppError> {
    let ingest = load_readings(csv)?;
    run_fit_on(ingest, config, expected_fg, model)
}

/// Run the predictor on already-ingested readings.
pub fn run_fit_on(
    ingest: IngestedReadings,
    config: &PredictorConfig,
    expected_fg: Option<f64>,
    model: &str,
) -> Result<RunOutput, AppError> {
    if let Some(fg) = expected_fg {
        if !(fg.is_finite() && fg > 0.0) {
            return Err(AppError::input(format!("Invalid expected FG: {fg}")));
        }
    }

    let report = fit_report(config, &ingest.times(), &ingest.sgs(), expected_fg, model);

    let residuals = match &report.best {
        Some(best) => crate::report::compute_residuals(&ingest.readings, best)?,
        None => Vec::new(),
    };

    Ok(RunOutput { ingest, report, residuals })
}
