//! Read/write fit results and curve JSON files.
//!
//! - result JSON: the flat `FitResult` record, as handed to callers
//! - curve JSON: the chosen model's full parameter vector plus a fitted grid,
//!   for plotting without refitting (schema: `domain::CurveFile`)

use std::fs::File;
use std::path::Path;

use crate::domain::{CurveFile, CurveGrid, FitResult};
use crate::error::AppError;
use crate::fit::ModelFit;
use crate::models::evaluate;

const GRID_POINTS: usize = 101;

/// Write a `FitResult` as pretty JSON.
pub fn write_result_json(path: &Path, result: &FitResult) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create result JSON '{}': {e}", path.display())))?;
    serde_json::to_writer_pretty(file, result)
        .map_err(|e| AppError::input(format!("Failed to write result JSON: {e}")))?;
    Ok(())
}

/// Read a `FitResult` from either a result JSON or a curve JSON.
pub fn read_result_json(path: &Path) -> Result<FitResult, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open result JSON '{}': {e}", path.display())))?;
    let value: serde_json::Value =
        serde_json::from_reader(file).map_err(|e| AppError::input(format!("Invalid JSON: {e}")))?;

    let parsed = if value.get("grid").is_some() {
        serde_json::from_value::<CurveFile>(value).map(|curve| curve.result)
    } else {
        serde_json::from_value::<FitResult>(value)
    };
    parsed.map_err(|e| AppError::input(format!("Invalid fit result JSON: {e}")))
}

/// Write a curve JSON file for the chosen fit.
///
/// The grid runs from the first reading to the last reading plus the blended
/// (or curve) ETA, so the plot shows where the batch is heading.
pub fn write_curve_json(
    path: &Path,
    fit: &ModelFit,
    result: &FitResult,
    hours_min: f64,
    hours_max: f64,
) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create curve JSON '{}': {e}", path.display())))?;

    let curve = build_curve_file(fit, result, hours_min, hours_max);
    serde_json::to_writer_pretty(file, &curve)
        .map_err(|e| AppError::input(format!("Failed to write curve JSON: {e}")))?;
    Ok(())
}

/// Read a curve JSON file.
pub fn read_curve_json(path: &Path) -> Result<CurveFile, AppError> {
    let file = File::open(path)
        .map_err(|e| AppError::input(format!("Failed to open curve JSON '{}': {e}", path.display())))?;
    let curve: CurveFile = serde_json::from_reader(file)
        .map_err(|e| AppError::input(format!("Invalid curve JSON: {e}")))?;

    let expected = curve.model.param_count();
    if curve.parameters.len() != expected {
        return Err(AppError::input(format!(
            "Invalid curve JSON: {} model needs {expected} parameters, found {}",
            curve.model.name(),
            curve.parameters.len()
        )));
    }
    if curve.parameters.iter().any(|v| !v.is_finite()) {
        return Err(AppError::input("Invalid curve JSON: parameters must be finite"));
    }
    Ok(curve)
}

/// Assemble the curve file contents without touching the filesystem.
pub fn build_curve_file(fit: &ModelFit, result: &FitResult, hours_min: f64, hours_max: f64) -> CurveFile {
    let eta = result
        .blended_hours_to_completion
        .or(result.hours_to_completion)
        .unwrap_or(0.0);
    let (hours, sg) = build_grid(fit, hours_min, hours_max + eta, GRID_POINTS);

    CurveFile {
        tool: "ferment".to_string(),
        model: fit.model,
        parameters: fit.params.clone(),
        result: result.clone(),
        grid: CurveGrid { hours, sg },
    }
}

fn build_grid(fit: &ModelFit, t_min: f64, t_max: f64, n: usize) -> (Vec<f64>, Vec<f64>) {
    let n = n.max(2);
    let mut t0 = t_min;
    let mut t1 = t_max;
    if !(t0.is_finite() && t1.is_finite()) || t1 <= t0 {
        t0 = 0.0;
        t1 = t0.max(t1).max(24.0);
    }

    let mut hours = Vec::with_capacity(n);
    let mut sg = Vec::with_capacity(n);
    for i in 0..n {
        let u = i as f64 / (n as f64 - 1.0);
        let t = t0 + u * (t1 - t0);
        hours.push(t);
        sg.push(evaluate(fit.model, t, &fit.params));
    }
    (hours, sg)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ModelKind;

    fn sample_fit() -> ModelFit {
        ModelFit {
            model: ModelKind::Exponential,
            params: vec![1.055, 1.012, 0.02],
            r_squared: 0.99,
            sse: 1e-6,
            rmse: 1e-4,
            iterations: 5,
        }
    }

    fn sample_result() -> FitResult {
        FitResult {
            fitted: true,
            model_type: Some(ModelKind::Exponential),
            predicted_og: Some(1.055),
            predicted_fg: Some(1.012),
            decay_rate: Some(0.02),
            r_squared: Some(0.99),
            hours_to_completion: Some(40.0),
            hours_to_target_linear: None,
            blended_hours_to_completion: Some(40.0),
            confidence: Some(0.69),
            reason: None,
        }
    }

    #[test]
    fn grid_extends_past_last_reading_by_eta() {
        let curve = build_curve_file(&sample_fit(), &sample_result(), 0.0, 100.0);
        assert_eq!(curve.grid.hours.len(), GRID_POINTS);
        assert_eq!(curve.grid.hours[0], 0.0);
        assert!((curve.grid.hours[GRID_POINTS - 1] - 140.0).abs() < 1e-9);
        assert!((curve.grid.sg[0] - 1.055).abs() < 1e-12);
    }

    #[test]
    fn result_and_curve_files_round_trip_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let result_path = dir.path().join("result.json");
        let curve_path = dir.path().join("curve.json");

        write_result_json(&result_path, &sample_result()).unwrap();
        write_curve_json(&curve_path, &sample_fit(), &sample_result(), 0.0, 100.0).unwrap();

        assert_eq!(read_result_json(&result_path).unwrap(), sample_result());
        // A curve file is also accepted wherever a result is expected.
        assert_eq!(read_result_json(&curve_path).unwrap(), sample_result());
        assert_eq!(read_curve_json(&curve_path).unwrap().parameters, vec![1.055, 1.012, 0.02]);
    }

    #[test]
    fn curve_with_too_few_parameters_is_an_input_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("curve.json");

        let mut curve = build_curve_file(&sample_fit(), &sample_result(), 0.0, 100.0);
        curve.model = ModelKind::Gompertz;
        curve.parameters = vec![1.05, 1.01];
        std::fs::write(&path, serde_json::to_string(&curve).unwrap()).unwrap();

        let err = read_curve_json(&path).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(err.to_string().contains("needs 4 parameters"), "{err}");
    }
}
