//! Public entry points for fermentation prediction.
//!
//! Everything here is a pure function of its arguments: no fitted state is kept
//! between calls, so one process can fit many batches concurrently.

use crate::domain::{FitResult, ModelSpec, PredictorConfig};
use crate::error::AppError;
use crate::fit::{fit_and_select, FitReport};
use crate::models::exponential;

/// Fit a gravity series with the default configuration.
///
/// `model` is matched case-insensitively against `auto`, `exponential`,
/// `gompertz`, and `logistic`; anything else is treated as `exponential`.
pub fn fit(times: &[f64], sgs: &[f64], expected_fg: Option<f64>, model: &str) -> FitResult {
    fit_with(&PredictorConfig::default(), times, sgs, expected_fg, model)
}

/// Fit a gravity series with an explicit configuration.
pub fn fit_with(
    config: &PredictorConfig,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
    model: &str,
) -> FitResult {
    fit_report(config, times, sgs, expected_fg, model).result
}

/// Like [`fit_with`], but also returns every candidate fit and rejection.
pub fn fit_report(
    config: &PredictorConfig,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
    model: &str,
) -> FitReport {
    fit_and_select(config, times, sgs, expected_fg, ModelSpec::from_name(model))
}

/// Extrapolate gravity at `future_times` from a successful fit.
///
/// Uses the exponential form `FG + (OG − FG)·e^(−rate·t)` with the result's
/// OG, FG, and decay rate.
///
/// # Errors
/// Returns an input error if `result` is not a successful fit.
pub fn predict(result: &FitResult, future_times: &[f64]) -> Result<Vec<f64>, AppError> {
    if !result.fitted {
        return Err(AppError::input(format!(
            "predict requires a successful fit (reason: {})",
            result.reason.as_deref().unwrap_or("unknown")
        )));
    }
    let (Some(og), Some(fg), Some(rate)) =
        (result.predicted_og, result.predicted_fg, result.decay_rate)
    else {
        return Err(AppError::input("predict requires OG, FG, and decay rate on the fit result"));
    };

    Ok(future_times.iter().map(|&t| exponential(t, og, fg, rate)).collect())
}
