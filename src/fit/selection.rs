//! Fit orchestration and model selection.
//!
//! For one call:
//! 1. validate the series (length, reading count, finite values, progress)
//! 2. derive the FG floor from the optional recipe target
//! 3. fit every requested model kind (in parallel for `auto`)
//! 4. keep the highest-R² success
//! 5. attach the curve ETA, the linear ETA, confidence, and the blend
//!
//! Failures never escape as errors: they come back as `fitted = false` with a
//! reason code. Nothing is cached between calls.

use rayon::prelude::*;
use tracing::debug;

use crate::domain::{FailureReason, FitResult, ModelKind, ModelSpec, PredictorConfig};
use crate::fit::fitter::{fit_model, ModelFit};
use crate::fit::variant::fg_lower_bound;
use crate::forecast::{blend_hours, hours_to_completion, hours_to_target, score_confidence, ConfidenceInputs};
use crate::math::{LeastSquaresSolver, LevenbergMarquardt};

/// Minimum SG drop from first to last reading before fitting is attempted.
pub const MIN_PROGRESS_DROP: f64 = 0.005;
/// Absorbs representation error in `first − last` (e.g. `1.050 − 1.045`).
const DROP_EPSILON: f64 = 1e-12;

/// Output of fitting + selection.
#[derive(Debug, Clone, PartialEq)]
pub struct FitReport {
    /// The record handed to callers.
    pub result: FitResult,
    /// The chosen fit, if any model succeeded.
    pub best: Option<ModelFit>,
    /// Every successful fit, in attempt order.
    pub fits: Vec<ModelFit>,
    /// Models that failed and why.
    pub skipped: Vec<(ModelKind, FailureReason)>,
}

/// Build the default solver for a config.
pub fn solver_for(config: &PredictorConfig) -> LevenbergMarquardt {
    LevenbergMarquardt {
        max_iterations: config.max_iterations,
        ftol: config.tolerance,
        xtol: config.tolerance,
        gtol: config.tolerance,
    }
}

/// Fit and select using the default Levenberg–Marquardt solver.
pub fn fit_and_select(
    config: &PredictorConfig,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
    spec: ModelSpec,
) -> FitReport {
    let solver = solver_for(config);
    fit_and_select_with(&solver, config, times, sgs, expected_fg, spec)
}

/// Fit and select with an explicit solver.
pub fn fit_and_select_with(
    solver: &dyn LeastSquaresSolver,
    config: &PredictorConfig,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
    spec: ModelSpec,
) -> FitReport {
    if let Err(reason) = check_inputs(config, times, sgs, expected_fg) {
        debug!(%reason, n = times.len(), "fit preconditions not met");
        return failed_report(&reason, Vec::new(), times, sgs, expected_fg);
    }

    let fg_lower = fg_lower_bound(expected_fg);
    let kinds = spec.kinds();

    let outcomes: Vec<(ModelKind, Result<ModelFit, FailureReason>)> = kinds
        .par_iter()
        .map(|&kind| (kind, fit_model(kind, times, sgs, fg_lower, solver)))
        .collect();

    let mut fits = Vec::new();
    let mut skipped = Vec::new();
    for (kind, outcome) in outcomes {
        match outcome {
            Ok(fit) => fits.push(fit),
            Err(reason) => {
                debug!(model = kind.name(), %reason, "model fit rejected");
                skipped.push((kind, reason));
            }
        }
    }

    // Strictly greater keeps the earlier kind on ties (exponential first).
    let mut best: Option<&ModelFit> = None;
    for fit in &fits {
        if best.is_none_or(|b| fit.r_squared > b.r_squared) {
            best = Some(fit);
        }
    }

    let Some(best) = best.cloned() else {
        // All attempts failed: report the first kind's failure so `auto`
        // fails with the same shape as a plain exponential fit.
        let reason = skipped
            .first()
            .map(|(_, r)| r.clone())
            .unwrap_or_else(|| FailureReason::FitFailed("no model attempted".to_string()));
        return failed_report(&reason, skipped, times, sgs, expected_fg);
    };

    debug!(
        model = best.model.name(),
        r_squared = best.r_squared,
        candidates = fits.len(),
        "selected model"
    );

    let result = build_result(&best, times, sgs, expected_fg, config);
    FitReport {
        result,
        best: Some(best),
        fits,
        skipped,
    }
}

fn check_inputs(
    config: &PredictorConfig,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
) -> Result<(), FailureReason> {
    if times.len() != sgs.len() {
        return Err(FailureReason::InvalidInput(format!(
            "times has {} values but sgs has {}",
            times.len(),
            sgs.len()
        )));
    }
    if times.len() < config.min_readings.max(1) {
        return Err(FailureReason::InsufficientData);
    }
    if times.iter().chain(sgs.iter()).any(|v| !v.is_finite()) {
        return Err(FailureReason::InvalidInput("non-finite reading".to_string()));
    }
    if expected_fg.is_some_and(|fg| !fg.is_finite()) {
        return Err(FailureReason::InvalidInput("non-finite expected FG".to_string()));
    }
    let drop = sgs[0] - sgs[sgs.len() - 1];
    if drop < MIN_PROGRESS_DROP - DROP_EPSILON {
        return Err(FailureReason::InsufficientProgress);
    }
    Ok(())
}

fn build_result(
    fit: &ModelFit,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
    config: &PredictorConfig,
) -> FitResult {
    let current_hours = times[times.len() - 1];
    let current_sg = sgs[sgs.len() - 1];

    let curve_hours = hours_to_completion(
        fit.model,
        &fit.params,
        current_hours,
        current_sg,
        config.completion_threshold,
    );
    let linear_hours = hours_to_target(times, sgs, expected_fg.unwrap_or(fit.fg()));
    let confidence = score_confidence(&ConfidenceInputs {
        r_squared: fit.r_squared,
        predicted_og: fit.og(),
        predicted_fg: fit.fg(),
        target_fg: expected_fg,
        current_sg,
    });

    FitResult {
        fitted: true,
        model_type: Some(fit.model),
        predicted_og: Some(fit.og()),
        predicted_fg: Some(fit.fg()),
        decay_rate: Some(fit.rate()),
        r_squared: Some(fit.r_squared),
        hours_to_completion: Some(curve_hours),
        hours_to_target_linear: linear_hours,
        blended_hours_to_completion: blend_hours(Some(curve_hours), linear_hours, confidence),
        confidence: Some(confidence),
        reason: None,
    }
}

/// A failed report, still carrying the straight-line ETA when a recipe FG
/// gives it something to aim at.
fn failed_report(
    reason: &FailureReason,
    skipped: Vec<(ModelKind, FailureReason)>,
    times: &[f64],
    sgs: &[f64],
    expected_fg: Option<f64>,
) -> FitReport {
    let mut result = FitResult::failed(reason);

    let usable = !matches!(reason, FailureReason::InvalidInput(_))
        && times.len() == sgs.len()
        && times.len() >= 2;
    if usable {
        if let Some(target) = expected_fg {
            let linear = hours_to_target(times, sgs, target);
            result.hours_to_target_linear = linear;
            result.blended_hours_to_completion = blend_hours(None, linear, 0.0);
        }
    }

    FitReport {
        result,
        best: None,
        fits: Vec::new(),
        skipped,
    }
}
