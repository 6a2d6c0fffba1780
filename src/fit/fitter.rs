//! Fit a single model kind to a gravity series.
//!
//! Given:
//! - elapsed hours `t_i`
//! - observed gravities `sg_i`
//! - the FG floor
//!
//! we build the model's variant descriptor, run the bounded least-squares
//! solver on `SG_model(t_i) − sg_i`, and validate the result.

use tracing::debug;

use crate::domain::{FailureReason, ModelKind};
use crate::fit::variant::model_variant;
use crate::math::{r_squared, sse, BoundedProblem, LeastSquaresSolver};
use crate::models::{evaluate, evaluate_many};

/// A fit whose FG sits this close to its floor counts as pinned.
const FG_PINNED_TOLERANCE: f64 = 0.001;
/// Pinned fits below this R² are rejected as boundary collapses.
const PINNED_MIN_R_SQUARED: f64 = 0.85;

/// Best fit for a single model kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelFit {
    pub model: ModelKind,
    /// `[OG, FG, rate]` or `[OG, FG, rate, shape]`.
    pub params: Vec<f64>,
    pub r_squared: f64,
    pub sse: f64,
    pub rmse: f64,
    pub iterations: usize,
}

impl ModelFit {
    pub fn og(&self) -> f64 {
        self.params[0]
    }

    pub fn fg(&self) -> f64 {
        self.params[1]
    }

    /// `k` for exponential/logistic, `μ` for Gompertz.
    pub fn rate(&self) -> f64 {
        self.params[2]
    }

    /// Predicted gravity at `t`.
    pub fn sg_at(&self, t: f64) -> f64 {
        evaluate(self.model, t, &self.params)
    }
}

/// Fit one model kind.
///
/// Callers have already checked length, reading count, and progress.
pub fn fit_model(
    model: ModelKind,
    times: &[f64],
    sgs: &[f64],
    fg_lower: f64,
    solver: &dyn LeastSquaresSolver,
) -> Result<ModelFit, FailureReason> {
    let variant = model_variant(model, times, sgs, fg_lower);

    let residuals = |params: &[f64]| -> Vec<f64> {
        times
            .iter()
            .zip(sgs.iter())
            .map(|(&t, &sg)| evaluate(model, t, params) - sg)
            .collect()
    };

    let problem = BoundedProblem {
        residuals: &residuals,
        initial: variant.initial,
        lower: variant.lower,
        upper: variant.upper,
    };

    let output = solver
        .solve(&problem)
        .map_err(|e| FailureReason::FitFailed(e.to_string()))?;

    if output.params.iter().any(|p| !p.is_finite()) {
        return Err(FailureReason::FitFailed("invalid parameters".to_string()));
    }

    let fitted = evaluate_many(model, times, &output.params);
    let r2 = r_squared(sgs, &fitted);
    let sse = sse(sgs, &fitted);
    if !(r2.is_finite() && sse.is_finite()) {
        return Err(FailureReason::FitFailed("non-finite fit statistics".to_string()));
    }

    let fg = output.params[1];
    if (fg - fg_lower).abs() <= FG_PINNED_TOLERANCE && r2 < PINNED_MIN_R_SQUARED {
        debug!(
            model = model.name(),
            fg,
            fg_lower,
            r_squared = r2,
            "FG pinned at lower bound with poor fit"
        );
        return Err(FailureReason::InsufficientCurveData);
    }

    debug!(
        model = model.name(),
        og = output.params[0],
        fg,
        rate = output.params[2],
        r_squared = r2,
        iterations = output.iterations,
        "model fit converged"
    );

    Ok(ModelFit {
        model,
        rmse: (sse / times.len() as f64).sqrt(),
        params: output.params,
        r_squared: r2,
        sse,
        iterations: output.iterations,
    })
}
