//! Model evaluation for the exponential / Gompertz / logistic gravity curves.
//!
//! Parameter vectors are laid out as:
//! - exponential: `[OG, FG, k]`
//! - Gompertz: `[OG, FG, μ, lag]`
//! - logistic: `[OG, FG, k, t_half]`
//!
//! Time is in hours since fermentation start.

use std::f64::consts::E;

use crate::domain::ModelKind;

/// `SG(t) = FG + (OG − FG)·e^(−k·t)`
pub fn exponential(t: f64, og: f64, fg: f64, k: f64) -> f64 {
    fg + (og - fg) * (-k * t).exp()
}

/// `SG(t) = OG − A·exp(−exp((μ·e/A)·(lag − t) + 1))` with `A = OG − FG`.
///
/// A non-positive amplitude has no drop to model, so the curve is flat at OG.
pub fn gompertz(t: f64, og: f64, fg: f64, mu: f64, lag: f64) -> f64 {
    let a = og - fg;
    if a <= 0.0 {
        return og;
    }
    let inner = (mu * E / a) * (lag - t) + 1.0;
    og - a * (-inner.exp()).exp()
}

/// `SG(t) = FG + (OG − FG) / (1 + e^(k·(t − t_half)))`
pub fn logistic(t: f64, og: f64, fg: f64, k: f64, t_half: f64) -> f64 {
    fg + (og - fg) / (1.0 + (k * (t - t_half)).exp())
}

/// Evaluate `SG(t)` for the given model kind.
///
/// # Panics
/// Panics if `params` is shorter than `model.param_count()`.
pub fn evaluate(model: ModelKind, t: f64, params: &[f64]) -> f64 {
    match model {
        ModelKind::Exponential => exponential(t, params[0], params[1], params[2]),
        ModelKind::Gompertz => gompertz(t, params[0], params[1], params[2], params[3]),
        ModelKind::Logistic => logistic(t, params[0], params[1], params[2], params[3]),
    }
}

/// Vectorized `evaluate` over a slice of times.
pub fn evaluate_many(model: ModelKind, times: &[f64], params: &[f64]) -> Vec<f64> {
    times.iter().map(|&t| evaluate(model, t, params)).collect()
}
