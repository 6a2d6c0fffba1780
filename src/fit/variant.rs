//! Per-model bound boxes and initial guesses.
//!
//! The three fit paths differ only in these descriptors; everything else
//! (solver call, R², validation) lives in `fitter`.

use crate::domain::ModelKind;

pub const OG_MIN: f64 = 1.000;
pub const OG_MAX: f64 = 1.200;
/// Absolute floor for FG when no recipe target is known.
pub const FG_FLOOR: f64 = 1.000;
pub const FG_MAX: f64 = 1.100;
/// How far below the recipe FG the fit may place FG.
pub const FG_TARGET_SLACK: f64 = 0.003;

const EXP_K_RANGE: (f64, f64) = (0.001, 0.5);
const EXP_K_GUESS: f64 = 0.02;
/// Gompertz μ is a peak drop rate in SG/hour.
const GOMPERTZ_MU_RANGE: (f64, f64) = (1e-5, 0.05);
const LOGISTIC_K_RANGE: (f64, f64) = (0.001, 1.0);

/// Bound box and starting point for one model kind.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelVariant {
    pub kind: ModelKind,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
    pub initial: Vec<f64>,
}

/// Lower bound for the FG parameter.
///
/// With a recipe target the fit may only undershoot it by `FG_TARGET_SLACK`,
/// which keeps noisy early data from dragging FG unrealistically low.
pub fn fg_lower_bound(expected_fg: Option<f64>) -> f64 {
    match expected_fg {
        Some(fg) => (fg - FG_TARGET_SLACK).max(FG_FLOOR),
        None => FG_FLOOR,
    }
}

/// Build the descriptor for `kind` from the observed readings.
///
/// Callers guarantee `times`/`sgs` are non-empty and of equal length.
pub fn model_variant(kind: ModelKind, times: &[f64], sgs: &[f64], fg_lower: f64) -> ModelVariant {
    let t_first = times[0];
    let t_last = times[times.len() - 1];
    let span = (t_last - t_first).max(1.0);
    let sg_first = sgs[0];
    let sg_min = sgs.iter().copied().fold(f64::INFINITY, f64::min);
    let drop = (sg_first - sg_min).max(0.0);

    let og0 = sg_first;
    let fg0 = sg_min;

    let (lower, upper, initial) = match kind {
        ModelKind::Exponential => (
            vec![OG_MIN, fg_lower, EXP_K_RANGE.0],
            vec![OG_MAX, FG_MAX, EXP_K_RANGE.1],
            vec![og0, fg0, EXP_K_GUESS],
        ),
        ModelKind::Gompertz => {
            let lag_max = t_last.max(0.0);
            let mu0 = 2.0 * drop / span;
            let lag0 = first_time_below(times, sgs, sg_first - 0.1 * drop).unwrap_or(0.0);
            (
                vec![OG_MIN, fg_lower, GOMPERTZ_MU_RANGE.0, 0.0],
                vec![OG_MAX, FG_MAX, GOMPERTZ_MU_RANGE.1, lag_max],
                vec![og0, fg0, mu0, lag0],
            )
        }
        ModelKind::Logistic => {
            let t_half_max = 2.0 * t_last.max(0.0) + 1.0;
            let k0 = 4.0 / span;
            let midpoint = sg_first - 0.5 * drop;
            let t_half0 = first_time_below(times, sgs, midpoint).unwrap_or(t_first + 0.5 * span);
            (
                vec![OG_MIN, fg_lower, LOGISTIC_K_RANGE.0, 0.0],
                vec![OG_MAX, FG_MAX, LOGISTIC_K_RANGE.1, t_half_max],
                vec![og0, fg0, k0, t_half0],
            )
        }
    };

    // Guesses outside the box (or non-finite) are pulled back in; inverted
    // boxes are left for the solver to reject.
    let initial = initial
        .iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&v, (&lo, &hi))| {
            if !v.is_finite() {
                lo
            } else if lo <= hi {
                v.clamp(lo, hi)
            } else {
                v
            }
        })
        .collect();

    ModelVariant {
        kind,
        lower,
        upper,
        initial,
    }
}

fn first_time_below(times: &[f64], sgs: &[f64], level: f64) -> Option<f64> {
    times
        .iter()
        .zip(sgs.iter())
        .find(|&(_, &sg)| sg <= level)
        .map(|(&t, _)| t)
}
