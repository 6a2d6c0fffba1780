//! Hours remaining until a fitted curve counts as finished.
//!
//! - exponential: closed form on the instantaneous rate `(OG−FG)·k·e^(−k·t)`
//! - Gompertz / logistic: forward search one hour at a time until the curve
//!   comes within `SEARCH_TARGET_MARGIN` of FG, capped at `SEARCH_HORIZON_HOURS`

use crate::domain::ModelKind;
use crate::models::evaluate;

/// Current gravity within this of FG means done.
pub const DONE_MARGIN: f64 = 0.001;
/// Forward search stops once the curve is within this of FG.
pub const SEARCH_TARGET_MARGIN: f64 = 0.002;
/// 30 days.
pub const SEARCH_HORIZON_HOURS: usize = 720;

/// Estimate hours from `current_hours` until fermentation is complete.
///
/// `params` is the fitted parameter vector for `model`; `threshold_per_day` is
/// the completion rate in SG/day. The result is always finite and `>= 0`.
pub fn hours_to_completion(
    model: ModelKind,
    params: &[f64],
    current_hours: f64,
    current_sg: f64,
    threshold_per_day: f64,
) -> f64 {
    let fg = params[1];
    if current_sg <= fg + DONE_MARGIN {
        return 0.0;
    }

    match model {
        ModelKind::Exponential => exponential_hours(params, current_hours, threshold_per_day / 24.0),
        ModelKind::Gompertz | ModelKind::Logistic => search_hours(model, params, current_hours),
    }
}

fn exponential_hours(params: &[f64], current_hours: f64, threshold_per_hour: f64) -> f64 {
    let (og, fg, k) = (params[0], params[1], params[2]);
    let amplitude = og - fg;
    if !(k > 0.0 && amplitude > 0.0 && threshold_per_hour > 0.0) {
        return 0.0;
    }

    let current_rate = (amplitude * k * (-k * current_hours).exp()).abs();
    if current_rate <= threshold_per_hour {
        return 0.0;
    }

    // A·k·e^(−k·t) = threshold  ⇒  t = ln(A·k / threshold) / k
    let t_done = (amplitude * k / threshold_per_hour).ln() / k;
    let remaining = t_done - current_hours;
    if remaining.is_finite() { remaining.max(0.0) } else { 0.0 }
}

fn search_hours(model: ModelKind, params: &[f64], current_hours: f64) -> f64 {
    let target = params[1] + SEARCH_TARGET_MARGIN;
    (0..=SEARCH_HORIZON_HOURS)
        .find(|&h| evaluate(model, current_hours + h as f64, params) <= target)
        .unwrap_or(SEARCH_HORIZON_HOURS) as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::exponential;
    use approx::assert_relative_eq;

    #[test]
    fn done_when_current_gravity_near_fg() {
        let params = [1.050, 1.010, 0.02];
        assert_eq!(hours_to_completion(ModelKind::Exponential, &params, 50.0, 1.0105, 0.002), 0.0);
        let params = [1.05, 1.01, 0.05, 40.0];
        assert_eq!(hours_to_completion(ModelKind::Logistic, &params, 50.0, 1.005, 0.002), 0.0);
    }

    #[test]
    fn exponential_closed_form_matches_rate_threshold() {
        let params = [1.055, 1.012, 0.02];
        let now = 24.0;
        let sg_now = exponential(now, 1.055, 1.012, 0.02);
        let hours = hours_to_completion(ModelKind::Exponential, &params, now, sg_now, 0.002);

        // At the returned time the hourly rate equals 0.002/24.
        let t = now + hours;
        let rate = 0.043 * 0.02 * (-0.02 * t).exp();
        assert_relative_eq!(rate, 0.002 / 24.0, epsilon = 1e-12);
        assert!(hours > 0.0 && hours.is_finite());
    }

    #[test]
    fn exponential_already_slow_returns_zero() {
        let params = [1.055, 1.012, 0.02];
        // Rate at t=300 is far below threshold even though SG is above FG + margin
        // by construction of the inputs.
        assert_eq!(hours_to_completion(ModelKind::Exponential, &params, 300.0, 1.020, 0.002), 0.0);
    }

    #[test]
    fn zero_rate_exponential_returns_zero() {
        assert_eq!(hours_to_completion(ModelKind::Exponential, &[1.05, 1.01, 0.0], 10.0, 1.04, 0.002), 0.0);
    }

    #[test]
    fn logistic_search_finds_first_hour_near_fg() {
        let params = [1.060, 1.010, 0.05, 40.0];
        let now = 20.0;
        let sg_now = evaluate(ModelKind::Logistic, now, &params);
        let hours = hours_to_completion(ModelKind::Logistic, &params, now, sg_now, 0.002);

        assert!(hours > 0.0);
        assert!(evaluate(ModelKind::Logistic, now + hours, &params) <= 1.012);
        assert!(evaluate(ModelKind::Logistic, now + hours - 1.0, &params) > 1.012);
    }

    #[test]
    fn search_is_capped_at_horizon() {
        // Glacially slow logistic: never gets near FG within 30 days.
        let params = [1.060, 1.010, 0.001, 5000.0];
        let hours = hours_to_completion(ModelKind::Logistic, &params, 0.0, 1.059, 0.002);
        assert_eq!(hours, SEARCH_HORIZON_HOURS as f64);
    }
}
