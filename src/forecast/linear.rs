//! Model-free ETA: straight-line OLS through all readings, projected to a target FG.

use crate::math::fit_line;

/// ETA ceiling (60 days).
pub const LINEAR_CAP_HOURS: f64 = 1440.0;

/// Hours from the last reading until the regression line reaches `target_fg`.
///
/// `None` when the line is not declining or the regression is degenerate.
pub fn hours_to_target(times: &[f64], sgs: &[f64], target_fg: f64) -> Option<f64> {
    let line = fit_line(times, sgs)?;
    if line.slope >= 0.0 {
        return None;
    }
    let current_hours = *times.last()?;
    let t_target = line.x_at(target_fg)?;
    let remaining = t_target - current_hours;
    if !remaining.is_finite() {
        return None;
    }
    Some(remaining.clamp(0.0, LINEAR_CAP_HOURS))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn projects_declining_line_to_target() {
        let times: Vec<f64> = (0..10).map(|i| i as f64 * 10.0).collect();
        let sgs: Vec<f64> = times.iter().map(|&t| 1.060 - 0.0005 * t).collect();
        // Line hits 1.010 at t=100; last reading at t=90.
        let hours = hours_to_target(&times, &sgs, 1.010).unwrap();
        assert_relative_eq!(hours, 10.0, epsilon = 1e-6);
    }

    #[test]
    fn past_target_is_zero() {
        let times = [0.0, 10.0, 20.0];
        let sgs = [1.020, 1.010, 1.000];
        assert_eq!(hours_to_target(&times, &sgs, 1.015), Some(0.0));
    }

    #[test]
    fn flat_or_rising_line_has_no_eta() {
        assert_eq!(hours_to_target(&[0.0, 1.0, 2.0], &[1.05, 1.05, 1.05], 1.01), None);
        assert_eq!(hours_to_target(&[0.0, 1.0, 2.0], &[1.04, 1.05, 1.06], 1.01), None);
    }

    #[test]
    fn degenerate_times_have_no_eta() {
        assert_eq!(hours_to_target(&[5.0, 5.0, 5.0], &[1.05, 1.04, 1.03], 1.01), None);
    }

    #[test]
    fn slow_decline_is_capped() {
        let times = [0.0, 100.0];
        let sgs = [1.050, 1.049];
        assert_eq!(hours_to_target(&times, &sgs, 1.010), Some(LINEAR_CAP_HOURS));
    }
}
