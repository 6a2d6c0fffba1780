//! Goodness-of-fit and straight-line regression helpers.

/// Below this the normal-equation denominator is treated as singular.
const DEGENERATE_DENOM: f64 = 1e-10;

/// Sum of squared residuals between observations and fitted values.
pub fn sse(observed: &[f64], fitted: &[f64]) -> f64 {
    observed
        .iter()
        .zip(fitted.iter())
        .map(|(o, f)| (o - f) * (o - f))
        .sum()
}

/// Coefficient of determination `1 − SS_res / SS_tot`.
///
/// With zero variance in the observations there is nothing to explain, so a
/// perfect match scores 1 and anything else scores 0.
pub fn r_squared(observed: &[f64], fitted: &[f64]) -> f64 {
    if observed.is_empty() {
        return 0.0;
    }
    let mean = observed.iter().sum::<f64>() / observed.len() as f64;
    let ss_tot: f64 = observed.iter().map(|o| (o - mean) * (o - mean)).sum();
    let ss_res = sse(observed, fitted);
    if ss_tot <= 0.0 {
        return if ss_res <= 0.0 { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}

/// `y = intercept + slope · x`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFit {
    pub slope: f64,
    pub intercept: f64,
}

impl LineFit {
    /// `x` at which the line reaches `y`, if the line is not flat.
    pub fn x_at(&self, y: f64) -> Option<f64> {
        if self.slope == 0.0 {
            return None;
        }
        Some((y - self.intercept) / self.slope)
    }
}

/// Ordinary least-squares line through `(x, y)` via the normal equations.
///
/// Returns `None` for mismatched/empty input or a degenerate denominator
/// (all `x` equal).
pub fn fit_line(x: &[f64], y: &[f64]) -> Option<LineFit> {
    if x.is_empty() || x.len() != y.len() {
        return None;
    }
    let n = x.len() as f64;
    let (mut sx, mut sy, mut sxx, mut sxy) = (0.0, 0.0, 0.0, 0.0);
    for (&xi, &yi) in x.iter().zip(y.iter()) {
        sx += xi;
        sy += yi;
        sxx += xi * xi;
        sxy += xi * yi;
    }
    let denom = n * sxx - sx * sx;
    if denom.abs() < DEGENERATE_DENOM {
        return None;
    }
    let slope = (n * sxy - sx * sy) / denom;
    let intercept = (sy - slope * sx) / n;
    Some(LineFit { slope, intercept })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn r_squared_perfect_and_mean_fits() {
        let obs = [1.0, 2.0, 3.0, 4.0];
        assert_relative_eq!(r_squared(&obs, &obs), 1.0);
        assert_relative_eq!(r_squared(&obs, &[2.5; 4]), 0.0);
    }

    #[test]
    fn r_squared_can_go_negative_for_bad_fits() {
        let obs = [1.0, 2.0, 3.0];
        assert!(r_squared(&obs, &[3.0, 2.0, 1.0]) < 0.0);
    }

    #[test]
    fn fit_line_recovers_slope_and_intercept() {
        let x = [0.0, 10.0, 20.0, 30.0];
        let y: Vec<f64> = x.iter().map(|&xi| 1.050 - 0.001 * xi).collect();
        let line = fit_line(&x, &y).unwrap();
        assert_relative_eq!(line.slope, -0.001, epsilon = 1e-12);
        assert_relative_eq!(line.intercept, 1.050, epsilon = 1e-12);
        assert_relative_eq!(line.x_at(1.020).unwrap(), 30.0, epsilon = 1e-9);
    }

    #[test]
    fn fit_line_degenerate_inputs() {
        assert!(fit_line(&[5.0, 5.0, 5.0], &[1.0, 2.0, 3.0]).is_none());
        assert!(fit_line(&[], &[]).is_none());
        assert!(fit_line(&[1.0, 2.0], &[1.0]).is_none());
    }
}
