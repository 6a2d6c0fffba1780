//! ASCII plotting for terminal output.
//!
//! Fixed-size character grid, deterministic output (golden-testable).
//!
//! Plot elements:
//! - observed readings: `o`
//! - fitted curve: `-` line
//! - predicted final gravity: `=` level

use crate::domain::{CurveFile, ReadingResidual};
use crate::fit::ModelFit;

/// Render a plot for an in-memory fit.
///
/// The time axis runs from the first reading to `hours_max` (callers usually
/// pass the last reading plus the ETA).
pub fn render_ascii_plot(
    residuals: &[ReadingResidual],
    fit: &ModelFit,
    hours_max: Option<f64>,
    width: usize,
    height: usize,
) -> String {
    let (t_min, t_max) = hours_range_from_residuals(residuals).unwrap_or((0.0, 24.0));
    let t_max = hours_max.filter(|h| h.is_finite() && *h > t_min).unwrap_or(t_max);
    let curve = sample_curve(fit, t_min, t_max, width.max(2));
    render_plot(residuals, Some(&curve), Some(fit.fg()), t_min, t_max, width, height)
}

/// Render a plot from a saved curve JSON file, optionally with overlay readings.
pub fn render_ascii_plot_from_curve_file(
    residuals: &[ReadingResidual],
    curve: &CurveFile,
    width: usize,
    height: usize,
) -> String {
    let (t_min, t_max) = curve_hours_range(curve).unwrap_or((0.0, 24.0));
    let curve_points: Vec<(f64, f64)> = curve
        .grid
        .hours
        .iter()
        .zip(curve.grid.sg.iter())
        .map(|(&t, &y)| (t, y))
        .collect();

    render_plot(
        residuals,
        Some(&curve_points),
        curve.result.predicted_fg,
        t_min,
        t_max,
        width,
        height,
    )
}

fn render_plot(
    residuals: &[ReadingResidual],
    curve_points: Option<&[(f64, f64)]>,
    fg_level: Option<f64>,
    t_min: f64,
    t_max: f64,
    width: usize,
    height: usize,
) -> String {
    let width = width.max(10);
    let height = height.max(5);

    let (y_min, y_max) = sg_range(residuals, curve_points, fg_level).unwrap_or((1.0, 1.1));
    let (y_min, y_max) = pad_range(y_min, y_max, 0.05);

    let mut grid = vec![vec![' '; width]; height];

    // FG level under the curve, readings on top.
    if let Some(fg) = fg_level.filter(|v| v.is_finite()) {
        let y = map_y(fg, y_min, y_max, height);
        for cell in grid[y].iter_mut() {
            *cell = '=';
        }
    }

    if let Some(curve) = curve_points {
        draw_curve(&mut grid, curve, t_min, t_max, y_min, y_max);
    }

    for r in residuals {
        let x = map_x(r.reading.hours, t_min, t_max, width);
        let y = map_y(r.reading.sg, y_min, y_max, height);
        grid[y][x] = 'o';
    }

    let mut out = String::new();
    out.push_str(&format!(
        "Plot: hours=[{t_min:.1}, {t_max:.1}] | sg=[{y_min:.4}, {y_max:.4}]\n"
    ));

    for row in grid {
        out.push_str(&row.into_iter().collect::<String>());
        out.push('\n');
    }

    out
}

fn hours_range_from_residuals(residuals: &[ReadingResidual]) -> Option<(f64, f64)> {
    span(residuals.iter().map(|r| r.reading.hours))
}

fn curve_hours_range(curve: &CurveFile) -> Option<(f64, f64)> {
    span(curve.grid.hours.iter().copied())
}

fn span(values: impl Iterator<Item = f64>) -> Option<(f64, f64)> {
    let mut min_v = f64::INFINITY;
    let mut max_v = f64::NEG_INFINITY;
    for v in values {
        min_v = min_v.min(v);
        max_v = max_v.max(v);
    }
    if min_v.is_finite() && max_v.is_finite() && max_v > min_v {
        Some((min_v, max_v))
    } else {
        None
    }
}

fn sample_curve(fit: &ModelFit, t_min: f64, t_max: f64, n: usize) -> Vec<(f64, f64)> {
    let n = n.max(2);
    (0..n)
        .map(|i| {
            let u = i as f64 / (n as f64 - 1.0);
            let t = t_min + u * (t_max - t_min);
            (t, fit.sg_at(t))
        })
        .collect()
}

fn sg_range(
    residuals: &[ReadingResidual],
    curve: Option<&[(f64, f64)]>,
    fg_level: Option<f64>,
) -> Option<(f64, f64)> {
    let observed = residuals.iter().map(|r| r.reading.sg);
    let fitted = curve.unwrap_or(&[]).iter().map(|&(_, y)| y);
    let level = fg_level.into_iter();
    span(observed.chain(fitted).chain(level).filter(|v| v.is_finite()))
}

fn pad_range(min: f64, max: f64, frac: f64) -> (f64, f64) {
    let span = (max - min).abs();
    let pad = (span * frac).max(1e-12);
    (min - pad, max + pad)
}

fn map_x(t: f64, t_min: f64, t_max: f64, width: usize) -> usize {
    let width = width.max(2);
    let u = ((t - t_min) / (t_max - t_min)).clamp(0.0, 1.0);
    (u * (width as f64 - 1.0)).round() as usize
}

fn map_y(y: f64, y_min: f64, y_max: f64, height: usize) -> usize {
    let height = height.max(2);
    let u = ((y - y_min) / (y_max - y_min)).clamp(0.0, 1.0);
    // highest gravity on row 0
    (height as f64 - 1.0 - (u * (height as f64 - 1.0))).round() as usize
}

fn draw_curve(grid: &mut [Vec<char>], curve: &[(f64, f64)], t_min: f64, t_max: f64, y_min: f64, y_max: f64) {
    if curve.len() < 2 {
        return;
    }
    let height = grid.len();
    let width = grid[0].len();

    let mut prev = None;
    for &(t, y) in curve {
        if !y.is_finite() {
            prev = None;
            continue;
        }
        let x = map_x(t, t_min, t_max, width);
        let yy = map_y(y, y_min, y_max, height);
        if let Some((x0, y0)) = prev {
            draw_line(grid, x0, y0, x, yy, '-');
        } else {
            grid[yy][x] = '-';
        }
        prev = Some((x, yy));
    }
}

/// Integer line drawing (Bresenham-ish). Overwrites blanks and the FG level.
fn draw_line(grid: &mut [Vec<char>], x0: usize, y0: usize, x1: usize, y1: usize, ch: char) {
    let mut x0 = x0 as isize;
    let mut y0 = y0 as isize;
    let x1 = x1 as isize;
    let y1 = y1 as isize;

    let dx = (x1 - x0).abs();
    let sx = if x0 < x1 { 1 } else { -1 };
    let dy = -(y1 - y0).abs();
    let sy = if y0 < y1 { 1 } else { -1 };
    let mut err = dx + dy;

    loop {
        if y0 >= 0 && (y0 as usize) < grid.len() && x0 >= 0 && (x0 as usize) < grid[0].len() {
            let cell = &mut grid[y0 as usize][x0 as usize];
            if *cell == ' ' || *cell == '=' {
                *cell = ch;
            }
        }

        if x0 == x1 && y0 == y1 {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x0 += sx;
        }
        if e2 <= dx {
            err += dx;
            y0 += sy;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{CurveGrid, FitResult, ModelKind, Reading};

    fn residual(hours: f64, sg: f64) -> ReadingResidual {
        ReadingResidual { reading: Reading { hours, sg }, sg_fit: sg, residual: 0.0 }
    }

    #[test]
    fn plot_golden_snapshot_from_curve_file() {
        let curve = CurveFile {
            tool: "ferment".to_string(),
            model: ModelKind::Exponential,
            parameters: vec![1.05, 1.01, 0.1],
            result: FitResult {
                predicted_fg: Some(1.01),
                ..FitResult::failed(&crate::domain::FailureReason::InsufficientData)
            },
            grid: CurveGrid { hours: vec![0.0, 9.0], sg: vec![1.05, 1.05] },
        };
        let points = vec![residual(0.0, 1.05), residual(9.0, 1.01)];

        let txt = render_ascii_plot_from_curve_file(&points, &curve, 10, 5);
        let expected = concat!(
            "Plot: hours=[0.0, 9.0] | sg=[1.0080, 1.0520]\n",
            "o---------\n",
            "          \n",
            "          \n",
            "          \n",
            "=========o\n",
        );
        assert_eq!(txt, expected);
    }

    #[test]
    fn fitted_plot_marks_every_reading() {
        let fit = ModelFit {
            model: ModelKind::Exponential,
            params: vec![1.050, 1.010, 0.05],
            r_squared: 1.0,
            sse: 0.0,
            rmse: 0.0,
            iterations: 1,
        };
        let points: Vec<_> = (0..5).map(|i| residual(i as f64 * 12.0, fit.sg_at(i as f64 * 12.0))).collect();
        let txt = render_ascii_plot(&points, &fit, Some(96.0), 40, 12);
        assert_eq!(txt.lines().count(), 13);
        let body: String = txt.lines().skip(1).collect();
        assert!(body.contains('='));
        assert_eq!(body.chars().filter(|&c| c == 'o').count(), 5);
    }
}
