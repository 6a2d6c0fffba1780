//! Bounded non-linear least squares.
//!
//! The fit policy only needs "minimize ½‖r(x)‖² subject to `lower ≤ x ≤ upper`",
//! so the solver sits behind the small [`LeastSquaresSolver`] trait and can be
//! swapped without touching the orchestrator.
//!
//! [`LevenbergMarquardt`] is a projected Levenberg–Marquardt:
//! - forward-difference Jacobian (stepping inward when a parameter sits on its
//!   upper bound)
//! - Marquardt diagonal scaling, so OG (~1.05) and a Gompertz μ (~1e-3) are
//!   damped comparably
//! - parameters resting on a bound with the gradient pushing outward are held
//!   fixed for the step (their Jacobian columns are dropped)
//! - each trial step is clamped back into the box before evaluation
//! - damping follows the gain ratio (actual vs. predicted cost reduction)
//! - the damped system is solved as a stacked SVD least-squares problem
//!
//! Convergence uses the MINPACK-style `ftol` / `xtol` / `gtol` triple, with the
//! gradient test applied to the projected gradient only.

use nalgebra::{DMatrix, DVector};

use crate::math::solve_least_squares;

/// Residual function `x ↦ r(x)`.
pub type ResidualFn<'a> = dyn Fn(&[f64]) -> Vec<f64> + 'a;

/// A box-constrained least-squares problem.
pub struct BoundedProblem<'a> {
    pub residuals: &'a ResidualFn<'a>,
    pub initial: Vec<f64>,
    pub lower: Vec<f64>,
    pub upper: Vec<f64>,
}

/// Solver output.
#[derive(Debug, Clone, PartialEq)]
pub struct SolverOutput {
    pub params: Vec<f64>,
    /// `½‖r‖²` at `params`.
    pub cost: f64,
    pub iterations: usize,
}

/// Numeric failure inside the solver.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    InvalidBounds(String),
    NonFiniteResiduals,
    MaxIterations(usize),
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::InvalidBounds(msg) => write!(f, "invalid bounds: {msg}"),
            SolverError::NonFiniteResiduals => write!(f, "residuals are not finite"),
            SolverError::MaxIterations(n) => {
                write!(f, "Optimal parameters not found: iteration budget ({n}) exhausted")
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Box-constrained least-squares solver.
pub trait LeastSquaresSolver: Send + Sync {
    fn solve(&self, problem: &BoundedProblem<'_>) -> Result<SolverOutput, SolverError>;
}

/// Projected Levenberg–Marquardt.
#[derive(Debug, Clone, PartialEq)]
pub struct LevenbergMarquardt {
    /// Budget of accepted steps.
    pub max_iterations: usize,
    /// Relative cost-reduction tolerance.
    pub ftol: f64,
    /// Relative (scaled) step-size tolerance.
    pub xtol: f64,
    /// Largest cosine between the residual vector and a free Jacobian column.
    pub gtol: f64,
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self {
            max_iterations: 400,
            ftol: 1e-8,
            xtol: 1e-8,
            gtol: 1e-8,
        }
    }
}

const LAMBDA_INIT: f64 = 1e-3;
const LAMBDA_MIN: f64 = 1e-15;
const LAMBDA_MAX: f64 = 1e16;
/// Above this the step is mostly damping, so a small step says nothing about convergence.
const TRUSTED_LAMBDA: f64 = 1.0;
const DIAG_FLOOR: f64 = 1e-24;
/// Fraction of the box width within which a parameter counts as on its bound.
const BOUND_EPS: f64 = 1e-12;

impl LeastSquaresSolver for LevenbergMarquardt {
    fn solve(&self, problem: &BoundedProblem<'_>) -> Result<SolverOutput, SolverError> {
        validate_bounds(problem)?;
        let p = problem.initial.len();

        let mut x = clamp_into(&problem.initial, &problem.lower, &problem.upper);
        let mut r = eval_residuals(problem, &x)?;
        let mut cost = half_sse(&r);
        let mut lambda = LAMBDA_INIT;
        let mut nu = 2.0_f64;
        // Moré's running max of column norms keeps the scaling from collapsing.
        let mut diag = vec![0.0_f64; p];

        for iter in 0..self.max_iterations {
            if cost == 0.0 {
                return Ok(SolverOutput { params: x, cost, iterations: iter });
            }

            let jac = jacobian(problem, &x, &r)?;
            let r_vec = DVector::from_column_slice(&r);
            let grad = jac.transpose() * &r_vec;
            for (j, d) in diag.iter_mut().enumerate() {
                *d = d.max(jac.column(j).norm_squared()).max(DIAG_FLOOR);
            }

            let free: Vec<usize> = (0..p)
                .filter(|&j| !held_at_bound(problem, &x, grad[j], j))
                .collect();
            if gradient_converged(&jac, &grad, r_vec.norm(), &free, self.gtol) {
                return Ok(SolverOutput { params: x, cost, iterations: iter });
            }

            // Inner loop: raise damping until a step lowers the cost.
            loop {
                let trial = damped_step(&jac, &r_vec, &diag, &free, lambda).map(|delta| {
                    let moved: Vec<f64> =
                        x.iter().zip(delta.iter()).map(|(xi, di)| xi + di).collect();
                    clamp_into(&moved, &problem.lower, &problem.upper)
                });

                if let Some(trial) = trial.filter(|t| t != &x) {
                    let step: Vec<f64> = trial.iter().zip(x.iter()).map(|(a, b)| a - b).collect();
                    let r_trial = (problem.residuals)(&trial);
                    let cost_trial =
                        if r_trial.len() == r.len() { half_sse(&r_trial) } else { f64::NAN };
                    let actual = cost - cost_trial;

                    if cost_trial.is_finite() && actual > 0.0 {
                        let predicted = predicted_reduction(&jac, &r_vec, &step);
                        let rho = if predicted > 0.0 { actual / predicted } else { 1.0 };
                        let trusted = lambda <= TRUSTED_LAMBDA;
                        let x_scale = scaled_norm(&x, &diag);
                        let small_step =
                            scaled_norm(&step, &diag) <= self.xtol * (x_scale + self.xtol);
                        let flat = actual <= self.ftol * cost && predicted <= self.ftol * cost;

                        let shrink = (1.0 / 3.0_f64).max(1.0 - (2.0 * rho - 1.0).powi(3));
                        lambda = (lambda * shrink).max(LAMBDA_MIN);
                        nu = 2.0;
                        x = trial;
                        r = r_trial;
                        cost = cost_trial;

                        if trusted && (small_step || flat) {
                            return Ok(SolverOutput { params: x, cost, iterations: iter + 1 });
                        }
                        break;
                    }
                }

                lambda *= nu;
                nu *= 2.0;
                if lambda > LAMBDA_MAX {
                    // No descent step left inside the box: stationary point.
                    return Ok(SolverOutput { params: x, cost, iterations: iter + 1 });
                }
            }
        }

        Err(SolverError::MaxIterations(self.max_iterations))
    }
}

/// On a bound with the descent direction (`−grad`) pointing out of the box.
fn held_at_bound(problem: &BoundedProblem<'_>, x: &[f64], grad_j: f64, j: usize) -> bool {
    let (lo, hi) = (problem.lower[j], problem.upper[j]);
    let eps = BOUND_EPS * (hi - lo).max(1.0);
    (x[j] <= lo + eps && grad_j > 0.0) || (x[j] >= hi - eps && grad_j < 0.0)
}

/// `max_j |J_jᵀ r| / (‖J_j‖·‖r‖) ≤ gtol` over the free columns.
fn gradient_converged(
    jac: &DMatrix<f64>,
    grad: &DVector<f64>,
    r_norm: f64,
    free: &[usize],
    gtol: f64,
) -> bool {
    if r_norm == 0.0 {
        return true;
    }
    free.iter().all(|&j| {
        let col_norm = jac.column(j).norm();
        col_norm == 0.0 || grad[j].abs() / (col_norm * r_norm) <= gtol
    })
}

/// Solve `[J_F; √λ D_F] δ_F = [−r; 0]` for the free parameters; held ones get 0.
fn damped_step(
    jac: &DMatrix<f64>,
    r: &DVector<f64>,
    diag: &[f64],
    free: &[usize],
    lambda: f64,
) -> Option<Vec<f64>> {
    let n = r.len();
    let f = free.len();
    let mut aug = DMatrix::<f64>::zeros(n + f, f);
    for (k, &j) in free.iter().enumerate() {
        for i in 0..n {
            aug[(i, k)] = jac[(i, j)];
        }
        aug[(n + k, k)] = (lambda * diag[j]).sqrt();
    }
    let mut rhs = DVector::<f64>::zeros(n + f);
    for i in 0..n {
        rhs[i] = -r[i];
    }

    let delta_free = solve_least_squares(&aug, &rhs)?;
    let mut delta = vec![0.0_f64; jac.ncols()];
    for (k, &j) in free.iter().enumerate() {
        delta[j] = delta_free[k];
    }
    Some(delta)
}

/// Cost reduction the linearised model expects from `step`.
fn predicted_reduction(jac: &DMatrix<f64>, r: &DVector<f64>, step: &[f64]) -> f64 {
    let linear = r + jac * DVector::from_column_slice(step);
    0.5 * (r.norm_squared() - linear.norm_squared())
}

fn scaled_norm(v: &[f64], diag: &[f64]) -> f64 {
    v.iter().zip(diag.iter()).map(|(vi, d)| d * vi * vi).sum::<f64>().sqrt()
}

fn validate_bounds(problem: &BoundedProblem<'_>) -> Result<(), SolverError> {
    let p = problem.initial.len();
    if p == 0 {
        return Err(SolverError::InvalidBounds("no parameters".to_string()));
    }
    if problem.lower.len() != p || problem.upper.len() != p {
        return Err(SolverError::InvalidBounds(format!(
            "expected {p} bounds, got lower={} upper={}",
            problem.lower.len(),
            problem.upper.len()
        )));
    }
    for (j, (&lo, &hi)) in problem.lower.iter().zip(problem.upper.iter()).enumerate() {
        if !(lo.is_finite() && hi.is_finite()) || lo > hi {
            return Err(SolverError::InvalidBounds(format!(
                "parameter {j}: lower={lo} upper={hi}"
            )));
        }
    }
    Ok(())
}

fn eval_residuals(problem: &BoundedProblem<'_>, x: &[f64]) -> Result<Vec<f64>, SolverError> {
    let r = (problem.residuals)(x);
    if r.is_empty() || r.iter().any(|v| !v.is_finite()) {
        return Err(SolverError::NonFiniteResiduals);
    }
    Ok(r)
}

fn jacobian(problem: &BoundedProblem<'_>, x: &[f64], r: &[f64]) -> Result<DMatrix<f64>, SolverError> {
    let n = r.len();
    let p = x.len();
    let mut jac = DMatrix::<f64>::zeros(n, p);
    let mut shifted = x.to_vec();

    for j in 0..p {
        let mut h = f64::EPSILON.sqrt() * x[j].abs().max(1.0);
        if x[j] + h > problem.upper[j] {
            h = -h;
        }
        shifted[j] = x[j] + h;
        let r_h = (problem.residuals)(&shifted);
        shifted[j] = x[j];

        if r_h.len() != n {
            return Err(SolverError::NonFiniteResiduals);
        }
        for i in 0..n {
            let d = (r_h[i] - r[i]) / h;
            if !d.is_finite() {
                return Err(SolverError::NonFiniteResiduals);
            }
            jac[(i, j)] = d;
        }
    }

    Ok(jac)
}

fn clamp_into(x: &[f64], lower: &[f64], upper: &[f64]) -> Vec<f64> {
    x.iter()
        .zip(lower.iter().zip(upper.iter()))
        .map(|(&v, (&lo, &hi))| if v.is_finite() { v.clamp(lo, hi) } else { lo })
        .collect()
}

fn half_sse(r: &[f64]) -> f64 {
    0.5 * r.iter().map(|v| v * v).sum::<f64>()
}
