//! Reporting utilities: per-reading residuals and formatted terminal output.

pub mod format;

pub use format::*;

use crate::domain::{Reading, ReadingResidual};
use crate::error::AppError;
use crate::fit::ModelFit;

/// Compute fitted values and residuals for each reading.
pub fn compute_residuals(readings: &[Reading], fit: &ModelFit) -> Result<Vec<ReadingResidual>, AppError> {
    let mut out = Vec::with_capacity(readings.len());
    for r in readings {
        let sg_fit = fit.sg_at(r.hours);
        if !sg_fit.is_finite() {
            return Err(AppError::numeric("Non-finite model prediction during residual computation."));
        }
        out.push(ReadingResidual {
            reading: *r,
            sg_fit,
            residual: r.sg - sg_fit,
        });
    }
    Ok(out)
}
