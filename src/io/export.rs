//! Export per-reading fitted values to CSV.
//!
//! The export is meant to be easy to consume in spreadsheets or downstream scripts.

use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::domain::ReadingResidual;
use crate::error::AppError;

/// Write per-reading results to a CSV file.
pub fn write_readings_csv(path: &Path, residuals: &[ReadingResidual]) -> Result<(), AppError> {
    let file = File::create(path)
        .map_err(|e| AppError::input(format!("Failed to create export CSV '{}': {e}", path.display())))?;
    write_readings(file, residuals)
}

/// Write per-reading results to any writer.
pub fn write_readings<W: Write>(mut out: W, residuals: &[ReadingResidual]) -> Result<(), AppError> {
    writeln!(out, "hours,sg_obs,sg_fit,residual")
        .map_err(|e| AppError::input(format!("Failed to write export CSV header: {e}")))?;

    for r in residuals {
        writeln!(
            out,
            "{:.4},{:.5},{:.5},{:.6}",
            r.reading.hours, r.reading.sg, r.sg_fit, r.residual
        )
        .map_err(|e| AppError::input(format!("Failed to write export CSV row: {e}")))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Reading;

    #[test]
    fn writes_header_and_rows() {
        let rows = vec![ReadingResidual {
            reading: Reading { hours: 4.0, sg: 1.050 },
            sg_fit: 1.0495,
            residual: 0.0005,
        }];
        let mut buf = Vec::new();
        write_readings(&mut buf, &rows).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "hours,sg_obs,sg_fit,residual\n4.0000,1.05000,1.04950,0.000500\n");
    }
}
