//! Synthetic gravity readings from a known kinetic curve.
//!
//! Readings are drawn from one of the fermentation models plus Gaussian
//! hydrometer noise, with a fixed seed so a run is reproducible.

use std::io::Write;

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::domain::{DatasetStats, ModelKind, Reading};
use crate::error::AppError;
use crate::models::evaluate;

/// Gravity readings are reported to 4 decimals, like a digital hydrometer.
const SG_DECIMALS: i32 = 4;

/// Parameters for a synthetic fermentation.
#[derive(Debug, Clone)]
pub struct SimulationConfig {
    pub model: ModelKind,
    pub og: f64,
    pub fg: f64,
    /// `k` (1/h) for exponential and logistic, `mu` (SG/h) for Gompertz.
    pub rate: f64,
    /// Gompertz lag or logistic midpoint (hours). Defaults per model when `None`.
    pub shape: Option<f64>,
    pub every_hours: f64,
    pub count: usize,
    /// Standard deviation of the additive SG noise.
    pub noise: f64,
    pub seed: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            model: ModelKind::Exponential,
            og: 1.055,
            fg: 1.012,
            rate: 0.03,
            shape: None,
            every_hours: 4.0,
            count: 30,
            noise: 0.0005,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SampleData {
    pub readings: Vec<Reading>,
    /// Noise-free model value at each reading.
    pub truth: Vec<f64>,
    pub params: Vec<f64>,
    pub stats: DatasetStats,
}

pub fn generate_readings(config: &SimulationConfig) -> Result<SampleData, AppError> {
    if config.count == 0 {
        return Err(AppError::input("Reading count must be > 0."));
    }
    if !(config.every_hours.is_finite() && config.every_hours > 0.0) {
        return Err(AppError::input("Reading interval must be a positive number of hours."));
    }
    if !(config.og.is_finite() && config.fg.is_finite() && config.og > config.fg) {
        return Err(AppError::input("OG must be greater than FG."));
    }
    if !(config.rate.is_finite() && config.rate > 0.0) {
        return Err(AppError::input("Rate must be > 0."));
    }
    if !(config.noise.is_finite() && config.noise >= 0.0) {
        return Err(AppError::input("Noise must be >= 0."));
    }

    let params = model_params(config)?;
    let mut rng = StdRng::seed_from_u64(config.seed);
    let normal = Normal::new(0.0, config.noise)
        .map_err(|e| AppError::numeric(format!("Noise distribution error: {e}")))?;

    let mut readings = Vec::with_capacity(config.count);
    let mut truth = Vec::with_capacity(config.count);
    for i in 0..config.count {
        let hours = i as f64 * config.every_hours;
        let sg_true = evaluate(config.model, hours, &params);
        let sg = round_sg(sg_true + normal.sample(&mut rng));
        truth.push(sg_true);
        readings.push(Reading { hours, sg });
    }

    let stats = DatasetStats::from_readings(&readings)
        .ok_or_else(|| AppError::numeric("Failed to compute sample stats."))?;

    Ok(SampleData { readings, truth, params, stats })
}

/// Write readings as an `hours,sg` CSV that `ferment fit --csv` reads back.
pub fn write_sample_csv<W: Write>(out: W, readings: &[Reading]) -> Result<(), AppError> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(["hours", "sg"])
        .map_err(|e| AppError::input(format!("Failed to write sample CSV header: {e}")))?;
    for r in readings {
        writer
            .write_record([format!("{:.2}", r.hours), format!("{:.4}", r.sg)])
            .map_err(|e| AppError::input(format!("Failed to write sample CSV row: {e}")))?;
    }
    writer
        .flush()
        .map_err(|e| AppError::input(format!("Failed to flush sample CSV: {e}")))
}

fn model_params(config: &SimulationConfig) -> Result<Vec<f64>, AppError> {
    let span = config.every_hours * config.count as f64;
    let mut params = vec![config.og, config.fg, config.rate];
    match config.model {
        ModelKind::Exponential => {}
        ModelKind::Gompertz => params.push(config.shape.unwrap_or(12.0)),
        ModelKind::Logistic => params.push(config.shape.unwrap_or(span / 3.0)),
    }
    if params.iter().any(|p| !p.is_finite()) || params.get(3).is_some_and(|s| *s < 0.0) {
        return Err(AppError::input("Shape parameter must be a non-negative number of hours."));
    }
    Ok(params)
}

fn round_sg(sg: f64) -> f64 {
    let scale = 10f64.powi(SG_DECIMALS);
    (sg * scale).round() / scale
}
