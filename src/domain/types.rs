//! Shared domain types.
//!
//! These types are kept small and serializable so they can be:
//!
//! - produced by the fitting core as plain values
//! - exported to JSON/CSV
//! - reloaded later for `predict` or plotting

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Which kinetic model(s) to fit.
///
/// `Auto` fits all three and keeps the highest R².
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelSpec {
    #[default]
    Auto,
    Exponential,
    Gompertz,
    Logistic,
}

impl ModelSpec {
    /// Parse a model name case-insensitively.
    ///
    /// Unknown names fall back to `Exponential` rather than failing.
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "auto" => ModelSpec::Auto,
            "exponential" => ModelSpec::Exponential,
            "gompertz" => ModelSpec::Gompertz,
            "logistic" => ModelSpec::Logistic,
            other => {
                warn!(model = other, "unrecognized model name, using exponential");
                ModelSpec::Exponential
            }
        }
    }

    /// Concrete model kinds to attempt, in tie-break order.
    pub fn kinds(self) -> Vec<ModelKind> {
        match self {
            ModelSpec::Auto => ModelKind::ALL.to_vec(),
            ModelSpec::Exponential => vec![ModelKind::Exponential],
            ModelSpec::Gompertz => vec![ModelKind::Gompertz],
            ModelSpec::Logistic => vec![ModelKind::Logistic],
        }
    }
}

/// Concrete fitted model kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    Exponential,
    Gompertz,
    Logistic,
}

impl ModelKind {
    pub const ALL: [ModelKind; 3] = [ModelKind::Exponential, ModelKind::Gompertz, ModelKind::Logistic];

    /// Lowercase identifier (matches the serialized form).
    pub fn name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "exponential",
            ModelKind::Gompertz => "gompertz",
            ModelKind::Logistic => "logistic",
        }
    }

    /// Human-readable label for terminal output.
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Exponential => "Exponential decay",
            ModelKind::Gompertz => "Gompertz",
            ModelKind::Logistic => "Logistic",
        }
    }

    /// Parameter vector length: `[OG, FG, rate]` or `[OG, FG, rate, shape]`.
    pub fn param_count(self) -> usize {
        match self {
            ModelKind::Exponential => 3,
            ModelKind::Gompertz | ModelKind::Logistic => 4,
        }
    }

    /// Name of the fourth (shape) parameter, if the model has one.
    pub fn shape_name(self) -> Option<&'static str> {
        match self {
            ModelKind::Exponential => None,
            ModelKind::Gompertz => Some("lag"),
            ModelKind::Logistic => Some("t_half"),
        }
    }
}

/// One specific-gravity reading, timed in hours since fermentation start.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub hours: f64,
    pub sg: f64,
}

/// Why a fit produced no usable curve.
#[derive(Debug, Clone, PartialEq)]
pub enum FailureReason {
    /// Fewer readings than `min_readings`.
    InsufficientData,
    /// Gravity has not dropped far enough since the first reading.
    InsufficientProgress,
    /// The optimizer collapsed onto the FG floor with a poor fit.
    InsufficientCurveData,
    /// The solver raised a numeric error.
    FitFailed(String),
    /// Inputs were malformed (length mismatch, non-finite values).
    InvalidInput(String),
}

impl std::fmt::Display for FailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FailureReason::InsufficientData => write!(f, "insufficient_data"),
            FailureReason::InsufficientProgress => write!(f, "insufficient_fermentation_progress"),
            FailureReason::InsufficientCurveData => write!(f, "insufficient_curve_data"),
            FailureReason::FitFailed(msg) => write!(f, "fit_failed: {msg}"),
            FailureReason::InvalidInput(msg) => write!(f, "invalid_input: {msg}"),
        }
    }
}

/// Prediction output for one batch.
///
/// Every field is always serialized; absent values become `null`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    pub fitted: bool,
    pub model_type: Option<ModelKind>,
    pub predicted_og: Option<f64>,
    pub predicted_fg: Option<f64>,
    /// `k` for exponential/logistic, `μ` for Gompertz.
    pub decay_rate: Option<f64>,
    pub r_squared: Option<f64>,
    pub hours_to_completion: Option<f64>,
    pub hours_to_target_linear: Option<f64>,
    pub blended_hours_to_completion: Option<f64>,
    pub confidence: Option<f64>,
    pub reason: Option<String>,
}

impl FitResult {
    /// A failed result carrying only the reason.
    pub fn failed(reason: &FailureReason) -> Self {
        Self {
            fitted: false,
            model_type: None,
            predicted_og: None,
            predicted_fg: None,
            decay_rate: None,
            r_squared: None,
            hours_to_completion: None,
            hours_to_target_linear: None,
            blended_hours_to_completion: None,
            confidence: None,
            reason: Some(reason.to_string()),
        }
    }
}

/// Tunables for a prediction run.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictorConfig {
    /// Minimum number of readings before a fit is attempted.
    pub min_readings: usize,
    /// Rate (SG/day) below which fermentation counts as done.
    pub completion_threshold: f64,
    /// Iteration budget for the least-squares solver.
    pub max_iterations: usize,
    /// Solver convergence tolerance (cost reduction, step size, projected gradient).
    pub tolerance: f64,
}

impl Default for PredictorConfig {
    fn default() -> Self {
        Self {
            min_readings: 10,
            completion_threshold: 0.002,
            max_iterations: 400,
            tolerance: 1e-8,
        }
    }
}

/// Summary stats about the readings used for fitting.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetStats {
    pub n_readings: usize,
    pub hours_min: f64,
    pub hours_max: f64,
    pub sg_min: f64,
    pub sg_max: f64,
}

impl DatasetStats {
    pub fn from_readings(readings: &[Reading]) -> Option<Self> {
        let first = readings.first()?;
        let mut stats = Self {
            n_readings: readings.len(),
            hours_min: first.hours,
            hours_max: first.hours,
            sg_min: first.sg,
            sg_max: first.sg,
        };
        for r in &readings[1..] {
            stats.hours_min = stats.hours_min.min(r.hours);
            stats.hours_max = stats.hours_max.max(r.hours);
            stats.sg_min = stats.sg_min.min(r.sg);
            stats.sg_max = stats.sg_max.max(r.sg);
        }
        Some(stats)
    }
}

/// A per-reading fitted value (used for exports and plots).
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingResidual {
    pub reading: Reading,
    pub sg_fit: f64,
    pub residual: f64,
}

/// A saved curve file (JSON).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveFile {
    pub tool: String,
    pub model: ModelKind,
    pub parameters: Vec<f64>,
    pub result: FitResult,
    pub grid: CurveGrid,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurveGrid {
    pub hours: Vec<f64>,
    pub sg: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_names_parse_case_insensitively() {
        assert_eq!(ModelSpec::from_name("EXPONENTIAL"), ModelSpec::Exponential);
        assert_eq!(ModelSpec::from_name("Gompertz"), ModelSpec::Gompertz);
        assert_eq!(ModelSpec::from_name(" logistic "), ModelSpec::Logistic);
        assert_eq!(ModelSpec::from_name("AUTO"), ModelSpec::Auto);
    }

    #[test]
    fn unknown_model_name_falls_back_to_exponential() {
        assert_eq!(ModelSpec::from_name("weibull"), ModelSpec::Exponential);
        assert_eq!(ModelSpec::from_name(""), ModelSpec::Exponential);
    }

    #[test]
    fn failure_reason_codes() {
        assert_eq!(FailureReason::InsufficientData.to_string(), "insufficient_data");
        assert_eq!(
            FailureReason::InsufficientProgress.to_string(),
            "insufficient_fermentation_progress"
        );
        assert_eq!(
            FailureReason::FitFailed("diverged".into()).to_string(),
            "fit_failed: diverged"
        );
    }

    #[test]
    fn failed_result_serializes_every_key() {
        let result = FitResult::failed(&FailureReason::InsufficientData);
        let json = serde_json::to_value(&result).unwrap();
        let obj = json.as_object().unwrap();
        for key in [
            "fitted",
            "model_type",
            "predicted_og",
            "predicted_fg",
            "decay_rate",
            "r_squared",
            "hours_to_completion",
            "hours_to_target_linear",
            "blended_hours_to_completion",
            "confidence",
            "reason",
        ] {
            assert!(obj.contains_key(key), "missing key {key}");
        }
        assert!(obj["model_type"].is_null());
        assert_eq!(obj["reason"], "insufficient_data");
    }
}
