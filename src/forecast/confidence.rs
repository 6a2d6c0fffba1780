//! Confidence scoring and the curve/linear ETA blend.
//!
//! Confidence starts at the fit's R² and is scaled down by two brewing heuristics:
//!
//! 1. FG deviation: how far the fitted FG lands from the recipe target
//!    (a flat 0.7 when there is no target to check against).
//! 2. Progress: predictions made before 60% of the expected drop are damped
//!    linearly, since early plateaus are often false.

/// Scale applied when no recipe FG is known.
pub const NO_TARGET_FACTOR: f64 = 0.7;
/// FG deviation tolerated without penalty.
pub const FG_DEVIATION_FREE: f64 = 0.003;
/// Deviation span over which the penalty ramps to its floor.
pub const FG_DEVIATION_SPAN: f64 = 0.017;
/// Strongest FG-deviation penalty (80% reduction).
pub const FG_DEVIATION_FLOOR: f64 = 0.2;
/// Expected drops at or below this skip the progress penalty.
pub const MIN_EXPECTED_DROP: f64 = 0.005;
/// Progress fraction above which no damping applies.
pub const PROGRESS_FULL: f64 = 0.6;

/// Inputs to the confidence score.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConfidenceInputs {
    pub r_squared: f64,
    pub predicted_og: f64,
    pub predicted_fg: f64,
    /// Recipe FG, if supplied.
    pub target_fg: Option<f64>,
    pub current_sg: f64,
}

/// Confidence in `[0, 1]`.
///
/// The progress penalty measures against the recipe FG when given, otherwise
/// against the fitted FG.
pub fn score_confidence(inputs: &ConfidenceInputs) -> f64 {
    let mut confidence = inputs.r_squared;

    match inputs.target_fg {
        None => confidence *= NO_TARGET_FACTOR,
        Some(target) => {
            let deviation = (inputs.predicted_fg - target).abs();
            if deviation > FG_DEVIATION_FREE {
                let factor = 1.0 - (deviation - FG_DEVIATION_FREE) / FG_DEVIATION_SPAN;
                confidence *= factor.max(FG_DEVIATION_FLOOR);
            }
        }
    }

    let target = inputs.target_fg.unwrap_or(inputs.predicted_fg);
    let expected_drop = inputs.predicted_og - target;
    if expected_drop > MIN_EXPECTED_DROP {
        let progress = (inputs.predicted_og - inputs.current_sg) / expected_drop;
        if progress < PROGRESS_FULL {
            confidence *= progress.max(0.0) / PROGRESS_FULL;
        }
    }

    if confidence.is_finite() { confidence.clamp(0.0, 1.0) } else { 0.0 }
}

/// Confidence-weighted blend of the two ETAs.
///
/// With only one estimate available that estimate is returned unchanged.
pub fn blend_hours(curve_hours: Option<f64>, linear_hours: Option<f64>, confidence: f64) -> Option<f64> {
    match (curve_hours, linear_hours) {
        (Some(curve), Some(linear)) => Some(confidence * curve + (1.0 - confidence) * linear),
        (None, Some(linear)) => Some(linear),
        (Some(curve), None) => Some(curve),
        (None, None) => None,
    }
}
