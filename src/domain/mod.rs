//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - model selection enums (`ModelSpec`, `ModelKind`)
//! - input readings (`Reading`) and run tunables (`PredictorConfig`)
//! - fit outputs (`FitResult`, `FailureReason`, `CurveFile`)

pub mod types;

pub use types::*;
