//! `ferment-curves` library crate.
//!
//! Fits fermentation kinetics (exponential decay, Gompertz, logistic) to
//! specific-gravity readings and forecasts final gravity and time to completion.
//!
//! The binary (`ferment`) is a thin wrapper around this library so that:
//!
//! - core logic is testable without spawning processes
//! - the predictor can be embedded elsewhere (`predictor::fit` / `predictor::predict`)

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod forecast;
pub mod io;
pub mod math;
pub mod models;
pub mod plot;
pub mod predictor;
pub mod report;

pub use domain::{FailureReason, FitResult, ModelKind, ModelSpec, PredictorConfig, Reading};
pub use error::AppError;
pub use fit::FitReport;
pub use predictor::{fit, fit_report, fit_with, predict};
