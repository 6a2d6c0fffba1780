//! Curve fitting orchestration.
//!
//! Responsibilities:
//!
//! - build per-model bound boxes and initial guesses (`variant`)
//! - run the bounded least-squares fit for one model (`fitter`)
//! - check preconditions, fan out over models, and assemble the result (`selection`)

pub mod fitter;
pub mod selection;
pub mod variant;

pub use fitter::*;
pub use selection::*;
pub use variant::*;
