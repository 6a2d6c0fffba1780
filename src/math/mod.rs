//! Numerical building blocks: SVD least squares, the bounded Levenberg–Marquardt
//! solver, and fit statistics.

pub mod lm;
pub mod ols;
pub mod stats;

pub use lm::*;
pub use ols::*;
pub use stats::*;
