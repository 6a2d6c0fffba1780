//! Kinetic gravity-curve models.
//!
//! Models are small, pure functions so that the fitting code can stay generic
//! over the model kind.

pub mod model;

pub use model::*;
