//! Completion estimates derived from a fit.
//!
//! - curve ETA from the fitted model (`completion`)
//! - model-free straight-line ETA (`linear`)
//! - confidence score and the blend of both ETAs (`confidence`)

pub mod completion;
pub mod confidence;
pub mod linear;

pub use completion::*;
pub use confidence::*;
pub use linear::*;
