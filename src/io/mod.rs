//! Input/output helpers.
//!
//! - CSV readings ingest + validation (`ingest`)
//! - per-reading CSV export (`export`)
//! - result/curve JSON read/write (`curve`)

pub mod curve;
pub mod export;
pub mod ingest;

pub use curve::*;
pub use export::*;
pub use ingest::*;
