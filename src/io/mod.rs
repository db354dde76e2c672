//! Input/output helpers.
//!
//! - CSV ingest + validation (`ingest`)
//! - load-once dataset cache (`cache`)
//! - dashboard JSON export (`export`)

pub mod cache;
pub mod export;
pub mod ingest;

pub use cache::*;
pub use export::*;
pub use ingest::*;
