//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - statement rows and the immutable dataset (`StatementRow`, `Dataset`)
//! - indicator columns, stored and derived (`Indicator`)

pub mod indicator;
pub mod types;

pub use indicator::*;
pub use types::*;
