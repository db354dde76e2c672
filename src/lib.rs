//! `bovespa-dash` library crate.
//!
//! The binary (`bvd`) is a thin wrapper around this library so that:
//!
//! - the filter/aggregation pipeline is testable without spawning processes
//! - renderers (text report, JSON export, TUI) share one dashboard model
//! - code stays easy to navigate as the catalog grows

pub mod app;
pub mod catalog;
pub mod cli;
pub mod domain;
pub mod error;
pub mod filter;
pub mod io;
pub mod metrics;
pub mod plot;
pub mod report;
pub mod tui;
pub mod viz;
