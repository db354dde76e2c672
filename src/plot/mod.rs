//! Terminal plotting for the `show` command.

pub mod ascii;

pub use ascii::*;
