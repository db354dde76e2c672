//! Small numeric helpers shared by every panel.
//!
//! - period interval labels (`periods`)
//! - named reductions over nullable values (`aggregate`)

pub mod aggregate;
pub mod periods;

pub use aggregate::Aggregation;
pub use periods::{compress_years, period_label};
