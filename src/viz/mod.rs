//! Visualization selection and the tables each chart shape consumes.
//!
//! - `router`: user choice + degeneracy rule -> render mode
//! - `pivot`: working subset -> bar / line / heatmap / pie / table data

pub mod pivot;
pub mod router;

pub use pivot::*;
pub use router::{RenderMode, VizMode, route};
