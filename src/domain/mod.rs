//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - the immutable input snapshot (`RawData`, `RawRow`, `RawVariation`)
//! - the prepared variation catalog (`VariationCatalog`, `Variation`)
//! - aggregated outputs (`ChartPoint`, `AxisRange`)

pub mod catalog;
pub mod types;

pub use catalog::*;
pub use types::*;
