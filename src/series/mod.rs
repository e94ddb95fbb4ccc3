//! Series preparation: the aggregation pipeline.
//!
//! Responsibilities:
//!
//! - resolve calendar dates to ISO week identifiers (`week`)
//! - aggregate raw rows into ordered chart points (`aggregate`)
//! - compute the padded value-axis range (`range`)

pub mod aggregate;
pub mod range;
pub mod week;

pub use aggregate::*;
pub use range::*;
pub use week::*;
