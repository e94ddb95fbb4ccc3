//! Input/output helpers.
//!
//! - snapshot JSON ingest + validation (`ingest`)
//! - per-point CSV export (`export`)
//! - series JSON read/write (`series`)

pub mod export;
pub mod ingest;
pub mod series;

pub use export::*;
pub use ingest::*;
pub use series::*;
