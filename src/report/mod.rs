//! Reporting utilities: point rankings and formatted terminal output.

pub mod format;

pub use format::*;
