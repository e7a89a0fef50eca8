//! Input/output helpers.
//!
//! - statement CSV ingest + latest-filing filter (`ingest`)
//! - indicator CSV write/read + run manifest (`export`)

pub mod export;
pub mod ingest;

pub use export::*;
pub use ingest::*;
