//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - statement rows and tables (`StatementRecord`, `StatementTable`)
//! - companies and the line items read for them (`Company`, `LineItem`)
//! - derived outputs (`Indicator`, `IndicatorRow`, `IndicatorTable`)
//! - run policies (`DuplicatePolicy`, `CompletenessPolicy`)

pub mod types;

pub use types::*;
