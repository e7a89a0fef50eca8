//! The indicator derivation pipeline, stage by stage:
//!
//! - `companies`: distinct companies of the income statement
//! - `extract`: per-company line-item series
//! - `frame`: outer join on reference date
//! - `indicators`: ratios + completeness filter

pub mod companies;
pub mod extract;
pub mod frame;
pub mod indicators;

pub use companies::enumerate_companies;
pub use extract::{CompanyIndex, ExtractedItems, LineSeries, extract_company};
pub use frame::{YearInputs, outer_join};
pub use indicators::{apply_completeness, derive_indicators};
