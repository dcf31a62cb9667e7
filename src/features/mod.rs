//! Feature assembly
//!
//! Builds the fixed-schema single-row record the preprocessing transform
//! was fitted on.

pub mod match_record;
pub mod row;

pub use match_record::{MatchContext, MatchRecord, PlayerAttributes};
pub use row::{CellValue, FeatureRow};
