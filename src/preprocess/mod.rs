//! Preprocessing
//!
//! Applies the fitted transform and restores column labels on its output.

pub mod pipeline;
pub mod transformed;

pub use pipeline::{CategoricalColumn, NumericColumn, PreprocessingPipeline, Standardize};
pub use transformed::TransformedRecord;
