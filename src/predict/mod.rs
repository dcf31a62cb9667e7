//! Prediction and inference
//!
//! Runs a match record through the transform and the classifier and turns
//! the resulting probability into a ranked result.

pub mod inference;
pub mod result;

pub use inference::Predictor;
pub use result::{format_prediction, Outcome, PredictionResult};
